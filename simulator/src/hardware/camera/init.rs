//! Building the derived state of a camera.

use std::time::Instant;

use log::{debug, info};
use nalgebra::{Vector2, Vector3};
use ndarray::Array2;

use shared::algo::fill_array;
use shared::image_size::Resolution;

use super::intrinsics::{direction_through_pixel, FrameConvention, Intrinsics};
use super::{Camera, CameraState, PrecomputedState};
use crate::algo::quad_solid_angle;
use crate::geometry::{cast_vector, CameraFloat, Frustum, MeshFloat};
use crate::hardware::aperture::CircularAperture;
use crate::hardware::distortion::Distortion;
use crate::hardware::error::CameraError;
use crate::hardware::filter_array::{bayer_filter, BayerPrimaries};
use crate::hardware::noise_model::SensorNoiseModel;
use crate::hardware::photosite::Photosite;
use crate::hardware::psf::{
    AiryDiskPsfConfig, DefaultPsf, GaussianPsf, PointSpreadFunction,
    DEFAULT_SUPERSAMPLING,
};
use crate::photometry::Spectral;

/// Distance of the far frustum corners, in camera-space units.
pub const FRUSTUM_FAR_DISTANCE: f64 = 1.0e4;

/// Unit direction through continuous pixel coordinate `(u, v)`, in `f64`.
fn unit_direction(
    intrinsics: &Intrinsics<f64>,
    distortion: Option<&dyn Distortion>,
    convention: &FrameConvention<f64>,
    u: f64,
    v: f64,
) -> Vector3<f64> {
    direction_through_pixel(intrinsics, distortion, convention, &Vector2::new(u, v)).normalize()
}

/// Solid angle of every pixel, shape `(height, width)`.
///
/// Corner directions are computed once on the `(height + 1) x (width + 1)`
/// grid, then each pixel is split into two spherical triangles.
pub(crate) fn compute_pixel_solid_angles(
    intrinsics: &Intrinsics<f64>,
    distortion: Option<&dyn Distortion>,
    convention: &FrameConvention<f64>,
    resolution: Resolution,
) -> Array2<f32> {
    let (rows, cols) = resolution.shape();
    let corners = fill_array((rows + 1, cols + 1), |j, i| {
        unit_direction(intrinsics, distortion, convention, i as f64, j as f64)
    });
    fill_array((rows, cols), |j, i| {
        let quad = [
            corners[[j, i]],
            corners[[j, i + 1]],
            corners[[j + 1, i + 1]],
            corners[[j + 1, i]],
        ];
        quad_solid_angle(&quad) as f32
    })
}

/// Unit camera-space directions at pixel centers.
pub(crate) fn compute_pixel_directions<F: CameraFloat>(
    intrinsics: &Intrinsics<f64>,
    distortion: Option<&dyn Distortion>,
    convention: &FrameConvention<f64>,
    resolution: Resolution,
) -> Array2<Vector3<F>> {
    fill_array(resolution.shape(), |j, i| {
        let (u, v) = (i as f64 + 0.5, j as f64 + 0.5);
        let d = unit_direction(intrinsics, distortion, convention, u, v);
        cast_vector(&d)
    })
}

/// Frustum through the four outer image corners.
pub(crate) fn compute_frustum<F: CameraFloat>(
    intrinsics: &Intrinsics<f64>,
    distortion: Option<&dyn Distortion>,
    convention: &FrameConvention<f64>,
    resolution: Resolution,
) -> Frustum<F> {
    let w = resolution.width as f64;
    let h = resolution.height as f64;
    let corner =
        |u: f64, v: f64| cast_vector(&unit_direction(intrinsics, distortion, convention, u, v));
    let directions = [corner(0.0, 0.0), corner(w, 0.0), corner(w, h), corner(0.0, h)];
    let forward = Vector3::new(F::zero(), F::zero(), F::from_f64_lossy(convention.z_dir));
    Frustum::from_corner_directions(&directions, &forward, F::from_f64_lossy(FRUSTUM_FAR_DISTANCE))
}

impl<S: Spectral, F: CameraFloat, M: MeshFloat<F>> Camera<S, F, M> {
    /// Build default components and all derived state.
    ///
    /// Does nothing if the camera is already initialized. On error the camera
    /// stays uninitialized.
    pub fn initialize(&mut self) -> Result<(), CameraError> {
        if self.is_initialized() {
            return Ok(());
        }
        let start = Instant::now();

        if self.photosite.is_none() {
            self.photosite = Some(Photosite::from_config(&self.photosite_config)?);
        }

        match self.aperture.as_mut() {
            Some(aperture) => aperture.set_diameter(self.aperture_diameter),
            None => self.aperture = Some(Box::new(CircularAperture::new(self.aperture_diameter))),
        }

        let pixel_size = self.pixel_size();

        if !self.custom_psf {
            self.psf = self.build_default_psf(pixel_size);
        }

        if self.noise_model.is_none() {
            if let Some(config) = self.noise_config {
                let model = SensorNoiseModel::with_seed(config, self.next_seed())?;
                self.noise_model = Some(Box::new(model));
            }
        }

        self.prepare_filter_mosaic()?;

        let convention = self.frame_convention();
        let pixels_per_metre = Vector2::new(1.0 / pixel_size.x, 1.0 / pixel_size.y);
        let intrinsics = Intrinsics::from_physical(
            self.focal_length,
            pixels_per_metre,
            self.principal_point(),
            self.skew,
        )?;
        debug!(
            "{}: intrinsics fx={:.3} fy={:.3} pp=({:.2}, {:.2}) skew=({}, {})",
            self.id, intrinsics.fx, intrinsics.fy, intrinsics.px, intrinsics.py, intrinsics.kxy,
            intrinsics.kyx
        );

        let distortion = self.distortion.as_deref();
        let resolution = self.resolution;

        let phase = Instant::now();
        let pixel_solid_angles =
            compute_pixel_solid_angles(&intrinsics, distortion, &convention, resolution);
        debug!(
            "{}: pixel solid angles for {} took {:?}",
            self.id,
            resolution,
            phase.elapsed()
        );

        let pixel_directions = if self.interpolate_directions && distortion.is_some() {
            let phase = Instant::now();
            let field = compute_pixel_directions(&intrinsics, distortion, &convention, resolution);
            debug!("{}: direction field took {:?}", self.id, phase.elapsed());
            Some(field)
        } else {
            None
        };

        let frustum = compute_frustum(&intrinsics, distortion, &convention, resolution);

        self.state = CameraState::Ready(Box::new(PrecomputedState {
            intrinsics,
            intrinsics_working: intrinsics.cast(),
            pixel_solid_angles,
            pixel_directions,
            frustum,
        }));

        info!(
            "{} initialized: {} at f={:.1} mm f/{:.1} in {:?}",
            self.id,
            resolution,
            self.focal_length * 1e3,
            self.f_stop,
            start.elapsed()
        );
        Ok(())
    }

    fn build_default_psf(&self, pixel_size: Vector2<f64>) -> Option<PointSpreadFunction<S>> {
        let pixel_size = (pixel_size.x, pixel_size.y);
        match self.default_psf {
            DefaultPsf::None => None,
            DefaultPsf::Airy => {
                let config = AiryDiskPsfConfig {
                    focal_length: self.focal_length,
                    aperture_diameter: self.aperture_diameter,
                    pixel_size,
                    supersampling: DEFAULT_SUPERSAMPLING,
                };
                Some(PointSpreadFunction::from_airy(config))
            }
            DefaultPsf::Gaussian => Some(PointSpreadFunction::new(Box::new(
                GaussianPsf::<S>::from_airy(self.focal_length, self.aperture_diameter, pixel_size),
            ))),
        }
    }

    fn prepare_filter_mosaic(&mut self) -> Result<(), CameraError> {
        if !self.bayer_filter {
            return Ok(());
        }
        let stale = self
            .filter_mosaic
            .as_ref()
            .map(|mosaic| Resolution::from_shape(mosaic.dim()) != self.resolution)
            .unwrap_or(true);
        if !stale {
            return Ok(());
        }
        if self.custom_filter_mosaic {
            let actual = self
                .filter_mosaic
                .as_ref()
                .map(|mosaic| Resolution::from_shape(mosaic.dim()))
                .unwrap_or_default();
            return Err(CameraError::FilterMosaicMismatch {
                expected: self.resolution,
                actual,
            });
        }
        debug!("{}: building RGGB mosaic for {}", self.id, self.resolution);
        let BayerPrimaries { red, green, blue } = self.bayer_primaries;
        self.filter_mosaic = Some(bayer_filter(self.resolution, red, green, blue));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::distortion::{BrownCoefficients, BrownDistortion};
    use crate::photometry::VisibleSpectrum;
    use approx::assert_relative_eq;

    fn pinhole(width: usize, height: usize, fx: f64) -> Intrinsics<f64> {
        Intrinsics::from_physical(
            1.0,
            Vector2::new(fx, fx),
            Vector2::new(width as f64 / 2.0, height as f64 / 2.0),
            Vector2::zeros(),
        )
        .unwrap()
    }

    fn standard(width: usize) -> FrameConvention<f64> {
        FrameConvention::standard(width as f64)
    }

    #[test]
    fn test_solid_angles_sum_to_field_of_view() {
        let (w, h, f) = (64, 48, 50.0);
        let k = pinhole(w, h, f);
        let angles = compute_pixel_solid_angles(&k, None, &standard(w), Resolution::new(w, h));
        let total: f64 = angles.iter().map(|&a| a as f64).sum();

        // Rectangle centered on the axis with half-tangents a, b
        let a = w as f64 / 2.0 / f;
        let b = h as f64 / 2.0 / f;
        let expected = 4.0 * (a * b / (1.0 + a * a + b * b).sqrt()).atan();
        assert_relative_eq!(total, expected, max_relative = 1e-4);

        // Corner pixels see less of the sphere than central ones.
        assert!(angles[[0, 0]] < angles[[h / 2, w / 2]]);
    }

    #[test]
    fn test_solid_angles_mirror_invariant() {
        // Off-center principal point: the Blender frame mirrors the columns
        let k = Intrinsics::from_physical(
            1.0,
            Vector2::new(20.0, 20.0),
            Vector2::new(5.0, 6.0),
            Vector2::zeros(),
        )
        .unwrap();
        let resolution = Resolution::new(16, 12);
        let a = compute_pixel_solid_angles(&k, None, &standard(16), resolution);
        let b =
            compute_pixel_solid_angles(&k, None, &FrameConvention::blender(16.0), resolution);
        for ((j, i), x) in a.indexed_iter() {
            assert_relative_eq!(*x, b[[j, 15 - i]], max_relative = 1e-6);
        }
    }

    #[test]
    fn test_direction_field_is_normalized() {
        let k = pinhole(10, 8, 10.0);
        let brown = BrownDistortion::new(BrownCoefficients {
            k1: -0.1,
            ..Default::default()
        });
        let field: Array2<Vector3<f64>> =
            compute_pixel_directions(&k, Some(&brown), &standard(10), Resolution::new(10, 8));
        assert_eq!(field.dim(), (8, 10));
        for d in field.iter() {
            assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-12);
            assert!(d.z > 0.0);
        }
    }

    #[test]
    fn test_frustum_contains_axis() {
        let k = pinhole(20, 10, 15.0);
        let frustum: Frustum<f64> = compute_frustum(&k, None, &standard(20), Resolution::new(20, 10));
        let on_axis = Vector3::new(0.0, 0.0, 5.0);
        for plane in frustum.planes() {
            assert!(plane.signed_distance(&on_axis) > 0.0);
        }
        let outside = Vector3::new(50.0, 0.0, 5.0);
        assert!(frustum.planes().iter().any(|p| p.signed_distance(&outside) < 0.0));
    }

    #[test]
    fn test_initialize_builds_defaults() {
        let mut camera: Camera<VisibleSpectrum> = Camera::new();
        camera.set_resolution(Resolution::new(6, 4)).unwrap();
        camera.set_default_psf(DefaultPsf::Gaussian);
        camera.set_bayer_filter(true);
        camera.set_default_low_noise().unwrap();
        camera.initialize().unwrap();

        assert_eq!(camera.psf().unwrap().model().name(), "gaussian");
        assert_eq!(camera.filter_mosaic().unwrap().dim(), (4, 6));
        assert!(camera.noise_model().is_ok());
        assert_eq!(camera.pixel_solid_angles().unwrap().dim(), (4, 6));
        assert!(!camera.interpolates_directions());

        // Idempotent
        camera.initialize().unwrap();

        // Resolution change regenerates the default mosaic.
        camera.set_resolution(Resolution::new(8, 8)).unwrap();
        camera.initialize().unwrap();
        assert_eq!(camera.filter_mosaic().unwrap().dim(), (8, 8));
    }

    #[test]
    fn test_default_airy_psf_is_finite() {
        let mut camera: Camera<VisibleSpectrum> = Camera::new();
        camera.set_resolution(Resolution::new(8, 8)).unwrap();
        camera.set_sensor_size(40e-6, 40e-6).unwrap();
        camera.set_f_stop(2.8).unwrap();
        camera.set_default_psf(DefaultPsf::Airy);
        camera.initialize().unwrap();

        let psf = camera.psf().unwrap();
        assert_eq!(psf.model().name(), "airy");
        assert_eq!(psf.supersampling(), DEFAULT_SUPERSAMPLING);
        let kernel = psf.kernels().last().unwrap();
        assert_eq!(kernel.size, 81);
        let mut total = VisibleSpectrum::default();
        kernel.values.iter().for_each(|v| total += *v);
        for band in 0..VisibleSpectrum::BANDS {
            assert!(kernel.values.iter().all(|v| v[band].is_finite()));
            assert_relative_eq!(total[band], 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_custom_mosaic_mismatch_after_resize() {
        let mut camera: Camera<VisibleSpectrum> = Camera::new();
        camera.set_resolution(Resolution::new(4, 4)).unwrap();
        camera
            .set_filter_mosaic(Array2::from_elem((4, 4), VisibleSpectrum::splat(1.0)))
            .unwrap();
        camera.set_resolution(Resolution::new(6, 4)).unwrap();
        assert!(matches!(
            camera.initialize(),
            Err(CameraError::FilterMosaicMismatch { .. })
        ));
        assert!(camera.needs_initialization());
    }

    #[test]
    fn test_degenerate_skew_reported() {
        let mut camera: Camera<VisibleSpectrum> = Camera::new();
        camera.set_resolution(Resolution::new(10, 10)).unwrap();
        camera.set_sensor_size(1e-3, 1e-3).unwrap();
        camera.set_focal_length(1e-3).unwrap();
        // fx = fy = 10 pixels
        camera.set_skew(10.0, 10.0).unwrap();
        assert!(matches!(
            camera.initialize(),
            Err(CameraError::DegenerateIntrinsics { .. })
        ));
    }
}
