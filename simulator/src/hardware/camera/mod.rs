//! The camera: pose, intrinsics, optical components and sensor.
//!
//! A [`Camera`] converts between world geometry and pixels (projection, rays,
//! frustum culling) and between incident power and digital output (photon
//! counting, noise, photosite response). It is generic over
//!
//! - `S`: the [`Spectral`] sample type carried through radiometry,
//! - `F`: the working precision of ray casting and projection,
//! - `M`: the precision of scene geometry handed to [`Camera::obb_in_view`],
//!   which must be at least as precise as `F`.
//!
//! # Lifecycle
//!
//! Setters validate their input before touching any state. Those that change
//! the geometry (focal length, sensor, resolution, principal point, skew,
//! distortion, frame convention, aperture, PSF choice) discard the derived
//! state; [`Camera::initialize`] rebuilds it. Operations that read derived
//! state return [`CameraError::NotInitialized`] until then.
//!
//! ```
//! use camera_sim::hardware::camera::Camera;
//! use camera_sim::photometry::Panchromatic;
//! use shared::image_size::Resolution;
//!
//! let mut camera: Camera<Panchromatic> = Camera::new();
//! camera.set_resolution(Resolution::new(64, 48)).unwrap();
//! camera.set_sensor_size(6.4e-3, 4.8e-3).unwrap();
//! camera.set_focal_length(0.025).unwrap();
//! camera.initialize().unwrap();
//!
//! let ray = camera.pixel_to_ray(32.0, 24.0).unwrap();
//! assert!((ray.direction.z - 1.0).abs() < 1e-9);
//! ```

mod config;
mod init;
mod intrinsics;
pub mod models;
mod projection;
mod radiometry;

pub use config::{CameraConfig, ConfigError, PsfConfig};
pub use intrinsics::{
    direction_through_pixel, pixel_of_point, FrameConvention, Intrinsics, DETERMINANT_EPSILON,
};
pub use radiometry::MINIMUM_DETECTABLE_ELECTRONS;

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use nalgebra::{Matrix3, Vector2, Vector3};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use shared::algo::entropy_seed;
use shared::image_size::Resolution;

use super::aperture::Aperture;
use super::distortion::Distortion;
use super::error::{ensure_finite, ensure_non_negative, ensure_positive, CameraError};
use super::filter_array::BayerPrimaries;
use super::noise_model::{NoiseModel, NoiseModelConfig, SensorNoiseModel};
use super::photosite::{Photosite, PhotositeConfig};
use super::psf::{DefaultPsf, GaussianPsf, PointSpreadFunction};
use crate::geometry::{CameraFloat, Frustum, MeshFloat, ReferenceFrame};
use crate::photometry::{ColorRgb, Spectral};

/// Default focal length, metres
pub const DEFAULT_FOCAL_LENGTH: f64 = 0.05;
/// Default f-number
pub const DEFAULT_F_STOP: f64 = 2.8;
/// Default sensor size (full frame, 16:9 crop), metres
pub const DEFAULT_SENSOR_SIZE: (f64, f64) = (36e-3, 20.25e-3);
/// Default exposure time, seconds
pub const DEFAULT_EXPOSURE_TIME: f64 = 1.0 / 60.0;

static NEXT_CAMERA_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique camera identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(u64);

impl CameraId {
    fn next() -> Self {
        Self(NEXT_CAMERA_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "camera-{}", self.0)
    }
}

/// Everything `initialize` derives from the configuration.
#[derive(Debug, Clone)]
pub(crate) struct PrecomputedState<F: CameraFloat> {
    pub(crate) intrinsics: Intrinsics<f64>,
    pub(crate) intrinsics_working: Intrinsics<F>,
    /// Steradians per pixel, shape `(height, width)`
    pub(crate) pixel_solid_angles: Array2<f32>,
    /// Unit directions at pixel centers when interpolation is active
    pub(crate) pixel_directions: Option<Array2<Vector3<F>>>,
    pub(crate) frustum: Frustum<F>,
}

#[derive(Debug, Clone)]
pub(crate) enum CameraState<F: CameraFloat> {
    Dirty,
    Ready(Box<PrecomputedState<F>>),
}

/// Physically based camera model.
pub struct Camera<S: Spectral, F: CameraFloat = f64, M: MeshFloat<F> = F> {
    id: CameraId,
    frame: ReferenceFrame<F>,

    focal_length: f64,
    sensor_size: Vector2<f64>,
    resolution: Resolution,
    principal_point: Option<Vector2<f64>>,
    /// `(kxy, kyx)` in pixels
    skew: Vector2<f64>,

    f_stop: f64,
    aperture_diameter: f64,
    focus_distance: f64,
    exposure_time: f64,
    optical_efficiency: S,

    depth_of_field: bool,
    blender_frame: bool,
    interpolate_directions: bool,
    photon_noise: bool,
    bayer_filter: bool,
    bayer_primaries: BayerPrimaries<S>,

    aperture: Option<Box<dyn Aperture>>,
    distortion: Option<Box<dyn Distortion>>,
    psf: Option<PointSpreadFunction<S>>,
    custom_psf: bool,
    default_psf: DefaultPsf,
    noise_model: Option<Box<dyn NoiseModel>>,
    custom_noise_model: bool,
    noise_config: Option<NoiseModelConfig>,
    photosite: Option<Photosite<S>>,
    photosite_config: PhotositeConfig,
    filter_mosaic: Option<Array2<S>>,
    custom_filter_mosaic: bool,

    rng: Mutex<StdRng>,
    state: CameraState<F>,
    _mesh: PhantomData<M>,
}

impl<S: Spectral, F: CameraFloat, M: MeshFloat<F>> fmt::Debug for Camera<S, F, M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Camera")
            .field("id", &self.id)
            .field("resolution", &self.resolution)
            .field("focal_length", &self.focal_length)
            .field("sensor_size", &self.sensor_size)
            .field("f_stop", &self.f_stop)
            .field("aperture_diameter", &self.aperture_diameter)
            .field("distortion", &self.distortion)
            .field("psf", &self.psf)
            .field("noise_model", &self.noise_model)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl<S: Spectral, F: CameraFloat, M: MeshFloat<F>> Default for Camera<S, F, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Spectral, F: CameraFloat, M: MeshFloat<F>> Camera<S, F, M> {
    /// Camera with default optics: 50 mm f/2.8, full-frame 16:9 sensor at
    /// 1920x1080, no distortion, PSF or sensor noise.
    pub fn new() -> Self {
        Self {
            id: CameraId::next(),
            frame: ReferenceFrame::default(),
            focal_length: DEFAULT_FOCAL_LENGTH,
            sensor_size: Vector2::new(DEFAULT_SENSOR_SIZE.0, DEFAULT_SENSOR_SIZE.1),
            resolution: Resolution::default(),
            principal_point: None,
            skew: Vector2::zeros(),
            f_stop: DEFAULT_F_STOP,
            aperture_diameter: DEFAULT_FOCAL_LENGTH / DEFAULT_F_STOP,
            focus_distance: f64::INFINITY,
            exposure_time: DEFAULT_EXPOSURE_TIME,
            optical_efficiency: S::splat(1.0),
            depth_of_field: false,
            blender_frame: false,
            interpolate_directions: false,
            photon_noise: true,
            bayer_filter: false,
            bayer_primaries: BayerPrimaries::default(),
            aperture: None,
            distortion: None,
            psf: None,
            custom_psf: false,
            default_psf: DefaultPsf::None,
            noise_model: None,
            custom_noise_model: false,
            noise_config: None,
            photosite: None,
            photosite_config: PhotositeConfig::default(),
            filter_mosaic: None,
            custom_filter_mosaic: false,
            rng: Mutex::new(StdRng::seed_from_u64(entropy_seed())),
            state: CameraState::Dirty,
            _mesh: PhantomData,
        }
    }

    pub fn id(&self) -> CameraId {
        self.id
    }

    // --- state ------------------------------------------------------------

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, CameraState::Ready(_))
    }

    pub fn needs_initialization(&self) -> bool {
        !self.is_initialized()
    }

    fn invalidate(&mut self) {
        self.state = CameraState::Dirty;
    }

    pub(crate) fn precomputed(&self) -> Result<&PrecomputedState<F>, CameraError> {
        match &self.state {
            CameraState::Ready(state) => Ok(state),
            CameraState::Dirty => Err(CameraError::NotInitialized),
        }
    }

    /// Seed the camera's generator (noise and photon draws).
    pub fn set_rng_seed(&mut self, seed: u64) {
        *self.lock_rng() = StdRng::seed_from_u64(seed);
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Draw a seed for a parallel region from the camera's generator.
    pub(crate) fn next_seed(&self) -> u64 {
        self.lock_rng().next_u64()
    }

    // --- pose ---------------------------------------------------------------

    pub fn frame(&self) -> &ReferenceFrame<F> {
        &self.frame
    }

    /// Pose changes never invalidate the derived state, which lives in
    /// camera space.
    pub fn frame_mut(&mut self) -> &mut ReferenceFrame<F> {
        &mut self.frame
    }

    pub fn set_position(&mut self, position: Vector3<F>) {
        self.frame.set_position(position);
    }

    pub fn position(&self) -> Vector3<F> {
        self.frame.position()
    }

    /// +1 when the camera looks along +z, -1 in the Blender convention.
    pub fn z_dir(&self) -> f64 {
        if self.blender_frame {
            -1.0
        } else {
            1.0
        }
    }

    /// Axis convention used by the pixel maps.
    pub fn frame_convention(&self) -> FrameConvention<f64> {
        let width = self.resolution.width as f64;
        if self.blender_frame {
            FrameConvention::blender(width)
        } else {
            FrameConvention::standard(width)
        }
    }

    // --- intrinsics ----------------------------------------------------------

    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    /// Set the focal length in metres. The f-number is kept and the aperture
    /// diameter follows.
    pub fn set_focal_length(&mut self, focal_length: f64) -> Result<(), CameraError> {
        let focal_length = ensure_positive("focal_length", focal_length)?;
        self.focal_length = focal_length;
        self.apply_aperture_diameter(focal_length / self.f_stop);
        self.invalidate();
        Ok(())
    }

    /// Physical sensor size `(width, height)` in metres.
    pub fn sensor_size(&self) -> Vector2<f64> {
        self.sensor_size
    }

    pub fn set_sensor_size(&mut self, width: f64, height: f64) -> Result<(), CameraError> {
        let width = ensure_positive("sensor_width", width)?;
        let height = ensure_positive("sensor_height", height)?;
        self.sensor_size = Vector2::new(width, height);
        self.invalidate();
        Ok(())
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), CameraError> {
        if resolution.is_empty() {
            return Err(CameraError::OutOfRange {
                parameter: "resolution",
                message: format!("{resolution} has no pixels"),
            });
        }
        self.resolution = resolution;
        self.invalidate();
        Ok(())
    }

    /// Pixel pitch `(x, y)` in metres.
    pub fn pixel_size(&self) -> Vector2<f64> {
        Vector2::new(
            self.sensor_size.x / self.resolution.width as f64,
            self.sensor_size.y / self.resolution.height as f64,
        )
    }

    /// Principal point in pixels; the image center unless set explicitly.
    pub fn principal_point(&self) -> Vector2<f64> {
        self.principal_point.unwrap_or_else(|| {
            let (cx, cy) = self.resolution.center();
            Vector2::new(cx, cy)
        })
    }

    pub fn set_principal_point(&mut self, x: f64, y: f64) -> Result<(), CameraError> {
        let x = ensure_finite("principal_point_x", x)?;
        let y = ensure_finite("principal_point_y", y)?;
        self.principal_point = Some(Vector2::new(x, y));
        self.invalidate();
        Ok(())
    }

    /// Return to a principal point at the image center.
    pub fn reset_principal_point(&mut self) {
        self.principal_point = None;
        self.invalidate();
    }

    /// Skew terms `(kxy, kyx)` in pixels.
    pub fn skew(&self) -> Vector2<f64> {
        self.skew
    }

    pub fn set_skew(&mut self, kxy: f64, kyx: f64) -> Result<(), CameraError> {
        let kxy = ensure_finite("kxy", kxy)?;
        let kyx = ensure_finite("kyx", kyx)?;
        self.skew = Vector2::new(kxy, kyx);
        self.invalidate();
        Ok(())
    }

    pub fn blender_frame(&self) -> bool {
        self.blender_frame
    }

    /// Blender camera convention: look along -z with +y up, pixel columns
    /// mirrored about the image width.
    pub fn set_blender_frame(&mut self, enabled: bool) {
        if self.blender_frame != enabled {
            self.blender_frame = enabled;
            self.invalidate();
        }
    }

    /// Whether direction interpolation was requested. It is only active when
    /// a distortion model is present too; see
    /// [`Camera::interpolates_directions`].
    pub fn interpolate_directions_requested(&self) -> bool {
        self.interpolate_directions
    }

    pub fn set_interpolate_directions(&mut self, enabled: bool) {
        if self.interpolate_directions != enabled {
            self.interpolate_directions = enabled;
            self.invalidate();
        }
    }

    /// True if ray directions come from the precomputed field.
    pub fn interpolates_directions(&self) -> bool {
        self.precomputed()
            .map(|state| state.pixel_directions.is_some())
            .unwrap_or(false)
    }

    // --- derived geometry ----------------------------------------------------

    /// Intrinsic matrix in working precision.
    pub fn intrinsic_matrix(&self) -> Result<Matrix3<F>, CameraError> {
        Ok(self.precomputed()?.intrinsics_working.matrix())
    }

    pub fn inverse_intrinsic_matrix(&self) -> Result<Matrix3<F>, CameraError> {
        Ok(self.precomputed()?.intrinsics_working.inverse_matrix())
    }

    /// Double-precision intrinsics used by the solid-angle and frustum passes.
    pub fn intrinsics_f64(&self) -> Result<&Intrinsics<f64>, CameraError> {
        Ok(&self.precomputed()?.intrinsics)
    }

    pub fn intrinsics(&self) -> Result<&Intrinsics<F>, CameraError> {
        Ok(&self.precomputed()?.intrinsics_working)
    }

    /// Per-pixel solid angles in steradians, shape `(height, width)`.
    pub fn pixel_solid_angles(&self) -> Result<&Array2<f32>, CameraError> {
        Ok(&self.precomputed()?.pixel_solid_angles)
    }

    pub fn pixel_solid_angle(&self, i: usize, j: usize) -> Result<f32, CameraError> {
        let angles = self.pixel_solid_angles()?;
        angles.get([j, i]).copied().ok_or(CameraError::PixelOutOfBounds {
            x: i,
            y: j,
            resolution: self.resolution,
        })
    }

    /// Precomputed unit directions at pixel centers, if interpolation is active.
    pub fn pixel_directions(&self) -> Result<Option<&Array2<Vector3<F>>>, CameraError> {
        Ok(self.precomputed()?.pixel_directions.as_ref())
    }

    /// Camera-space frustum.
    pub fn frustum(&self) -> Result<&Frustum<F>, CameraError> {
        Ok(&self.precomputed()?.frustum)
    }

    // --- aperture -------------------------------------------------------------

    pub fn f_stop(&self) -> f64 {
        self.f_stop
    }

    /// Set the f-number; the aperture diameter becomes `focal_length / f_stop`.
    pub fn set_f_stop(&mut self, f_stop: f64) -> Result<(), CameraError> {
        let f_stop = ensure_positive("f_stop", f_stop)?;
        self.f_stop = f_stop;
        self.apply_aperture_diameter(self.focal_length / f_stop);
        self.invalidate();
        Ok(())
    }

    pub fn aperture_diameter(&self) -> f64 {
        self.aperture_diameter
    }

    /// Set the aperture diameter in metres; the f-number follows.
    pub fn set_aperture_diameter(&mut self, diameter: f64) -> Result<(), CameraError> {
        let diameter = ensure_positive("aperture_diameter", diameter)?;
        self.f_stop = self.focal_length / diameter;
        self.apply_aperture_diameter(diameter);
        self.invalidate();
        Ok(())
    }

    fn apply_aperture_diameter(&mut self, diameter: f64) {
        self.aperture_diameter = diameter;
        if let Some(aperture) = self.aperture.as_mut() {
            aperture.set_diameter(diameter);
        }
    }

    /// Install a custom aperture. Its diameter becomes the camera's and the
    /// f-number is recomputed.
    pub fn set_aperture(&mut self, aperture: Box<dyn Aperture>) -> Result<(), CameraError> {
        let diameter = ensure_positive("aperture_diameter", aperture.diameter())?;
        self.aperture = Some(aperture);
        self.set_aperture_diameter(diameter)
    }

    pub fn aperture(&self) -> Result<&dyn Aperture, CameraError> {
        self.aperture
            .as_deref()
            .ok_or(CameraError::ComponentMissing("aperture"))
    }

    // --- exposure ---------------------------------------------------------------

    pub fn exposure_time(&self) -> f64 {
        self.exposure_time
    }

    pub fn set_exposure_time(&mut self, seconds: f64) -> Result<(), CameraError> {
        self.exposure_time = ensure_positive("exposure_time", seconds)?;
        Ok(())
    }

    pub fn focus_distance(&self) -> f64 {
        self.focus_distance
    }

    /// Distance to the plane of sharp focus in metres. Infinity is allowed
    /// and disables refocusing of depth-of-field rays.
    pub fn set_focus_distance(&mut self, distance: f64) -> Result<(), CameraError> {
        if distance.is_nan() {
            return Err(CameraError::NotFinite {
                parameter: "focus_distance",
                value: distance,
            });
        }
        if distance <= 0.0 {
            return Err(CameraError::NotPositive {
                parameter: "focus_distance",
                value: distance,
            });
        }
        self.focus_distance = distance;
        Ok(())
    }

    pub fn depth_of_field(&self) -> bool {
        self.depth_of_field
    }

    pub fn set_depth_of_field(&mut self, enabled: bool) {
        self.depth_of_field = enabled;
    }

    pub fn optical_efficiency(&self) -> &S {
        &self.optical_efficiency
    }

    /// Per-band transmission of the optics.
    pub fn set_optical_efficiency(&mut self, efficiency: S) -> Result<(), CameraError> {
        for band in 0..S::BANDS {
            ensure_non_negative("optical_efficiency", efficiency[band] as f64)?;
        }
        self.optical_efficiency = efficiency;
        Ok(())
    }

    pub fn set_optical_efficiency_scalar(&mut self, efficiency: f32) -> Result<(), CameraError> {
        self.set_optical_efficiency(S::splat(efficiency))
    }

    pub fn photon_noise(&self) -> bool {
        self.photon_noise
    }

    /// Enable Poisson redraws of photon counts.
    pub fn set_photon_noise(&mut self, enabled: bool) {
        self.photon_noise = enabled;
    }

    // --- filter mosaic ------------------------------------------------------------

    pub fn bayer_filter(&self) -> bool {
        self.bayer_filter
    }

    /// Enable the default RGGB mosaic. Disabling also drops a custom mosaic.
    pub fn set_bayer_filter(&mut self, enabled: bool) {
        self.bayer_filter = enabled;
        if !enabled {
            self.filter_mosaic = None;
            self.custom_filter_mosaic = false;
        }
        self.invalidate();
    }

    /// Enable the RGGB mosaic with the given filter responses in place of the
    /// ideal primaries. Drops a custom mosaic.
    pub fn set_default_bayer_filter(&mut self, red: S, green: S, blue: S) {
        self.bayer_primaries = BayerPrimaries { red, green, blue };
        self.bayer_filter = true;
        self.filter_mosaic = None;
        self.custom_filter_mosaic = false;
        self.invalidate();
    }

    pub fn bayer_primaries(&self) -> &BayerPrimaries<S> {
        &self.bayer_primaries
    }

    /// Install a custom per-pixel filter response. The mosaic must match the
    /// camera resolution exactly.
    pub fn set_filter_mosaic(&mut self, mosaic: Array2<S>) -> Result<(), CameraError> {
        let actual = Resolution::from_shape(mosaic.dim());
        if actual != self.resolution {
            return Err(CameraError::FilterMosaicMismatch {
                expected: self.resolution,
                actual,
            });
        }
        self.filter_mosaic = Some(mosaic);
        self.custom_filter_mosaic = true;
        self.bayer_filter = true;
        Ok(())
    }

    pub fn filter_mosaic(&self) -> Option<&Array2<S>> {
        self.filter_mosaic.as_ref()
    }

    // --- distortion ------------------------------------------------------------

    pub fn set_distortion(&mut self, distortion: Box<dyn Distortion>) {
        self.distortion = Some(distortion);
        self.invalidate();
    }

    /// Back to a pinhole camera.
    pub fn clear_distortion(&mut self) {
        self.distortion = None;
        self.invalidate();
    }

    pub fn has_distortion(&self) -> bool {
        self.distortion.is_some()
    }

    pub fn distortion(&self) -> Result<&dyn Distortion, CameraError> {
        self.distortion
            .as_deref()
            .ok_or(CameraError::ComponentMissing("distortion"))
    }

    /// Mutable access to the distortion model. Invalidates derived state.
    pub fn distortion_mut(&mut self) -> Result<&mut (dyn Distortion + 'static), CameraError> {
        if self.distortion.is_none() {
            return Err(CameraError::ComponentMissing("distortion"));
        }
        self.invalidate();
        self.distortion
            .as_deref_mut()
            .ok_or(CameraError::ComponentMissing("distortion"))
    }

    // --- PSF -------------------------------------------------------------------------

    /// Install a custom PSF; it replaces any default PSF choice.
    pub fn set_psf(&mut self, psf: PointSpreadFunction<S>) {
        self.psf = Some(psf);
        self.custom_psf = true;
    }

    /// Remove the PSF, custom or default.
    pub fn clear_psf(&mut self) {
        self.psf = None;
        self.custom_psf = false;
        self.default_psf = DefaultPsf::None;
        self.invalidate();
    }

    pub fn default_psf(&self) -> DefaultPsf {
        self.default_psf
    }

    /// Choose the PSF built by `initialize` when no custom PSF is set.
    pub fn set_default_psf(&mut self, choice: DefaultPsf) {
        self.default_psf = choice;
        self.custom_psf = false;
        self.invalidate();
    }

    /// Elliptical Gaussian PSF with per-band sigmas in pixels.
    pub fn set_gaussian_psf_elliptical(
        &mut self,
        sigma_x: S,
        sigma_y: S,
        angle: f64,
    ) -> Result<(), CameraError> {
        for band in 0..S::BANDS {
            ensure_non_negative("sigma_x", sigma_x[band] as f64)?;
            ensure_non_negative("sigma_y", sigma_y[band] as f64)?;
        }
        let angle = ensure_finite("psf_angle", angle)?;
        self.set_psf(PointSpreadFunction::new(Box::new(GaussianPsf::new(
            sigma_x, sigma_y, angle,
        ))));
        Ok(())
    }

    /// Circular Gaussian PSF with per-band sigma in pixels.
    pub fn set_gaussian_psf(&mut self, sigma: S) -> Result<(), CameraError> {
        self.set_gaussian_psf_elliptical(sigma, sigma, 0.0)
    }

    /// Gaussian PSF with the same sigmas in every band.
    pub fn set_gaussian_psf_scalar(
        &mut self,
        sigma_x: f32,
        sigma_y: f32,
        angle: f64,
    ) -> Result<(), CameraError> {
        self.set_gaussian_psf_elliptical(S::splat(sigma_x), S::splat(sigma_y), angle)
    }

    pub fn psf(&self) -> Result<&PointSpreadFunction<S>, CameraError> {
        self.psf.as_ref().ok_or(CameraError::ComponentMissing("psf"))
    }

    pub fn psf_mut(&mut self) -> Result<&mut PointSpreadFunction<S>, CameraError> {
        self.psf.as_mut().ok_or(CameraError::ComponentMissing("psf"))
    }

    // --- noise model ------------------------------------------------------------------

    pub fn set_noise_model(&mut self, model: Box<dyn NoiseModel>) {
        self.noise_model = Some(model);
        self.custom_noise_model = true;
    }

    /// Remove the noise model and any default noise configuration.
    pub fn clear_noise_model(&mut self) {
        self.noise_model = None;
        self.noise_config = None;
        self.custom_noise_model = false;
    }

    pub fn noise_model(&self) -> Result<&dyn NoiseModel, CameraError> {
        self.noise_model
            .as_deref()
            .ok_or(CameraError::ComponentMissing("noise model"))
    }

    pub fn noise_model_mut(&mut self) -> Result<&mut (dyn NoiseModel + 'static), CameraError> {
        self.noise_model
            .as_deref_mut()
            .ok_or(CameraError::ComponentMissing("noise model"))
    }

    pub fn noise_config(&self) -> Option<&NoiseModelConfig> {
        self.noise_config.as_ref()
    }

    /// Configure the default [`SensorNoiseModel`]. Replaces a previously built
    /// default model but leaves a custom one in place.
    pub fn set_noise_config(&mut self, config: NoiseModelConfig) -> Result<(), CameraError> {
        config.validate()?;
        self.noise_config = Some(config);
        if !self.custom_noise_model {
            let model = SensorNoiseModel::with_seed(config, self.next_seed())?;
            self.noise_model = Some(Box::new(model));
        }
        Ok(())
    }

    fn update_noise_config(
        &mut self,
        update: impl FnOnce(&mut NoiseModelConfig),
    ) -> Result<(), CameraError> {
        let mut config = self.noise_config.unwrap_or_default();
        update(&mut config);
        self.set_noise_config(config)
    }

    /// Dark current in electrons per second.
    pub fn set_dark_current(&mut self, dark_current: f64) -> Result<(), CameraError> {
        self.update_noise_config(|c| c.dark_current = dark_current)
    }

    pub fn set_readout_noise(&mut self, mean: f64, std_dev: f64) -> Result<(), CameraError> {
        self.update_noise_config(|c| {
            c.readout_noise_mean = mean;
            c.readout_noise_std = std_dev;
        })
    }

    /// Sinusoidal fixed-pattern noise. Scales in electrons, periods in pixels.
    pub fn set_fixed_pattern_noise(
        &mut self,
        horizontal_scale: f64,
        vertical_scale: f64,
        horizontal_period: f64,
        vertical_period: f64,
    ) -> Result<(), CameraError> {
        self.update_noise_config(|c| {
            c.horizontal_scale = horizontal_scale;
            c.vertical_scale = vertical_scale;
            c.horizontal_period = horizontal_period;
            c.vertical_period = vertical_period;
        })
    }

    pub fn set_default_low_noise(&mut self) -> Result<(), CameraError> {
        self.set_noise_config(NoiseModelConfig::low_noise())
    }

    pub fn set_default_fixed_pattern_noise(&mut self) -> Result<(), CameraError> {
        self.set_noise_config(NoiseModelConfig::fixed_pattern())
    }

    // --- photosite ------------------------------------------------------------------

    pub fn set_photosite(&mut self, photosite: Photosite<S>) {
        self.photosite = Some(photosite);
    }

    pub fn photosite(&self) -> Result<&Photosite<S>, CameraError> {
        self.photosite
            .as_ref()
            .ok_or(CameraError::ComponentMissing("photosite"))
    }

    pub fn photosite_mut(&mut self) -> Result<&mut Photosite<S>, CameraError> {
        self.photosite
            .as_mut()
            .ok_or(CameraError::ComponentMissing("photosite"))
    }

    /// Configuration used when `initialize` builds the default photosite.
    pub fn photosite_config(&self) -> &PhotositeConfig {
        &self.photosite_config
    }

    /// Replace the default photosite configuration and rebuild the photosite
    /// from it.
    pub fn set_photosite_config(&mut self, config: PhotositeConfig) -> Result<(), CameraError> {
        let photosite = Photosite::from_config(&config)?;
        self.photosite_config = config;
        self.photosite = Some(photosite);
        Ok(())
    }

    /// Apply a validating change to the photosite, building the default one
    /// first if needed.
    fn configure_photosite(
        &mut self,
        change: impl FnOnce(&mut Photosite<S>) -> Result<(), CameraError>,
    ) -> Result<(), CameraError> {
        if self.photosite.is_none() {
            self.photosite = Some(Photosite::from_config(&self.photosite_config)?);
        }
        change(self.photosite_mut()?)
    }

    /// Conversion gain in ADU per electron.
    pub fn set_gain(&mut self, gain: f64) -> Result<(), CameraError> {
        self.configure_photosite(|p| p.set_gain(gain))
    }

    /// Conversion gain in dB relative to the unity-gain setting.
    pub fn set_gain_db(&mut self, gain_db: f64, unity_gain_db: f64) -> Result<(), CameraError> {
        self.configure_photosite(|p| p.set_gain_db(gain_db, unity_gain_db))
    }

    pub fn set_bit_depth(&mut self, bit_depth: u8) -> Result<(), CameraError> {
        self.configure_photosite(|p| p.set_bit_depth(bit_depth))
    }

    /// Full-well capacity in electrons.
    pub fn set_well_depth(&mut self, well_depth: f64) -> Result<(), CameraError> {
        self.configure_photosite(|p| p.set_well_depth(well_depth))
    }

    pub fn set_quantum_efficiency(&mut self, qe: S) -> Result<(), CameraError> {
        self.configure_photosite(|p| p.set_quantum_efficiency(qe))
    }

    pub fn set_quantum_efficiency_scalar(&mut self, qe: f32) -> Result<(), CameraError> {
        self.set_quantum_efficiency(S::splat(qe))
    }

    /// Quantum efficiency from a `(wavelength nm, efficiency)` table.
    pub fn set_quantum_efficiency_table(
        &mut self,
        wavelengths_nm: &[f64],
        efficiencies: &[f64],
    ) -> Result<(), CameraError> {
        self.configure_photosite(|p| p.set_quantum_efficiency_table(wavelengths_nm, efficiencies))
    }

    pub fn set_quantum_efficiency_rgb(&mut self, qe: ColorRgb) -> Result<(), CameraError> {
        self.configure_photosite(|p| p.set_quantum_efficiency_rgb(qe))
    }

    pub fn set_linear_scale_factor(&mut self, factor: f64) -> Result<(), CameraError> {
        self.configure_photosite(|p| p.set_linear_scale_factor(factor))
    }
}
