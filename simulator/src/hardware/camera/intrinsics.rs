//! Intrinsic matrix and its analytic inverse.
//!
//! The forward map takes normalized image-plane coordinates `(x, y)` to pixel
//! coordinates:
//!
//! ```text
//! | u |   | fx   kyx  px | | x |
//! | v | = | kxy  fy   py | | y |
//! | 1 |   | 0    0    1  | | 1 |
//! ```
//!
//! with `fx = f · kx`, `fy = f · ky` and `kx`, `ky` in pixels per metre. The
//! inverse is written out from `det = fx·fy − kxy·kyx` instead of going through
//! a general matrix inversion.

use nalgebra::{Matrix3, Vector2, Vector3};

use crate::hardware::distortion::Distortion;
use crate::hardware::error::CameraError;
use crate::geometry::CameraFloat;

/// Relative determinant below which the intrinsics are rejected.
pub const DETERMINANT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics<F: CameraFloat> {
    /// Focal length along x, in pixels
    pub fx: F,
    /// Focal length along y, in pixels
    pub fy: F,
    /// Coupling of x into v
    pub kxy: F,
    /// Coupling of y into u
    pub kyx: F,
    /// Principal point, pixels
    pub px: F,
    pub py: F,
}

impl Intrinsics<f64> {
    /// Build from physical parameters.
    ///
    /// # Arguments
    /// * `focal_length` - Focal length in metres
    /// * `pixels_per_metre` - `(kx, ky)`, resolution over sensor size
    /// * `principal_point` - Principal point in pixels
    /// * `skew` - `(kxy, kyx)` in pixels
    ///
    /// # Returns
    /// `Err(DegenerateIntrinsics)` if `|det| <= ε · |fx · fy|`.
    pub fn from_physical(
        focal_length: f64,
        pixels_per_metre: Vector2<f64>,
        principal_point: Vector2<f64>,
        skew: Vector2<f64>,
    ) -> Result<Self, CameraError> {
        let intrinsics = Self {
            fx: focal_length * pixels_per_metre.x,
            fy: focal_length * pixels_per_metre.y,
            kxy: skew.x,
            kyx: skew.y,
            px: principal_point.x,
            py: principal_point.y,
        };
        let determinant = intrinsics.determinant();
        let scale = (intrinsics.fx * intrinsics.fy).abs();
        if !determinant.is_finite() || determinant.abs() <= DETERMINANT_EPSILON * scale {
            return Err(CameraError::DegenerateIntrinsics { determinant });
        }
        Ok(intrinsics)
    }
}

impl<F: CameraFloat> Intrinsics<F> {
    pub fn determinant(&self) -> F {
        self.fx * self.fy - self.kxy * self.kyx
    }

    pub fn matrix(&self) -> Matrix3<F> {
        let (zero, one) = (F::zero(), F::one());
        Matrix3::new(
            self.fx, self.kyx, self.px, //
            self.kxy, self.fy, self.py, //
            zero, zero, one,
        )
    }

    pub fn inverse_matrix(&self) -> Matrix3<F> {
        let inv_det = F::one() / self.determinant();
        let (zero, one) = (F::zero(), F::one());
        let a = self.fy * inv_det;
        let b = -self.kyx * inv_det;
        let c = -self.kxy * inv_det;
        let d = self.fx * inv_det;
        Matrix3::new(
            a, b, -(a * self.px + b * self.py), //
            c, d, -(c * self.px + d * self.py), //
            zero, zero, one,
        )
    }

    /// Normalized coordinates to pixels.
    pub fn project(&self, normalized: &Vector2<F>) -> Vector2<F> {
        Vector2::new(
            self.fx * normalized.x + self.kyx * normalized.y + self.px,
            self.kxy * normalized.x + self.fy * normalized.y + self.py,
        )
    }

    /// Pixels to normalized coordinates.
    pub fn unproject(&self, pixel: &Vector2<F>) -> Vector2<F> {
        let inv_det = F::one() / self.determinant();
        let du = pixel.x - self.px;
        let dv = pixel.y - self.py;
        Vector2::new(
            (self.fy * du - self.kyx * dv) * inv_det,
            (self.fx * dv - self.kxy * du) * inv_det,
        )
    }

    /// Same intrinsics in another precision.
    pub fn cast<G: CameraFloat>(&self) -> Intrinsics<G> {
        let c = |v: F| G::from_f64_lossy(v.as_f64());
        Intrinsics {
            fx: c(self.fx),
            fy: c(self.fy),
            kxy: c(self.kxy),
            kyx: c(self.kyx),
            px: c(self.px),
            py: c(self.py),
        }
    }
}

/// Axis convention shared by the forward and inverse pixel maps.
///
/// The standard frame looks along `+z` with `+y` down. The Blender frame looks
/// along `-z` and mirrors pixel columns about the image width, `u' = width - u`,
/// which keeps pixel `i` mapped to pixel `width - 1 - i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameConvention<F: CameraFloat> {
    /// +1 in the standard frame, -1 in the Blender frame
    pub z_dir: F,
    /// Image width in pixels
    pub width: F,
}

impl<F: CameraFloat> FrameConvention<F> {
    pub fn standard(width: F) -> Self {
        Self {
            z_dir: F::one(),
            width,
        }
    }

    pub fn blender(width: F) -> Self {
        Self {
            z_dir: -F::one(),
            width,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.z_dir < F::zero()
    }

    /// Mirror a pixel coordinate's column in the Blender frame. Self-inverse.
    pub fn mirror(&self, pixel: &Vector2<F>) -> Vector2<F> {
        if self.is_mirrored() {
            Vector2::new(self.width - pixel.x, pixel.y)
        } else {
            *pixel
        }
    }

    pub fn cast<G: CameraFloat>(&self) -> FrameConvention<G> {
        FrameConvention {
            z_dir: G::from_f64_lossy(self.z_dir.as_f64()),
            width: G::from_f64_lossy(self.width.as_f64()),
        }
    }
}

/// Camera-space direction through a pixel coordinate, not normalized.
///
/// Undoes the column mirror, applies the inverse intrinsics, then `undistort`
/// if a model is given. The result `z_dir · (x, y, 1)` projects back to the
/// same pixel through [`pixel_of_point`].
pub fn direction_through_pixel<F: CameraFloat>(
    intrinsics: &Intrinsics<F>,
    distortion: Option<&dyn Distortion>,
    convention: &FrameConvention<F>,
    pixel: &Vector2<F>,
) -> Vector3<F> {
    let mut normalized = intrinsics.unproject(&convention.mirror(pixel));
    if let Some(model) = distortion {
        let ideal = model.undistort(&Vector2::new(normalized.x.as_f64(), normalized.y.as_f64()));
        normalized = Vector2::new(F::from_f64_lossy(ideal.x), F::from_f64_lossy(ideal.y));
    }
    let z_dir = convention.z_dir;
    Vector3::new(normalized.x * z_dir, normalized.y * z_dir, z_dir)
}

/// Pixel coordinate of a camera-space point, the inverse of
/// [`direction_through_pixel`].
///
/// Perspective divide, forward distortion and the intrinsic matrix, then the
/// column mirror in the Blender frame. Returns `None` for points in the camera
/// plane.
pub fn pixel_of_point<F: CameraFloat>(
    intrinsics: &Intrinsics<F>,
    distortion: Option<&dyn Distortion>,
    convention: &FrameConvention<F>,
    point: &Vector3<F>,
) -> Option<Vector2<F>> {
    if point.z == F::zero() {
        return None;
    }
    let mut normalized = Vector2::new(point.x / point.z, point.y / point.z);
    if let Some(model) = distortion {
        let real = model.distort(&Vector2::new(normalized.x.as_f64(), normalized.y.as_f64()));
        normalized = Vector2::new(F::from_f64_lossy(real.x), F::from_f64_lossy(real.y));
    }
    Some(convention.mirror(&intrinsics.project(&normalized)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn skewed() -> Intrinsics<f64> {
        Intrinsics::from_physical(
            0.05,
            Vector2::new(1e5, 1.2e5),
            Vector2::new(320.0, 240.0),
            Vector2::new(3.0, -7.0),
        )
        .unwrap()
    }

    #[test]
    fn test_inverse_is_exact() {
        let k = skewed();
        let product = k.matrix() * k.inverse_matrix();
        assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_project_unproject() {
        let k = skewed();
        let n = Vector2::new(0.031, -0.012);
        let p = k.project(&n);
        assert_relative_eq!(k.unproject(&p), n, epsilon = 1e-14);

        let h = k.inverse_matrix() * Vector3::new(p.x, p.y, 1.0);
        assert_relative_eq!(h.x, n.x, epsilon = 1e-14);
        assert_relative_eq!(h.y, n.y, epsilon = 1e-14);
    }

    #[test]
    fn test_degenerate_rejected() {
        // fx·fy == kxy·kyx
        let result = Intrinsics::from_physical(
            1.0,
            Vector2::new(2.0, 8.0),
            Vector2::zeros(),
            Vector2::new(4.0, 4.0),
        );
        assert!(matches!(result, Err(CameraError::DegenerateIntrinsics { .. })));
    }

    #[test]
    fn test_single_precision_copy() {
        let k = skewed();
        let k32: Intrinsics<f32> = k.cast();
        let p = Vector2::new(100.0f32, 50.0);
        let n = k32.unproject(&p);
        let expected = k.unproject(&Vector2::new(100.0, 50.0));
        assert_relative_eq!(n.x as f64, expected.x, epsilon = 1e-6);
        assert_relative_eq!(n.y as f64, expected.y, epsilon = 1e-6);
    }

    #[test]
    fn test_direction_round_trip_both_conventions() {
        let k = skewed();
        for convention in [FrameConvention::standard(640.0), FrameConvention::blender(640.0)] {
            let pixel = Vector2::new(12.5, 470.25);
            let d = direction_through_pixel(&k, None, &convention, &pixel);
            assert_eq!(d.z, convention.z_dir);
            let back = pixel_of_point(&k, None, &convention, &(d * 3.0)).unwrap();
            assert_relative_eq!(back, pixel, epsilon = 1e-9);
        }
        let standard = FrameConvention::standard(640.0);
        assert!(pixel_of_point(&k, None, &standard, &Vector3::new(1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_blender_mirror_about_image_width() {
        // Principal point well off center
        let k = skewed();
        let point = Vector3::new(-0.2, 0.1, 2.0);
        let standard = pixel_of_point(&k, None, &FrameConvention::standard(640.0), &point).unwrap();
        let blender = pixel_of_point(&k, None, &FrameConvention::blender(640.0), &point).unwrap();
        assert_relative_eq!(blender.x, 640.0 - standard.x, epsilon = 1e-9);
        assert_relative_eq!(blender.y, standard.y, epsilon = 1e-9);
    }
}
