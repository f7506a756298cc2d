//! Elliptical Gaussian PSF.
//!
//! Per band, a 2D normal density with standard deviations `sigma_x`,
//! `sigma_y` (pixels) along axes rotated by `angle` radians:
//!
//! ```text
//! (u, v) = R(-angle) (dx, dy)
//! g = exp(-(u²/2σx² + v²/2σy²)) / (2π σx σy)
//! ```
//!
//! Integrating to one over the plane, `g` is directly the fraction of power
//! per (unit-area) pixel.

use std::f64::consts::PI;

use nalgebra::Vector2;

use super::PsfModel;
use crate::photometry::Spectral;

/// Ratio of the Gaussian sigma to `λ f / D`, taken from the Airy core radius
/// approximation `r ≈ 0.84 λ f / D`.
pub const AIRY_SIGMA_FACTOR: f64 = 0.84;

#[derive(Debug, Clone)]
pub struct GaussianPsf<S: Spectral> {
    sigma_x: S,
    sigma_y: S,
    angle: f64,
}

impl<S: Spectral> GaussianPsf<S> {
    /// Elliptical PSF with per-band sigmas in pixels.
    pub fn new(sigma_x: S, sigma_y: S, angle: f64) -> Self {
        Self {
            sigma_x,
            sigma_y,
            angle,
        }
    }

    /// Circular PSF with the same sigma in every band.
    pub fn isotropic(sigma: f32) -> Self {
        Self::new(S::splat(sigma), S::splat(sigma), 0.0)
    }

    /// Gaussian approximation of the Airy pattern.
    ///
    /// Per band, `σ = 0.84 λ f / D` converted to pixels per axis.
    pub fn from_airy(
        focal_length: f64,
        aperture_diameter: f64,
        pixel_size: (f64, f64),
    ) -> Self {
        let sigma_m =
            |i: usize| AIRY_SIGMA_FACTOR * S::band(i).wavelength() * focal_length / aperture_diameter;
        Self::new(
            S::from_fn(|i| (sigma_m(i) / pixel_size.0) as f32),
            S::from_fn(|i| (sigma_m(i) / pixel_size.1) as f32),
            0.0,
        )
    }

    pub fn sigma_x(&self) -> &S {
        &self.sigma_x
    }

    pub fn sigma_y(&self) -> &S {
        &self.sigma_y
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }
}

impl<S: Spectral> PsfModel<S> for GaussianPsf<S> {
    fn evaluate(&self, offset: &Vector2<f64>) -> S {
        let (sin, cos) = self.angle.sin_cos();
        let u = cos * offset.x + sin * offset.y;
        let v = -sin * offset.x + cos * offset.y;

        S::from_fn(|i| {
            let sx = self.sigma_x[i] as f64;
            let sy = self.sigma_y[i] as f64;
            if sx <= 0.0 || sy <= 0.0 {
                // Degenerate: all power in the source pixel.
                return if offset.x.abs() < 0.5 && offset.y.abs() < 0.5 { 1.0 } else { 0.0 };
            }
            let exponent = -(u * u / (2.0 * sx * sx) + v * v / (2.0 * sy * sy));
            (exponent.exp() / (2.0 * PI * sx * sy)) as f32
        })
    }

    fn name(&self) -> &'static str {
        "gaussian"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometry::SpectralData;
    use approx::assert_relative_eq;

    type One = SpectralData<1, 500, 600>;

    #[test]
    fn test_peak_and_integral() {
        let psf = GaussianPsf::<One>::isotropic(1.5);
        let peak = psf.evaluate(&Vector2::zeros())[0] as f64;
        assert_relative_eq!(peak, 1.0 / (2.0 * PI * 2.25), epsilon = 1e-7);

        let mut total = 0.0;
        for j in -20..=20 {
            for i in -20..=20 {
                total += psf.evaluate(&Vector2::new(i as f64, j as f64))[0] as f64;
            }
        }
        assert_relative_eq!(total, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rotation_swaps_axes() {
        let psf = GaussianPsf::<One>::new(One::splat(3.0), One::splat(1.0), PI / 2.0);
        // After a quarter turn the wide axis lies along y.
        let along_y = psf.evaluate(&Vector2::new(0.0, 3.0))[0];
        let along_x = psf.evaluate(&Vector2::new(3.0, 0.0))[0];
        assert!(along_y > along_x);
        let unrotated = GaussianPsf::<One>::new(One::splat(3.0), One::splat(1.0), 0.0);
        assert_relative_eq!(along_y, unrotated.evaluate(&Vector2::new(3.0, 0.0))[0], epsilon = 1e-7);
    }

    #[test]
    fn test_from_airy_sigma() {
        let psf = GaussianPsf::<One>::from_airy(0.05, 0.0125, (5e-6, 2.5e-6));
        // 0.84 * 550nm * 4 = 1.848 um
        assert_relative_eq!(psf.sigma_x()[0], 1.848e-6 / 5e-6, epsilon = 1e-6);
        assert_relative_eq!(psf.sigma_y()[0], 1.848e-6 / 2.5e-6, epsilon = 1e-6);
    }
}
