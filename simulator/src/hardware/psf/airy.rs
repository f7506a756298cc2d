//! Diffraction-limited PSF of a circular aperture.
//!
//! The Airy pattern for wavelength `λ`, aperture diameter `D` and focal
//! length `f` is
//!
//! ```text
//! x    = π D r / (λ f)
//! I(r) = I₀ [2 J₁(x) / x]²,     I₀ = π D² / (4 λ² f²)
//! ```
//!
//! with `r` the radial distance on the sensor in metres and `I₀` the peak
//! fraction of total power per unit sensor area. Multiplying by the pixel
//! area gives the fraction of power a pixel at that offset receives.

use std::f64::consts::PI;
use std::marker::PhantomData;

use nalgebra::Vector2;
use scilib::math::bessel;
use serde::{Deserialize, Serialize};

use super::{PsfModel, DEFAULT_SUPERSAMPLING};
use crate::photometry::Spectral;

/// Optical parameters of an Airy-disk PSF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiryDiskPsfConfig {
    /// Focal length in metres
    pub focal_length: f64,
    /// Aperture diameter in metres
    pub aperture_diameter: f64,
    /// Pixel pitch (x, y) in metres
    pub pixel_size: (f64, f64),
    /// Sub-samples per pixel axis when building kernels
    pub supersampling: usize,
}

impl Default for AiryDiskPsfConfig {
    fn default() -> Self {
        Self {
            focal_length: 0.05,
            aperture_diameter: 0.05 / 2.8,
            pixel_size: (36e-3 / 1920.0, 20.25e-3 / 1080.0),
            supersampling: DEFAULT_SUPERSAMPLING,
        }
    }
}

/// Above this argument the series in `scilib` loses precision and `J₁` is
/// taken from its Hankel asymptotic expansion instead.
const BESSEL_ASYMPTOTIC_THRESHOLD: f64 = 20.0;

/// Bessel function of the first kind, order one.
pub fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();
    if ax < BESSEL_ASYMPTOTIC_THRESHOLD {
        return bessel::j_n(1, x);
    }
    let inv = 1.0 / ax;
    let inv2 = inv * inv;
    let p = 1.0 + 15.0 / 128.0 * inv2 - 14175.0 / 98304.0 * inv2 * inv2;
    let q = inv * (3.0 / 8.0 - 315.0 / 3072.0 * inv2 + 1091475.0 / 3932160.0 * inv2 * inv2);
    let chi = ax - 0.75 * PI;
    let j1 = (2.0 / (PI * ax)).sqrt() * (p * chi.cos() - q * chi.sin());
    j1.copysign(x)
}

/// Normalized Airy profile `[2 J₁(x) / x]²`, equal to one at the center.
pub fn airy_intensity(x: f64) -> f64 {
    if x.abs() < 1e-10 {
        return 1.0;
    }
    let j1 = bessel_j1(x);
    let term = 2.0 * j1 / x;
    term * term
}

#[derive(Debug, Clone)]
pub struct AiryDiskPsf<S: Spectral> {
    config: AiryDiskPsfConfig,
    /// Per-band wavelength in metres
    wavelengths: Vec<f64>,
    _bands: PhantomData<S>,
}

impl<S: Spectral> AiryDiskPsf<S> {
    pub fn new(config: AiryDiskPsfConfig) -> Self {
        Self {
            config,
            wavelengths: (0..S::BANDS).map(|i| S::band(i).wavelength()).collect(),
            _bands: PhantomData,
        }
    }

    pub fn config(&self) -> &AiryDiskPsfConfig {
        &self.config
    }

    /// Radius of the first dark ring in metres for band `index`.
    pub fn first_zero_radius(&self, index: usize) -> f64 {
        1.2196698912665045 * self.wavelengths[index] * self.config.focal_length
            / self.config.aperture_diameter
    }
}

impl<S: Spectral> PsfModel<S> for AiryDiskPsf<S> {
    fn evaluate(&self, offset: &Vector2<f64>) -> S {
        let AiryDiskPsfConfig {
            focal_length: f,
            aperture_diameter: d,
            pixel_size: (px, py),
            ..
        } = self.config;
        let r = ((offset.x * px).powi(2) + (offset.y * py).powi(2)).sqrt();
        let pixel_area = px * py;

        S::from_fn(|i| {
            let lambda = self.wavelengths[i];
            let x = PI * d * r / (lambda * f);
            let peak = PI * d * d / (4.0 * lambda * lambda * f * f);
            (airy_intensity(x) * peak * pixel_area) as f32
        })
    }

    fn name(&self) -> &'static str {
        "airy"
    }
}
