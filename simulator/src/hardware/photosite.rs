//! Per-pixel sensor response: photons in, normalized digital value out.
//!
//! The conversion chain for one pixel is
//!
//! ```text
//! electrons = Σ photons_b · QE_b + noise          clamped to [0, well_depth]
//! adu       = round(electrons · gain)             clamped to [0, 2^bit_depth - 1]
//! value     = adu / (2^bit_depth - 1) · linear_scale_factor,  clamped to [0, 1]
//! ```
//!
//! `gain` is in ADU per electron. Sensors usually quote it in decibels relative
//! to a "unity gain" setting where one electron produces one ADU;
//! [`Photosite::set_gain_db`] converts from that form.

use serde::{Deserialize, Serialize};

use shared::algo::interval_mean;

use super::error::{ensure_non_negative, ensure_positive, CameraError};
use crate::photometry::{ColorRgb, Spectral};

/// Largest supported ADC bit depth
pub const MAX_BIT_DEPTH: u8 = 32;

/// Serializable photosite parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotositeConfig {
    /// ADC resolution in bits
    pub bit_depth: u8,
    /// Full-well capacity in electrons
    pub well_depth: f64,
    /// Conversion gain in ADU per electron
    pub gain: f64,
    /// Per-band quantum efficiency; empty means 1.0 in every band
    pub quantum_efficiency: Vec<f32>,
    /// Quantum efficiency of the red, green and blue channels
    pub quantum_efficiency_rgb: [f32; 3],
    /// Multiplier applied to the normalized output
    pub linear_scale_factor: f64,
}

impl Default for PhotositeConfig {
    fn default() -> Self {
        // 8-bit ADC with full well mapped to full scale
        Self {
            bit_depth: 8,
            well_depth: 15000.0,
            gain: 255.0 / 15000.0,
            quantum_efficiency: Vec::new(),
            quantum_efficiency_rgb: [1.0; 3],
            linear_scale_factor: 1.0,
        }
    }
}

/// Converts gain in dB to ADU per electron, `unity_gain_db` being the
/// setting at which one electron yields one ADU.
pub fn gain_from_db(gain_db: f64, unity_gain_db: f64) -> f64 {
    10f64.powf((gain_db - unity_gain_db) / 20.0)
}

/// Sensor element model for spectral type `S`.
#[derive(Debug, Clone, PartialEq)]
pub struct Photosite<S: Spectral> {
    bit_depth: u8,
    well_depth: f64,
    gain: f64,
    quantum_efficiency: S,
    quantum_efficiency_rgb: ColorRgb,
    linear_scale_factor: f64,
}

impl<S: Spectral> Default for Photosite<S> {
    fn default() -> Self {
        let config = PhotositeConfig::default();
        Self {
            bit_depth: config.bit_depth,
            well_depth: config.well_depth,
            gain: config.gain,
            quantum_efficiency: S::splat(1.0),
            quantum_efficiency_rgb: ColorRgb::from_array(config.quantum_efficiency_rgb),
            linear_scale_factor: config.linear_scale_factor,
        }
    }
}

impl<S: Spectral> Photosite<S> {
    /// Build a photosite, validating every parameter.
    pub fn from_config(config: &PhotositeConfig) -> Result<Self, CameraError> {
        let mut photosite = Self::default();
        photosite.set_bit_depth(config.bit_depth)?;
        photosite.set_well_depth(config.well_depth)?;
        photosite.set_gain(config.gain)?;
        if !config.quantum_efficiency.is_empty() {
            let qe = S::from_slice(&config.quantum_efficiency).ok_or(
                CameraError::BandCountMismatch {
                    parameter: "quantum_efficiency",
                    expected: S::BANDS,
                    actual: config.quantum_efficiency.len(),
                },
            )?;
            photosite.set_quantum_efficiency(qe)?;
        }
        photosite.set_quantum_efficiency_rgb(ColorRgb::from_array(config.quantum_efficiency_rgb))?;
        photosite.set_linear_scale_factor(config.linear_scale_factor)?;
        Ok(photosite)
    }

    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    pub fn set_bit_depth(&mut self, bit_depth: u8) -> Result<(), CameraError> {
        if bit_depth == 0 || bit_depth > MAX_BIT_DEPTH {
            return Err(CameraError::OutOfRange {
                parameter: "bit_depth",
                message: format!("{bit_depth} not in 1..={MAX_BIT_DEPTH}"),
            });
        }
        self.bit_depth = bit_depth;
        Ok(())
    }

    /// Largest digital value the ADC can produce.
    pub fn max_adu(&self) -> f64 {
        2f64.powi(self.bit_depth as i32) - 1.0
    }

    pub fn well_depth(&self) -> f64 {
        self.well_depth
    }

    pub fn set_well_depth(&mut self, well_depth: f64) -> Result<(), CameraError> {
        self.well_depth = ensure_positive("well_depth", well_depth)?;
        Ok(())
    }

    /// Conversion gain in ADU per electron.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f64) -> Result<(), CameraError> {
        self.gain = ensure_positive("gain", gain)?;
        Ok(())
    }

    pub fn set_gain_db(&mut self, gain_db: f64, unity_gain_db: f64) -> Result<(), CameraError> {
        let gain = gain_from_db(gain_db, unity_gain_db);
        self.set_gain(gain)
    }

    /// Current gain expressed in dB relative to `unity_gain_db`.
    pub fn gain_db(&self, unity_gain_db: f64) -> f64 {
        unity_gain_db + 20.0 * self.gain.log10()
    }

    pub fn quantum_efficiency(&self) -> &S {
        &self.quantum_efficiency
    }

    pub fn set_quantum_efficiency(&mut self, qe: S) -> Result<(), CameraError> {
        for i in 0..S::BANDS {
            ensure_non_negative("quantum_efficiency", qe[i] as f64)?;
        }
        self.quantum_efficiency = qe;
        Ok(())
    }

    /// Set the spectral QE from a `(wavelength nm, efficiency)` table by
    /// averaging the piecewise-linear curve over each band. Outside the
    /// table the edge values are held.
    pub fn set_quantum_efficiency_table(
        &mut self,
        wavelengths_nm: &[f64],
        efficiency: &[f64],
    ) -> Result<(), CameraError> {
        let mut qe = S::default();
        for i in 0..S::BANDS {
            let band = S::band(i);
            qe[i] = interval_mean(band.min_nm, band.max_nm, wavelengths_nm, efficiency)? as f32;
        }
        self.set_quantum_efficiency(qe)
    }

    pub fn quantum_efficiency_rgb(&self) -> ColorRgb {
        self.quantum_efficiency_rgb
    }

    pub fn set_quantum_efficiency_rgb(&mut self, qe: ColorRgb) -> Result<(), CameraError> {
        for v in qe.to_array() {
            ensure_non_negative("quantum_efficiency_rgb", v as f64)?;
        }
        self.quantum_efficiency_rgb = qe;
        Ok(())
    }

    pub fn linear_scale_factor(&self) -> f64 {
        self.linear_scale_factor
    }

    pub fn set_linear_scale_factor(&mut self, factor: f64) -> Result<(), CameraError> {
        self.linear_scale_factor = ensure_non_negative("linear_scale_factor", factor)?;
        Ok(())
    }

    /// Collected electrons for the given photon counts and noise electrons,
    /// limited to the full well.
    pub fn electrons(&self, photons: &S, noise: f32) -> f64 {
        let signal: f64 = (0..S::BANDS)
            .map(|i| photons[i] as f64 * self.quantum_efficiency[i] as f64)
            .sum();
        (signal + noise as f64).clamp(0.0, self.well_depth)
    }

    fn digitize(&self, electrons: f64) -> f32 {
        let max_adu = self.max_adu();
        let adu = (electrons * self.gain).round().clamp(0.0, max_adu);
        ((adu / max_adu) * self.linear_scale_factor).clamp(0.0, 1.0) as f32
    }

    /// Normalized [0, 1] output for a spectral pixel.
    pub fn expose_pixel(&self, photons: &S, noise: f32) -> f32 {
        self.digitize(self.electrons(photons, noise))
    }

    /// Normalized [0, 1] output per channel for an RGB pixel with one noise
    /// sample per channel.
    pub fn expose_pixel_rgb(&self, photons: &ColorRgb, noise: [f32; 3]) -> ColorRgb {
        let qe = self.quantum_efficiency_rgb.to_array();
        let p = photons.to_array();
        let out: [f32; 3] = std::array::from_fn(|c| {
            let electrons = (p[c] as f64 * qe[c] as f64 + noise[c] as f64).clamp(0.0, self.well_depth);
            self.digitize(electrons)
        });
        ColorRgb::from_array(out)
    }
}
