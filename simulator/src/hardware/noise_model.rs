//! Per-pixel sensor noise in electrons.
//!
//! A [`NoiseModel`] returns one noise contribution for a pixel and exposure.
//! [`SensorNoiseModel`] combines three sources:
//!
//! - **Dark current**: Poisson with mean `dark_current * exposure`
//! - **Readout noise**: Gaussian with configurable mean and standard deviation
//! - **Fixed-pattern noise**: two sinusoids, one along each image axis
//!
//! ```text
//! fpn(i, j) = h_scale sin(2π i / h_period + φh) + v_scale sin(2π j / v_period + φv)
//! ```
//!
//! The phases `φh`, `φv` are drawn once when the model is built, so the
//! pattern is stable from frame to frame.

use std::f64::consts::PI;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use shared::algo::entropy_seed;
use shared::image_proc::{sample_normal, sample_poisson};

use super::error::{ensure_non_negative, CameraError};

/// Source of per-pixel noise electrons.
pub trait NoiseModel: fmt::Debug + Send + Sync {
    /// Noise electrons for pixel `(i, j)` (column, row) over `exposure_time`
    /// seconds, drawn from `rng`.
    fn simulate(&self, rng: &mut dyn RngCore, i: usize, j: usize, exposure_time: f64) -> f32;
}

/// Serializable parameters of [`SensorNoiseModel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseModelConfig {
    /// Dark current in electrons per second
    pub dark_current: f64,
    /// Mean readout offset in electrons
    pub readout_noise_mean: f64,
    /// Readout noise standard deviation in electrons
    pub readout_noise_std: f64,
    /// Amplitude of the pattern varying along x, electrons
    pub horizontal_scale: f64,
    /// Amplitude of the pattern varying along y, electrons
    pub vertical_scale: f64,
    /// Period of the x pattern in pixels; zero disables it
    pub horizontal_period: f64,
    /// Period of the y pattern in pixels; zero disables it
    pub vertical_period: f64,
}

impl NoiseModelConfig {
    /// Cooled scientific sensor: little dark current, ~1 e- read noise.
    pub fn low_noise() -> Self {
        Self {
            dark_current: 0.1,
            readout_noise_mean: 0.0,
            readout_noise_std: 1.0,
            ..Default::default()
        }
    }

    /// Consumer sensor with visible banding.
    pub fn fixed_pattern() -> Self {
        Self {
            dark_current: 5.0,
            readout_noise_mean: 0.0,
            readout_noise_std: 3.0,
            horizontal_scale: 2.0,
            vertical_scale: 1.0,
            horizontal_period: 64.0,
            vertical_period: 128.0,
        }
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        ensure_non_negative("dark_current", self.dark_current)?;
        super::error::ensure_finite("readout_noise_mean", self.readout_noise_mean)?;
        ensure_non_negative("readout_noise_std", self.readout_noise_std)?;
        ensure_non_negative("horizontal_scale", self.horizontal_scale)?;
        ensure_non_negative("vertical_scale", self.vertical_scale)?;
        ensure_non_negative("horizontal_period", self.horizontal_period)?;
        ensure_non_negative("vertical_period", self.vertical_period)?;
        Ok(())
    }
}

/// Dark current, readout and fixed-pattern noise.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorNoiseModel {
    config: NoiseModelConfig,
    horizontal_phase: f64,
    vertical_phase: f64,
}

impl SensorNoiseModel {
    /// Build with pattern phases from an entropy seed.
    pub fn new(config: NoiseModelConfig) -> Result<Self, CameraError> {
        Self::with_seed(config, entropy_seed())
    }

    /// Build with pattern phases drawn from `seed`.
    pub fn with_seed(config: NoiseModelConfig, seed: u64) -> Result<Self, CameraError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(Self {
            config,
            horizontal_phase: rng.gen_range(0.0..2.0 * PI),
            vertical_phase: rng.gen_range(0.0..2.0 * PI),
        })
    }

    pub fn config(&self) -> &NoiseModelConfig {
        &self.config
    }

    /// Deterministic fixed-pattern component for pixel `(i, j)`.
    pub fn fixed_pattern(&self, i: usize, j: usize) -> f64 {
        let c = &self.config;
        let mut value = 0.0;
        if c.horizontal_period > 0.0 && c.horizontal_scale > 0.0 {
            value += c.horizontal_scale
                * (2.0 * PI * i as f64 / c.horizontal_period + self.horizontal_phase).sin();
        }
        if c.vertical_period > 0.0 && c.vertical_scale > 0.0 {
            value += c.vertical_scale
                * (2.0 * PI * j as f64 / c.vertical_period + self.vertical_phase).sin();
        }
        value
    }
}

impl NoiseModel for SensorNoiseModel {
    fn simulate(&self, rng: &mut dyn RngCore, i: usize, j: usize, exposure_time: f64) -> f32 {
        let c = &self.config;
        let dark = sample_poisson(c.dark_current * exposure_time, rng);
        let readout = sample_normal(c.readout_noise_mean, c.readout_noise_std, rng);
        (dark + readout + self.fixed_pattern(i, j)) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var)
    }

    #[test]
    fn test_dark_and_readout_moments() {
        let config = NoiseModelConfig {
            dark_current: 20.0,
            readout_noise_mean: 1.0,
            readout_noise_std: 2.0,
            ..Default::default()
        };
        let model = SensorNoiseModel::with_seed(config, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let samples: Vec<f64> = (0..40_000)
            .map(|_| model.simulate(&mut rng, 0, 0, 0.5) as f64)
            .collect();
        let (mean, var) = stats(&samples);
        // Poisson(10) + N(1, 4)
        assert!((mean - 11.0).abs() < 0.1, "mean {mean}");
        assert!((var - 14.0).abs() < 0.5, "var {var}");
    }

    #[test]
    fn test_fixed_pattern_periodic_and_stable() {
        let config = NoiseModelConfig {
            horizontal_scale: 3.0,
            horizontal_period: 8.0,
            vertical_scale: 1.0,
            vertical_period: 5.0,
            ..Default::default()
        };
        let model = SensorNoiseModel::with_seed(config, 99).unwrap();
        assert_relative_eq!(model.fixed_pattern(1, 2), model.fixed_pattern(9, 7), epsilon = 1e-12);
        assert!(model.fixed_pattern(3, 0).abs() <= 4.0);

        // Without random terms the sample is the pattern itself.
        let mut rng = StdRng::seed_from_u64(0);
        assert_relative_eq!(
            model.simulate(&mut rng, 4, 3, 1.0) as f64,
            model.fixed_pattern(4, 3),
            epsilon = 1e-5
        );

        let same = SensorNoiseModel::with_seed(config, 99).unwrap();
        assert_eq!(same, model);
    }

    #[test]
    fn test_presets_valid() {
        assert!(SensorNoiseModel::new(NoiseModelConfig::low_noise()).is_ok());
        assert!(SensorNoiseModel::new(NoiseModelConfig::fixed_pattern()).is_ok());
        let bad = NoiseModelConfig {
            readout_noise_std: -1.0,
            ..Default::default()
        };
        assert!(SensorNoiseModel::new(bad).is_err());
    }
}
