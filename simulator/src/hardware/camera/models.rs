//! Preset camera configurations.

use once_cell::sync::Lazy;

use shared::image_size::Resolution;

use super::config::{CameraConfig, PsfConfig};
use crate::hardware::distortion::{BrownCoefficients, DistortionCoefficients};
use crate::hardware::noise_model::NoiseModelConfig;
use crate::hardware::photosite::PhotositeConfig;

/// Narrow-field navigation camera: 1024² at 5.5 µm, 50 mm f/4, 12-bit,
/// cooled sensor.
pub static NAVCAM: Lazy<CameraConfig> = Lazy::new(|| CameraConfig {
    resolution: Resolution::new(1024, 1024),
    sensor_size: (1024.0 * 5.5e-6, 1024.0 * 5.5e-6),
    focal_length: 0.05,
    f_stop: 4.0,
    exposure_time: 0.01,
    optical_efficiency: 0.9,
    psf: PsfConfig::Airy,
    noise: Some(NoiseModelConfig::low_noise()),
    photosite: PhotositeConfig {
        bit_depth: 12,
        well_depth: 20_000.0,
        gain: 4095.0 / 20_000.0,
        ..Default::default()
    },
    ..Default::default()
});

/// 35 mm full-frame body with a 50 mm f/2.8 lens.
pub static FULL_FRAME: Lazy<CameraConfig> = Lazy::new(|| CameraConfig {
    resolution: Resolution::new(6000, 4000),
    sensor_size: (36e-3, 24e-3),
    focal_length: 0.05,
    f_stop: 2.8,
    exposure_time: 1.0 / 125.0,
    bayer_filter: true,
    psf: PsfConfig::Gaussian,
    noise: Some(NoiseModelConfig {
        dark_current: 0.5,
        readout_noise_std: 2.5,
        ..Default::default()
    }),
    photosite: PhotositeConfig {
        bit_depth: 14,
        well_depth: 50_000.0,
        gain: 16383.0 / 50_000.0,
        ..Default::default()
    },
    ..Default::default()
});

/// Wide-angle hazard camera with noticeable barrel distortion.
pub static WIDE_ANGLE: Lazy<CameraConfig> = Lazy::new(|| CameraConfig {
    resolution: Resolution::new(1280, 960),
    sensor_size: (1280.0 * 3.75e-6, 1280.0 * 3.75e-6 * 0.75),
    focal_length: 3e-3,
    f_stop: 2.0,
    exposure_time: 0.02,
    interpolate_directions: true,
    distortion: Some(DistortionCoefficients::Brown(BrownCoefficients {
        k1: -0.28,
        k2: 0.07,
        ..Default::default()
    })),
    noise: Some(NoiseModelConfig::fixed_pattern()),
    ..Default::default()
});
