//! Serializable camera description.
//!
//! A [`CameraConfig`] captures everything needed to rebuild a camera except
//! its pose and any custom components (aperture shapes, PSF or noise models,
//! filter mosaics). Missing JSON fields take their defaults.
//!
//! ```json
//! {
//!   "resolution": { "width": 1024, "height": 1024 },
//!   "sensor_size": [0.01024, 0.01024],
//!   "focal_length": 0.05,
//!   "f_stop": 4.0,
//!   "distortion": { "model": "brown", "k1": -0.05 },
//!   "psf": { "model": "airy" },
//!   "noise": { "readout_noise_std": 2.0 }
//! }
//! ```

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::image_size::Resolution;

use super::{Camera, DEFAULT_EXPOSURE_TIME, DEFAULT_FOCAL_LENGTH, DEFAULT_F_STOP, DEFAULT_SENSOR_SIZE};
use crate::geometry::{CameraFloat, MeshFloat};
use crate::hardware::distortion::DistortionCoefficients;
use crate::hardware::error::CameraError;
use crate::hardware::noise_model::NoiseModelConfig;
use crate::hardware::photosite::PhotositeConfig;
use crate::hardware::psf::DefaultPsf;
use crate::photometry::Spectral;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid camera JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error("failed to read camera config: {0}")]
    Io(#[from] std::io::Error),
}

/// Point spread function selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum PsfConfig {
    #[default]
    None,
    /// Diffraction-limited Airy disk from the aperture
    Airy,
    /// Gaussian fitted to the Airy disk
    Gaussian,
    /// Gaussian with explicit sigmas in pixels, equal in every band
    GaussianSigma {
        sigma_x: f32,
        sigma_y: f32,
        #[serde(default)]
        angle: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub resolution: Resolution,
    /// Sensor width and height in metres
    pub sensor_size: (f64, f64),
    /// Metres
    pub focal_length: f64,
    pub f_stop: f64,
    /// Overrides the diameter implied by `f_stop`, metres
    pub aperture_diameter: Option<f64>,
    /// Seconds
    pub exposure_time: f64,
    /// Metres; `None` focuses at infinity
    pub focus_distance: Option<f64>,
    pub optical_efficiency: f32,
    /// Pixels; `None` centers it
    pub principal_point: Option<(f64, f64)>,
    /// `(kxy, kyx)` in pixels
    pub skew: (f64, f64),
    pub blender_frame: bool,
    pub depth_of_field: bool,
    pub interpolate_directions: bool,
    pub photon_noise: bool,
    pub bayer_filter: bool,
    pub distortion: Option<DistortionCoefficients>,
    pub psf: PsfConfig,
    pub noise: Option<NoiseModelConfig>,
    pub photosite: PhotositeConfig,
    /// Fixed seed for reproducible noise
    pub rng_seed: Option<u64>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            sensor_size: DEFAULT_SENSOR_SIZE,
            focal_length: DEFAULT_FOCAL_LENGTH,
            f_stop: DEFAULT_F_STOP,
            aperture_diameter: None,
            exposure_time: DEFAULT_EXPOSURE_TIME,
            focus_distance: None,
            optical_efficiency: 1.0,
            principal_point: None,
            skew: (0.0, 0.0),
            blender_frame: false,
            depth_of_field: false,
            interpolate_directions: false,
            photon_noise: true,
            bayer_filter: false,
            distortion: None,
            psf: PsfConfig::None,
            noise: None,
            photosite: PhotositeConfig::default(),
            rng_seed: None,
        }
    }
}

impl CameraConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("loading camera config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a camera from this description. The camera still needs
    /// [`Camera::initialize`].
    pub fn build<S: Spectral, F: CameraFloat, M: MeshFloat<F>>(
        &self,
    ) -> Result<Camera<S, F, M>, CameraError> {
        Camera::from_config(self)
    }
}

impl<S: Spectral, F: CameraFloat, M: MeshFloat<F>> Camera<S, F, M> {
    /// Uninitialized camera configured through the regular setters, so every
    /// field is validated the same way.
    pub fn from_config(config: &CameraConfig) -> Result<Self, CameraError> {
        let mut camera = Self::new();
        if let Some(seed) = config.rng_seed {
            camera.set_rng_seed(seed);
        }

        camera.set_resolution(config.resolution)?;
        camera.set_sensor_size(config.sensor_size.0, config.sensor_size.1)?;
        camera.set_focal_length(config.focal_length)?;
        camera.set_f_stop(config.f_stop)?;
        if let Some(diameter) = config.aperture_diameter {
            camera.set_aperture_diameter(diameter)?;
        }
        camera.set_exposure_time(config.exposure_time)?;
        if let Some(distance) = config.focus_distance {
            camera.set_focus_distance(distance)?;
        }
        camera.set_optical_efficiency_scalar(config.optical_efficiency)?;
        if let Some((x, y)) = config.principal_point {
            camera.set_principal_point(x, y)?;
        }
        camera.set_skew(config.skew.0, config.skew.1)?;

        camera.set_blender_frame(config.blender_frame);
        camera.set_depth_of_field(config.depth_of_field);
        camera.set_interpolate_directions(config.interpolate_directions);
        camera.set_photon_noise(config.photon_noise);
        camera.set_bayer_filter(config.bayer_filter);

        match config.distortion {
            None | Some(DistortionCoefficients::None) => camera.clear_distortion(),
            Some(coefficients) => camera.set_distortion(coefficients.into_model()),
        }

        match config.psf {
            PsfConfig::None => camera.set_default_psf(DefaultPsf::None),
            PsfConfig::Airy => camera.set_default_psf(DefaultPsf::Airy),
            PsfConfig::Gaussian => camera.set_default_psf(DefaultPsf::Gaussian),
            PsfConfig::GaussianSigma {
                sigma_x,
                sigma_y,
                angle,
            } => camera.set_gaussian_psf_scalar(sigma_x, sigma_y, angle)?,
        }

        if let Some(noise) = config.noise {
            camera.set_noise_config(noise)?;
        }
        camera.set_photosite_config(config.photosite.clone())?;

        debug!("{}: configured from {} camera config", camera.id(), config.resolution);
        Ok(camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::distortion::DistortionType;
    use crate::photometry::Panchromatic;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_json_is_default() {
        let config = CameraConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CameraConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = CameraConfig::from_json_str(
            r#"{
                "resolution": { "width": 40, "height": 30 },
                "sensor_size": [0.004, 0.003],
                "f_stop": 8.0,
                "distortion": { "model": "brown", "k1": -0.1 },
                "psf": { "model": "gaussian_sigma", "sigma_x": 1.5, "sigma_y": 0.5 },
                "noise": { "readout_noise_std": 2.0 },
                "photosite": { "bit_depth": 12 },
                "rng_seed": 9
            }"#,
        )
        .unwrap();
        assert_eq!(config.resolution, Resolution::new(40, 30));
        assert_eq!(config.focal_length, DEFAULT_FOCAL_LENGTH);
        assert_eq!(
            config.psf,
            PsfConfig::GaussianSigma {
                sigma_x: 1.5,
                sigma_y: 0.5,
                angle: 0.0
            }
        );

        let camera: Camera<Panchromatic> = config.build().unwrap();
        assert_eq!(camera.resolution(), Resolution::new(40, 30));
        assert_relative_eq!(camera.aperture_diameter(), DEFAULT_FOCAL_LENGTH / 8.0);
        assert_eq!(camera.distortion().unwrap().kind(), DistortionType::Brown);
        assert!(camera.psf().is_ok());
        assert_eq!(camera.noise_config().unwrap().readout_noise_std, 2.0);
        assert_eq!(camera.photosite().unwrap().bit_depth(), 12);
        assert!(!camera.is_initialized());
    }

    #[test]
    fn test_none_distortion_is_pinhole() {
        let config = CameraConfig::from_json_str(
            r#"{ "distortion": { "model": "none" }, "interpolate_directions": true }"#,
        )
        .unwrap();
        assert_eq!(config.distortion, Some(DistortionCoefficients::None));
        let mut camera: Camera<Panchromatic> = config.build().unwrap();
        assert!(!camera.has_distortion());
        camera.initialize().unwrap();
        assert!(!camera.interpolates_directions());
    }

    #[test]
    fn test_aperture_diameter_overrides_f_stop() {
        let config = CameraConfig {
            focal_length: 0.1,
            f_stop: 2.0,
            aperture_diameter: Some(0.025),
            ..Default::default()
        };
        let camera: Camera<Panchromatic> = Camera::from_config(&config).unwrap();
        assert_relative_eq!(camera.f_stop(), 4.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = CameraConfig {
            focal_length: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            Camera::<Panchromatic>::from_config(&config),
            Err(CameraError::NotPositive { .. })
        ));

        let err = CameraConfig::from_json_str(r#"{"psf": {"model": "bokeh"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = CameraConfig {
            resolution: Resolution::new(16, 8),
            focus_distance: Some(12.0),
            noise: Some(NoiseModelConfig::fixed_pattern()),
            psf: PsfConfig::Airy,
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(CameraConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = CameraConfig::from_json_file("/nonexistent/camera.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
