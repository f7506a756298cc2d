//! Camera hardware: optics, sensor and the camera that ties them together

pub mod aperture;
pub mod camera;
pub mod distortion;
pub mod error;
pub mod filter_array;
pub mod noise_model;
pub mod photosite;
pub mod psf;

pub use aperture::{Aperture, CircularAperture};
pub use camera::{Camera, CameraConfig, CameraId, ConfigError, PsfConfig};
pub use distortion::{Distortion, DistortionCoefficients, DistortionType, NoDistortion};
pub use error::CameraError;
pub use filter_array::BayerPrimaries;
pub use noise_model::{NoiseModel, NoiseModelConfig, SensorNoiseModel};
pub use photosite::{Photosite, PhotositeConfig};
pub use psf::{DefaultPsf, PointSpreadFunction, PsfModel};
