//! Physically based camera and sensor simulation
//!
//! This crate models the camera of a rendering pipeline: the geometry that
//! maps between world space and pixels (intrinsics, lens distortion, pose,
//! frustum culling, depth-of-field rays) and the radiometry that turns
//! received power into a digital image (étendue, photon shot noise, sensor
//! noise, photosite quantization).

pub mod algo;
pub mod geometry;
pub mod hardware;
pub mod photometry;

// Re-exports for easier access
pub use geometry::{CameraFloat, MeshFloat, Obb, Ray, ReferenceFrame};
pub use hardware::camera::{models, Camera, CameraConfig};
pub use hardware::CameraError;
pub use photometry::{ColorRgb, Panchromatic, Spectral, SpectralData, VisibleSpectrum};
