//! Image-level processing primitives.
//!
//! - **noise**: Poisson and Gaussian samplers used by the photon and sensor noise paths

pub mod noise;

pub use noise::{sample_normal, sample_poisson};
