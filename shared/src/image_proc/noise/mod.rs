//! Noise processing module
//!
//! - **generate**: Scalar noise samplers for sensor simulation

pub mod generate;

pub use generate::{sample_normal, sample_poisson};
