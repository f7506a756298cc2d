//! Numerical building blocks for the camera precomputation passes
//!
//! - **bilinear**: bilinear lookup into per-pixel vector fields
//! - **spherical**: spherical-triangle solid angles on the unit sphere

pub mod bilinear;
pub mod spherical;

pub use bilinear::sample_vector_field;
pub use spherical::{quad_solid_angle, tangent, triangle_solid_angle};
