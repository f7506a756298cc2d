//! Shared components and utilities for the camera simulator.
//!
//! This crate contains the domain-neutral pieces used by the camera
//! subsystem: image dimensions, row-chunked parallel array processing with
//! deterministic seeding, one-dimensional interpolation, and the basic
//! random-noise samplers.

pub mod algo;
pub mod image_proc;
pub mod image_size;
