//! Algorithms shared across the simulator crates
//!
//! This module provides interpolation helpers and the parallel array
//! processing primitives used by the precomputation passes.

pub mod misc;
pub mod parallel;

pub use misc::{interp_clamped, interval_mean, InterpError};
pub use parallel::{
    entropy_seed, fill_array, is_single_threaded, process_array_in_parallel_chunks,
    set_single_threaded,
};
