//! Scalar noise samplers for detector simulation.
//!
//! Two primitives cover every stochastic term of the sensor model:
//! - Poisson draws for photon arrival and dark-current electrons
//! - Gaussian draws for readout noise
//!
//! Both take the generator by `&mut dyn RngCore` so callers can pass a
//! per-chunk `StdRng` from the parallel helpers or a camera-owned generator
//! without monomorphising every call site.

use rand::RngCore;
use rand_distr::{Distribution, Normal, Poisson};

/// Draw a Poisson sample with the given mean.
///
/// Non-positive or non-finite means yield `0.0`; there is nothing to count.
///
/// # Arguments
/// * `mean` - Expected count
/// * `rng` - Random number generator
///
/// # Returns
/// An integral count returned as `f64`
pub fn sample_poisson(mean: f64, rng: &mut dyn RngCore) -> f64 {
    if !(mean > 0.0) || !mean.is_finite() {
        return 0.0;
    }
    match Poisson::new(mean) {
        Ok(dist) => dist.sample(rng),
        Err(_) => 0.0,
    }
}

/// Draw a Gaussian sample.
///
/// A zero (or invalid) standard deviation degenerates to returning `mean`.
pub fn sample_normal(mean: f64, std_dev: f64, rng: &mut dyn RngCore) -> f64 {
    if !(std_dev > 0.0) {
        return mean;
    }
    match Normal::new(mean, std_dev) {
        Ok(dist) => dist.sample(rng),
        Err(_) => mean,
    }
}
