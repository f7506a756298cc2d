//! Light-gathering aperture of the optical system.
//!
//! The aperture supplies the collecting area used in radiometric transfer and
//! random points on the lens plane for depth-of-field ray origins.

use std::f32::consts::PI;
use std::fmt;

use nalgebra::Vector2;
use rand::RngCore;
use rand_distr::{Distribution, Uniform};

/// An aperture shape in the lens plane, centered on the optical axis.
pub trait Aperture: fmt::Debug + Send + Sync {
    /// Draw a point uniformly distributed over the aperture, in metres, using
    /// the caller's generator and unit-interval distribution.
    fn sample_point(&self, rng: &mut dyn RngCore, uniform: &Uniform<f32>) -> Vector2<f32>;

    /// Collecting area in square metres
    fn area(&self) -> f64;

    /// Diameter in metres
    fn diameter(&self) -> f64;

    fn set_diameter(&mut self, diameter: f64);

    fn radius(&self) -> f64 {
        0.5 * self.diameter()
    }

    fn set_radius(&mut self, radius: f64) {
        self.set_diameter(2.0 * radius);
    }
}

/// Circular aperture of a given diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularAperture {
    diameter: f64,
}

impl CircularAperture {
    pub fn new(diameter: f64) -> Self {
        Self { diameter }
    }
}

impl Default for CircularAperture {
    fn default() -> Self {
        // 50 mm lens at f/2.8
        Self::new(0.05 / 2.8)
    }
}

impl Aperture for CircularAperture {
    fn sample_point(&self, rng: &mut dyn RngCore, uniform: &Uniform<f32>) -> Vector2<f32> {
        // Square-root radius keeps the density uniform in area.
        let r = self.radius() as f32 * uniform.sample(rng).sqrt();
        let theta = 2.0 * PI * uniform.sample(rng);
        Vector2::new(r * theta.cos(), r * theta.sin())
    }

    fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius() * self.radius()
    }

    fn diameter(&self) -> f64 {
        self.diameter
    }

    fn set_diameter(&mut self, diameter: f64) {
        self.diameter = diameter;
    }
}
