//! Owen distortion model.
//!
//! Six coefficients combining radial terms along the position vector with
//! tangential terms along its perpendicular, plus linear terms in x and y:
//!
//! ```text
//! r = |p|
//! dp = (e2 r² + e4 r⁴ + e5 y + e6 x) (x, y) + (e1 r + e3 r³) (-y, x)
//! ```

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{Distortion, DistortionCoefficients, DistortionType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwenCoefficients {
    pub e1: f64,
    pub e2: f64,
    pub e3: f64,
    pub e4: f64,
    pub e5: f64,
    pub e6: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OwenDistortion {
    coefficients: OwenCoefficients,
}

impl OwenDistortion {
    pub fn new(coefficients: OwenCoefficients) -> Self {
        Self { coefficients }
    }

    pub fn set_radial(&mut self, e2: f64, e4: f64) {
        self.coefficients.e2 = e2;
        self.coefficients.e4 = e4;
    }

    pub fn set_tangential(&mut self, e1: f64, e3: f64) {
        self.coefficients.e1 = e1;
        self.coefficients.e3 = e3;
    }

    pub fn set_linear(&mut self, e5: f64, e6: f64) {
        self.coefficients.e5 = e5;
        self.coefficients.e6 = e6;
    }
}

impl Distortion for OwenDistortion {
    fn compute_delta(&self, point: &Vector2<f64>) -> Vector2<f64> {
        let OwenCoefficients { e1, e2, e3, e4, e5, e6 } = self.coefficients;
        let (x, y) = (point.x, point.y);
        let r2 = x * x + y * y;
        let r = r2.sqrt();
        let along = e2 * r2 + e4 * r2 * r2 + e5 * y + e6 * x;
        let across = e1 * r + e3 * r2 * r;
        Vector2::new(along * x - across * y, along * y + across * x)
    }

    fn kind(&self) -> DistortionType {
        DistortionType::Owen
    }

    fn coefficients(&self) -> DistortionCoefficients {
        DistortionCoefficients::Owen(self.coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tangential_is_perpendicular() {
        let mut model = OwenDistortion::default();
        model.set_tangential(0.01, 0.002);
        let p = Vector2::new(0.3, -0.2);
        let delta = model.compute_delta(&p);
        assert_relative_eq!(delta.dot(&p), 0.0, epsilon = 1e-16);
    }

    #[test]
    fn test_radial_and_linear() {
        let mut model = OwenDistortion::default();
        model.set_radial(0.1, 0.0);
        model.set_linear(0.0, 0.2);
        let p = Vector2::new(0.5, 0.0);
        // along = 0.1 * 0.25 + 0.2 * 0.5
        assert_relative_eq!(model.compute_delta(&p), Vector2::new(0.0625, 0.0), epsilon = 1e-15);
        assert_relative_eq!(model.undistort(&model.distort(&p)), p, epsilon = 1e-10);
    }
}
