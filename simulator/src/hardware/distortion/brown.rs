//! Brown-Conrady distortion with three radial and two tangential terms.
//!
//! ```text
//! r² = x² + y²
//! radial = k1 r² + k2 r⁴ + k3 r⁶
//! dx = x radial + 2 p1 x y + p2 (r² + 2x²)
//! dy = y radial + p1 (r² + 2y²) + 2 p2 x y
//! ```

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{Distortion, DistortionCoefficients, DistortionType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrownCoefficients {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub p1: f64,
    pub p2: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BrownDistortion {
    coefficients: BrownCoefficients,
}

impl BrownDistortion {
    pub fn new(coefficients: BrownCoefficients) -> Self {
        Self { coefficients }
    }

    pub fn set_radial(&mut self, k1: f64, k2: f64, k3: f64) {
        self.coefficients.k1 = k1;
        self.coefficients.k2 = k2;
        self.coefficients.k3 = k3;
    }

    pub fn set_tangential(&mut self, p1: f64, p2: f64) {
        self.coefficients.p1 = p1;
        self.coefficients.p2 = p2;
    }
}

impl Distortion for BrownDistortion {
    fn compute_delta(&self, point: &Vector2<f64>) -> Vector2<f64> {
        let BrownCoefficients { k1, k2, k3, p1, p2 } = self.coefficients;
        let (x, y) = (point.x, point.y);
        let r2 = x * x + y * y;
        let radial = r2 * (k1 + r2 * (k2 + r2 * k3));
        Vector2::new(
            x * radial + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x),
            y * radial + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y,
        )
    }

    fn kind(&self) -> DistortionType {
        DistortionType::Brown
    }

    fn coefficients(&self) -> DistortionCoefficients {
        DistortionCoefficients::Brown(self.coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pure_radial() {
        let model = BrownDistortion::new(BrownCoefficients {
            k1: 0.1,
            k2: 0.01,
            ..Default::default()
        });
        let p = Vector2::new(0.3, 0.4); // r² = 0.25
        let scale = 1.0 + 0.1 * 0.25 + 0.01 * 0.0625;
        assert_relative_eq!(model.distort(&p), p * scale, epsilon = 1e-15);
        assert_eq!(model.distort(&Vector2::zeros()), Vector2::zeros());
    }

    #[test]
    fn test_tangential_terms() {
        let mut model = BrownDistortion::default();
        model.set_tangential(0.01, 0.02);
        let p = Vector2::new(0.5, 0.0);
        // dx = p2 (r² + 2x²) = 0.02 * 0.75, dy = p1 r² = 0.01 * 0.25
        assert_relative_eq!(model.compute_delta(&p), Vector2::new(0.015, 0.0025), epsilon = 1e-15);
    }

    #[test]
    fn test_strong_barrel_inverts() {
        let mut model = BrownDistortion::default();
        model.set_radial(-0.3, 0.08, 0.0);
        let p = Vector2::new(0.5, -0.35);
        let u = model.undistort(&model.distort(&p));
        assert_relative_eq!(u, p, epsilon = 1e-10);
    }
}
