//! OpenCV-compatible distortion: rational radial, tangential and thin prism.
//!
//! ```text
//! r² = x² + y²
//! q  = (1 + k1 r² + k2 r⁴ + k3 r⁶) / (1 + k4 r² + k5 r⁴ + k6 r⁶)
//! x' = x q + 2 p1 x y + p2 (r² + 2x²) + s1 r² + s2 r⁴
//! y' = y q + p1 (r² + 2y²) + 2 p2 x y + s3 r² + s4 r⁴
//! ```

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{Distortion, DistortionCoefficients, DistortionType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenCvCoefficients {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub k4: f64,
    pub k5: f64,
    pub k6: f64,
    pub p1: f64,
    pub p2: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub s4: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpenCvDistortion {
    coefficients: OpenCvCoefficients,
}

impl OpenCvDistortion {
    pub fn new(coefficients: OpenCvCoefficients) -> Self {
        Self { coefficients }
    }

    /// Numerator (`k1..k3`) and denominator (`k4..k6`) radial coefficients.
    pub fn set_radial(&mut self, numerator: [f64; 3], denominator: [f64; 3]) {
        let c = &mut self.coefficients;
        [c.k1, c.k2, c.k3] = numerator;
        [c.k4, c.k5, c.k6] = denominator;
    }

    pub fn set_tangential(&mut self, p1: f64, p2: f64) {
        self.coefficients.p1 = p1;
        self.coefficients.p2 = p2;
    }

    pub fn set_thin_prism(&mut self, s: [f64; 4]) {
        let c = &mut self.coefficients;
        [c.s1, c.s2, c.s3, c.s4] = s;
    }
}

impl Distortion for OpenCvDistortion {
    fn compute_delta(&self, point: &Vector2<f64>) -> Vector2<f64> {
        let c = &self.coefficients;
        let (x, y) = (point.x, point.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        let numerator = 1.0 + c.k1 * r2 + c.k2 * r4 + c.k3 * r6;
        let denominator = 1.0 + c.k4 * r2 + c.k5 * r4 + c.k6 * r6;
        let radial = numerator / denominator - 1.0;
        Vector2::new(
            x * radial + 2.0 * c.p1 * x * y + c.p2 * (r2 + 2.0 * x * x) + c.s1 * r2 + c.s2 * r4,
            y * radial + c.p1 * (r2 + 2.0 * y * y) + 2.0 * c.p2 * x * y + c.s3 * r2 + c.s4 * r4,
        )
    }

    fn kind(&self) -> DistortionType {
        DistortionType::OpenCv
    }

    fn coefficients(&self) -> DistortionCoefficients {
        DistortionCoefficients::OpenCv(self.coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::distortion::{BrownCoefficients, BrownDistortion};
    use approx::assert_relative_eq;

    #[test]
    fn test_reduces_to_brown() {
        let brown = BrownDistortion::new(BrownCoefficients {
            k1: -0.1,
            k2: 0.02,
            k3: 0.003,
            p1: 0.001,
            p2: 0.002,
        });
        let mut cv = OpenCvDistortion::default();
        cv.set_radial([-0.1, 0.02, 0.003], [0.0; 3]);
        cv.set_tangential(0.001, 0.002);

        let p = Vector2::new(0.21, -0.33);
        assert_relative_eq!(cv.distort(&p), brown.distort(&p), epsilon = 1e-15);
    }

    #[test]
    fn test_thin_prism() {
        let mut cv = OpenCvDistortion::default();
        cv.set_thin_prism([0.01, 0.0, 0.02, 0.0]);
        let p = Vector2::new(0.0, 0.5);
        assert_relative_eq!(cv.compute_delta(&p), Vector2::new(0.0025, 0.005), epsilon = 1e-15);
        assert_relative_eq!(cv.undistort(&cv.distort(&p)), p, epsilon = 1e-10);
    }
}
