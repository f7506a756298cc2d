//! Lens distortion models.
//!
//! A distortion model maps ideal pinhole coordinates on the normalized image
//! plane (`z = 1`) to where a real lens actually images them. Each model only
//! has to provide the additive displacement [`Distortion::compute_delta`];
//! `distort` adds it and `undistort` inverts the mapping numerically.
//!
//! # Models
//!
//! - **Brown-Conrady**: three radial plus two tangential coefficients
//! - **Owen**: six coefficients mixing radial, tangential and linear terms
//! - **OpenCV**: rational radial (six), tangential (two), thin prism (four)
//!
//! [`NoDistortion`] is the identity model a `none` coefficient set decodes to.
//! A camera never stores it; it treats `none` as having no model at all.
//!
//! All evaluation happens in `f64`; the camera narrows results to its working
//! precision afterwards.

pub mod brown;
pub mod opencv;
pub mod owen;

pub use brown::{BrownCoefficients, BrownDistortion};
pub use opencv::{OpenCvCoefficients, OpenCvDistortion};
pub use owen::{OwenCoefficients, OwenDistortion};

use std::fmt;

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// Maximum Newton iterations in [`Distortion::undistort`]
pub const UNDISTORT_MAX_ITERATIONS: usize = 50;

/// Residual at which [`Distortion::undistort`] stops iterating
pub const UNDISTORT_TOLERANCE: f64 = 1e-14;

/// Finite-difference step for the numerical Jacobian
const JACOBIAN_STEP: f64 = 1e-7;

/// Which family a distortion model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistortionType {
    None,
    Brown,
    Owen,
    OpenCv,
}

impl fmt::Display for DistortionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DistortionType::None => "none",
            DistortionType::Brown => "brown",
            DistortionType::Owen => "owen",
            DistortionType::OpenCv => "opencv",
        };
        write!(f, "{name}")
    }
}

/// Coefficients of any supported model, tagged by family.
///
/// This is the serialisable description of a distortion; use
/// [`DistortionCoefficients::into_model`] to build the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum DistortionCoefficients {
    None,
    Brown(BrownCoefficients),
    Owen(OwenCoefficients),
    #[serde(rename = "opencv")]
    OpenCv(OpenCvCoefficients),
}

impl DistortionCoefficients {
    pub fn kind(&self) -> DistortionType {
        match self {
            DistortionCoefficients::None => DistortionType::None,
            DistortionCoefficients::Brown(_) => DistortionType::Brown,
            DistortionCoefficients::Owen(_) => DistortionType::Owen,
            DistortionCoefficients::OpenCv(_) => DistortionType::OpenCv,
        }
    }

    pub fn into_model(self) -> Box<dyn Distortion> {
        match self {
            DistortionCoefficients::None => Box::new(NoDistortion),
            DistortionCoefficients::Brown(c) => Box::new(BrownDistortion::new(c)),
            DistortionCoefficients::Owen(c) => Box::new(OwenDistortion::new(c)),
            DistortionCoefficients::OpenCv(c) => Box::new(OpenCvDistortion::new(c)),
        }
    }
}

/// Forward and inverse lens distortion on normalized image coordinates.
///
/// Implementations must be pure: no interior state changes on evaluation.
pub trait Distortion: fmt::Debug + Send + Sync {
    /// Displacement added to an ideal point by the lens.
    fn compute_delta(&self, point: &Vector2<f64>) -> Vector2<f64>;

    fn kind(&self) -> DistortionType;

    fn coefficients(&self) -> DistortionCoefficients;

    /// Ideal to observed coordinates.
    fn distort(&self, point: &Vector2<f64>) -> Vector2<f64> {
        point + self.compute_delta(point)
    }

    /// Observed to ideal coordinates.
    ///
    /// Solves `distort(x) = point` by Newton's method with a central
    /// finite-difference Jacobian, starting from `point` itself. If the
    /// Jacobian becomes singular the step falls back to fixed-point
    /// iteration `x <- point - delta(x)`.
    fn undistort(&self, point: &Vector2<f64>) -> Vector2<f64> {
        let mut x = *point;
        for _ in 0..UNDISTORT_MAX_ITERATIONS {
            let residual = self.distort(&x) - point;
            if residual.norm() <= UNDISTORT_TOLERANCE {
                break;
            }

            let jacobian = self.jacobian(&x);
            x = match jacobian.try_inverse() {
                Some(inverse) => x - inverse * residual,
                None => point - self.compute_delta(&x),
            };
        }
        x
    }

    /// Jacobian of [`Distortion::distort`] at `point`, by central differences.
    fn jacobian(&self, point: &Vector2<f64>) -> Matrix2<f64> {
        let h = JACOBIAN_STEP;
        let dx = Vector2::new(h, 0.0);
        let dy = Vector2::new(0.0, h);
        let col_x = (self.distort(&(point + dx)) - self.distort(&(point - dx))) / (2.0 * h);
        let col_y = (self.distort(&(point + dy)) - self.distort(&(point - dy))) / (2.0 * h);
        Matrix2::from_columns(&[col_x, col_y])
    }
}

/// Identity distortion: a perfect pinhole lens.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoDistortion;

impl Distortion for NoDistortion {
    fn compute_delta(&self, _point: &Vector2<f64>) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn kind(&self) -> DistortionType {
        DistortionType::None
    }

    fn coefficients(&self) -> DistortionCoefficients {
        DistortionCoefficients::None
    }

    fn distort(&self, point: &Vector2<f64>) -> Vector2<f64> {
        *point
    }

    fn undistort(&self, point: &Vector2<f64>) -> Vector2<f64> {
        *point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_grid() -> Vec<Vector2<f64>> {
        let mut points = Vec::new();
        for i in -4..=4 {
            for j in -3..=3 {
                points.push(Vector2::new(i as f64 * 0.09, j as f64 * 0.1));
            }
        }
        points
    }

    fn models() -> Vec<Box<dyn Distortion>> {
        vec![
            DistortionCoefficients::None.into_model(),
            DistortionCoefficients::Brown(BrownCoefficients {
                k1: -0.12,
                k2: 0.03,
                k3: -0.004,
                p1: 0.001,
                p2: -0.0015,
            })
            .into_model(),
            DistortionCoefficients::Owen(OwenCoefficients {
                e1: 0.002,
                e2: -0.08,
                e3: 0.001,
                e4: 0.01,
                e5: 0.0005,
                e6: -0.0007,
            })
            .into_model(),
            DistortionCoefficients::OpenCv(OpenCvCoefficients {
                k1: 0.09,
                k2: -0.02,
                k3: 0.001,
                k4: 0.05,
                k5: -0.01,
                k6: 0.002,
                p1: 0.0008,
                p2: -0.0004,
                s1: 0.0003,
                s2: -0.0001,
                s3: 0.0002,
                s4: 0.0001,
            })
            .into_model(),
        ]
    }

    #[test]
    fn test_round_trip_all_models() {
        for model in models() {
            for p in sample_grid() {
                let d = model.distort(&p);
                let u = model.undistort(&d);
                assert_relative_eq!(u, p, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_coefficients_rebuild_same_model() {
        for model in models() {
            let rebuilt = model.coefficients().into_model();
            assert_eq!(rebuilt.kind(), model.kind());
            let p = Vector2::new(0.2, -0.15);
            assert_eq!(rebuilt.distort(&p), model.distort(&p));
        }
    }

    #[test]
    fn test_coefficients_serde() {
        let coeffs = DistortionCoefficients::Brown(BrownCoefficients {
            k1: 0.1,
            ..Default::default()
        });
        let json = serde_json::to_string(&coeffs).unwrap();
        assert!(json.contains(r#""model":"brown""#));
        let back: DistortionCoefficients = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coeffs);

        let cv: DistortionCoefficients =
            serde_json::from_str(r#"{"model":"opencv","k1":0.5}"#).unwrap();
        assert_eq!(cv.kind(), DistortionType::OpenCv);
    }

    #[test]
    fn test_identity() {
        let p = Vector2::new(0.3, 0.4);
        assert_eq!(NoDistortion.distort(&p), p);
        assert_eq!(NoDistortion.undistort(&p), p);
        assert_eq!(NoDistortion.kind().to_string(), "none");
    }
}
