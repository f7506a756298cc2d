//! Errors raised while configuring or using a camera and its components.

use thiserror::Error;

use shared::algo::InterpError;
use shared::image_size::Resolution;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("{parameter} must be positive, got {value}")]
    NotPositive { parameter: &'static str, value: f64 },

    #[error("{parameter} must be finite, got {value}")]
    NotFinite { parameter: &'static str, value: f64 },

    #[error("{parameter} must not be negative, got {value}")]
    Negative { parameter: &'static str, value: f64 },

    #[error("{parameter} is out of range: {message}")]
    OutOfRange {
        parameter: &'static str,
        message: String,
    },

    #[error("filter mosaic is {actual} but the camera resolution is {expected}")]
    FilterMosaicMismatch {
        expected: Resolution,
        actual: Resolution,
    },

    #[error("image is {actual} but the camera resolution is {expected}")]
    ImageSizeMismatch {
        expected: Resolution,
        actual: Resolution,
    },

    #[error("expected {expected} spectral values for {parameter}, got {actual}")]
    BandCountMismatch {
        parameter: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} has not been constructed; call initialize() or set it explicitly")]
    ComponentMissing(&'static str),

    #[error("camera has pending changes; call initialize() first")]
    NotInitialized,

    #[error("intrinsic matrix is singular (determinant {determinant})")]
    DegenerateIntrinsics { determinant: f64 },

    #[error("pixel ({x}, {y}) is outside the {resolution} image")]
    PixelOutOfBounds {
        x: usize,
        y: usize,
        resolution: Resolution,
    },

    #[error("invalid quantum efficiency table: {0}")]
    QuantumEfficiencyTable(#[from] InterpError),
}

/// Require `value > 0` and finite.
pub(crate) fn ensure_positive(parameter: &'static str, value: f64) -> Result<f64, CameraError> {
    ensure_finite(parameter, value)?;
    if value <= 0.0 {
        return Err(CameraError::NotPositive { parameter, value });
    }
    Ok(value)
}

/// Require a finite value.
pub(crate) fn ensure_finite(parameter: &'static str, value: f64) -> Result<f64, CameraError> {
    if !value.is_finite() {
        return Err(CameraError::NotFinite { parameter, value });
    }
    Ok(value)
}

/// Require `value >= 0` and finite.
pub(crate) fn ensure_non_negative(parameter: &'static str, value: f64) -> Result<f64, CameraError> {
    ensure_finite(parameter, value)?;
    if value < 0.0 {
        return Err(CameraError::Negative { parameter, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validators() {
        assert_eq!(ensure_positive("f_stop", 2.8), Ok(2.8));
        assert!(matches!(
            ensure_positive("f_stop", 0.0),
            Err(CameraError::NotPositive { parameter: "f_stop", .. })
        ));
        assert!(matches!(
            ensure_positive("f_stop", f64::INFINITY),
            Err(CameraError::NotFinite { .. })
        ));
        assert!(matches!(
            ensure_non_negative("dark_current", -1.0),
            Err(CameraError::Negative { .. })
        ));
        assert_eq!(ensure_non_negative("dark_current", 0.0), Ok(0.0));
    }

    #[test]
    fn test_messages() {
        let err = CameraError::FilterMosaicMismatch {
            expected: Resolution::new(4, 4),
            actual: Resolution::new(2, 2),
        };
        assert_eq!(
            err.to_string(),
            "filter mosaic is 2x2 but the camera resolution is 4x4"
        );
    }
}
