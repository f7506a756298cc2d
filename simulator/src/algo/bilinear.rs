//! Bilinear interpolation over per-pixel vector fields.
//!
//! Fields are sampled at pixel centers: entry `[[row, col]]` holds the value at
//! continuous pixel coordinate `(col + 0.5, row + 0.5)`. Queries outside the
//! span of centers extrapolate linearly from the nearest edge cell, so the
//! half-pixel border of the image is handled without clamping artifacts.

use nalgebra::Vector3;
use ndarray::Array2;

use crate::geometry::CameraFloat;

/// Lower grid index and fractional weight along one axis.
///
/// The weight falls outside `[0, 1]` when extrapolating.
fn axis_index_and_weight(coord: f64, len: usize) -> (usize, f64) {
    if len < 2 {
        return (0, 0.0);
    }
    let centered = coord - 0.5;
    let lower = centered.floor().clamp(0.0, (len - 2) as f64);
    (lower as usize, centered - lower)
}

/// Bilinearly sample `field` at continuous pixel coordinate `(x, y)`.
///
/// # Arguments
/// * `field` - Vector field with shape `(height, width)`; must not be empty
/// * `x` - Horizontal pixel coordinate
/// * `y` - Vertical pixel coordinate
///
/// # Returns
/// The interpolated (or extrapolated) vector. Single-row or single-column
/// fields are held constant along the degenerate axis.
pub fn sample_vector_field<F: CameraFloat>(
    field: &Array2<Vector3<F>>,
    x: F,
    y: F,
) -> Vector3<F> {
    let (rows, cols) = field.dim();
    let (i0, tx) = axis_index_and_weight(x.as_f64(), cols);
    let (j0, ty) = axis_index_and_weight(y.as_f64(), rows);
    let i1 = (i0 + 1).min(cols - 1);
    let j1 = (j0 + 1).min(rows - 1);
    let tx = F::from_f64_lossy(tx);
    let ty = F::from_f64_lossy(ty);
    let one = F::one();

    let top = field[[j0, i0]] * (one - tx) + field[[j0, i1]] * tx;
    let bottom = field[[j1, i0]] * (one - tx) + field[[j1, i1]] * tx;
    top * (one - ty) + bottom * ty
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // f(x, y) = (x, 2y, x + y) sampled at pixel centers
    fn linear_field(width: usize, height: usize) -> Array2<Vector3<f64>> {
        Array2::from_shape_fn((height, width), |(j, i)| {
            let (x, y) = (i as f64 + 0.5, j as f64 + 0.5);
            Vector3::new(x, 2.0 * y, x + y)
        })
    }

    #[test]
    fn test_exact_at_centers() {
        let field = linear_field(5, 4);
        let v = sample_vector_field(&field, 2.5, 1.5);
        assert_relative_eq!(v, field[[1, 2]], epsilon = 1e-12);
    }

    #[test]
    fn test_linear_field_reproduced() {
        let field = linear_field(6, 3);
        for &(x, y) in &[(1.2, 0.9), (3.75, 2.1), (5.4, 1.0)] {
            let v = sample_vector_field(&field, x, y);
            assert_relative_eq!(v, Vector3::new(x, 2.0 * y, x + y), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_extrapolates_past_border() {
        let field = linear_field(4, 4);
        for &(x, y) in &[(0.0, 0.0), (4.0, 4.0), (0.1, 3.9)] {
            let v = sample_vector_field(&field, x, y);
            assert_relative_eq!(v, Vector3::new(x, 2.0 * y, x + y), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_pixel_field() {
        let field = Array2::from_elem((1, 1), Vector3::new(0.0f32, 0.0, 1.0));
        assert_eq!(sample_vector_field(&field, 0.9f32, 0.1), Vector3::new(0.0, 0.0, 1.0));
    }
}
