//! One-dimensional interpolation over tabulated curves.
//!
//! Sensor curves (quantum efficiency, filter transmission) arrive as sparse
//! `(wavelength, value)` tables and have to be resampled onto the simulator's
//! spectral bands. [`interp_clamped`] holds the edge values constant outside
//! the table and [`interval_mean`] averages a table over a closed interval.

use thiserror::Error;

/// Errors that can occur during interpolation operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    #[error("Input vectors must have at least 2 points")]
    InsufficientData,
    #[error("Input vectors must have the same length")]
    MismatchedLengths,
    #[error("X values must be sorted in ascending order")]
    UnsortedData,
    #[error("Interval [{0}, {1}] is empty or reversed")]
    EmptyInterval(f64, f64),
}

fn validate(xs: &[f64], ys: &[f64]) -> Result<(), InterpError> {
    if xs.len() != ys.len() {
        return Err(InterpError::MismatchedLengths);
    }
    if xs.len() < 2 {
        return Err(InterpError::InsufficientData);
    }
    if xs.windows(2).any(|w| w[1] < w[0]) {
        return Err(InterpError::UnsortedData);
    }
    Ok(())
}

// Caller guarantees validated input and xs[0] <= x <= xs[n-1].
fn lerp_sorted(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    let idx = xs.partition_point(|&val| val <= x);
    if idx == 0 {
        return ys[0];
    }
    if idx == n {
        return ys[n - 1];
    }
    let (x1, x2) = (xs[idx - 1], xs[idx]);
    let (y1, y2) = (ys[idx - 1], ys[idx]);
    let t = (x - x1) / (x2 - x1);
    y1 + t * (y2 - y1)
}

/// Linear interpolation on sorted 1D data, holding the first/last value
/// outside the table.
///
/// # Arguments
///
/// * `x` - The x-coordinate at which to interpolate
/// * `xs` - Ascending x-coordinates
/// * `ys` - Values at `xs`
///
/// # Returns
///
/// The interpolated value, or an [`InterpError`] when the table is malformed.
///
/// ```rust
/// use shared::algo::misc::interp_clamped;
///
/// let xs = [0.0, 1.0, 2.0];
/// let ys = [0.0, 2.0, 4.0];
/// assert_eq!(interp_clamped(1.5, &xs, &ys).unwrap(), 3.0);
/// assert_eq!(interp_clamped(-1.0, &xs, &ys).unwrap(), 0.0);
/// ```
pub fn interp_clamped(x: f64, xs: &[f64], ys: &[f64]) -> Result<f64, InterpError> {
    validate(xs, ys)?;
    let x = x.clamp(xs[0], xs[xs.len() - 1]);
    Ok(lerp_sorted(x, xs, ys))
}

/// Mean of the clamped interpolant over `[a, b]`.
///
/// Integrates the piecewise-linear curve exactly with the trapezoid rule on
/// the union of the interval ends and the table breakpoints inside it.
pub fn interval_mean(a: f64, b: f64, xs: &[f64], ys: &[f64]) -> Result<f64, InterpError> {
    validate(xs, ys)?;
    if !(b > a) {
        return Err(InterpError::EmptyInterval(a, b));
    }

    let mut knots = Vec::with_capacity(xs.len() + 2);
    knots.push(a);
    knots.extend(xs.iter().copied().filter(|&x| x > a && x < b));
    knots.push(b);

    let mut area = 0.0;
    let mut prev_x = a;
    let mut prev_y = interp_clamped(a, xs, ys)?;
    for &x in &knots[1..] {
        let y = interp_clamped(x, xs, ys)?;
        area += 0.5 * (prev_y + y) * (x - prev_x);
        prev_x = x;
        prev_y = y;
    }
    Ok(area / (b - a))
}
