//! Image dimensions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensor or image resolution in pixels.
///
/// `width` runs along the pixel x axis (array columns) and `height` along the
/// pixel y axis (array rows), so an `ndarray` image of this resolution has
/// shape `(height, width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
}

impl Resolution {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// `ndarray` shape `(rows, cols)` of an image with this resolution
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Resolution matching an `ndarray` shape `(rows, cols)`
    pub fn from_shape(shape: (usize, usize)) -> Self {
        Self::new(shape.1, shape.0)
    }

    /// Geometric image center in continuous pixel coordinates
    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Whether pixel `(x, y)` lies inside the image
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Whether either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(usize, usize)> for Resolution {
    /// Interprets the tuple as `(width, height)`.
    fn from(dimensions: (usize, usize)) -> Self {
        Self::new(dimensions.0, dimensions.1)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
