//! Colour filter mosaics laid over a monochrome sensor.

use ndarray::Array2;

use shared::image_size::Resolution;

use crate::photometry::{rgb_to_spectral, ColorRgb, Spectral};

/// Spectral transmission of the three filter colours of a Bayer mosaic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BayerPrimaries<S: Spectral> {
    pub red: S,
    pub green: S,
    pub blue: S,
}

impl<S: Spectral> Default for BayerPrimaries<S> {
    /// Ideal primaries spread over the bands by wavelength overlap.
    fn default() -> Self {
        Self {
            red: rgb_to_spectral(&ColorRgb::RED),
            green: rgb_to_spectral(&ColorRgb::GREEN),
            blue: rgb_to_spectral(&ColorRgb::BLUE),
        }
    }
}

/// RGGB Bayer mosaic built from the given filter responses.
///
/// The 2x2 cell is
///
/// ```text
///        x even  x odd
/// y even   R       G
/// y odd    G       B
/// ```
///
/// The returned array has shape `(height, width)` and is indexed `[[y, x]]`.
pub fn bayer_filter<S: Spectral>(resolution: Resolution, red: S, green: S, blue: S) -> Array2<S> {
    Array2::from_shape_fn(resolution.shape(), |(y, x)| match (x % 2, y % 2) {
        (0, 0) => red,
        (1, 1) => blue,
        _ => green,
    })
}

/// RGGB mosaic with the default primaries.
pub fn default_bayer_filter<S: Spectral>(resolution: Resolution) -> Array2<S> {
    let BayerPrimaries { red, green, blue } = BayerPrimaries::default();
    bayer_filter(resolution, red, green, blue)
}
