//! Spectral representation and colour conversion

pub mod color;
pub mod spectrum;

pub use color::{rgb_to_spectral, spectral_to_rgb, ColorRgb};
pub use spectrum::{photon_energy, Panchromatic, Spectral, SpectralBand, SpectralData, VisibleSpectrum, SI};
