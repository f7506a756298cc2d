//! Spectral to RGB conversion.
//!
//! The three channels partition the wavelength axis: blue below 500 nm, green
//! from 500 nm to 600 nm, red from 600 nm up. Band power is split between
//! channels in proportion to how much of the band falls in each, so
//! [`spectral_to_rgb`] conserves the band sum. [`rgb_to_spectral`] uses the
//! same fractions in the other direction, which makes it suitable for
//! filter responses: a pure red primary becomes a spectral response of 1 in
//! every band lying entirely above 600 nm.

use std::ops::{Add, AddAssign, Index, Mul};

use super::spectrum::{photon_energy, Spectral};

/// Channel boundary between blue and green, nanometres
pub const BLUE_GREEN_BOUNDARY_NM: f64 = 500.0;
/// Channel boundary between green and red, nanometres
pub const GREEN_RED_BOUNDARY_NM: f64 = 600.0;

/// Representative wavelength of each channel (red, green, blue), metres
pub const RGB_WAVELENGTHS: [f64; 3] = [650e-9, 550e-9, 450e-9];

/// A red/green/blue triple.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorRgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorRgb {
    pub const RED: ColorRgb = ColorRgb::new(1.0, 0.0, 0.0);
    pub const GREEN: ColorRgb = ColorRgb::new(0.0, 1.0, 0.0);
    pub const BLUE: ColorRgb = ColorRgb::new(0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    pub fn from_array(values: [f32; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn map<G: FnMut(f32) -> f32>(self, mut f: G) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    pub fn sum(&self) -> f32 {
        self.r + self.g + self.b
    }

    /// Photon energy of each channel's representative wavelength, joules.
    pub fn photon_energies() -> [f64; 3] {
        RGB_WAVELENGTHS.map(photon_energy)
    }
}

impl Index<usize> for ColorRgb {
    type Output = f32;
    fn index(&self, index: usize) -> &f32 {
        match index {
            0 => &self.r,
            1 => &self.g,
            2 => &self.b,
            _ => panic!("ColorRgb index {index} out of range"),
        }
    }
}

impl Add for ColorRgb {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for ColorRgb {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul for ColorRgb {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl Mul<f32> for ColorRgb {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        self.map(|v| v * rhs)
    }
}

/// Fraction of band `index` falling into each channel, as `[r, g, b]`.
fn channel_fractions<S: Spectral>(index: usize) -> [f64; 3] {
    let band = S::band(index);
    [
        band.overlap_fraction(GREEN_RED_BOUNDARY_NM, f64::INFINITY),
        band.overlap_fraction(BLUE_GREEN_BOUNDARY_NM, GREEN_RED_BOUNDARY_NM),
        band.overlap_fraction(0.0, BLUE_GREEN_BOUNDARY_NM),
    ]
}

/// Collapse a spectral value into three channels, conserving the band sum.
pub fn spectral_to_rgb<S: Spectral>(value: &S) -> ColorRgb {
    let mut rgb = [0.0f64; 3];
    for i in 0..S::BANDS {
        let fractions = channel_fractions::<S>(i);
        for c in 0..3 {
            rgb[c] += fractions[c] * value[i] as f64;
        }
    }
    ColorRgb::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32)
}

/// Expand an RGB value onto the spectral bands by channel overlap.
pub fn rgb_to_spectral<S: Spectral>(color: &ColorRgb) -> S {
    S::from_fn(|i| {
        let f = channel_fractions::<S>(i);
        (f[0] * color.r as f64 + f[1] * color.g as f64 + f[2] * color.b as f64) as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometry::spectrum::SpectralData;
    use approx::assert_relative_eq;

    // Bands: 400-450, 450-500, 500-550, 550-600, 600-650, 650-700
    type Six = SpectralData<6, 400, 700>;
    // Bands: 450-550, 550-650 (each straddles a boundary)
    type Two = SpectralData<2, 450, 650>;

    #[test]
    fn test_spectral_to_rgb_aligned() {
        let s = Six::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let rgb = spectral_to_rgb(&s);
        assert_relative_eq!(rgb.b, 3.0);
        assert_relative_eq!(rgb.g, 7.0);
        assert_relative_eq!(rgb.r, 11.0);
    }

    #[test]
    fn test_spectral_to_rgb_conserves_sum() {
        let s = Two::new([2.0, 4.0]);
        let rgb = spectral_to_rgb(&s);
        assert_relative_eq!(rgb.sum(), 6.0, epsilon = 1e-6);
        assert_relative_eq!(rgb.b, 1.0, epsilon = 1e-6);
        assert_relative_eq!(rgb.g, 3.0, epsilon = 1e-6);
        assert_relative_eq!(rgb.r, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_primaries_to_spectral() {
        let red: Six = rgb_to_spectral(&ColorRgb::RED);
        assert_eq!(red.0, [0.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
        let green: Two = rgb_to_spectral(&ColorRgb::GREEN);
        assert_relative_eq!(green[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(green[1], 0.5, epsilon = 1e-6);
        let white: Six = rgb_to_spectral(&ColorRgb::splat(1.0));
        assert!(white.0.iter().all(|v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_rgb_photon_energies_ordered() {
        let [r, g, b] = ColorRgb::photon_energies();
        assert!(r < g && g < b);
    }
}
