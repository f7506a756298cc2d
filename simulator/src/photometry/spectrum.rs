//! Fixed-size spectral samples for radiometric calculations.
//!
//! A spectral value is a short vector of per-band quantities (radiance, power,
//! photon counts, filter transmission, quantum efficiency). The band layout is
//! part of the type: [`SpectralData<N, MIN_NM, MAX_NM>`] splits the wavelength
//! range `[MIN_NM, MAX_NM]` into `N` equal-width bands, so two values can only
//! be combined when they describe the same bands.
//!
//! # Units
//!
//! All radiometry is SI: watts, metres, seconds, steradians. Wavelengths in the
//! type parameters are nanometres for readability; [`SpectralBand`] reports
//! metres.
//!
//! # Photon energy
//!
//! Each band carries the photon energy used to convert power to photon rate:
//! `E = h * nu_mean`, with `nu_mean` the mean of the band-edge frequencies.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Sub};

/// Physical constants in SI units.
pub struct SI {}

impl SI {
    /// Planck's constant
    /// Units: J s
    pub const PLANCK_CONSTANT: f64 = 6.62607015e-34;

    /// Speed of light in vacuum
    /// Units: m/s
    pub const SPEED_OF_LIGHT: f64 = 2.99792458e8;
}

/// Energy of a single photon of the given wavelength (metres), in joules.
pub fn photon_energy(wavelength_m: f64) -> f64 {
    SI::PLANCK_CONSTANT * SI::SPEED_OF_LIGHT / wavelength_m
}

/// Wavelength interval covered by one spectral band.
///
/// Bounds are kept in nanometres so that band edges built from integer
/// layouts compare exactly against channel boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralBand {
    /// Lower wavelength bound in nanometres
    pub min_nm: f64,
    /// Upper wavelength bound in nanometres
    pub max_nm: f64,
}

impl SpectralBand {
    pub fn from_nm(min_nm: f64, max_nm: f64) -> Self {
        Self { min_nm, max_nm }
    }

    /// Lower wavelength bound in metres
    pub fn min_wavelength(&self) -> f64 {
        self.min_nm * 1e-9
    }

    /// Upper wavelength bound in metres
    pub fn max_wavelength(&self) -> f64 {
        self.max_nm * 1e-9
    }

    /// Central wavelength in metres
    pub fn wavelength(&self) -> f64 {
        self.wavelength_nm() * 1e-9
    }

    /// Central wavelength in nanometres
    pub fn wavelength_nm(&self) -> f64 {
        0.5 * (self.min_nm + self.max_nm)
    }

    /// Band width in metres
    pub fn bandwidth(&self) -> f64 {
        (self.max_nm - self.min_nm) * 1e-9
    }

    /// Mean of the band-edge frequencies in Hz
    pub fn frequency(&self) -> f64 {
        0.5 * (SI::SPEED_OF_LIGHT / self.min_wavelength()
            + SI::SPEED_OF_LIGHT / self.max_wavelength())
    }

    /// Photon energy at the mean band frequency in joules
    pub fn photon_energy(&self) -> f64 {
        SI::PLANCK_CONSTANT * self.frequency()
    }

    /// Fraction of the band lying inside `[lo_nm, hi_nm]`.
    pub fn overlap_fraction(&self, lo_nm: f64, hi_nm: f64) -> f64 {
        let width = self.max_nm - self.min_nm;
        if width <= 0.0 {
            return 0.0;
        }
        (self.max_nm.min(hi_nm) - self.min_nm.max(lo_nm)).max(0.0) / width
    }
}

/// A fixed-size vector of per-band values.
///
/// Arithmetic is elementwise. Scalar multiplication and division broadcast.
pub trait Spectral:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Mul<f32, Output = Self>
    + Div<f32, Output = Self>
    + AddAssign
    + MulAssign<f32>
    + Index<usize, Output = f32>
    + IndexMut<usize>
{
    /// Number of bands
    const BANDS: usize;

    /// Metadata for band `index`.
    fn band(index: usize) -> SpectralBand;

    fn from_fn<G: FnMut(usize) -> f32>(f: G) -> Self;

    fn as_slice(&self) -> &[f32];

    fn splat(value: f32) -> Self {
        Self::from_fn(|_| value)
    }

    /// Build from a slice with exactly [`Self::BANDS`] entries.
    fn from_slice(values: &[f32]) -> Option<Self> {
        (values.len() == Self::BANDS).then(|| Self::from_fn(|i| values[i]))
    }

    fn map<G: FnMut(f32) -> f32>(&self, mut f: G) -> Self {
        Self::from_fn(|i| f(self[i]))
    }

    fn sum(&self) -> f32 {
        self.as_slice().iter().sum()
    }

    fn mean(&self) -> f32 {
        self.sum() / Self::BANDS as f32
    }

    fn max_value(&self) -> f32 {
        self.as_slice().iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    fn min_value(&self) -> f32 {
        self.as_slice().iter().copied().fold(f32::INFINITY, f32::min)
    }

    fn is_finite(&self) -> bool {
        self.as_slice().iter().all(|v| v.is_finite())
    }

    /// Per-band photon energies in joules.
    fn photon_energies() -> Vec<f64> {
        (0..Self::BANDS).map(|i| Self::band(i).photon_energy()).collect()
    }

    /// Photon energy averaged over the bands, in joules.
    fn mean_photon_energy() -> f64 {
        Self::photon_energies().iter().sum::<f64>() / Self::BANDS as f64
    }
}

/// `N` uniform bands spanning `MIN_NM..MAX_NM` nanometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralData<const N: usize, const MIN_NM: u32, const MAX_NM: u32>(pub [f32; N]);

/// Eight bands across the visible range.
pub type VisibleSpectrum = SpectralData<8, 400, 720>;

/// A single broad band, for panchromatic sensors.
pub type Panchromatic = SpectralData<1, 400, 700>;

impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> SpectralData<N, MIN_NM, MAX_NM> {
    pub fn new(values: [f32; N]) -> Self {
        Self(values)
    }
}

impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> Default
    for SpectralData<N, MIN_NM, MAX_NM>
{
    fn default() -> Self {
        Self([0.0; N])
    }
}

impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> Spectral
    for SpectralData<N, MIN_NM, MAX_NM>
{
    const BANDS: usize = N;

    fn band(index: usize) -> SpectralBand {
        let width = (MAX_NM as f64 - MIN_NM as f64) / N as f64;
        let lo = MIN_NM as f64 + width * index as f64;
        SpectralBand::from_nm(lo, lo + width)
    }

    fn from_fn<G: FnMut(usize) -> f32>(f: G) -> Self {
        Self(std::array::from_fn(f))
    }

    fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> Index<usize>
    for SpectralData<N, MIN_NM, MAX_NM>
{
    type Output = f32;
    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> IndexMut<usize>
    for SpectralData<N, MIN_NM, MAX_NM>
{
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.0[index]
    }
}

macro_rules! elementwise_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> $trait
            for SpectralData<N, MIN_NM, MAX_NM>
        {
            type Output = Self;
            fn $method(self, rhs: Self) -> Self {
                Self(std::array::from_fn(|i| self.0[i] $op rhs.0[i]))
            }
        }
    };
}

elementwise_op!(Add, add, +);
elementwise_op!(Sub, sub, -);
elementwise_op!(Mul, mul, *);
elementwise_op!(Div, div, /);

impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> Mul<f32>
    for SpectralData<N, MIN_NM, MAX_NM>
{
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self(self.0.map(|v| v * rhs))
    }
}

impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> Div<f32>
    for SpectralData<N, MIN_NM, MAX_NM>
{
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self(self.0.map(|v| v / rhs))
    }
}

impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> AddAssign
    for SpectralData<N, MIN_NM, MAX_NM>
{
    fn add_assign(&mut self, rhs: Self) {
        self.0.iter_mut().zip(rhs.0).for_each(|(a, b)| *a += b);
    }
}

impl<const N: usize, const MIN_NM: u32, const MAX_NM: u32> MulAssign<f32>
    for SpectralData<N, MIN_NM, MAX_NM>
{
    fn mul_assign(&mut self, rhs: f32) {
        self.0.iter_mut().for_each(|a| *a *= rhs);
    }
}
