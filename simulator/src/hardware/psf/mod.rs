//! Point spread function models and their convolution kernels.
//!
//! A [`PsfModel`] answers one question: what fraction of a point source's
//! power, per band, lands in a pixel at a given offset from the source?
//! [`PointSpreadFunction`] wraps a model and turns it into a pyramid of
//! normalized, supersampled kernels of increasing size.
//!
//! # Kernel selection
//!
//! A kernel of size `n` truncates the PSF at `n / 2` pixels. The truncation
//! matters only if the power that would land just outside the kernel is
//! detectable. For each kernel we record the largest per-pixel weight on its
//! border; [`PointSpreadFunction::get_kernel`] picks the smallest kernel whose
//! border weight times the source's received power stays at or below the
//! minimum detectable power. Sources whose border contribution is detectable
//! in every kernel get the largest one.
//!
//! Kernel size therefore grows with brightness: a faint source gets the 3x3
//! kernel, since nothing it spreads past one pixel would register, while a
//! bright source keeps widening until its truncated wings fall below the
//! detection floor. The choice is driven by detectability of the truncated
//! tail, not by how faint the source is.

pub mod airy;
pub mod gaussian;

pub use airy::{AiryDiskPsf, AiryDiskPsfConfig};
pub use gaussian::GaussianPsf;

use std::fmt;

use log::debug;
use nalgebra::Vector2;
use ndarray::Array2;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::photometry::Spectral;

/// Default kernel sizes in pixels
pub const DEFAULT_KERNEL_SIZES: [usize; 4] = [3, 9, 27, 81];

/// Default number of sub-samples per pixel axis when building kernels
pub const DEFAULT_SUPERSAMPLING: usize = 10;

/// Which PSF the camera builds when no custom PSF is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultPsf {
    #[default]
    None,
    Airy,
    Gaussian,
}

/// Spectral point spread function.
pub trait PsfModel<S: Spectral>: fmt::Debug + Send + Sync {
    /// Fraction of a point source's power per pixel at `offset` pixels from
    /// the source, for each band.
    fn evaluate(&self, offset: &Vector2<f64>) -> S;

    fn name(&self) -> &'static str;
}

/// One level of the kernel pyramid.
#[derive(Debug, Clone)]
pub struct PsfKernel<S: Spectral> {
    /// Side length in pixels (odd)
    pub size: usize,
    /// Kernel weights, each band summing to one
    pub values: Array2<S>,
    /// Largest single-band weight on the kernel border
    pub edge_max: f32,
}

impl<S: Spectral> PsfKernel<S> {
    /// Kernel scaled by the source power: the power each pixel receives.
    pub fn response(&self, received_power: &S) -> Array2<S> {
        self.values.mapv(|w| w * *received_power)
    }
}

/// A PSF model plus its lazily built kernel pyramid.
pub struct PointSpreadFunction<S: Spectral> {
    model: Box<dyn PsfModel<S>>,
    kernel_sizes: Vec<usize>,
    supersampling: usize,
    kernels: OnceCell<Vec<PsfKernel<S>>>,
}

impl<S: Spectral> fmt::Debug for PointSpreadFunction<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PointSpreadFunction")
            .field("model", &self.model)
            .field("kernel_sizes", &self.kernel_sizes)
            .field("supersampling", &self.supersampling)
            .field("kernels_built", &self.kernels.get().is_some())
            .finish()
    }
}

impl<S: Spectral> PointSpreadFunction<S> {
    pub fn new(model: Box<dyn PsfModel<S>>) -> Self {
        Self {
            model,
            kernel_sizes: DEFAULT_KERNEL_SIZES.to_vec(),
            supersampling: DEFAULT_SUPERSAMPLING,
            kernels: OnceCell::new(),
        }
    }

    /// Airy-disk PSF sampled at `config.supersampling`.
    pub fn from_airy(config: AiryDiskPsfConfig) -> Self {
        Self::new(Box::new(AiryDiskPsf::<S>::new(config))).with_supersampling(config.supersampling)
    }

    /// Replace the kernel sizes. Even sizes are rounded up to the next odd
    /// size so every kernel has a center pixel; zero sizes are dropped.
    pub fn with_kernel_sizes(mut self, sizes: &[usize]) -> Self {
        let mut sizes: Vec<usize> = sizes
            .iter()
            .filter(|&&s| s > 0)
            .map(|&s| if s % 2 == 0 { s + 1 } else { s })
            .collect();
        sizes.sort_unstable();
        sizes.dedup();
        if sizes.is_empty() {
            sizes = DEFAULT_KERNEL_SIZES.to_vec();
        }
        self.kernel_sizes = sizes;
        self.kernels = OnceCell::new();
        self
    }

    pub fn with_supersampling(mut self, supersampling: usize) -> Self {
        self.supersampling = supersampling.max(1);
        self.kernels = OnceCell::new();
        self
    }

    pub fn model(&self) -> &dyn PsfModel<S> {
        self.model.as_ref()
    }

    pub fn kernel_sizes(&self) -> &[usize] {
        &self.kernel_sizes
    }

    pub fn supersampling(&self) -> usize {
        self.supersampling
    }

    pub fn evaluate(&self, offset: &Vector2<f64>) -> S {
        self.model.evaluate(offset)
    }

    /// Build a normalized `size x size` kernel by averaging the model over a
    /// `supersampling x supersampling` grid inside each pixel.
    pub fn make_kernel(&self, size: usize) -> PsfKernel<S> {
        let half = (size as f64 - 1.0) / 2.0;
        let ss = self.supersampling;
        let inv_ss = 1.0 / ss as f64;

        let mut values = Array2::from_shape_fn((size, size), |(row, col)| {
            let mut acc = S::default();
            for sy in 0..ss {
                for sx in 0..ss {
                    let dx = col as f64 - half + (sx as f64 + 0.5) * inv_ss - 0.5;
                    let dy = row as f64 - half + (sy as f64 + 0.5) * inv_ss - 0.5;
                    acc += self.model.evaluate(&Vector2::new(dx, dy));
                }
            }
            acc / (ss * ss) as f32
        });

        let mut totals = S::default();
        values.iter().for_each(|v| totals += *v);
        let norm = totals.map(|t| if t > 0.0 { 1.0 / t } else { 0.0 });
        values.mapv_inplace(|v| v * norm);

        let last = size - 1;
        let edge_max = values
            .indexed_iter()
            .filter(|((r, c), _)| *r == 0 || *c == 0 || *r == last || *c == last)
            .map(|(_, v)| v.max_value())
            .fold(0.0f32, f32::max);

        PsfKernel {
            size,
            values,
            edge_max,
        }
    }

    /// All kernels, smallest first. Built on first use.
    pub fn kernels(&self) -> &[PsfKernel<S>] {
        self.kernels.get_or_init(|| {
            debug!(
                "Building {} PSF kernels {:?} with {}x supersampling",
                self.model.name(),
                self.kernel_sizes,
                self.supersampling
            );
            self.kernel_sizes.iter().map(|&s| self.make_kernel(s)).collect()
        })
    }

    /// Smallest kernel whose truncation stays below `minimum_power`.
    ///
    /// # Arguments
    /// * `received_power` - Power of the point source, per band
    /// * `minimum_power` - Smallest per-pixel power the sensor can detect
    pub fn get_kernel(&self, received_power: &S, minimum_power: f32) -> &PsfKernel<S> {
        let kernels = self.kernels();
        let peak = received_power.max_value();
        let index = match kernels.iter().position(|k| k.edge_max * peak <= minimum_power) {
            Some(index) => index,
            None => {
                debug!(
                    "PSF truncation detectable at every kernel size (peak power {peak:e}); using {}x{}",
                    self.kernel_sizes[kernels.len() - 1],
                    self.kernel_sizes[kernels.len() - 1]
                );
                kernels.len() - 1
            }
        };
        &kernels[index]
    }

    /// Per-pixel power pattern of a point source: the selected kernel scaled
    /// by `received_power`.
    pub fn get_response(&self, received_power: &S, minimum_power: f32) -> Array2<S> {
        self.get_kernel(received_power, minimum_power)
            .response(received_power)
    }
}
