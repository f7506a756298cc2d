//! Radiometric transfer and sensor simulation.
//!
//! Power reaching a pixel from an extended source follows the étendue
//! relation
//!
//! ```text
//! P = η · A · Ω_pixel · L
//! ```
//!
//! with optical efficiency `η`, aperture area `A`, pixel solid angle `Ω` and
//! radiance `L`. Unresolved sources skip the solid angle: `P = η · A · E`.
//!
//! Photon counts per band are `t · P · filter / (h ν)`. With photon noise on,
//! bands expecting at least one photon are redrawn from a Poisson
//! distribution. The photosite then turns photons plus sensor noise into a
//! normalized digital value.
//!
//! Stochastic passes run over row chunks in parallel. Each call draws one base
//! seed from the camera's generator and every chunk derives its own stream
//! from it, so results depend on the seed but not on the thread count.

use std::time::Instant;

use log::{debug, warn};
use ndarray::Array2;
use rand::RngCore;

use shared::algo::process_array_in_parallel_chunks;
use shared::image_proc::sample_poisson;
use shared::image_size::Resolution;

use super::Camera;
use crate::geometry::{CameraFloat, MeshFloat};
use crate::hardware::error::CameraError;
use crate::photometry::{spectral_to_rgb, ColorRgb, Spectral};

/// Electrons a pixel must collect to count as a detection.
///
/// Used with unit quantum efficiency by the detection-threshold estimates;
/// the photosite's own QE and noise floor are not consulted.
pub const MINIMUM_DETECTABLE_ELECTRONS: f64 = 1.0;

/// Expected photon count for one band, redrawn from a Poisson distribution
/// when `photon_noise` is set and the expectation is at least one.
fn band_photons(
    power: f32,
    photon_energy: f64,
    exposure_time: f64,
    photon_noise: bool,
    rng: &mut dyn RngCore,
) -> f32 {
    let expected = exposure_time * power as f64 / photon_energy;
    if photon_noise && expected >= 1.0 {
        sample_poisson(expected, rng) as f32
    } else {
        expected as f32
    }
}

impl<S: Spectral, F: CameraFloat, M: MeshFloat<F>> Camera<S, F, M> {
    fn check_image_size(&self, shape: (usize, usize)) -> Result<(), CameraError> {
        let actual = Resolution::from_shape(shape);
        if actual != self.resolution {
            return Err(CameraError::ImageSizeMismatch {
                expected: self.resolution,
                actual,
            });
        }
        Ok(())
    }

    fn active_filter_mosaic(&self) -> Option<&Array2<S>> {
        if self.bayer_filter {
            self.filter_mosaic.as_ref()
        } else {
            None
        }
    }

    /// Power received by pixel `(i, j)` from a source of uniform radiance
    /// (W m⁻² sr⁻¹ per band) filling it.
    pub fn calculate_received_power(&self, radiance: &S, i: usize, j: usize) -> Result<S, CameraError> {
        let solid_angle = self.pixel_solid_angle(i, j)? as f64;
        let area = self.aperture()?.area();
        Ok(self.optical_efficiency * *radiance * (area * solid_angle) as f32)
    }

    /// Power collected from an unresolved source of irradiance `irradiance`
    /// (W m⁻² per band) at the aperture.
    pub fn calculate_received_power_irr(&self, irradiance: &S) -> Result<S, CameraError> {
        let area = self.aperture()?.area();
        Ok(self.optical_efficiency * *irradiance * area as f32)
    }

    /// Received power for a whole radiance image.
    pub fn calculate_received_power_image(
        &self,
        radiance: &Array2<S>,
    ) -> Result<Array2<S>, CameraError> {
        self.check_image_size(radiance.dim())?;
        let solid_angles = self.pixel_solid_angles()?;
        let area = self.aperture()?.area();
        let efficiency = self.optical_efficiency;
        let mut power = radiance.clone();
        power
            .iter_mut()
            .zip(solid_angles.iter())
            .for_each(|(p, &omega)| *p = efficiency * *p * (area * omega as f64) as f32);
        Ok(power)
    }

    /// Smallest per-pixel power that yields
    /// [`MINIMUM_DETECTABLE_ELECTRONS`] within one exposure at unit QE.
    pub fn minimum_detectable_power(&self) -> f64 {
        MINIMUM_DETECTABLE_ELECTRONS * S::mean_photon_energy() / self.exposure_time
    }

    /// Irradiance at the aperture below which a point source is lost.
    ///
    /// An approximation: it assumes unit quantum efficiency and a fixed
    /// [`MINIMUM_DETECTABLE_ELECTRONS`] threshold rather than the photosite's
    /// QE curve and noise floor. Infinite if the optics transmit nothing.
    pub fn compute_minimum_detectable_irradiance(&self) -> Result<f64, CameraError> {
        let area = self.aperture()?.area();
        let efficiency = self.optical_efficiency.mean() as f64;
        if efficiency <= 0.0 {
            return Ok(f64::INFINITY);
        }
        Ok(self.minimum_detectable_power() / (area * efficiency))
    }

    /// Per-pixel power pattern of a point source, spread by the PSF.
    ///
    /// The kernel size follows the source brightness; see
    /// [`crate::hardware::psf::PointSpreadFunction::get_kernel`].
    pub fn point_source_response(&self, irradiance: &S) -> Result<Array2<S>, CameraError> {
        let power = self.calculate_received_power_irr(irradiance)?;
        let minimum = self.minimum_detectable_power() as f32;
        Ok(self.psf()?.get_response(&power, minimum))
    }

    /// Photon counts per band for a received-power image (watts per band).
    pub fn get_photon_counts(&self, received_power: &Array2<S>) -> Result<Array2<S>, CameraError> {
        self.check_image_size(received_power.dim())?;
        self.precomputed()?;
        warn_non_finite(received_power.iter().filter(|p| !p.is_finite()).count());

        let energies = S::photon_energies();
        let mosaic = self.active_filter_mosaic();
        let exposure_time = self.exposure_time;
        let photon_noise = self.photon_noise;

        Ok(process_array_in_parallel_chunks(
            received_power.clone(),
            self.next_seed(),
            None,
            |first_row, chunk, rng| {
                for ((r, c), pixel) in chunk.indexed_iter_mut() {
                    let filtered = match mosaic {
                        Some(m) => *pixel * m[[first_row + r, c]],
                        None => *pixel,
                    };
                    *pixel = S::from_fn(|b| {
                        band_photons(filtered[b], energies[b], exposure_time, photon_noise, rng)
                    });
                }
            },
        ))
    }

    /// Photon counts per RGB channel. Spectral power (after the filter mosaic)
    /// is collapsed to red, green and blue before counting.
    pub fn get_photon_counts_rgb(
        &self,
        received_power: &Array2<S>,
    ) -> Result<Array2<ColorRgb>, CameraError> {
        self.check_image_size(received_power.dim())?;
        self.precomputed()?;
        warn_non_finite(received_power.iter().filter(|p| !p.is_finite()).count());

        let energies = ColorRgb::photon_energies();
        let mosaic = self.active_filter_mosaic();
        let exposure_time = self.exposure_time;
        let photon_noise = self.photon_noise;

        Ok(process_array_in_parallel_chunks(
            Array2::from_elem(received_power.dim(), ColorRgb::default()),
            self.next_seed(),
            None,
            |first_row, chunk, rng| {
                for ((r, c), pixel) in chunk.indexed_iter_mut() {
                    let j = first_row + r;
                    let power = match mosaic {
                        Some(m) => received_power[[j, c]] * m[[j, c]],
                        None => received_power[[j, c]],
                    };
                    let rgb = spectral_to_rgb(&power).to_array();
                    *pixel = ColorRgb::from_array(std::array::from_fn(|ch| {
                        band_photons(rgb[ch], energies[ch], exposure_time, photon_noise, rng)
                    }));
                }
            },
        ))
    }

    /// Normalized `[0, 1]` monochrome image for a received-power image.
    pub fn simulate_sensor(&self, received_power: &Array2<S>) -> Result<Array2<f32>, CameraError> {
        let start = Instant::now();
        let photons = self.get_photon_counts(received_power)?;
        let photosite = self.photosite()?;
        let noise_model = self.noise_model.as_deref();
        let exposure_time = self.exposure_time;

        let image = process_array_in_parallel_chunks(
            Array2::<f32>::zeros(photons.dim()),
            self.next_seed(),
            None,
            |first_row, chunk, rng| {
                for ((r, i), value) in chunk.indexed_iter_mut() {
                    let j = first_row + r;
                    let noise = noise_model.map_or(0.0, |m| m.simulate(rng, i, j, exposure_time));
                    *value = photosite.expose_pixel(&photons[[j, i]], noise);
                }
            },
        );
        debug!("{}: simulated sensor in {:?}", self.id, start.elapsed());
        Ok(image)
    }

    /// Normalized `[0, 1]` RGB image, with independent noise per channel.
    pub fn simulate_sensor_rgb(
        &self,
        received_power: &Array2<S>,
    ) -> Result<Array2<ColorRgb>, CameraError> {
        let start = Instant::now();
        let photons = self.get_photon_counts_rgb(received_power)?;
        let photosite = self.photosite()?;
        let noise_model = self.noise_model.as_deref();
        let exposure_time = self.exposure_time;

        let image = process_array_in_parallel_chunks(
            Array2::from_elem(photons.dim(), ColorRgb::default()),
            self.next_seed(),
            None,
            |first_row, chunk, rng| {
                for ((r, i), value) in chunk.indexed_iter_mut() {
                    let j = first_row + r;
                    let noise: [f32; 3] = std::array::from_fn(|_| {
                        noise_model.map_or(0.0, |m| m.simulate(rng, i, j, exposure_time))
                    });
                    *value = photosite.expose_pixel_rgb(&photons[[j, i]], noise);
                }
            },
        );
        debug!("{}: simulated RGB sensor in {:?}", self.id, start.elapsed());
        Ok(image)
    }
}

fn warn_non_finite(count: usize) {
    if count > 0 {
        warn!("received power has {count} non-finite pixels");
    }
}
