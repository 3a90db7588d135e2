// Harmonics module - Fundamental/harmonic peak location and THD
//
// This module finds the fundamental peak of a spectrum, the peaks at each
// harmonic multiple, and derives Total Harmonic Distortion from them.
//
// Search policy (deliberately asymmetric):
// - The fundamental must always resolve to something: if no bin falls inside
//   the search band, the single bin closest to the expected frequency is used.
// - Harmonics may legitimately be absent in short or clean signals: an order
//   whose band contains no bin, or whose target sits at or above Nyquist, is
//   silently skipped. Short windows therefore under-count THD.

use crate::error::SignalError;

use super::spectrum::SpectrumProcessor;
use super::types::{HarmonicAnalysis, HarmonicPeak, Spectrum};

/// Highest harmonic order included in THD by default (inclusive)
pub const DEFAULT_MAX_HARMONIC: u32 = 10;

/// Default half-width of the peak search band, Hz
pub const DEFAULT_SEARCH_WINDOW_HZ: f64 = 5.0;

/// Locates harmonic peaks in a spectrum and computes THD
pub struct HarmonicLocator {
    max_harmonic: u32,
    search_window_hz: f64,
}

impl Default for HarmonicLocator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HARMONIC, DEFAULT_SEARCH_WINDOW_HZ)
    }
}

impl HarmonicLocator {
    /// Create a new locator
    ///
    /// # Arguments
    /// * `max_harmonic` - Highest harmonic order searched (inclusive)
    /// * `search_window_hz` - Half-width of the band searched around each
    ///   expected frequency
    pub fn new(max_harmonic: u32, search_window_hz: f64) -> Self {
        Self {
            max_harmonic,
            search_window_hz,
        }
    }

    /// Locate the fundamental and harmonic peaks and compute THD
    ///
    /// `THD = sqrt(sum(amp_h^2)) / amp_fundamental * 100`, summed over the
    /// harmonics actually found. An empty harmonic set yields THD 0. A zero
    /// fundamental amplitude yields a non-finite THD; callers must guard
    /// against near-silent signals.
    ///
    /// # Arguments
    /// * `spectrum` - One-sided amplitude spectrum (at least one bin)
    /// * `fundamental_freq` - Expected fundamental frequency in Hz
    ///
    /// # Returns
    /// Tuple of (thd_percent, harmonic peaks in ascending order, fundamental peak)
    pub fn locate(
        &self,
        spectrum: &Spectrum,
        fundamental_freq: f64,
    ) -> (f64, Vec<HarmonicPeak>, HarmonicPeak) {
        let fundamental = self.find_fundamental(spectrum, fundamental_freq);

        let mut harmonics = Vec::new();
        let mut harmonic_energy = 0.0;

        for order in 2..=self.max_harmonic {
            let target = order as f64 * fundamental.frequency;

            // No aliasing lookups above Nyquist
            if target >= spectrum.nyquist() {
                continue;
            }

            if let Some(peak) = self.band_peak(spectrum, target) {
                harmonic_energy += peak.amplitude * peak.amplitude;
                harmonics.push(peak);
            }
        }

        let thd_percent = harmonic_energy.sqrt() / fundamental.amplitude * 100.0;
        (thd_percent, harmonics, fundamental)
    }

    /// Find the fundamental peak near the expected frequency
    ///
    /// Picks the maximum-amplitude bin within the search band, falling back
    /// to the bin numerically closest to `fundamental_freq` when the band is
    /// empty (degenerate or very short signals).
    fn find_fundamental(&self, spectrum: &Spectrum, fundamental_freq: f64) -> HarmonicPeak {
        if let Some(peak) = self.band_peak(spectrum, fundamental_freq) {
            return peak;
        }

        // Fallback: closest bin to the expected frequency
        let (idx, _) = spectrum
            .frequencies
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (*a - fundamental_freq).abs();
                let db = (*b - fundamental_freq).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or((0, &0.0));

        HarmonicPeak {
            frequency: spectrum.frequencies[idx],
            amplitude: spectrum.amplitudes[idx],
        }
    }

    /// Maximum-amplitude bin within `[target - w, target + w]`, if any bin
    /// falls inside the band
    fn band_peak(&self, spectrum: &Spectrum, target: f64) -> Option<HarmonicPeak> {
        let lo = target - self.search_window_hz;
        let hi = target + self.search_window_hz;

        let mut best: Option<HarmonicPeak> = None;
        for (freq, amp) in spectrum
            .frequencies
            .iter()
            .zip(spectrum.amplitudes.iter())
        {
            if *freq < lo || *freq > hi {
                continue;
            }
            match best {
                Some(peak) if peak.amplitude >= *amp => {}
                _ => {
                    best = Some(HarmonicPeak {
                        frequency: *freq,
                        amplitude: *amp,
                    })
                }
            }
        }
        best
    }
}

/// Compute the full THD analysis of one signal window
///
/// Convenience entry point combining spectrum computation and harmonic
/// location. The spectrum uses the harmonic-pipeline scaling (DC bin not
/// halved, see [`SpectrumProcessor::amplitude_spectrum`]).
///
/// # Arguments
/// * `signal` - Signal samples, length >= 2
/// * `sample_rate` - Sampling rate in Hz
/// * `fundamental_freq` - Expected fundamental frequency in Hz
///
/// # Errors
/// [`SignalError::SignalTooShort`] when fewer than 2 samples are supplied;
/// there is no spectrum to search in that case.
pub fn calculate_thd(
    signal: &[f64],
    sample_rate: f64,
    fundamental_freq: f64,
) -> Result<HarmonicAnalysis, SignalError> {
    calculate_thd_with(
        &SpectrumProcessor::new(),
        &HarmonicLocator::default(),
        signal,
        sample_rate,
        fundamental_freq,
    )
}

/// THD analysis reusing existing processor and locator instances
///
/// The windowed evaluation loop calls this per tick to avoid re-planning the
/// FFT for every window.
pub fn calculate_thd_with(
    processor: &SpectrumProcessor,
    locator: &HarmonicLocator,
    signal: &[f64],
    sample_rate: f64,
    fundamental_freq: f64,
) -> Result<HarmonicAnalysis, SignalError> {
    if signal.len() < 2 {
        return Err(SignalError::SignalTooShort {
            samples: signal.len(),
            required: 2,
        });
    }

    let spectrum = processor.amplitude_spectrum(signal, sample_rate);
    let (thd_percent, harmonics, fundamental) = locator.locate(&spectrum, fundamental_freq);

    Ok(HarmonicAnalysis {
        thd_percent,
        fundamental,
        harmonics,
        spectrum,
    })
}
