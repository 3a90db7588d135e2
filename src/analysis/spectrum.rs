// Spectrum module - Discrete Fourier transform computation
//
// This module computes one-sided amplitude spectra of real-valued signals.
// No taper is applied before the transform: the harmonic pipeline relies on
// the raw 2/N scaling so that a coherently sampled sinusoid of amplitude A
// lands at amplitude A in its frequency bin.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::{Arc, Mutex};

use super::types::Spectrum;

/// Spectrum processor that computes amplitude spectra from signal windows
pub struct SpectrumProcessor {
    fft_planner: Arc<Mutex<FftPlanner<f64>>>,
}

impl Default for SpectrumProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumProcessor {
    /// Create a new spectrum processor
    pub fn new() -> Self {
        Self {
            fft_planner: Arc::new(Mutex::new(FftPlanner::new())),
        }
    }

    /// Compute the one-sided amplitude spectrum used by the harmonic pipeline
    ///
    /// Scaling is `2/N` across all bins, including DC. Leaving the DC bin
    /// unhalved matches the spectrum the THD search runs against; the
    /// general-purpose [`magnitude_spectrum`](Self::magnitude_spectrum)
    /// variant halves it. The two call sites intentionally differ and must
    /// not be unified without revisiting the THD contract.
    ///
    /// # Arguments
    /// * `signal` - Real-valued samples, length >= 2
    /// * `sample_rate` - Sampling rate in Hz
    ///
    /// # Returns
    /// Spectrum with `floor(N/2)` bins at `k * sample_rate / N`
    pub fn amplitude_spectrum(&self, signal: &[f64], sample_rate: f64) -> Spectrum {
        self.one_sided(signal, sample_rate, false)
    }

    /// Compute a one-sided magnitude spectrum with the DC bin halved
    ///
    /// General-purpose variant for spectrum dumps and plotting consumers:
    /// the DC component carries no negative-frequency mirror, so doubling it
    /// would overstate the mean level.
    pub fn magnitude_spectrum(&self, signal: &[f64], sample_rate: f64) -> Spectrum {
        self.one_sided(signal, sample_rate, true)
    }

    fn one_sided(&self, signal: &[f64], sample_rate: f64, halve_dc: bool) -> Spectrum {
        let n = signal.len();
        let half = n / 2;

        let mut buffer: Vec<Complex<f64>> = signal
            .iter()
            .map(|&sample| Complex::new(sample, 0.0))
            .collect();

        {
            let mut planner = self.fft_planner.lock().expect("FFT planner poisoned");
            let fft = planner.plan_fft_forward(n);
            fft.process(&mut buffer);
        }

        let scale = 2.0 / n as f64;
        let mut amplitudes: Vec<f64> = buffer[..half].iter().map(|c| c.norm() * scale).collect();
        if halve_dc {
            if let Some(dc) = amplitudes.first_mut() {
                *dc /= 2.0;
            }
        }

        let bin_width = sample_rate / n as f64;
        let frequencies: Vec<f64> = (0..half).map(|k| k as f64 * bin_width).collect();

        Spectrum {
            frequencies,
            amplitudes,
            sample_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_wave(sample_rate: f64, frequency: f64, amplitude: f64, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|i| {
                let t = i as f64 / sample_rate;
                amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_bin_layout() {
        let processor = SpectrumProcessor::new();
        let signal = sine_wave(1000.0, 50.0, 1.0, 1000);
        let spectrum = processor.amplitude_spectrum(&signal, 1000.0);

        assert_eq!(spectrum.len(), 500);
        assert_eq!(spectrum.frequencies.len(), spectrum.amplitudes.len());
        assert_eq!(spectrum.frequencies[0], 0.0);
        assert!((spectrum.frequencies[1] - 1.0).abs() < 1e-9);
        assert_eq!(spectrum.nyquist(), 500.0);
    }

    #[test]
    fn test_pure_sine_amplitude_recovery() {
        let processor = SpectrumProcessor::new();
        // 50 Hz sine, coherently sampled over an integer number of cycles
        let signal = sine_wave(1000.0, 50.0, 3.0, 1000);
        let spectrum = processor.amplitude_spectrum(&signal, 1000.0);

        // Bin 50 corresponds to 50 Hz at 1 Hz resolution
        assert!(
            (spectrum.amplitudes[50] - 3.0).abs() < 1e-6,
            "Expected amplitude 3.0 at 50 Hz, got {}",
            spectrum.amplitudes[50]
        );
        // Neighbouring bins carry no leakage for coherent sampling
        assert!(spectrum.amplitudes[49].abs() < 1e-6);
        assert!(spectrum.amplitudes[51].abs() < 1e-6);
    }

    #[test]
    fn test_dc_bin_asymmetry() {
        let processor = SpectrumProcessor::new();
        // Constant signal: all energy in the DC bin
        let signal = vec![1.0; 256];

        let raw = processor.amplitude_spectrum(&signal, 1000.0);
        let halved = processor.magnitude_spectrum(&signal, 1000.0);

        assert!((raw.amplitudes[0] - 2.0).abs() < 1e-9);
        assert!((halved.amplitudes[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_determinism() {
        let processor = SpectrumProcessor::new();
        let signal = sine_wave(1000.0, 50.0, 1.0, 512);

        let a = processor.amplitude_spectrum(&signal, 1000.0);
        let b = processor.amplitude_spectrum(&signal, 1000.0);
        assert_eq!(a, b);
    }
}
