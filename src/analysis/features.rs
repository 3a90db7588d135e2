// Features module - RMS and power feature extraction
//
// Computes the per-window feature set consumed by the anomaly classifier:
// RMS voltage/current, apparent power, and THD of the current signal.
// Purely a function of the supplied window; no cross-window memory.

use crate::error::SignalError;

use super::harmonics::{calculate_thd_with, HarmonicLocator};
use super::spectrum::SpectrumProcessor;
use super::types::{FeatureSet, PowerMetrics};

/// Root-mean-square of a signal: `sqrt(mean(x^2))`
///
/// NaN for an empty slice; callers validate shape first.
pub fn rms(signal: &[f64]) -> f64 {
    let sum_sq: f64 = signal.iter().map(|x| x * x).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

/// FeatureExtractor computes the per-window feature set
///
/// Owns the FFT processor and harmonic locator so repeated extraction (the
/// windowed evaluation loop) reuses the planned transforms.
pub struct FeatureExtractor {
    processor: SpectrumProcessor,
    locator: HarmonicLocator,
    fundamental_freq: f64,
}

impl FeatureExtractor {
    /// Create a feature extractor with default harmonic search parameters
    ///
    /// # Arguments
    /// * `fundamental_freq` - Expected grid frequency in Hz (e.g. 50)
    pub fn new(fundamental_freq: f64) -> Self {
        Self::with_locator(fundamental_freq, HarmonicLocator::default())
    }

    /// Create a feature extractor with a custom harmonic locator
    pub fn with_locator(fundamental_freq: f64, locator: HarmonicLocator) -> Self {
        Self {
            processor: SpectrumProcessor::new(),
            locator,
            fundamental_freq,
        }
    }

    /// Extract the feature set from one voltage/current window
    ///
    /// # Arguments
    /// * `voltage` - Voltage samples
    /// * `current` - Current samples, same length as `voltage`
    /// * `sample_rate` - Sampling rate in Hz
    ///
    /// # Errors
    /// [`SignalError::EmptySignal`] for empty input,
    /// [`SignalError::LengthMismatch`] when the arrays differ in length, and
    /// [`SignalError::SignalTooShort`] when the window is too short for the
    /// THD spectrum. These are caller contract failures, not recoverable
    /// conditions.
    pub fn extract(
        &self,
        voltage: &[f64],
        current: &[f64],
        sample_rate: f64,
    ) -> Result<FeatureSet, SignalError> {
        validate_pair(voltage, current)?;

        let v_rms = rms(voltage);
        let i_rms = rms(current);
        let apparent_power = v_rms * i_rms;

        let analysis = calculate_thd_with(
            &self.processor,
            &self.locator,
            current,
            sample_rate,
            self.fundamental_freq,
        )?;

        Ok(FeatureSet {
            v_rms,
            i_rms,
            apparent_power,
            thd_current_percent: analysis.thd_percent,
        })
    }
}

/// Compute instantaneous-power metrics for one window
///
/// `p(t) = v(t) * i(t)`; reports RMS values plus the mean, maximum, and
/// minimum of the instantaneous power. Used by the reporting and comparison
/// surfaces rather than the classifier.
pub fn power_metrics(voltage: &[f64], current: &[f64]) -> Result<PowerMetrics, SignalError> {
    validate_pair(voltage, current)?;

    let mut sum = 0.0;
    let mut max_power = f64::NEG_INFINITY;
    let mut min_power = f64::INFINITY;
    for (v, i) in voltage.iter().zip(current.iter()) {
        let p = v * i;
        sum += p;
        max_power = max_power.max(p);
        min_power = min_power.min(p);
    }

    Ok(PowerMetrics {
        v_rms: rms(voltage),
        i_rms: rms(current),
        avg_power: sum / voltage.len() as f64,
        max_power,
        min_power,
    })
}

fn validate_pair(voltage: &[f64], current: &[f64]) -> Result<(), SignalError> {
    if voltage.len() != current.len() {
        return Err(SignalError::LengthMismatch {
            voltage: voltage.len(),
            current: current.len(),
        });
    }
    if voltage.is_empty() {
        return Err(SignalError::EmptySignal);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 1000.0;

    fn sine(frequency: f64, rms_value: f64, phase: f64, samples: usize) -> Vec<f64> {
        let amplitude = rms_value * std::f64::consts::SQRT_2;
        (0..samples)
            .map(|i| {
                let t = i as f64 / FS;
                amplitude * (2.0 * std::f64::consts::PI * frequency * t + phase).sin()
            })
            .collect()
    }

    #[test]
    fn test_rms_of_sine() {
        let signal = sine(50.0, 230.0, 0.0, 10_000);
        let value = rms(&signal);
        assert!(
            (value - 230.0).abs() < 0.5,
            "Expected RMS ~230, got {}",
            value
        );
    }

    #[test]
    fn test_rms_of_constant() {
        let signal = vec![-3.0; 100];
        assert!((rms(&signal) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_extract_clean_signals() {
        let voltage = sine(50.0, 230.0, 0.0, 10_000);
        let current = sine(50.0, 5.0, -0.1, 10_000);

        let extractor = FeatureExtractor::new(50.0);
        let features = extractor.extract(&voltage, &current, FS).unwrap();

        assert!((features.v_rms - 230.0).abs() < 0.5);
        assert!((features.i_rms - 5.0).abs() < 0.05);
        assert!((features.apparent_power - 1150.0).abs() < 5.0);
        assert!(features.thd_current_percent < 0.1);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let extractor = FeatureExtractor::new(50.0);
        let err = extractor
            .extract(&[1.0, 2.0, 3.0], &[1.0, 2.0], FS)
            .unwrap_err();
        assert_eq!(
            err,
            SignalError::LengthMismatch {
                voltage: 3,
                current: 2
            }
        );
    }

    #[test]
    fn test_empty_input_rejected() {
        let extractor = FeatureExtractor::new(50.0);
        let err = extractor.extract(&[], &[], FS).unwrap_err();
        assert_eq!(err, SignalError::EmptySignal);
    }

    #[test]
    fn test_single_sample_rejected_by_thd() {
        let extractor = FeatureExtractor::new(50.0);
        let err = extractor.extract(&[1.0], &[1.0], FS).unwrap_err();
        assert!(matches!(err, SignalError::SignalTooShort { .. }));
    }

    #[test]
    fn test_power_metrics_resistive_load() {
        // In-phase voltage and current: avg power equals v_rms * i_rms
        let voltage = sine(50.0, 230.0, 0.0, 10_000);
        let current = sine(50.0, 5.0, 0.0, 10_000);

        let metrics = power_metrics(&voltage, &current).unwrap();
        assert!((metrics.avg_power - 1150.0).abs() < 5.0);
        assert!(metrics.max_power > metrics.avg_power);
        assert!(metrics.min_power <= 0.0 + 1e-6);
    }
}
