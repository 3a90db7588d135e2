// Types module - Data structures for the waveform analysis pipeline
//
// This module defines the core data structures shared by spectral analysis,
// feature extraction, and anomaly classification.

use serde::Serialize;

/// One-sided amplitude spectrum of a real-valued signal
///
/// Frequency bins are `k * sample_rate / n` for `k = 0 .. n/2 - 1`, where `n`
/// is the length of the analyzed signal. Frequencies and amplitudes are always
/// the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    /// Frequency bins in Hz, non-negative and ascending
    pub frequencies: Vec<f64>,
    /// Normalized amplitudes aligned with `frequencies`
    pub amplitudes: Vec<f64>,
    /// Sampling rate the spectrum was computed at, Hz
    pub sample_rate: f64,
}

impl Spectrum {
    /// Number of frequency bins
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Nyquist frequency (upper bound of representable frequencies)
    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }
}

/// A spectral peak found near an expected harmonic frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HarmonicPeak {
    /// Bin frequency of the peak, Hz
    pub frequency: f64,
    /// Normalized amplitude at the peak bin
    pub amplitude: f64,
}

/// Result of a full THD analysis of one signal window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonicAnalysis {
    /// Total Harmonic Distortion in percent
    ///
    /// Non-finite when the fundamental amplitude is zero; callers must guard
    /// against near-silent signals before interpreting this value.
    pub thd_percent: f64,
    /// The resolved fundamental peak
    pub fundamental: HarmonicPeak,
    /// Harmonic peaks actually found (orders 2 and up; absent orders skipped)
    pub harmonics: Vec<HarmonicPeak>,
    /// The spectrum the peaks were located in
    pub spectrum: Spectrum,
}

/// Features extracted from one voltage/current window
///
/// Derived entirely from the supplied window; no state is carried between
/// windows. Fixed, named fields so the classifier contract is checked at
/// compile time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSet {
    /// RMS voltage, V
    pub v_rms: f64,
    /// RMS current, A
    pub i_rms: f64,
    /// Apparent power `v_rms * i_rms`, VA
    pub apparent_power: f64,
    /// THD of the current signal, percent
    pub thd_current_percent: f64,
}

/// Instantaneous power summary for one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerMetrics {
    pub v_rms: f64,
    pub i_rms: f64,
    /// Mean of `v(t) * i(t)` over the window (real power for pure loads), W
    pub avg_power: f64,
    pub max_power: f64,
    pub min_power: f64,
}

/// Verdict produced by the anomaly classifier for one feature set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyVerdict {
    pub is_anomaly: bool,
    /// Every triggered rule, comma-joined; "Normal" when nothing triggered
    pub reason: String,
}
