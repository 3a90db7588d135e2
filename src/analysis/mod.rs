// Analysis - signal-to-decision pipeline for power waveforms
//
// This module implements the core pipeline: spectral estimation, harmonic
// location, feature extraction, and anomaly classification.
//
// Module organization:
// - types: Data structures (Spectrum, FeatureSet, AnomalyVerdict, ...)
// - spectrum: FFT amplitude spectrum computation
// - harmonics: Fundamental/harmonic peak search and THD
// - features: RMS, apparent power, and per-window feature sets
// - classifier: Threshold rules producing verdicts
//
// Data flow:
//   raw samples -> SpectrumProcessor -> HarmonicLocator
//                                   -> FeatureExtractor -> AnomalyClassifier
//
// Every stage is a deterministic, stateless-per-call computation over
// in-memory arrays: identical input always yields an identical result.

pub mod classifier;
pub mod features;
pub mod harmonics;
pub mod spectrum;
pub mod types;

pub use classifier::{detect_anomaly, AnomalyClassifier};
pub use features::{power_metrics, rms, FeatureExtractor};
pub use harmonics::{calculate_thd, HarmonicLocator};
pub use spectrum::SpectrumProcessor;
pub use types::{
    AnomalyVerdict, FeatureSet, HarmonicAnalysis, HarmonicPeak, PowerMetrics, Spectrum,
};
