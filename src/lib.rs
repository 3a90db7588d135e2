// Gridwatch - power-line waveform analysis engine
// FFT-based harmonic analysis and threshold anomaly detection

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod filter;
pub mod io;
pub mod stream;
pub mod synth;

// Re-exports for convenience
pub use analysis::{
    calculate_thd, detect_anomaly, AnomalyClassifier, AnomalyVerdict, FeatureExtractor,
    FeatureSet, HarmonicAnalysis, HarmonicPeak, Spectrum,
};
pub use config::AnalysisConfig;
pub use error::{ErrorCode, SignalError};
pub use stream::{evaluate_stream, StreamTick, WindowCursor, WindowedEvaluator};
