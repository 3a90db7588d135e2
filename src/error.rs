// Error types for the gridwatch analysis pipeline
//
// This module defines the error type shared by signal loading, feature
// extraction, and the windowed evaluation loop, providing structured error
// handling with error codes suitable for CLI exit reporting.

use log::error;
use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Log a signal error with structured context
///
/// Logs signal errors with the numeric error code, the component where the
/// error occurred, and a human-readable message. Non-blocking, never panics.
pub fn log_signal_error(err: &SignalError, context: &str) {
    error!(
        "Signal error in {}: code={}, component=AnalysisPipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Signal and pipeline errors
///
/// These cover input-shape violations (rejected calls), configuration
/// problems, and I/O failures. Degenerate numeric conditions such as a silent
/// fundamental or an absent harmonic are *not* errors; they are absorbed into
/// best-effort numeric results by the analysis functions themselves.
///
/// Error code ranges: 1001-1008
#[derive(Debug, Clone, PartialEq)]
pub enum SignalError {
    /// A required CSV column is missing
    ColumnMissing { column: String },

    /// Voltage and current arrays differ in length
    LengthMismatch { voltage: usize, current: usize },

    /// An empty signal was supplied where samples are required
    EmptySignal,

    /// Signal is too short for spectral analysis
    SignalTooShort { samples: usize, required: usize },

    /// Evaluation window is longer than the available signal
    WindowExceedsSignal { window: usize, available: usize },

    /// A numeric parameter is out of its valid range
    InvalidParameter { name: &'static str, value: f64 },

    /// Underlying file I/O failed
    Io { details: String },

    /// CSV parsing failed
    Csv { details: String },
}

impl ErrorCode for SignalError {
    fn code(&self) -> i32 {
        match self {
            SignalError::ColumnMissing { .. } => 1001,
            SignalError::LengthMismatch { .. } => 1002,
            SignalError::EmptySignal => 1003,
            SignalError::SignalTooShort { .. } => 1004,
            SignalError::WindowExceedsSignal { .. } => 1005,
            SignalError::InvalidParameter { .. } => 1006,
            SignalError::Io { .. } => 1007,
            SignalError::Csv { .. } => 1008,
        }
    }

    fn message(&self) -> String {
        match self {
            SignalError::ColumnMissing { column } => {
                format!("CSV is missing required column '{}'", column)
            }
            SignalError::LengthMismatch { voltage, current } => {
                format!(
                    "Voltage and current must have equal length (got {} and {})",
                    voltage, current
                )
            }
            SignalError::EmptySignal => "Signal contains no samples".to_string(),
            SignalError::SignalTooShort { samples, required } => {
                format!(
                    "Signal too short for spectral analysis: need {} samples, got {}",
                    required, samples
                )
            }
            SignalError::WindowExceedsSignal { window, available } => {
                format!(
                    "Window of {} samples exceeds signal of {} samples",
                    window, available
                )
            }
            SignalError::InvalidParameter { name, value } => {
                format!("Parameter '{}' out of range (got {})", name, value)
            }
            SignalError::Io { details } => format!("I/O error: {}", details),
            SignalError::Csv { details } => format!("CSV error: {}", details),
        }
    }
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for SignalError {}

impl From<std::io::Error> for SignalError {
    fn from(err: std::io::Error) -> Self {
        SignalError::Io {
            details: err.to_string(),
        }
    }
}

impl From<csv::Error> for SignalError {
    fn from(err: csv::Error) -> Self {
        SignalError::Csv {
            details: err.to_string(),
        }
    }
}
