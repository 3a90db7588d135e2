//! Configuration management for analysis parameter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling threshold and window adjustments without recompilation. All
//! values are passed explicitly into the components that use them; there is
//! no process-wide mutable state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub spectral: SpectralConfig,
    pub detection: DetectionConfig,
    pub stream: StreamConfig,
}

/// Spectral analysis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Expected grid fundamental frequency in Hz
    pub fundamental_freq_hz: f64,
    /// Highest harmonic order included in THD (inclusive)
    pub max_harmonic: u32,
    /// Half-width of the peak search band around each expected frequency, Hz
    pub search_window_hz: f64,
    /// Sampling rate used when the time column is absent or degenerate
    pub default_sample_rate_hz: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            fundamental_freq_hz: 50.0,
            max_harmonic: 10,
            search_window_hz: 5.0,
            default_sample_rate_hz: 1000.0,
        }
    }
}

/// Anomaly detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// THD-current threshold in percent above which a window is anomalous
    pub thd_threshold_percent: f64,
    /// Optional RMS current limit in amps; disabled when absent
    pub overcurrent_limit_amps: Option<f64>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            thd_threshold_percent: 5.0,
            overcurrent_limit_amps: None,
        }
    }
}

/// Windowed evaluation loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Evaluation window length in seconds
    pub window_seconds: f64,
    /// Cursor advance per tick in seconds
    pub step_seconds: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            window_seconds: 0.1,
            step_seconds: 0.05,
        }
    }
}

impl Default for AnalysisConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            spectral: SpectralConfig::default(),
            detection: DetectionConfig::default(),
            stream: StreamConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or the default configuration if the file does
    /// not exist or contains invalid JSON.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.spectral.fundamental_freq_hz, 50.0);
        assert_eq!(config.spectral.max_harmonic, 10);
        assert_eq!(config.spectral.search_window_hz, 5.0);
        assert_eq!(config.detection.thd_threshold_percent, 5.0);
        assert!(config.detection.overcurrent_limit_amps.is_none());
        assert_eq!(config.stream.window_seconds, 0.1);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AnalysisConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            parsed.spectral.fundamental_freq_hz,
            config.spectral.fundamental_freq_hz
        );
        assert_eq!(
            parsed.detection.thd_threshold_percent,
            config.detection.thd_threshold_percent
        );
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = AnalysisConfig::load_from_file("/nonexistent/gridwatch.json");
        assert_eq!(config.spectral.fundamental_freq_hz, 50.0);
    }
}
