// Classifier - threshold rule-based anomaly classification
//
// Applies threshold rules to an extracted feature set and returns a verdict
// with a human-readable reason. One-shot pure function of the features and
// the configured thresholds; no state machine.
//
// Rules:
// 1. THD-current above the configured threshold (always active)
// 2. RMS current above the overcurrent limit (active only when a limit is
//    configured)
//
// The reason text enumerates every triggered rule, comma-joined, so rules can
// be added without changing the return contract.

use crate::config::DetectionConfig;

use super::types::{AnomalyVerdict, FeatureSet};

/// Default THD-current threshold in percent
pub const DEFAULT_THD_THRESHOLD_PERCENT: f64 = 5.0;

/// AnomalyClassifier applies threshold rules to feature sets
pub struct AnomalyClassifier {
    thd_threshold_percent: f64,
    overcurrent_limit_amps: Option<f64>,
}

impl Default for AnomalyClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_THD_THRESHOLD_PERCENT)
    }
}

impl AnomalyClassifier {
    /// Create a classifier with only the THD rule active
    pub fn new(thd_threshold_percent: f64) -> Self {
        Self {
            thd_threshold_percent,
            overcurrent_limit_amps: None,
        }
    }

    /// Create a classifier from a detection configuration section
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            thd_threshold_percent: config.thd_threshold_percent,
            overcurrent_limit_amps: config.overcurrent_limit_amps,
        }
    }

    /// Enable the overcurrent rule
    pub fn with_overcurrent_limit(mut self, limit_amps: f64) -> Self {
        self.overcurrent_limit_amps = Some(limit_amps);
        self
    }

    /// Classify one feature set
    ///
    /// Monotone in the THD threshold: raising the threshold above the
    /// computed THD flips the verdict from anomalous to normal, never the
    /// reverse.
    pub fn classify(&self, features: &FeatureSet) -> AnomalyVerdict {
        let mut reasons = Vec::new();

        if features.thd_current_percent > self.thd_threshold_percent {
            reasons.push(format!(
                "High THD ({:.2}% > {}%)",
                features.thd_current_percent, self.thd_threshold_percent
            ));
        }

        if let Some(limit) = self.overcurrent_limit_amps {
            if features.i_rms > limit {
                reasons.push(format!(
                    "Overcurrent ({:.2} A > {} A)",
                    features.i_rms, limit
                ));
            }
        }

        if reasons.is_empty() {
            AnomalyVerdict {
                is_anomaly: false,
                reason: "Normal".to_string(),
            }
        } else {
            AnomalyVerdict {
                is_anomaly: true,
                reason: reasons.join(", "),
            }
        }
    }
}

/// Classify a feature set against a THD threshold
///
/// Convenience entry point matching the classifier's default rule set.
pub fn detect_anomaly(features: &FeatureSet, thd_threshold_percent: f64) -> AnomalyVerdict {
    AnomalyClassifier::new(thd_threshold_percent).classify(features)
}
