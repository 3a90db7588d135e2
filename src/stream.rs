// Stream module - windowed evaluation loop
//
// Drives the analysis pipeline repeatedly over a moving window, producing a
// fixed-cadence, fixed-size feed suitable for a rendering or alerting
// consumer. The iterator is infinite by design: when the window would run
// past the end of the signal the cursor wraps to index 0 and re-slices from
// the beginning (loop playback), never shortening the window.

use serde::Serialize;

use crate::analysis::{AnomalyClassifier, AnomalyVerdict, FeatureExtractor, FeatureSet};
use crate::error::{log_signal_error, SignalError};

/// Cursor state of the evaluation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowCursor {
    /// First sample index of the current window
    pub start: usize,
    /// Window length in samples (fixed for the life of the loop)
    pub window_len: usize,
    /// Cursor advance per tick, in samples
    pub step: usize,
}

/// One evaluation of the pipeline over a window
#[derive(Debug, Clone, Serialize)]
pub struct StreamTick {
    pub cursor: WindowCursor,
    pub features: FeatureSet,
    pub verdict: AnomalyVerdict,
}

/// Windowed evaluation loop over a pair of signal buffers
///
/// Each tick owns its own slice; there is no shared mutable state between
/// ticks beyond the cursor, which the iterator owns exclusively. The consumer
/// cancels by simply not requesting the next tick.
pub struct WindowedEvaluator<'a> {
    voltage: &'a [f64],
    current: &'a [f64],
    sample_rate: f64,
    extractor: FeatureExtractor,
    classifier: AnomalyClassifier,
    cursor: WindowCursor,
}

impl std::fmt::Debug for WindowedEvaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowedEvaluator")
            .field("voltage_len", &self.voltage.len())
            .field("current_len", &self.current.len())
            .field("sample_rate", &self.sample_rate)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl<'a> WindowedEvaluator<'a> {
    /// Create an evaluation loop over the supplied buffers
    ///
    /// `window_seconds` and `step_seconds` are converted to sample counts by
    /// rounding against `sample_rate`.
    ///
    /// # Errors
    /// - [`SignalError::LengthMismatch`] / [`SignalError::EmptySignal`] for
    ///   malformed buffers
    /// - [`SignalError::InvalidParameter`] when the window rounds below 2
    ///   samples (no spectrum to search) or the step rounds to 0 (the cursor
    ///   would never advance)
    /// - [`SignalError::WindowExceedsSignal`] when the window is longer than
    ///   the buffers
    pub fn new(
        voltage: &'a [f64],
        current: &'a [f64],
        sample_rate: f64,
        window_seconds: f64,
        step_seconds: f64,
        extractor: FeatureExtractor,
        classifier: AnomalyClassifier,
    ) -> Result<Self, SignalError> {
        if voltage.len() != current.len() {
            return Err(SignalError::LengthMismatch {
                voltage: voltage.len(),
                current: current.len(),
            });
        }
        if voltage.is_empty() {
            return Err(SignalError::EmptySignal);
        }

        let window_len = (window_seconds * sample_rate).round() as usize;
        if window_len < 2 {
            return Err(SignalError::InvalidParameter {
                name: "window_seconds",
                value: window_seconds,
            });
        }
        if window_len > voltage.len() {
            return Err(SignalError::WindowExceedsSignal {
                window: window_len,
                available: voltage.len(),
            });
        }

        let step = (step_seconds * sample_rate).round() as usize;
        if step == 0 {
            return Err(SignalError::InvalidParameter {
                name: "step_seconds",
                value: step_seconds,
            });
        }

        Ok(Self {
            voltage,
            current,
            sample_rate,
            extractor,
            classifier,
            cursor: WindowCursor {
                start: 0,
                window_len,
                step,
            },
        })
    }

    /// Current cursor position (the window the next tick will evaluate,
    /// before any wrap)
    pub fn cursor(&self) -> WindowCursor {
        self.cursor
    }
}

impl Iterator for WindowedEvaluator<'_> {
    type Item = StreamTick;

    fn next(&mut self) -> Option<StreamTick> {
        // Wrap instead of truncating: the window length is never shortened.
        // A window that would end exactly at the buffer end also wraps, so
        // the final step's worth of samples is only ever seen as history.
        if self.cursor.start + self.cursor.window_len >= self.voltage.len() {
            self.cursor.start = 0;
        }

        let start = self.cursor.start;
        let end = start + self.cursor.window_len;
        let v = &self.voltage[start..end];
        let i = &self.current[start..end];

        let features = match self.extractor.extract(v, i, self.sample_rate) {
            Ok(features) => features,
            Err(err) => {
                // Unreachable after construction validation; terminate the
                // feed rather than panic if it ever happens.
                log_signal_error(&err, "WindowedEvaluator::next");
                return None;
            }
        };
        let verdict = self.classifier.classify(&features);

        let tick = StreamTick {
            cursor: self.cursor,
            features,
            verdict,
        };

        self.cursor.start += self.cursor.step;
        Some(tick)
    }
}

/// Create a windowed evaluation loop with default pipeline components
///
/// # Arguments
/// * `voltage`, `current` - Equal-length signal buffers
/// * `sample_rate` - Sampling rate in Hz
/// * `window_seconds` - Window length in seconds
/// * `step_seconds` - Cursor advance per tick in seconds
/// * `fundamental_freq` - Expected grid frequency in Hz
/// * `thd_threshold_percent` - THD threshold for the classifier
pub fn evaluate_stream<'a>(
    voltage: &'a [f64],
    current: &'a [f64],
    sample_rate: f64,
    window_seconds: f64,
    step_seconds: f64,
    fundamental_freq: f64,
    thd_threshold_percent: f64,
) -> Result<WindowedEvaluator<'a>, SignalError> {
    WindowedEvaluator::new(
        voltage,
        current,
        sample_rate,
        window_seconds,
        step_seconds,
        FeatureExtractor::new(fundamental_freq),
        AnomalyClassifier::new(thd_threshold_percent),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 1000.0;

    fn sine(frequency: f64, rms_value: f64, samples: usize) -> Vec<f64> {
        let amplitude = rms_value * std::f64::consts::SQRT_2;
        (0..samples)
            .map(|i| {
                let t = i as f64 / FS;
                amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_tick_cadence_and_cursor_advance() {
        let voltage = sine(50.0, 230.0, 1000);
        let current = sine(50.0, 5.0, 1000);

        let stream = evaluate_stream(&voltage, &current, FS, 0.1, 0.05, 50.0, 5.0).unwrap();
        let ticks: Vec<StreamTick> = stream.take(4).collect();

        assert_eq!(ticks.len(), 4);
        assert_eq!(ticks[0].cursor.start, 0);
        assert_eq!(ticks[1].cursor.start, 50);
        assert_eq!(ticks[2].cursor.start, 100);
        assert_eq!(ticks[0].cursor.window_len, 100);
        assert_eq!(ticks[0].cursor.step, 50);
    }

    #[test]
    fn test_wrap_reproduces_first_window() {
        let voltage = sine(50.0, 230.0, 1000);
        let current = sine(50.0, 5.0, 1000);

        // Window 100, step 50 over 1000 samples: starts 0, 50, ..., 850;
        // start 900 would end exactly at the buffer end and wraps to 0.
        let stream = evaluate_stream(&voltage, &current, FS, 0.1, 0.05, 50.0, 5.0).unwrap();
        let ticks: Vec<StreamTick> = stream.take(20).collect();

        let wrapped = &ticks[18];
        assert_eq!(wrapped.cursor.start, 0, "Expected wrap to index 0");
        assert_eq!(wrapped.features, ticks[0].features);
        assert_eq!(ticks[19].cursor.start, 50);
        assert_eq!(ticks[19].features, ticks[1].features);
    }

    #[test]
    fn test_window_never_shortened() {
        let voltage = sine(50.0, 230.0, 250);
        let current = sine(50.0, 5.0, 250);

        let stream = evaluate_stream(&voltage, &current, FS, 0.1, 0.1, 50.0, 5.0).unwrap();
        for tick in stream.take(10) {
            assert_eq!(tick.cursor.window_len, 100);
            assert!(tick.cursor.start + tick.cursor.window_len <= 250);
        }
    }

    #[test]
    fn test_anomaly_flips_mid_signal() {
        // Clean current for the first half, 20% 3rd harmonic after
        let samples = 2000;
        let voltage = sine(50.0, 230.0, samples);
        let mut current = sine(50.0, 5.0, samples);
        let third = sine(150.0, 1.0, samples);
        for i in samples / 2..samples {
            current[i] += third[i];
        }

        let stream = evaluate_stream(&voltage, &current, FS, 0.1, 0.1, 50.0, 5.0).unwrap();
        let ticks: Vec<StreamTick> = stream.take(19).collect();

        assert!(!ticks[0].verdict.is_anomaly);
        assert!(
            ticks.iter().any(|t| t.verdict.is_anomaly),
            "Expected the harmonic-laden half to trigger the THD rule"
        );
        let anomalous = ticks.iter().find(|t| t.verdict.is_anomaly).unwrap();
        assert!(anomalous.verdict.reason.contains("High THD"));
    }

    #[test]
    fn test_rejects_mismatched_buffers() {
        let voltage = sine(50.0, 230.0, 1000);
        let current = sine(50.0, 5.0, 900);
        let err = evaluate_stream(&voltage, &current, FS, 0.1, 0.05, 50.0, 5.0).unwrap_err();
        assert!(matches!(err, SignalError::LengthMismatch { .. }));
    }

    #[test]
    fn test_rejects_oversized_window() {
        let voltage = sine(50.0, 230.0, 50);
        let current = sine(50.0, 5.0, 50);
        let err = evaluate_stream(&voltage, &current, FS, 0.1, 0.05, 50.0, 5.0).unwrap_err();
        assert_eq!(
            err,
            SignalError::WindowExceedsSignal {
                window: 100,
                available: 50
            }
        );
    }

    #[test]
    fn test_rejects_zero_step() {
        let voltage = sine(50.0, 230.0, 1000);
        let current = sine(50.0, 5.0, 1000);
        let err = evaluate_stream(&voltage, &current, FS, 0.1, 0.0001, 50.0, 5.0).unwrap_err();
        assert_eq!(
            err,
            SignalError::InvalidParameter {
                name: "step_seconds",
                value: 0.0001
            }
        );
    }
}
