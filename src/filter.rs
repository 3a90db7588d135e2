// Filter module - zero-phase Butterworth low-pass filtering
//
// A 4th-order Butterworth low-pass realized as two cascaded biquad sections,
// applied forward and then backward over the signal so the net response has
// zero phase (no waveform distortion ahead of RMS/THD analysis).

use crate::error::SignalError;

/// Butterworth pole Q factors for a 4th-order cascade
const SECTION_Q: [f64; 2] = [0.5411961001461969, 1.3065629648763766];

struct BiquadSection {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadSection {
    /// Low-pass section at `cutoff_hz` with the given Q (bilinear transform)
    fn lowpass(cutoff_hz: f64, q: f64, sample_rate_hz: f64) -> Self {
        let w0 = 2.0 * std::f64::consts::PI * cutoff_hz / sample_rate_hz;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 - cos_w0) / 2.0) / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: ((1.0 - cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// 4th-order Butterworth low-pass filter
pub struct LowPassFilter {
    sections: Vec<BiquadSection>,
}

impl LowPassFilter {
    /// Design the filter
    ///
    /// # Errors
    /// [`SignalError::InvalidParameter`] when the cutoff is not strictly
    /// between 0 and the Nyquist frequency.
    pub fn butterworth(cutoff_hz: f64, sample_rate_hz: f64) -> Result<Self, SignalError> {
        let nyquist = sample_rate_hz / 2.0;
        if !(cutoff_hz > 0.0 && cutoff_hz < nyquist) {
            return Err(SignalError::InvalidParameter {
                name: "cutoff_hz",
                value: cutoff_hz,
            });
        }

        let sections = SECTION_Q
            .iter()
            .map(|&q| BiquadSection::lowpass(cutoff_hz, q, sample_rate_hz))
            .collect();

        Ok(Self { sections })
    }

    fn run(&mut self, signal: &[f64]) -> Vec<f64> {
        for section in &mut self.sections {
            section.reset();
        }
        signal
            .iter()
            .map(|&sample| {
                self.sections
                    .iter_mut()
                    .fold(sample, |acc, section| section.process(acc))
            })
            .collect()
    }

    /// Apply the filter forward and backward for zero phase
    ///
    /// The squared magnitude response makes the effective attenuation twice
    /// the single-pass attenuation in dB, matching the usual filtfilt
    /// behavior.
    pub fn zero_phase(&mut self, signal: &[f64]) -> Vec<f64> {
        let mut forward = self.run(signal);
        forward.reverse();
        let mut backward = self.run(&forward);
        backward.reverse();
        backward
    }
}

/// Filter the voltage and current channels of a signal table
pub fn filter_signal(
    data: &crate::io::SignalData,
    cutoff_hz: f64,
    sample_rate_hz: f64,
) -> Result<crate::io::SignalData, SignalError> {
    let mut filter = LowPassFilter::butterworth(cutoff_hz, sample_rate_hz)?;
    let voltage = filter.zero_phase(&data.voltage);
    let current = filter.zero_phase(&data.current);

    Ok(crate::io::SignalData {
        time: data.time.clone(),
        voltage,
        current,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rms;

    const FS: f64 = 1000.0;

    fn sine(frequency: f64, amplitude: f64, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|i| {
                let t = i as f64 / FS;
                amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_passband_preserved() {
        let signal = sine(50.0, 1.0, 4000);
        let mut filter = LowPassFilter::butterworth(200.0, FS).unwrap();
        let filtered = filter.zero_phase(&signal);

        // 50 Hz is deep in the passband of a 200 Hz cutoff
        let original_rms = rms(&signal);
        let filtered_rms = rms(&filtered[500..3500]);
        assert!(
            (filtered_rms - original_rms).abs() / original_rms < 0.02,
            "Expected passband RMS preserved, got {} vs {}",
            filtered_rms,
            original_rms
        );
    }

    #[test]
    fn test_stopband_attenuated() {
        let signal = sine(400.0, 1.0, 4000);
        let mut filter = LowPassFilter::butterworth(100.0, FS).unwrap();
        let filtered = filter.zero_phase(&signal);

        let filtered_rms = rms(&filtered[500..3500]);
        assert!(
            filtered_rms < 0.01,
            "Expected 400 Hz strongly attenuated by a 100 Hz low-pass, got RMS {}",
            filtered_rms
        );
    }

    #[test]
    fn test_zero_phase_no_shift() {
        // Peak of a passband sine must stay at the same index
        let signal = sine(20.0, 1.0, 2000);
        let mut filter = LowPassFilter::butterworth(200.0, FS).unwrap();
        let filtered = filter.zero_phase(&signal);

        let peak = |s: &[f64]| {
            s.iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(i, _)| i)
                .unwrap_or(0)
        };
        // First quarter-cycle peak of 20 Hz at 1 kHz sits at sample 12-13
        let original_peak = peak(&signal[..25]);
        let filtered_peak = peak(&filtered[..25]);
        assert!(
            (original_peak as i64 - filtered_peak as i64).abs() <= 2,
            "Expected no phase shift, peaks at {} vs {}",
            original_peak,
            filtered_peak
        );
    }

    #[test]
    fn test_invalid_cutoff_rejected() {
        assert!(LowPassFilter::butterworth(0.0, FS).is_err());
        assert!(LowPassFilter::butterworth(500.0, FS).is_err());
        assert!(LowPassFilter::butterworth(600.0, FS).is_err());
        assert!(LowPassFilter::butterworth(-5.0, FS).is_err());
    }
}
