// Synth module - synthetic waveform fixtures
//
// Generates the two reference scenarios used for development and testing:
// a normal resistive load, and an unauthorized tap that switches in partway
// through the capture with harmonic-rich current (non-linear electronics).
// Generation is seeded so fixtures are reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::io::SignalData;

/// Parameters for synthetic waveform generation
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Sampling rate, Hz
    pub sample_rate_hz: f64,
    /// Capture length, seconds
    pub duration_seconds: f64,
    /// Grid frequency, Hz
    pub grid_freq_hz: f64,
    /// RMS voltage of the supply, V
    pub voltage_rms: f64,
    /// RMS current of the legitimate load, A
    pub current_rms: f64,
    /// Current noise as a fraction of the load RMS
    pub noise_level: f64,
    /// Time the tap switches in, seconds
    pub tap_start_seconds: f64,
    /// Additional RMS current drawn by the tap, A
    pub tap_current_rms: f64,
    /// RNG seed for reproducible fixtures
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 1000.0,
            duration_seconds: 10.0,
            grid_freq_hz: 50.0,
            voltage_rms: 230.0,
            current_rms: 5.0,
            noise_level: 0.05,
            tap_start_seconds: 3.0,
            tap_current_rms: 10.0,
            seed: 42,
        }
    }
}

/// Time vector with `duration * fs` samples at fixed spacing, endpoint excluded
pub fn time_vector(duration_seconds: f64, sample_rate_hz: f64) -> Vec<f64> {
    let n = (duration_seconds * sample_rate_hz) as usize;
    (0..n).map(|i| i as f64 / sample_rate_hz).collect()
}

/// Sine wave scaled so the result has the requested RMS
pub fn sine_wave(time: &[f64], rms: f64, freq_hz: f64, phase: f64) -> Vec<f64> {
    let amplitude = rms * std::f64::consts::SQRT_2;
    time.iter()
        .map(|t| amplitude * (2.0 * std::f64::consts::PI * freq_hz * t + phase).sin())
        .collect()
}

fn add_noise(signal: &mut [f64], sigma: f64, rng: &mut StdRng) {
    // Normal::new only fails for non-finite sigma
    let normal = Normal::new(0.0, sigma.abs().max(f64::MIN_POSITIVE))
        .expect("Gaussian sigma must be finite");
    for sample in signal.iter_mut() {
        *sample += normal.sample(rng);
    }
}

fn add_in_place(dst: &mut [f64], src: &[f64], gain: f64) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d += gain * s;
    }
}

/// Generate a normal (linear, slightly lagging) load capture
pub fn generate_normal_load(config: &SynthConfig) -> SignalData {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let t = time_vector(config.duration_seconds, config.sample_rate_hz);

    let mut voltage = sine_wave(&t, config.voltage_rms, config.grid_freq_hz, 0.0);
    add_noise(&mut voltage, config.voltage_rms * 0.01, &mut rng);

    let mut current = sine_wave(&t, config.current_rms, config.grid_freq_hz, -0.1);
    add_noise(&mut current, config.current_rms * config.noise_level, &mut rng);

    SignalData {
        time: Some(t),
        voltage,
        current,
    }
}

/// Generate a capture where an unauthorized tap switches in
///
/// From `tap_start_seconds` on, the current gains an extra fundamental
/// component plus 20% 3rd-harmonic and 10% 5th-harmonic content, the
/// signature of a non-linear tapped load.
pub fn generate_illegal_tap(config: &SynthConfig) -> SignalData {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let t = time_vector(config.duration_seconds, config.sample_rate_hz);

    let mut voltage = sine_wave(&t, config.voltage_rms, config.grid_freq_hz, 0.0);
    let mut current = sine_wave(&t, config.current_rms, config.grid_freq_hz, -0.1);

    let mut tap = sine_wave(&t, config.tap_current_rms, config.grid_freq_hz, -0.1);
    let third = sine_wave(&t, config.tap_current_rms, 3.0 * config.grid_freq_hz, 0.0);
    let fifth = sine_wave(&t, config.tap_current_rms, 5.0 * config.grid_freq_hz, 0.0);
    add_in_place(&mut tap, &third, 0.2);
    add_in_place(&mut tap, &fifth, 0.1);

    let tap_start = (config.tap_start_seconds * config.sample_rate_hz) as usize;
    for idx in tap_start..current.len() {
        current[idx] += tap[idx];
    }

    add_noise(&mut voltage, config.voltage_rms * 0.01, &mut rng);
    add_noise(&mut current, config.current_rms * config.noise_level, &mut rng);

    SignalData {
        time: Some(t),
        voltage,
        current,
    }
}
