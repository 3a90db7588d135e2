use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use gridwatch::analysis::{power_metrics, AnomalyClassifier, FeatureExtractor, PowerMetrics};
use gridwatch::config::AnalysisConfig;
use gridwatch::filter::filter_signal;
use gridwatch::io::{load_signal, write_signal, SignalData};
use gridwatch::stream::WindowedEvaluator;
use gridwatch::synth::{generate_illegal_tap, generate_normal_load, SynthConfig};
use gridwatch::{calculate_thd, detect_anomaly};

#[derive(Parser, Debug)]
#[command(
    name = "gridwatch",
    about = "Power-line anomaly detection from voltage/current waveform captures"
)]
struct Cli {
    /// Optional JSON configuration file overriding analysis defaults
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Channel {
    Voltage,
    Current,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate synthetic normal-load and illegal-tap captures
    Generate {
        /// Directory the CSV fixtures are written to
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Compute THD and harmonic peaks for one channel of a capture
    Thd {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "current")]
        channel: Channel,
        /// Write the full report as JSON instead of a text summary
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Report RMS and power metrics for a capture
    Analyze { file: PathBuf },
    /// Run anomaly detection over a whole capture
    Detect {
        file: PathBuf,
        #[arg(long)]
        thd_threshold: Option<f64>,
    },
    /// Stream windowed verdicts as JSON lines (real-time playback feed)
    Stream {
        file: PathBuf,
        /// Number of ticks to emit (the loop itself is infinite)
        #[arg(long, default_value_t = 100)]
        ticks: usize,
    },
    /// Compare power metrics of a baseline capture against a suspect one
    Compare {
        baseline: PathBuf,
        suspect: PathBuf,
        /// Average-power increase (percent) flagged as a possible tap
        #[arg(long, default_value_t = 50.0)]
        power_threshold: f64,
    },
    /// Low-pass filter a capture and write the result
    Filter {
        file: PathBuf,
        out: PathBuf,
        #[arg(long, default_value_t = 200.0)]
        cutoff: f64,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(AnalysisConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Generate { out_dir, seed } => run_generate(&out_dir, seed),
        Commands::Thd {
            file,
            channel,
            output,
        } => run_thd(&config, &file, channel, output),
        Commands::Analyze { file } => run_analyze(&file),
        Commands::Detect {
            file,
            thd_threshold,
        } => run_detect(&config, &file, thd_threshold),
        Commands::Stream { file, ticks } => run_stream(&config, &file, ticks),
        Commands::Compare {
            baseline,
            suspect,
            power_threshold,
        } => run_compare(&baseline, &suspect, power_threshold),
        Commands::Filter { file, out, cutoff } => run_filter(&config, &file, &out, cutoff),
    }
}

fn load(path: &PathBuf) -> Result<SignalData> {
    load_signal(path).with_context(|| format!("loading capture {}", path.display()))
}

fn run_generate(out_dir: &PathBuf, seed: u64) -> Result<ExitCode> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let synth = SynthConfig {
        seed,
        ..SynthConfig::default()
    };

    let normal = generate_normal_load(&synth);
    let normal_path = out_dir.join("normal_load.csv");
    write_signal(&normal_path, &normal)?;
    println!("Wrote {} ({} samples)", normal_path.display(), normal.len());

    let tap = generate_illegal_tap(&synth);
    let tap_path = out_dir.join("illegal_tap.csv");
    write_signal(&tap_path, &tap)?;
    println!("Wrote {} ({} samples)", tap_path.display(), tap.len());

    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct ThdReportPayload<'a> {
    file: String,
    channel: &'a str,
    sample_rate_hz: f64,
    analysis: &'a gridwatch::HarmonicAnalysis,
}

fn run_thd(
    config: &AnalysisConfig,
    file: &PathBuf,
    channel: Channel,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let data = load(file)?;
    let fs = data.sample_rate(config.spectral.default_sample_rate_hz);
    let (name, signal) = match channel {
        Channel::Voltage => ("voltage", &data.voltage),
        Channel::Current => ("current", &data.current),
    };

    let analysis = calculate_thd(signal, fs, config.spectral.fundamental_freq_hz)
        .with_context(|| format!("computing THD of {}", name))?;

    if let Some(path) = output {
        let payload = ThdReportPayload {
            file: file.display().to_string(),
            channel: name,
            sample_rate_hz: fs,
            analysis: &analysis,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&payload)?)
            .with_context(|| format!("writing report {}", path.display()))?;
        println!("Report written to {}", path.display());
    } else {
        println!("File:        {}", file.display());
        println!("Channel:     {}", name);
        println!("Sample rate: {:.1} Hz", fs);
        println!(
            "Fundamental: {:.1} Hz ({:.3})",
            analysis.fundamental.frequency, analysis.fundamental.amplitude
        );
        println!("THD:         {:.2}%", analysis.thd_percent);
        for peak in &analysis.harmonics {
            println!(
                "  harmonic {:>6.1} Hz  amplitude {:.4}",
                peak.frequency, peak.amplitude
            );
        }
    }

    Ok(ExitCode::from(0))
}

fn print_metrics(label: &str, metrics: &PowerMetrics) {
    println!("{label}");
    println!("  Voltage RMS:    {:>10.2} V", metrics.v_rms);
    println!("  Current RMS:    {:>10.2} A", metrics.i_rms);
    println!("  Average power:  {:>10.2} W", metrics.avg_power);
    println!("  Max power:      {:>10.2} W", metrics.max_power);
    println!("  Min power:      {:>10.2} W", metrics.min_power);
}

fn run_analyze(file: &PathBuf) -> Result<ExitCode> {
    let data = load(file)?;
    let metrics = power_metrics(&data.voltage, &data.current)
        .with_context(|| format!("analyzing {}", file.display()))?;

    println!("Samples: {}", data.len());
    print_metrics("Power metrics:", &metrics);
    Ok(ExitCode::from(0))
}

fn run_detect(
    config: &AnalysisConfig,
    file: &PathBuf,
    thd_threshold: Option<f64>,
) -> Result<ExitCode> {
    let data = load(file)?;
    let fs = data.sample_rate(config.spectral.default_sample_rate_hz);
    let threshold = thd_threshold.unwrap_or(config.detection.thd_threshold_percent);

    let extractor = FeatureExtractor::new(config.spectral.fundamental_freq_hz);
    let features = extractor
        .extract(&data.voltage, &data.current, fs)
        .with_context(|| format!("extracting features from {}", file.display()))?;
    let verdict = detect_anomaly(&features, threshold);

    println!("Extracted features:");
    println!("  Voltage RMS:    {:>10.2} V", features.v_rms);
    println!("  Current RMS:    {:>10.2} A", features.i_rms);
    println!("  Apparent power: {:>10.2} VA", features.apparent_power);
    println!("  Current THD:    {:>10.2} %", features.thd_current_percent);
    println!();
    if verdict.is_anomaly {
        println!("ANOMALY: {}", verdict.reason);
        Ok(ExitCode::from(2))
    } else {
        println!("Status: {}", verdict.reason);
        Ok(ExitCode::from(0))
    }
}

fn run_stream(config: &AnalysisConfig, file: &PathBuf, ticks: usize) -> Result<ExitCode> {
    let data = load(file)?;
    let fs = data.sample_rate(config.spectral.default_sample_rate_hz);

    let stream = WindowedEvaluator::new(
        &data.voltage,
        &data.current,
        fs,
        config.stream.window_seconds,
        config.stream.step_seconds,
        FeatureExtractor::new(config.spectral.fundamental_freq_hz),
        AnomalyClassifier::from_config(&config.detection),
    )
    .with_context(|| format!("starting stream over {}", file.display()))?;

    for tick in stream.take(ticks) {
        println!("{}", serde_json::to_string(&tick)?);
    }

    Ok(ExitCode::from(0))
}

fn percent_change(baseline: f64, suspect: f64) -> f64 {
    (suspect - baseline) / baseline * 100.0
}

fn run_compare(baseline: &PathBuf, suspect: &PathBuf, power_threshold: f64) -> Result<ExitCode> {
    let base_data = load(baseline)?;
    let suspect_data = load(suspect)?;

    let base = power_metrics(&base_data.voltage, &base_data.current)
        .with_context(|| format!("analyzing {}", baseline.display()))?;
    let other = power_metrics(&suspect_data.voltage, &suspect_data.current)
        .with_context(|| format!("analyzing {}", suspect.display()))?;

    print_metrics(&format!("Baseline ({}):", baseline.display()), &base);
    print_metrics(&format!("Suspect  ({}):", suspect.display()), &other);

    let power_change = percent_change(base.avg_power, other.avg_power);
    println!();
    println!(
        "Change: voltage {:+.1}%, current {:+.1}%, power {:+.1}%",
        percent_change(base.v_rms, other.v_rms),
        percent_change(base.i_rms, other.i_rms),
        power_change
    );

    if power_change > power_threshold {
        println!(
            "ANOMALY: average power increased by {:.1}% (threshold {:.1}%)",
            power_change, power_threshold
        );
        Ok(ExitCode::from(2))
    } else {
        println!("Status: Normal");
        Ok(ExitCode::from(0))
    }
}

fn run_filter(
    config: &AnalysisConfig,
    file: &PathBuf,
    out: &PathBuf,
    cutoff: f64,
) -> Result<ExitCode> {
    let data = load(file)?;
    let fs = data.sample_rate(config.spectral.default_sample_rate_hz);

    let filtered = filter_signal(&data, cutoff, fs)
        .with_context(|| format!("filtering {} at {} Hz", file.display(), cutoff))?;
    write_signal(out, &filtered)?;
    println!("Wrote {} ({} samples)", out.display(), filtered.len());

    Ok(ExitCode::from(0))
}
