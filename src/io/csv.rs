// CSV signal source
//
// Loads tabular waveform captures with `voltage` and `current` columns and an
// optional `time` column used only to infer the sampling rate. Columns are
// matched by header name; missing required columns are rejected, never
// silently coerced.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::SignalError;

/// In-memory signal table loaded from CSV
#[derive(Debug, Clone, PartialEq)]
pub struct SignalData {
    /// Timestamps in seconds, when the source had a `time` column
    pub time: Option<Vec<f64>>,
    pub voltage: Vec<f64>,
    pub current: Vec<f64>,
}

impl SignalData {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }

    /// Infer the sampling rate from the time column
    ///
    /// Uses the reciprocal of the first time step, `1 / (t[1] - t[0])`.
    /// Falls back to `default_hz` when the time column is absent, has fewer
    /// than two entries, or the computed step is non-positive (a
    /// configuration fallback, not an error).
    pub fn sample_rate(&self, default_hz: f64) -> f64 {
        match &self.time {
            Some(t) if t.len() > 1 => {
                let dt = t[1] - t[0];
                if dt > 0.0 {
                    1.0 / dt
                } else {
                    log::warn!(
                        "[Csv] Non-positive time step {}; falling back to {} Hz",
                        dt,
                        default_hz
                    );
                    default_hz
                }
            }
            _ => default_hz,
        }
    }
}

/// Load a signal table from a CSV file
///
/// # Errors
/// [`SignalError::ColumnMissing`] when `voltage` or `current` is absent,
/// [`SignalError::Csv`] for malformed rows or non-numeric values, and
/// [`SignalError::Io`] for filesystem failures.
pub fn load_signal<P: AsRef<Path>>(path: P) -> Result<SignalData, SignalError> {
    let file = File::open(&path)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let voltage_idx = column_index(&headers, "voltage")?;
    let current_idx = column_index(&headers, "current")?;
    let time_idx = headers.iter().position(|h| h.trim() == "time");

    let mut time = time_idx.map(|_| Vec::new());
    let mut voltage = Vec::new();
    let mut current = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        voltage.push(parse_field(&record, voltage_idx, "voltage", row)?);
        current.push(parse_field(&record, current_idx, "current", row)?);
        if let (Some(times), Some(idx)) = (time.as_mut(), time_idx) {
            times.push(parse_field(&record, idx, "time", row)?);
        }
    }

    log::info!(
        "[Csv] Loaded {} samples from {:?}",
        voltage.len(),
        path.as_ref()
    );

    Ok(SignalData {
        time,
        voltage,
        current,
    })
}

/// Write a signal table to a CSV file
///
/// Emits a `time, voltage, current` header when timestamps are present and
/// omits the time column entirely otherwise; no synthetic timestamps are
/// invented.
pub fn write_signal<P: AsRef<Path>>(path: P, data: &SignalData) -> Result<(), SignalError> {
    let mut writer = csv::Writer::from_path(&path).map_err(SignalError::from)?;

    match &data.time {
        Some(time) => {
            writer.write_record(["time", "voltage", "current"])?;
            for ((t, v), i) in time.iter().zip(&data.voltage).zip(&data.current) {
                writer.write_record([t.to_string(), v.to_string(), i.to_string()])?;
            }
        }
        None => {
            writer.write_record(["voltage", "current"])?;
            for (v, i) in data.voltage.iter().zip(&data.current) {
                writer.write_record([v.to_string(), i.to_string()])?;
            }
        }
    }

    writer.flush()?;
    log::info!(
        "[Csv] Wrote {} samples to {:?}",
        data.voltage.len(),
        path.as_ref()
    );
    Ok(())
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, SignalError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| SignalError::ColumnMissing {
            column: name.to_string(),
        })
}

fn parse_field(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    row: usize,
) -> Result<f64, SignalError> {
    let raw = record.get(idx).ok_or_else(|| SignalError::Csv {
        details: format!("Row {} is missing column '{}'", row + 1, column),
    })?;
    raw.trim().parse::<f64>().map_err(|_| SignalError::Csv {
        details: format!(
            "Row {} column '{}' is not numeric (got '{}')",
            row + 1,
            column,
            raw
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "gridwatch_csv_test_{}_{}.csv",
            std::process::id(),
            contents.len()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_with_time_column() {
        let path = write_temp("time,voltage,current\n0.0,1.0,0.1\n0.001,2.0,0.2\n");
        let data = load_signal(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(data.len(), 2);
        assert_eq!(data.voltage, vec![1.0, 2.0]);
        assert_eq!(data.current, vec![0.1, 0.2]);
        assert!((data.sample_rate(1000.0) - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_without_time_column_uses_default_rate() {
        let path = write_temp("voltage,current\n1.0,0.1\n2.0,0.2\n");
        let data = load_signal(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(data.time.is_none());
        assert_eq!(data.sample_rate(1234.0), 1234.0);
    }

    #[test]
    fn test_non_positive_time_step_falls_back() {
        let path = write_temp("time,voltage,current\n0.5,1.0,0.1\n0.5,2.0,0.2\n");
        let data = load_signal(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(data.sample_rate(1000.0), 1000.0);
    }

    #[test]
    fn test_missing_column_rejected() {
        let path = write_temp("time,voltage\n0.0,1.0\n");
        let err = load_signal(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            err,
            SignalError::ColumnMissing {
                column: "current".to_string()
            }
        );
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        let path = write_temp("time,voltage,current\n0.0,abc,0.1\n");
        let err = load_signal(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, SignalError::Csv { .. }));
    }

    #[test]
    fn test_write_then_load_roundtrip() {
        let data = SignalData {
            time: Some(vec![0.0, 0.001, 0.002]),
            voltage: vec![1.5, -2.25, 3.0],
            current: vec![0.5, 0.25, -0.125],
        };

        let mut path = std::env::temp_dir();
        path.push(format!("gridwatch_csv_roundtrip_{}.csv", std::process::id()));
        write_signal(&path, &data).unwrap();
        let loaded = load_signal(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, data);
    }
}
