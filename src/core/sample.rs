//! Resource samples - Normalized CPU/memory readings and their log form

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Text shown wherever a reading could not be collected
pub const UNAVAILABLE: &str = "N/A";

/// A normalized utilization percentage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Reading {
    /// Percentage in the range 0.0-100.0
    Value(f64),
    /// The metric source failed or returned something unusable
    #[default]
    Unavailable,
}

impl Reading {
    /// Build a reading from a raw percentage.
    ///
    /// Non-finite values become `Unavailable`; parse artifacts slightly
    /// outside 0-100 are clamped.
    pub fn percent(raw: f64) -> Self {
        if raw.is_finite() {
            Self::Value(raw.clamp(0.0, 100.0))
        } else {
            Self::Unavailable
        }
    }

    /// Ratio of `part` to `whole` as a percentage
    pub fn ratio(part: u64, whole: u64) -> Self {
        if whole == 0 {
            return Self::Unavailable;
        }
        Self::percent(part as f64 / whole as f64 * 100.0)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Strictly greater than `limit`. Unavailable never exceeds anything.
    pub fn exceeds(&self, limit: f64) -> bool {
        self.value().is_some_and(|v| v > limit)
    }

    /// Two-decimal form used in the log and the UI ("95.00" or "N/A")
    pub fn formatted(&self) -> String {
        match self {
            Self::Value(v) => format!("{:.2}", v),
            Self::Unavailable => UNAVAILABLE.to_string(),
        }
    }

    /// Like `formatted`, with a percent sign when a value is present
    pub fn with_unit(&self) -> String {
        match self {
            Self::Value(v) => format!("{:.2}%", v),
            Self::Unavailable => UNAVAILABLE.to_string(),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// One monitoring observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    timestamp: DateTime<Local>,
    cpu: Reading,
    mem: Reading,
}

impl Sample {
    pub fn new(timestamp: DateTime<Local>, cpu: Reading, mem: Reading) -> Self {
        Self {
            timestamp,
            cpu,
            mem,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn cpu(&self) -> Reading {
        self.cpu
    }

    pub fn mem(&self) -> Reading {
        self.mem
    }

    /// "CPU: 95.00% | RAM: 50.00%"
    pub fn summary(&self) -> String {
        format!("CPU: {} | RAM: {}", self.cpu.with_unit(), self.mem.with_unit())
    }
}

/// A row of the monitoring log; field names are the `Date;Hour;CPU;RAM` header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Hour")]
    pub hour: String,
    #[serde(rename = "CPU")]
    pub cpu: String,
    #[serde(rename = "RAM")]
    pub ram: String,
}

impl From<&Sample> for LogRecord {
    fn from(sample: &Sample) -> Self {
        Self {
            date: sample.timestamp.format("%Y-%m-%d").to_string(),
            hour: sample.timestamp.format("%H:%M:%S").to_string(),
            cpu: sample.cpu.formatted(),
            ram: sample.mem.formatted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn percent_rejects_non_finite_values() {
        assert_eq!(Reading::percent(f64::NAN), Reading::Unavailable);
        assert_eq!(Reading::percent(f64::INFINITY), Reading::Unavailable);
        assert_eq!(Reading::percent(f64::NEG_INFINITY), Reading::Unavailable);
    }

    #[test]
    fn percent_clamps_parse_artifacts() {
        assert_eq!(Reading::percent(-0.1), Reading::Value(0.0));
        assert_eq!(Reading::percent(100.4), Reading::Value(100.0));
        assert_eq!(Reading::percent(42.5), Reading::Value(42.5));
    }

    #[test]
    fn ratio_with_zero_total_is_unavailable() {
        assert_eq!(Reading::ratio(4000, 0), Reading::Unavailable);
        assert_eq!(Reading::ratio(4000, 8000), Reading::Value(50.0));
    }

    #[test]
    fn unavailable_never_exceeds() {
        assert!(!Reading::Unavailable.exceeds(0.0));
        assert!(!Reading::Value(90.0).exceeds(90.0));
        assert!(Reading::Value(90.01).exceeds(90.0));
    }

    #[test]
    fn formatting_uses_two_decimals_or_na() {
        assert_eq!(Reading::Value(95.0).formatted(), "95.00");
        assert_eq!(Reading::Value(12.345).with_unit(), "12.35%");
        assert_eq!(Reading::Unavailable.formatted(), "N/A");
        assert_eq!(Reading::Unavailable.with_unit(), "N/A");
    }

    #[test]
    fn log_record_splits_date_and_hour() {
        let timestamp = Local.with_ymd_and_hms(2026, 10, 19, 15, 50, 1).unwrap();
        let sample = Sample::new(timestamp, Reading::Value(95.0), Reading::Unavailable);

        let record = LogRecord::from(&sample);
        assert_eq!(record.date, "2026-10-19");
        assert_eq!(record.hour, "15:50:01");
        assert_eq!((record.cpu.as_str(), record.ram.as_str()), ("95.00", "N/A"));
        assert_eq!(sample.summary(), "CPU: 95.00% | RAM: N/A");
    }
}
