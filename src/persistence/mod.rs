//! Persistence - Monitoring log and SQLite storage

mod csv_log;
mod database;

pub use csv_log::CsvLog;
pub use database::Database;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::LogRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write monitoring log {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode monitoring log row: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only destination for log records
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &LogRecord) -> Result<(), SinkError>;
}
