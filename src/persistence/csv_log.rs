//! CSV monitoring log

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;

use super::{RecordSink, SinkError};
use crate::core::LogRecord;

/// `Date;Hour;CPU;RAM` file, one row per tick
pub struct CsvLog {
    path: PathBuf,
    /// Serializes appends so rows never interleave
    lock: Mutex<()>,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordSink for CsvLog {
    fn append(&self, record: &LogRecord) -> Result<(), SinkError> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let is_empty = file.metadata().map_err(|e| self.io_error(e))?.len() == 0;

        if is_empty {
            info!("Creating monitoring log at {:?}", self.path);
        }

        // the header comes from the record's field names, written only into a new file
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .has_headers(is_empty)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush().map_err(|e| self.io_error(e))
    }
}
