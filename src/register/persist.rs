//! Newline-delimited JSON record logs.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

use crate::generator::Readings;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One line of the raw metrics log.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsRecord {
    pub timestamp: u64,
    pub metrics: Readings,
}

/// One line of the exceedance log; `top_apps` serializes as `[[name, count], ...]`.
#[derive(Debug, Clone, Serialize)]
pub struct ExceedanceRecord {
    pub timestamp: u64,
    pub top_apps: Vec<(String, u64)>,
}

/// Appends JSON records, one per line, to a file.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    path: PathBuf,
}

impl RecordWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` as a single line, creating parent directories as needed.
    pub fn append<T: Serialize>(&self, record: &T) -> Result<(), PersistError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        self.write_line(&line).map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line)
    }
}

/// Delete a log left over from a previous run. Returns whether a file was removed.
pub fn remove_previous(path: &Path) -> Result<bool, PersistError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(PersistError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Seconds since the Unix epoch.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
