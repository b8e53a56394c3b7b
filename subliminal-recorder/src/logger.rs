use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use subliminal_core::TrialResult;
use tracing::{debug, info};

use crate::csv;
use crate::error::RecorderError;

const SESSION_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Appends one row per trial to `session_<id>.csv`.
#[derive(Debug)]
pub struct CsvTrialLogger {
    session_id: String,
    path: PathBuf,
    file: File,
    header_written: bool,
    rows: u64,
}

impl CsvTrialLogger {
    /// Session named after the current local time.
    pub fn create(dir: &Path) -> Result<Self, RecorderError> {
        let session_id = Local::now().format(SESSION_FORMAT).to_string();
        Self::with_session(dir, session_id)
    }

    /// Reopening an existing non-empty session file appends without a new
    /// header.
    pub fn with_session(dir: &Path, session_id: impl Into<String>) -> Result<Self, RecorderError> {
        let session_id = session_id.into();
        fs::create_dir_all(dir).map_err(|source| RecorderError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(format!("session_{session_id}.csv"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| RecorderError::Open {
                path: path.clone(),
                source,
            })?;
        let header_written = file
            .metadata()
            .map(|m| m.len() > 0)
            .map_err(|source| RecorderError::Open {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "session log opened");
        Ok(Self {
            session_id,
            path,
            file,
            header_written,
            rows: 0,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written by this logger.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn log(&mut self, result: &TrialResult) -> Result<(), RecorderError> {
        let mut chunk = String::new();
        if !self.header_written {
            chunk.push_str(&csv::header());
        }
        chunk.push_str(&csv::row(&self.session_id, result));
        self.file
            .write_all(chunk.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|source| RecorderError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.header_written = true;
        self.rows += 1;
        debug!(trial = result.trial_index, "trial row written");
        Ok(())
    }
}
