//! Timestamped progress log
//!
//! Each stage boundary of a run appends one line to the log file:
//!
//! ```text
//! 2024-Jan-05-14:02:31 : Data extraction complete. Initiating Transformation process
//! ```
//!
//! Messages are mirrored to the `log` facade at info level.

use crate::error::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Year-Monthname-Day-Hour:Minute:Second
pub const TIMESTAMP_FORMAT: &str = "%Y-%h-%d-%H:%M:%S";

/// Append-only progress log
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: Option<PathBuf>,
}

impl ProgressLog {
    /// Log to a file, created on first message
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Log only through the `log` facade
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append a timestamped message
    pub fn record(&self, message: &str) -> Result<()> {
        log::info!("{}", message);

        if let Some(path) = &self.path {
            let timestamp = Local::now().format(TIMESTAMP_FORMAT);
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{} : {}", timestamp, message)?;
        }

        Ok(())
    }
}
