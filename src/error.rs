//! Error types for bank-etl

use std::fmt;
use thiserror::Error;

/// Pipeline stage in which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Rates,
    Transform,
    SaveFile,
    SaveTable,
    Query,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Rates => "rates",
            Stage::Transform => "transform",
            Stage::SaveFile => "save-file",
            Stage::SaveTable => "save-table",
            Stage::Query => "query",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for bank-etl
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Parse error at row {row}: {reason}")]
    RowParse { row: usize, reason: String },

    #[error("Malformed value {value:?} at {location}")]
    MalformedValue { location: String, value: String },

    #[error("Source unavailable: {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Missing exchange rate for currency: {0}")]
    MissingRate(String),

    #[error("Persistence error: {target}: {reason}")]
    Persistence { target: String, reason: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<EtlError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EtlError {
    /// Attach the pipeline stage that raised this error
    pub fn in_stage(self, stage: Stage) -> Self {
        EtlError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Stage that failed, if the error was raised inside the pipeline
    pub fn stage(&self) -> Option<Stage> {
        match self {
            EtlError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, with any stage wrapping removed
    pub fn root(&self) -> &EtlError {
        match self {
            EtlError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn persistence(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        EtlError::Persistence {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for bank-etl operations
pub type Result<T> = std::result::Result<T, EtlError>;
