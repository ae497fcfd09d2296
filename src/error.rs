// 🚨 Error Taxonomy
// Fatal pipeline errors vs. per-record issues that are only counted

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop (or short-circuit) a pipeline run.
///
/// These travel inside `anyhow::Error` so callers can add context freely and
/// still recover the variant with `downcast_ref::<PipelineError>()`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("The file '{}' was not found.", .path.display())]
    MissingFile { path: PathBuf },

    #[error("No data at stage '{stage}': {message}")]
    NoData { stage: String, message: String },

    #[error("Failed to write '{}': {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn no_data(stage: &str, message: &str) -> Self {
        PipelineError::NoData {
            stage: stage.to_string(),
            message: message.to_string(),
        }
    }
}

/// Why a single raw line was dropped by the parser.
///
/// Never fatal: the parser logs it and bumps the invalid counter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordIssue {
    #[error("expected 8 fields, found {0}")]
    FieldCount(usize),

    #[error("{field} is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} failed rule: {rule}")]
    Rule { field: &'static str, rule: &'static str },
}
