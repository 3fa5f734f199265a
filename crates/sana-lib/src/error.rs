use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SanaError>;

/// Failures surfaced by the pipeline. Nothing here is corrected automatically.
#[derive(Debug, Error)]
pub enum SanaError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line} is malformed ({reason}): {content:?}")]
    MalformedInput {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("invalid window spec: {0}")]
    InvalidWindowSpec(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("segment count must be >= 1")]
    InvalidSegmentCount,

    #[error("change-point detector failed: {0}")]
    DelegateFailure(String),

    #[error("no series loaded")]
    NotLoaded,
}

impl SanaError {
    pub(crate) fn malformed(line: usize, content: &str, reason: impl Into<String>) -> Self {
        SanaError::MalformedInput {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }
}
