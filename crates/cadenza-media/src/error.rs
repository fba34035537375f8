//! Error types for media acquisition

use std::fmt;
use thiserror::Error;

/// Which external-tool invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Metadata,
    Download,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Metadata => f.write_str("metadata lookup"),
            Stage::Download => f.write_str("audio download"),
        }
    }
}

/// Acquisition error type
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// URL is not a recognized video URL
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    /// The tool exited with a non-zero status; `stderr` is already truncated
    #[error("{stage} failed (exit code {code:?}): {stderr}")]
    ToolFailed {
        stage: Stage,
        code: Option<i32>,
        stderr: String,
    },

    /// The metadata payload could not be parsed
    #[error("Failed to parse video information: {0}")]
    MalformedMetadata(#[from] serde_json::Error),

    /// The video is longer than the analysis ceiling
    #[error("Video duration {duration}s exceeds the {max_duration}s limit")]
    DurationExceeded { duration: f64, max_duration: f64 },

    /// The tool did not finish in time and was killed
    #[error("{stage} timed out after {seconds}s")]
    Timeout { stage: Stage, seconds: u64 },

    /// The tool could not be started or awaited
    #[error("Failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl AcquisitionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AcquisitionError::Timeout { .. })
    }
}

/// First `limit` characters of `text`
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
