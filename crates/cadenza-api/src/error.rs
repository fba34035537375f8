//! Error taxonomy of the request router

use cadenza_media::{seconds_value, AcquisitionError, Stage};
use serde_json::{json, Value};
use thiserror::Error;

use crate::response::ApiResponse;

/// Every way a request can fail, one variant per response class
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("Video duration {duration}s exceeds the {max_duration}s limit")]
    DurationExceeded { duration: f64, max_duration: f64 },

    /// Metadata lookup failed; `stderr` is already truncated
    #[error("Failed to fetch video information: {stderr}")]
    MetadataFailed { stderr: String },

    #[error("Failed to parse video information")]
    MalformedMetadata,

    /// Download failed; `stderr` is already truncated
    #[error("Failed to download audio: {stderr}")]
    DownloadFailed { stderr: String },

    #[error("{0}")]
    Timeout(String),

    #[error("Audio analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Endpoint not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingUrl | ApiError::InvalidUrl | ApiError::DurationExceeded { .. } => 400,
            ApiError::NotFound => 404,
            ApiError::Timeout(_) => 504,
            ApiError::MetadataFailed { .. }
            | ApiError::MalformedMetadata
            | ApiError::DownloadFailed { .. }
            | ApiError::AnalysisFailed(_)
            | ApiError::Internal(_) => 500,
        }
    }

    /// Client-facing message and optional details
    fn envelope(&self) -> (String, Option<Value>) {
        match self {
            ApiError::MissingUrl | ApiError::InvalidUrl | ApiError::NotFound | ApiError::MalformedMetadata => {
                (self.to_string(), None)
            }
            ApiError::DurationExceeded {
                duration,
                max_duration,
            } => (
                format!(
                    "Video duration exceeds {} minute limit",
                    seconds_value(max_duration / 60.0)
                ),
                Some(json!({
                    "duration": seconds_value(*duration),
                    "maxDuration": seconds_value(*max_duration),
                })),
            ),
            ApiError::MetadataFailed { stderr } => (
                "Failed to fetch video information".to_string(),
                Some(Value::String(stderr.clone())),
            ),
            ApiError::DownloadFailed { stderr } => (
                "Failed to download audio".to_string(),
                Some(json!({ "stderr": stderr })),
            ),
            ApiError::Timeout(_) => ("Request timeout".to_string(), None),
            ApiError::AnalysisFailed(message) => (
                "Audio analysis failed".to_string(),
                Some(Value::String(message.clone())),
            ),
            ApiError::Internal(e) => (format!("Internal server error: {}", e), None),
        }
    }

    pub fn into_response(self) -> ApiResponse {
        let (message, details) = self.envelope();
        ApiResponse::error(self.status_code(), &message, details)
    }
}

impl From<AcquisitionError> for ApiError {
    fn from(err: AcquisitionError) -> Self {
        match err {
            AcquisitionError::InvalidUrl(_) => ApiError::InvalidUrl,
            AcquisitionError::ToolFailed {
                stage: Stage::Metadata,
                stderr,
                ..
            } => ApiError::MetadataFailed { stderr },
            AcquisitionError::ToolFailed {
                stage: Stage::Download,
                stderr,
                ..
            } => ApiError::DownloadFailed { stderr },
            AcquisitionError::MalformedMetadata(_) => ApiError::MalformedMetadata,
            AcquisitionError::DurationExceeded {
                duration,
                max_duration,
            } => ApiError::DurationExceeded {
                duration,
                max_duration,
            },
            err @ AcquisitionError::Timeout { .. } => ApiError::Timeout(err.to_string()),
            err @ AcquisitionError::Io { .. } => ApiError::Internal(err.into()),
        }
    }
}
