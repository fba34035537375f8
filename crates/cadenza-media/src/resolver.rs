//! Resolver abstraction and the acquisition flow built on it

use async_trait::async_trait;
use std::path::Path;

use crate::error::AcquisitionError;
use crate::metadata::VideoMetadata;
use crate::video_url::is_valid_video_url;

/// Looks up video metadata and fetches audio for a URL
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolve metadata without downloading media
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata, AcquisitionError>;

    /// Download the best audio stream of `url`, transcoded to `dest`
    async fn download_audio(&self, url: &str, dest: &Path) -> Result<(), AcquisitionError>;
}

/// Reject durations strictly greater than `max_duration`
pub fn check_duration(duration: f64, max_duration: f64) -> Result<(), AcquisitionError> {
    if duration > max_duration {
        return Err(AcquisitionError::DurationExceeded {
            duration,
            max_duration,
        });
    }
    Ok(())
}

/// Validate `url`, resolve its metadata, gate on duration, then download to `dest`.
///
/// Nothing is downloaded unless the metadata lookup succeeded and the
/// duration is within `max_duration`.
pub async fn acquire_audio<R: MediaResolver + ?Sized>(
    resolver: &R,
    url: &str,
    dest: &Path,
    max_duration: f64,
) -> Result<VideoMetadata, AcquisitionError> {
    if !is_valid_video_url(url) {
        return Err(AcquisitionError::InvalidUrl(url.to_string()));
    }

    let metadata = resolver.resolve_metadata(url).await?;
    check_duration(metadata.duration, max_duration)?;

    log::info!(
        "Downloading audio for '{}' ({}s) to {}",
        metadata.title,
        metadata.duration,
        dest.display()
    );
    resolver.download_audio(url, dest).await?;

    Ok(metadata)
}
