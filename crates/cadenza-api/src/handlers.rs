//! Endpoint handlers

use cadenza_core::Analyzer;
use cadenza_media::{acquire_audio, check_duration, is_valid_video_url, MediaConfig, MediaResolver};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::temp::TempAudioFile;

/// `url` query parameter, validated
fn video_url(request: &ApiRequest) -> Result<&str, ApiError> {
    let url = request.query("url").ok_or(ApiError::MissingUrl)?;
    if !is_valid_video_url(url) {
        return Err(ApiError::InvalidUrl);
    }
    Ok(url)
}

/// `GET .../info?url=<videoUrl>`
pub async fn video_info(
    resolver: &dyn MediaResolver,
    media: &MediaConfig,
    request: &ApiRequest,
) -> Result<Value, ApiError> {
    let url = video_url(request)?;
    log::info!("[info] Fetching info for: {}", url);

    let metadata = resolver.resolve_metadata(url).await?;
    check_duration(metadata.duration, media.max_duration_secs)?;

    log::info!("[info] Success - Duration: {}s", metadata.duration);
    Ok(json!({
        "title": metadata.title,
        "duration": metadata.duration_value(),
        "thumbnail": metadata.thumbnail.clone().unwrap_or_default(),
        "author": metadata.author,
        "url": metadata.url,
    }))
}

/// `GET .../audio-with-analysis?url=<videoUrl>`
///
/// The downloaded clip lives only as long as this call. `request_id` only
/// tags log lines; the clip gets its own scratch directory.
pub async fn audio_with_analysis(
    resolver: &dyn MediaResolver,
    analyzer: Arc<dyn Analyzer>,
    media: &MediaConfig,
    request_id: &str,
    request: &ApiRequest,
) -> Result<Value, ApiError> {
    let url = video_url(request)?;
    log::info!("[audio-with-analysis] Processing: {}", url);

    let audio_file = TempAudioFile::new(&media.temp_dir, &media.audio_format).map_err(|e| {
        ApiError::Internal(anyhow::anyhow!(
            "Cannot create scratch directory in {}: {}",
            media.temp_dir.display(),
            e
        ))
    })?;
    log::debug!("[{}] Downloading to {}", request_id, audio_file.path().display());
    let metadata = acquire_audio(resolver, url, audio_file.path(), media.max_duration_secs).await?;

    log::info!("[audio-with-analysis] Download complete, analyzing...");
    let path = audio_file.path().to_path_buf();
    let features = tokio::task::spawn_blocking(move || analyzer.analyze_file(&path))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Analysis task failed: {}", e)))?
        .map_err(|e| {
            log::error!("[audio-with-analysis] Analysis failed: {:#}", e);
            ApiError::AnalysisFailed(format!("{:#}", e))
        })?;

    log::info!(
        "[audio-with-analysis] Success - Tempo: {:.1}, Mood: {}",
        features.tempo,
        features.mood
    );

    Ok(json!({
        "success": true,
        "videoInfo": {
            "title": metadata.title,
            "duration": metadata.duration_value(),
            "author": metadata.author,
            "thumbnail": metadata.thumbnail_or_default(),
        },
        "analysis": features,
    }))
}
