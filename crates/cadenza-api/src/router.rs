//! Path-suffix dispatch

use cadenza_core::{Analyzer, FeatureExtractor};
use cadenza_media::{MediaConfig, MediaResolver, YtDlp};
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Stateless request router
#[derive(Clone)]
pub struct ApiRouter {
    resolver: Arc<dyn MediaResolver>,
    analyzer: Arc<dyn Analyzer>,
    media: MediaConfig,
}

impl ApiRouter {
    pub fn new(
        resolver: Arc<dyn MediaResolver>,
        analyzer: Arc<dyn Analyzer>,
        media: MediaConfig,
    ) -> Self {
        Self {
            resolver,
            analyzer,
            media,
        }
    }

    /// Router backed by `yt-dlp` and the built-in analysis pipeline
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            Arc::new(YtDlp::new(config.media.clone())),
            Arc::new(FeatureExtractor::from_config(&config.analysis)),
            config.media.clone(),
        )
    }

    /// Handle one request; never fails, errors become error envelopes
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let request_id = request
            .request_id
            .clone()
            .filter(|id| is_safe_request_id(id))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        log::info!("[{}] Path: {}", request_id, request.path);
        log::debug!("[{}] Query params: {:?}", request_id, request.query_string_parameters);

        let result = if request.path.ends_with("/info") {
            handlers::video_info(self.resolver.as_ref(), &self.media, &request).await
        } else if request.path.ends_with("/audio-with-analysis") {
            handlers::audio_with_analysis(
                self.resolver.as_ref(),
                Arc::clone(&self.analyzer),
                &self.media,
                &request_id,
                &request,
            )
            .await
        } else {
            Err(ApiError::NotFound)
        };

        match result {
            Ok(body) => ApiResponse::success(&body),
            Err(e) => {
                match &e {
                    ApiError::Internal(inner) => log::error!("[{}] {:?}", request_id, inner),
                    other => log::warn!("[{}] {}", request_id, other),
                }
                e.into_response()
            }
        }
    }
}

/// Inbound ids are echoed into log lines
fn is_safe_request_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
