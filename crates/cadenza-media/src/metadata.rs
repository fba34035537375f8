//! Video metadata as reported by the resolver tool

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Subset of the `--dump-json` payload that is used
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub webpage_url: Option<String>,
}

/// Resolved description of one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: Option<String>,
    pub title: String,
    /// Seconds, 0 when unknown
    pub duration: f64,
    pub thumbnail: Option<String>,
    pub author: String,
    pub url: String,
}

impl VideoMetadata {
    /// Parse a `--dump-json` payload for `requested_url`
    pub fn from_json(payload: &str, requested_url: &str) -> Result<Self, serde_json::Error> {
        let raw: RawVideoInfo = serde_json::from_str(payload)?;
        Ok(Self::from_raw(raw, requested_url))
    }

    pub fn from_raw(raw: RawVideoInfo, requested_url: &str) -> Self {
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());

        Self {
            id: non_empty(raw.id),
            title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
            duration: raw.duration.filter(|d| d.is_finite()).unwrap_or(0.0),
            thumbnail: non_empty(raw.thumbnail),
            author: non_empty(raw.uploader)
                .or_else(|| non_empty(raw.channel))
                .unwrap_or_else(|| "Unknown".to_string()),
            url: non_empty(raw.webpage_url).unwrap_or_else(|| requested_url.to_string()),
        }
    }

    /// Duration as a JSON number, integral when it has no fractional part
    pub fn duration_value(&self) -> Value {
        seconds_value(self.duration)
    }

    /// Thumbnail URL, falling back to the static image of the video id
    pub fn thumbnail_or_default(&self) -> Option<String> {
        self.thumbnail.clone().or_else(|| {
            self.id
                .as_ref()
                .map(|id| format!("https://i3.ytimg.com/vi/{}/maxresdefault.jpg", id))
        })
    }
}

/// Render seconds as an integer JSON number when possible
pub fn seconds_value(seconds: f64) -> Value {
    if seconds.fract() == 0.0 && seconds >= 0.0 && seconds < u64::MAX as f64 {
        Value::from(seconds as u64)
    } else {
        Value::from(seconds)
    }
}
