//! Media acquisition configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the external resolver tool and the downloaded clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_tool_path")]
    pub tool_path: String,
    /// Arguments placed before the tool's own, e.g. `["-m", "yt_dlp"]`
    #[serde(default)]
    pub tool_args: Vec<String>,
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_stderr_limit")]
    pub stderr_limit: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            tool_path: default_tool_path(),
            tool_args: Vec::new(),
            metadata_timeout_secs: default_metadata_timeout(),
            download_timeout_secs: default_download_timeout(),
            max_duration_secs: default_max_duration(),
            audio_format: default_audio_format(),
            temp_dir: default_temp_dir(),
            stderr_limit: default_stderr_limit(),
        }
    }
}

fn default_tool_path() -> String {
    "yt-dlp".to_string()
}
fn default_metadata_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    45
}
fn default_max_duration() -> f64 {
    300.0
}
fn default_audio_format() -> String {
    "mp3".to_string()
}
fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}
fn default_stderr_limit() -> usize {
    500
}

impl MediaConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.tool_path.trim().is_empty() {
            return Err("tool_path must not be empty".to_string());
        }
        if self.metadata_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err("timeouts must be > 0".to_string());
        }
        if !(self.max_duration_secs > 0.0) {
            return Err("max_duration_secs must be > 0".to_string());
        }
        if self.audio_format.is_empty() || !self.audio_format.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("invalid audio_format: {:?}", self.audio_format));
        }
        Ok(())
    }
}
