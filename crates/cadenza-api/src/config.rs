//! Service configuration
//!
//! TOML file with `[analysis]`, `[media]` and `[server]` sections. Every
//! section and every key is optional.

use cadenza_core::AnalysisConfig;
use cadenza_media::MediaConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// HTTP front end configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

impl ServiceConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: ServiceConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.analysis.validate()?;
        self.media
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [media] section: {}", e))?;
        if self.server.bind_address.trim().is_empty() {
            anyhow::bail!("bind_address must not be empty");
        }
        Ok(())
    }
}
