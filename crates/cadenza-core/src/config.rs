//! Configuration parameters for audio analysis
//!
//! Defaults follow the usual conventions of music-information-retrieval
//! toolkits (22.05 kHz mono, 2048-point frames, hop of 512).

use serde::{Deserialize, Serialize};

/// Target sample rate of decoded audio
pub const SAMPLE_RATE: u32 = 22050;

/// Maximum amount of audio analyzed per clip, in seconds
pub const MAX_DURATION_SECS: f64 = 300.0;

/// Number of MFCC coefficients in a feature vector
pub const N_MFCC: usize = 13;

/// Number of pitch classes in a chroma frame
pub const N_CHROMA: usize = 12;

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Decoding
    pub sample_rate: u32,
    pub max_duration_secs: f64,

    // Framing
    pub n_fft: usize,
    pub hop_length: usize,

    // Mel / cepstral
    pub n_mels: usize,
    pub n_mfcc: usize,
    pub top_db: f32,

    // Chroma
    pub n_chroma: usize,

    // Spectral shape
    pub rolloff_percent: f32,

    // Beat tracking
    pub start_bpm: f32,
    pub max_bpm: f32,
    pub tightness: f32,
    pub tempo_window_secs: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            max_duration_secs: MAX_DURATION_SECS,

            n_fft: 2048,
            hop_length: 512,

            n_mels: 128,
            n_mfcc: N_MFCC,
            top_db: 80.0,

            n_chroma: N_CHROMA,

            rolloff_percent: 0.85,

            start_bpm: 120.0,
            max_bpm: 320.0,
            tightness: 100.0,
            tempo_window_secs: 8.0,
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sample_rate == 0 {
            anyhow::bail!("Sample rate must be > 0");
        }
        if !(self.max_duration_secs > 0.0) {
            anyhow::bail!("max_duration_secs must be > 0");
        }
        if self.n_fft < 2 || self.hop_length == 0 {
            anyhow::bail!("n_fft must be >= 2 and hop_length > 0");
        }
        if self.n_mels == 0 || self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            anyhow::bail!("n_mfcc must be in 1..=n_mels");
        }
        if self.n_chroma != N_CHROMA {
            anyhow::bail!("n_chroma must be {}", N_CHROMA);
        }
        if !(0.0..=1.0).contains(&self.rolloff_percent) {
            anyhow::bail!("rolloff_percent must be within [0, 1]");
        }
        if self.start_bpm <= 0.0 || self.max_bpm <= 0.0 {
            anyhow::bail!("start_bpm and max_bpm must be > 0");
        }
        Ok(())
    }

    /// Maximum number of mono samples kept after decoding
    pub fn max_samples(&self) -> usize {
        (self.max_duration_secs * self.sample_rate as f64) as usize
    }

    /// Analysis frames per second
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_length as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_rate, 22050);
        assert_eq!(config.n_mfcc, 13);
        assert_eq!(config.n_chroma, 12);
        assert_eq!(config.max_samples(), 22050 * 300);
    }

    #[test]
    fn test_rejects_bad_mfcc_count() {
        let config = AnalysisConfig {
            n_mfcc: 200,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_chromatic_chroma() {
        let config = AnalysisConfig {
            n_chroma: 24,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
