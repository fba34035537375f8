//! Audio decoding and resampling
//!
//! Decodes WAV, FLAC and Ogg Vorbis with dedicated pure Rust decoders, and
//! uses Symphonia for MP3 and container formats (MP4/M4A, MKV/WebM, MOV).

mod container;
mod decoder;
mod resample;

pub use container::decode_container;
pub use decoder::{decode_audio, FileDecoder, RawAudio};
pub use resample::resample_to_target;

use anyhow::Result;
use std::path::Path;

/// Supported audio and container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    // Pure audio formats
    Wav,
    Mp3,
    Flac,
    Ogg,

    // Container formats (first audio track is decoded)
    Mp4,
    Mkv,
    Mov,
    Webm,

    Unknown,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("wav") | Some("wave") => AudioFormat::Wav,
            Some("mp3") => AudioFormat::Mp3,
            Some("flac") => AudioFormat::Flac,
            Some("ogg") | Some("oga") => AudioFormat::Ogg,

            Some("mp4") | Some("m4a") | Some("aac") => AudioFormat::Mp4,
            Some("mkv") | Some("mka") => AudioFormat::Mkv,
            Some("mov") => AudioFormat::Mov,
            Some("webm") | Some("opus") => AudioFormat::Webm,

            _ => AudioFormat::Unknown,
        }
    }

    /// Check if format is handled by the container demuxer
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            AudioFormat::Mp4 | AudioFormat::Mkv | AudioFormat::Mov | AudioFormat::Webm
        )
    }
}

/// Mono audio at a fixed sample rate, ready for feature extraction
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSamples {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSamples {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Turns a media file into mono samples at a known rate
pub trait SignalDecoder: Send + Sync {
    fn decode_to_samples(&self, path: &Path) -> Result<AudioSamples>;
}
