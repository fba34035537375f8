//! Audio decoding for multiple formats

use super::{resample_to_target, AudioFormat, AudioSamples, SignalDecoder};
use crate::config::AnalysisConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Interleaved audio as it comes out of a format decoder
#[derive(Debug, Clone)]
pub struct RawAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl RawAudio {
    /// Convert to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels as usize)
            .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
            .collect()
    }

    /// Drop everything past `max_secs` of audio
    pub fn truncate_secs(&mut self, max_secs: f64) {
        let limit = frame_limit(self.sample_rate, max_secs) * self.channels.max(1) as usize;
        self.samples.truncate(limit);
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Number of sample frames in `secs` seconds at `sample_rate`
fn frame_limit(sample_rate: u32, secs: f64) -> usize {
    (secs * sample_rate as f64).ceil() as usize
}

/// Decoder backed by the built-in format readers
#[derive(Debug, Clone)]
pub struct FileDecoder {
    sample_rate: u32,
    max_duration_secs: f64,
}

impl FileDecoder {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            max_duration_secs: config.max_duration_secs,
        }
    }
}

impl SignalDecoder for FileDecoder {
    fn decode_to_samples(&self, path: &Path) -> Result<AudioSamples> {
        decode_audio(path, self.sample_rate, self.max_duration_secs)
    }
}

/// Decode an audio file to mono at `target_sample_rate`, keeping at most `max_secs`
pub fn decode_audio(path: &Path, target_sample_rate: u32, max_secs: f64) -> Result<AudioSamples> {
    if !path.exists() {
        anyhow::bail!("Audio file not found: {}", path.display());
    }

    let mut raw = match AudioFormat::from_path(path) {
        AudioFormat::Wav => decode_wav(path, max_secs)?,
        AudioFormat::Mp3 => super::decode_container(path, max_secs)?,
        AudioFormat::Flac => decode_flac(path, max_secs)?,
        AudioFormat::Ogg => decode_ogg(path, max_secs)?,
        format if format.is_container() => super::decode_container(path, max_secs)?,
        _ => anyhow::bail!("Unsupported audio format: {}", path.display()),
    };

    if raw.samples.is_empty() {
        log::warn!("Decoded no audio from {}", path.display());
        return Ok(AudioSamples::new(Vec::new(), target_sample_rate));
    }
    if raw.sample_rate == 0 {
        anyhow::bail!("Audio stream reports a sample rate of 0: {}", path.display());
    }

    raw.truncate_secs(max_secs);
    let source_rate = raw.sample_rate;
    let channels = raw.channels;
    let source_secs = raw.duration_secs();

    let mono = raw.to_mono();
    let mut samples = resample_to_target(&mono, source_rate, target_sample_rate)?;
    samples.truncate(frame_limit(target_sample_rate, max_secs));

    log::debug!(
        "Decoded {}: {:.1}s, {} ch @ {}Hz -> {} mono samples @ {}Hz",
        path.display(),
        source_secs,
        channels,
        source_rate,
        samples.len(),
        target_sample_rate
    );

    Ok(AudioSamples::new(samples, target_sample_rate))
}

/// Decode WAV file
fn decode_wav(path: &Path, max_secs: f64) -> Result<RawAudio> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    let limit = frame_limit(spec.sample_rate, max_secs) * spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .take(limit)
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read WAV samples: {}", path.display()))?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .take(limit)
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to read WAV samples: {}", path.display()))?
        }
    };

    Ok(RawAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Decode FLAC file
fn decode_flac(path: &Path, max_secs: f64) -> Result<RawAudio> {
    let mut reader = claxon::FlacReader::open(path)
        .with_context(|| format!("Failed to open FLAC file: {}", path.display()))?;

    let info = reader.streaminfo();
    let channels = info.channels as u16;
    let limit = frame_limit(info.sample_rate, max_secs) * channels as usize;
    let max_val = (1i64 << (info.bits_per_sample - 1)) as f32;

    let samples: Vec<f32> = reader
        .samples()
        .take(limit)
        .map(|s| s.map(|v| v as f32 / max_val))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read FLAC samples: {}", path.display()))?;

    Ok(RawAudio {
        samples,
        sample_rate: info.sample_rate,
        channels,
    })
}

/// Decode OGG Vorbis file
fn decode_ogg(path: &Path, max_secs: f64) -> Result<RawAudio> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open OGG file: {}", path.display()))?;

    let mut reader = lewton::inside_ogg::OggStreamReader::new(file)
        .with_context(|| format!("Failed to read OGG headers: {}", path.display()))?;

    let sample_rate = reader.ident_hdr.audio_sample_rate;
    let channels = reader.ident_hdr.audio_channels as u16;
    let limit = frame_limit(sample_rate, max_secs) * channels as usize;

    let mut samples = Vec::new();
    while samples.len() < limit {
        match reader.read_dec_packet_itl()? {
            Some(packet) => samples.extend(packet.iter().map(|&s| s as f32 / 32768.0)),
            None => break,
        }
    }

    Ok(RawAudio {
        samples,
        sample_rate,
        channels,
    })
}
