//! Feature primitives: the numeric transforms the aggregator summarizes
//!
//! `FeaturePrimitives` is the seam between the aggregation recipe and the
//! signal-processing backend. `StftPrimitives` is the built-in backend.

mod beat;
mod chroma;
mod mel;
mod spectral;

pub use beat::{beat_track, estimate_tempo, onset_strength, track_beats, BeatTrack};
pub use chroma::ChromaFilterBank;
pub use mel::{dct_matrix, hz_to_mel, mel_to_hz, mfcc_from_log_mel, power_to_db, MelFilterBank};
pub use spectral::{rms, spectral_centroid, spectral_rolloff, zero_crossing_rate};

use crate::audio::AudioSamples;
use crate::config::AnalysisConfig;
use crate::transform::{compute_stft, Spectrogram};
use anyhow::{Context, Result};

/// Per-frame spectral shape descriptors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralFeatures {
    pub centroid: Vec<f32>,
    pub rolloff: Vec<f32>,
    pub zero_crossing_rate: Vec<f32>,
}

/// Every primitive series for one clip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveSet {
    pub beats: BeatTrack,
    pub spectral: SpectralFeatures,
    pub mfcc: Vec<Vec<f32>>,
    pub chroma: Vec<Vec<f32>>,
    pub rms: Vec<f32>,
}

/// Numeric transforms over a decoded clip
pub trait FeaturePrimitives: Send + Sync {
    fn compute_beat_track(&self, audio: &AudioSamples) -> Result<BeatTrack>;
    fn compute_spectral_features(&self, audio: &AudioSamples) -> Result<SpectralFeatures>;
    /// MFCC matrix, [coefficient][frame]
    fn compute_mfcc(&self, audio: &AudioSamples) -> Result<Vec<Vec<f32>>>;
    /// Chroma matrix, [pitch_class][frame], row 0 is C
    fn compute_chroma(&self, audio: &AudioSamples) -> Result<Vec<Vec<f32>>>;
    fn compute_rms(&self, audio: &AudioSamples) -> Result<Vec<f32>>;

    /// All of the above in one pass. Backends that share intermediate
    /// transforms between primitives override this.
    fn compute_all(&self, audio: &AudioSamples) -> Result<PrimitiveSet> {
        Ok(PrimitiveSet {
            beats: self.compute_beat_track(audio).context("Beat tracking failed")?,
            spectral: self
                .compute_spectral_features(audio)
                .context("Spectral analysis failed")?,
            mfcc: self.compute_mfcc(audio).context("MFCC computation failed")?,
            chroma: self.compute_chroma(audio).context("Chroma computation failed")?,
            rms: self.compute_rms(audio).context("RMS computation failed")?,
        })
    }
}

/// STFT-based implementation of every primitive
#[derive(Debug, Clone)]
pub struct StftPrimitives {
    config: AnalysisConfig,
}

impl StftPrimitives {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn spectrogram(&self, audio: &AudioSamples) -> Result<Spectrogram> {
        compute_stft(&audio.samples, audio.sample_rate, &self.config)
    }

    /// dB-scaled mel spectrogram, [frame][band]
    fn log_mel(&self, power: &[Vec<f32>], sample_rate: u32) -> Vec<Vec<f32>> {
        let bank = MelFilterBank::new(sample_rate, self.config.n_fft, self.config.n_mels);
        let mel: Vec<Vec<f32>> = power.iter().map(|frame| bank.apply(frame)).collect();
        power_to_db(&mel, self.config.top_db)
    }

    fn frame_rate(&self, audio: &AudioSamples) -> f32 {
        audio.sample_rate as f32 / self.config.hop_length as f32
    }

    fn beats_from_log_mel(&self, log_mel: &[Vec<f32>], audio: &AudioSamples) -> BeatTrack {
        let onset = onset_strength(log_mel);
        beat_track(
            &onset,
            self.frame_rate(audio),
            self.config.start_bpm,
            self.config.max_bpm,
            self.config.tempo_window_secs,
            self.config.tightness,
        )
    }

    fn spectral_from(&self, spec: &Spectrogram, audio: &AudioSamples) -> SpectralFeatures {
        SpectralFeatures {
            centroid: spectral_centroid(spec),
            rolloff: spectral_rolloff(spec, self.config.rolloff_percent),
            zero_crossing_rate: zero_crossing_rate(
                &audio.samples,
                self.config.n_fft,
                self.config.hop_length,
            ),
        }
    }

    fn chroma_from_power(&self, power: &[Vec<f32>], sample_rate: u32) -> Vec<Vec<f32>> {
        let bank = ChromaFilterBank::new(sample_rate, self.config.n_fft, self.config.n_chroma);
        bank.chromagram(power)
    }
}

impl FeaturePrimitives for StftPrimitives {
    fn compute_beat_track(&self, audio: &AudioSamples) -> Result<BeatTrack> {
        let power = self.spectrogram(audio)?.power();
        Ok(self.beats_from_log_mel(&self.log_mel(&power, audio.sample_rate), audio))
    }

    fn compute_spectral_features(&self, audio: &AudioSamples) -> Result<SpectralFeatures> {
        let spec = self.spectrogram(audio)?;
        Ok(self.spectral_from(&spec, audio))
    }

    fn compute_mfcc(&self, audio: &AudioSamples) -> Result<Vec<Vec<f32>>> {
        let power = self.spectrogram(audio)?.power();
        Ok(mfcc_from_log_mel(&self.log_mel(&power, audio.sample_rate), self.config.n_mfcc))
    }

    fn compute_chroma(&self, audio: &AudioSamples) -> Result<Vec<Vec<f32>>> {
        let power = self.spectrogram(audio)?.power();
        Ok(self.chroma_from_power(&power, audio.sample_rate))
    }

    fn compute_rms(&self, audio: &AudioSamples) -> Result<Vec<f32>> {
        Ok(rms(&audio.samples, self.config.n_fft, self.config.hop_length))
    }

    /// One STFT and one mel projection shared by every primitive
    fn compute_all(&self, audio: &AudioSamples) -> Result<PrimitiveSet> {
        let spec = self.spectrogram(audio).context("STFT failed")?;
        let power = spec.power();
        let log_mel = self.log_mel(&power, audio.sample_rate);

        Ok(PrimitiveSet {
            beats: self.beats_from_log_mel(&log_mel, audio),
            spectral: self.spectral_from(&spec, audio),
            mfcc: mfcc_from_log_mel(&log_mel, self.config.n_mfcc),
            chroma: self.chroma_from_power(&power, audio.sample_rate),
            rms: rms(&audio.samples, self.config.n_fft, self.config.hop_length),
        })
    }
}
