//! End-to-end analysis of one audio file

use crate::audio::{FileDecoder, SignalDecoder};
use crate::config::AnalysisConfig;
use crate::features::{aggregate, FeatureVector, PrimitiveFeatures};
use crate::primitives::{FeaturePrimitives, StftPrimitives};
use anyhow::{Context, Result};
use std::path::Path;

/// Anything that can turn an audio file into a feature vector
pub trait Analyzer: Send + Sync {
    fn analyze_file(&self, path: &Path) -> Result<FeatureVector>;
}

/// Decoder → primitives → aggregator pipeline
pub struct FeatureExtractor<D = FileDecoder, P = StftPrimitives> {
    decoder: D,
    primitives: P,
}

impl FeatureExtractor {
    /// Pipeline backed by the built-in decoder and STFT primitives
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(FileDecoder::new(config), StftPrimitives::new(config))
    }
}

impl<D: SignalDecoder, P: FeaturePrimitives> FeatureExtractor<D, P> {
    pub fn new(decoder: D, primitives: P) -> Self {
        Self {
            decoder,
            primitives,
        }
    }

    /// Decode `path` and run every primitive over it
    pub fn extract_primitives(&self, path: &Path) -> Result<PrimitiveFeatures> {
        let audio = self
            .decoder
            .decode_to_samples(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?;

        log::info!(
            "Analyzing {}: {:.1}s @ {}Hz",
            path.display(),
            audio.duration_secs(),
            audio.sample_rate
        );

        let set = self.primitives.compute_all(&audio)?;

        Ok(PrimitiveFeatures {
            num_samples: audio.samples.len(),
            sample_rate: audio.sample_rate,
            tempo: set.beats.tempo,
            beat_times: set.beats.beat_times,
            spectral_centroid: set.spectral.centroid,
            spectral_rolloff: set.spectral.rolloff,
            zero_crossing_rate: set.spectral.zero_crossing_rate,
            mfcc: set.mfcc,
            chroma: set.chroma,
            rms: set.rms,
        })
    }
}

impl<D: SignalDecoder, P: FeaturePrimitives> Analyzer for FeatureExtractor<D, P> {
    fn analyze_file(&self, path: &Path) -> Result<FeatureVector> {
        let start = std::time::Instant::now();
        let primitives = self.extract_primitives(path)?;
        let features = aggregate(&primitives);

        log::info!(
            "Analysis of {} done in {:.2}s: tempo {:.1}, key {}, mood {}",
            path.display(),
            start.elapsed().as_secs_f64(),
            features.tempo,
            features.key,
            features.mood
        );

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioSamples;
    use crate::features::{Mood, PitchClass};
    use crate::primitives::{BeatTrack, SpectralFeatures};
    use std::f32::consts::PI;

    struct FixedDecoder(AudioSamples);

    impl SignalDecoder for FixedDecoder {
        fn decode_to_samples(&self, _path: &Path) -> Result<AudioSamples> {
            Ok(self.0.clone())
        }
    }

    struct FailingDecoder;

    impl SignalDecoder for FailingDecoder {
        fn decode_to_samples(&self, _path: &Path) -> Result<AudioSamples> {
            anyhow::bail!("corrupt stream")
        }
    }

    /// Primitives with canned outputs: 150 BPM, loud, G-dominant
    struct CannedPrimitives;

    impl FeaturePrimitives for CannedPrimitives {
        fn compute_beat_track(&self, _audio: &AudioSamples) -> Result<BeatTrack> {
            Ok(BeatTrack {
                tempo: 150.0,
                beat_frames: vec![0, 17],
                beat_times: vec![0.0, 0.4],
            })
        }
        fn compute_spectral_features(&self, _audio: &AudioSamples) -> Result<SpectralFeatures> {
            Ok(SpectralFeatures {
                centroid: vec![1500.0; 4],
                rolloff: vec![3000.0; 4],
                zero_crossing_rate: vec![0.05; 4],
            })
        }
        fn compute_mfcc(&self, _audio: &AudioSamples) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0; 4]; 13])
        }
        fn compute_chroma(&self, _audio: &AudioSamples) -> Result<Vec<Vec<f32>>> {
            Ok((0..12).map(|c| vec![if c == 7 { 1.0 } else { 0.2 }; 4]).collect())
        }
        fn compute_rms(&self, _audio: &AudioSamples) -> Result<Vec<f32>> {
            Ok(vec![0.2; 4])
        }
    }

    #[test]
    fn test_pipeline_with_canned_primitives() {
        let extractor = FeatureExtractor::new(
            FixedDecoder(AudioSamples::new(vec![0.0; 22050], 22050)),
            CannedPrimitives,
        );
        let features = extractor.analyze_file(Path::new("clip.wav")).unwrap();

        assert_eq!(features.key, PitchClass::G);
        assert_eq!(features.mood, Mood::Energetic);
        assert!((features.duration - 1.0).abs() < 1e-12);
        assert_eq!(features.mfcc_mean.len(), 13);
    }

    #[test]
    fn test_decoder_failure_propagates() {
        let extractor = FeatureExtractor::new(FailingDecoder, CannedPrimitives);
        let err = extractor.analyze_file(Path::new("clip.mp3")).unwrap_err();
        assert!(format!("{:#}", err).contains("corrupt stream"));
    }

    #[test]
    fn test_builtin_pipeline_on_tone() {
        let sr = 22050;
        let samples: Vec<f32> = (0..sr * 2)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / sr as f32).sin())
            .collect();
        let config = AnalysisConfig::default();
        let extractor = FeatureExtractor::new(
            FixedDecoder(AudioSamples::new(samples, sr as u32)),
            StftPrimitives::new(&config),
        );

        let features = extractor.analyze_file(Path::new("a440.wav")).unwrap();
        assert_eq!(features.key, PitchClass::A);
        assert!(features.energy > 0.3);
        assert!((features.spectral_centroid - 440.0).abs() < 100.0);
        assert!((0.0..=1.0).contains(&features.valence));
        assert!((0.0..=1.0).contains(&features.intensity));
        assert!((0.0..=1.0).contains(&features.complexity));
    }

    #[test]
    fn test_builtin_pipeline_on_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..22050 {
            let v = 0.3 * (2.0 * PI * 261.63 * i as f32 / 22050.0).sin();
            writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let features = FeatureExtractor::from_config(&AnalysisConfig::default())
            .analyze_file(&path)
            .unwrap();
        assert_eq!(features.key, PitchClass::C);
        assert!((features.duration - 1.0).abs() < 1e-3);
    }
}
