//! Cadenza Core - Audio Feature Extraction Library
//!
//! Decodes a clip, runs the spectral, cepstral, chroma and rhythm
//! primitives over it, and aggregates them into a `FeatureVector` with
//! heuristic valence, intensity, complexity and mood descriptors.

pub mod analyzer;
pub mod audio;
pub mod config;
pub mod features;
pub mod primitives;
pub mod transform;

pub use analyzer::{Analyzer, FeatureExtractor};
pub use audio::{AudioSamples, SignalDecoder};
pub use config::AnalysisConfig;
pub use features::{aggregate, FeatureVector, Mood, PitchClass, PrimitiveFeatures};
pub use primitives::FeaturePrimitives;

/// Analyze an audio file with the built-in decoder and primitives
pub fn analyze_audio(
    audio_path: &std::path::Path,
    config: &AnalysisConfig,
) -> anyhow::Result<FeatureVector> {
    config.validate()?;
    FeatureExtractor::from_config(config).analyze_file(audio_path)
}
