//! Feature aggregation
//!
//! Reduces the per-frame primitive outputs of one clip to summary
//! statistics, estimates the key from chroma energy, and derives the three
//! heuristic affect scores and the mood label. Everything here is a pure
//! function of its inputs.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
mod tests;

/// Pitch classes in chromatic order, starting at C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D#")]
    DSharp,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "G#")]
    GSharp,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A#")]
    ASharp,
    #[serde(rename = "B")]
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Pitch class for a chroma index (taken modulo 12)
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Membership in the C major scale {C, D, E, F, G, A, B}
    ///
    /// This stands in for major/minor mode detection.
    pub fn is_major(self) -> bool {
        matches!(self.index(), 0 | 2 | 4 | 5 | 7 | 9 | 11)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mood category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Energetic,
    Intense,
    Upbeat,
    Dramatic,
    Calm,
    Melancholic,
    Moderate,
    Contemplative,
}

impl Mood {
    pub const ALL: [Mood; 8] = [
        Mood::Energetic,
        Mood::Intense,
        Mood::Upbeat,
        Mood::Dramatic,
        Mood::Calm,
        Mood::Melancholic,
        Mood::Moderate,
        Mood::Contemplative,
    ];

    /// Ordered threshold rules, first match wins
    pub fn determine(tempo: f64, mean_rms: f64, is_major: bool) -> Self {
        let pick = |major: Mood, minor: Mood| if is_major { major } else { minor };

        if tempo > 140.0 && mean_rms > 0.15 {
            pick(Mood::Energetic, Mood::Intense)
        } else if tempo > 100.0 && mean_rms > 0.1 {
            pick(Mood::Upbeat, Mood::Dramatic)
        } else if tempo < 80.0 {
            pick(Mood::Calm, Mood::Melancholic)
        } else {
            pick(Mood::Moderate, Mood::Contemplative)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Energetic => "energetic",
            Mood::Intense => "intense",
            Mood::Upbeat => "upbeat",
            Mood::Dramatic => "dramatic",
            Mood::Calm => "calm",
            Mood::Melancholic => "melancholic",
            Mood::Moderate => "moderate",
            Mood::Contemplative => "contemplative",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive outputs for one decoded clip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveFeatures {
    pub num_samples: usize,
    pub sample_rate: u32,
    pub tempo: f32,
    pub beat_times: Vec<f32>,
    pub spectral_centroid: Vec<f32>,
    pub spectral_rolloff: Vec<f32>,
    pub zero_crossing_rate: Vec<f32>,
    /// [coefficient][frame]
    pub mfcc: Vec<Vec<f32>>,
    /// [pitch_class][frame]
    pub chroma: Vec<Vec<f32>>,
    pub rms: Vec<f32>,
}

/// Summary descriptors of one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub duration: f64,
    pub tempo: f64,
    pub key: PitchClass,
    pub energy: f64,
    pub energy_variance: f64,
    pub spectral_centroid: f64,
    pub spectral_centroid_variance: f64,
    pub spectral_rolloff: f64,
    pub zero_crossing_rate: f64,
    pub mfcc_mean: Vec<f64>,
    pub mfcc_variance: Vec<f64>,
    pub valence: f64,
    pub intensity: f64,
    pub complexity: f64,
    pub mood: Mood,
}

/// Replace NaN and infinities with 0
fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

fn clamp_unit(x: f64) -> f64 {
    finite_or_zero(x).clamp(0.0, 1.0)
}

/// `min(tempo / 180, 1)`
fn tempo_factor(tempo: f64) -> f64 {
    finite_or_zero(tempo / 180.0).min(1.0)
}

/// `min(mean_rms * 10, 1)`
fn energy_factor(mean_rms: f64) -> f64 {
    finite_or_zero(mean_rms * 10.0).min(1.0)
}

/// Arithmetic mean, 0 for an empty sequence
pub fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    finite_or_zero(sum / values.len() as f64)
}

/// Population variance (mean squared deviation), 0 for an empty sequence
pub fn variance(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|&v| (v as f64 - m).powi(2)).sum();
    finite_or_zero(ss / values.len() as f64)
}

/// Chroma summed over time, one entry per pitch class
pub fn chroma_energy(chroma: &[Vec<f32>]) -> [f64; 12] {
    let mut energy = [0.0; 12];
    for (slot, row) in energy.iter_mut().zip(chroma) {
        *slot = finite_or_zero(row.iter().map(|&v| v as f64).sum());
    }
    energy
}

/// Pitch class with the largest chroma energy; ties go to the lowest index
pub fn estimate_key(energy: &[f64; 12]) -> PitchClass {
    let mut best = 0;
    for (i, &e) in energy.iter().enumerate().skip(1) {
        if e > energy[best] {
            best = i;
        }
    }
    PitchClass::from_index(best)
}

/// Emotional positivity in [0, 1]
pub fn valence(key: PitchClass, tempo: f64, mean_rms: f64) -> f64 {
    let base = if key.is_major() { 0.4 } else { 0.2 };
    clamp_unit(base + 0.3 * tempo_factor(tempo) + 0.3 * energy_factor(mean_rms))
}

/// Overall intensity in [0, 1]
pub fn intensity(mean_rms: f64, tempo: f64) -> f64 {
    clamp_unit(0.6 * energy_factor(mean_rms) + 0.4 * tempo_factor(tempo))
}

/// Spectral and timbral variability in [0, 1]
///
/// `mfcc_variances` holds one variance per coefficient; their mean is used.
pub fn complexity(centroid_variance: f64, mfcc_variances: &[f64]) -> f64 {
    let mfcc_mean_variance = if mfcc_variances.is_empty() {
        0.0
    } else {
        mfcc_variances.iter().sum::<f64>() / mfcc_variances.len() as f64
    };
    let spectral_factor = finite_or_zero(centroid_variance / 1_000_000.0).min(1.0);
    let mfcc_factor = finite_or_zero(mfcc_mean_variance / 100.0).min(1.0);
    clamp_unit(0.5 * spectral_factor + 0.5 * mfcc_factor)
}

/// Reduce the primitive outputs of one clip to a feature vector
pub fn aggregate(primitives: &PrimitiveFeatures) -> FeatureVector {
    let duration = if primitives.sample_rate == 0 {
        0.0
    } else {
        primitives.num_samples as f64 / primitives.sample_rate as f64
    };
    let tempo = finite_or_zero(primitives.tempo as f64);

    let energy = mean(&primitives.rms);
    let centroid_variance = variance(&primitives.spectral_centroid);
    let mfcc_mean: Vec<f64> = primitives.mfcc.iter().map(|row| mean(row)).collect();
    let mfcc_variance: Vec<f64> = primitives.mfcc.iter().map(|row| variance(row)).collect();

    let key = estimate_key(&chroma_energy(&primitives.chroma));

    FeatureVector {
        duration,
        tempo,
        key,
        energy,
        energy_variance: variance(&primitives.rms),
        spectral_centroid: mean(&primitives.spectral_centroid),
        spectral_centroid_variance: centroid_variance,
        spectral_rolloff: mean(&primitives.spectral_rolloff),
        zero_crossing_rate: mean(&primitives.zero_crossing_rate),
        valence: valence(key, tempo, energy),
        intensity: intensity(energy, tempo),
        complexity: complexity(centroid_variance, &mfcc_variance),
        mood: Mood::determine(tempo, energy, key.is_major()),
        mfcc_mean,
        mfcc_variance,
    }
}
