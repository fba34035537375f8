//! Tests for feature aggregation

use super::*;
use approx::assert_relative_eq;

/// Chroma matrix whose only energy is in `class`
fn chroma_peaking_at(class: usize, frames: usize) -> Vec<Vec<f32>> {
    (0..12)
        .map(|c| vec![if c == class { 1.0 } else { 0.1 }; frames])
        .collect()
}

fn sample_primitives() -> PrimitiveFeatures {
    PrimitiveFeatures {
        num_samples: 22050 * 10,
        sample_rate: 22050,
        tempo: 150.0,
        beat_times: vec![0.4, 0.8, 1.2],
        spectral_centroid: vec![1000.0, 2000.0, 3000.0],
        spectral_rolloff: vec![4000.0, 5000.0],
        zero_crossing_rate: vec![0.1, 0.2],
        mfcc: (0..13).map(|i| vec![i as f32, i as f32 + 2.0]).collect(),
        chroma: chroma_peaking_at(0, 4),
        rms: vec![0.1, 0.3],
    }
}

#[test]
fn test_mean_and_variance() {
    assert_relative_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    assert_relative_eq!(variance(&[1.0, 2.0, 3.0]), 2.0 / 3.0, epsilon = 1e-12);
    assert_eq!(mean(&[]), 0.0);
    assert_eq!(variance(&[]), 0.0);
    assert_eq!(variance(&[5.0]), 0.0);
}

#[test]
fn test_end_to_end_scenario() {
    // tempo 150, mean RMS 0.2, key C
    let features = aggregate(&sample_primitives());

    assert_eq!(features.key, PitchClass::C);
    assert_relative_eq!(features.energy, 0.2, epsilon = 1e-7);
    assert_eq!(features.mood, Mood::Energetic);
    assert_relative_eq!(features.intensity, 0.6 + 0.4 * (150.0 / 180.0), epsilon = 1e-6);
    assert_relative_eq!(features.intensity, 0.9333, epsilon = 1e-3);
    assert_relative_eq!(features.valence, 0.95, epsilon = 1e-6);
}

#[test]
fn test_summary_statistics() {
    let features = aggregate(&sample_primitives());

    assert_relative_eq!(features.duration, 10.0);
    assert_relative_eq!(features.tempo, 150.0);
    assert_relative_eq!(features.spectral_centroid, 2000.0, epsilon = 1e-9);
    assert_relative_eq!(features.spectral_centroid_variance, 2_000_000.0 / 3.0, epsilon = 1e-6);
    assert_relative_eq!(features.spectral_rolloff, 4500.0, epsilon = 1e-9);
    assert_relative_eq!(features.zero_crossing_rate, 0.15, epsilon = 1e-7);
    assert_relative_eq!(features.energy_variance, 0.01, epsilon = 1e-7);

    assert_eq!(features.mfcc_mean.len(), 13);
    assert_eq!(features.mfcc_variance.len(), 13);
    assert_relative_eq!(features.mfcc_mean[4], 5.0);
    assert!(features.mfcc_variance.iter().all(|&v| (v - 1.0).abs() < 1e-12));

    // 0.5 * (666_666.7 / 1e6) + 0.5 * (1 / 100)
    assert_relative_eq!(features.complexity, 0.5 * (2.0 / 3.0) + 0.005, epsilon = 1e-6);
}

#[test]
fn test_aggregation_is_deterministic() {
    let primitives = sample_primitives();
    let first = aggregate(&primitives);
    for _ in 0..5 {
        let again = aggregate(&primitives);
        assert_eq!(again, first);
        assert_eq!(again.valence.to_bits(), first.valence.to_bits());
        assert_eq!(again.complexity.to_bits(), first.complexity.to_bits());
    }
}

#[test]
fn test_degenerate_input_degrades_to_zero() {
    let features = aggregate(&PrimitiveFeatures::default());

    assert_eq!(features.duration, 0.0);
    assert_eq!(features.tempo, 0.0);
    assert_eq!(features.energy, 0.0);
    assert_eq!(features.spectral_centroid, 0.0);
    assert_eq!(features.key, PitchClass::C);
    assert!(features.mfcc_mean.is_empty());
    assert_eq!(features.complexity, 0.0);
    assert_eq!(features.intensity, 0.0);
    assert_relative_eq!(features.valence, 0.4);
    assert_eq!(features.mood, Mood::Calm);
}

#[test]
fn test_nan_inputs_are_sanitized() {
    let primitives = PrimitiveFeatures {
        tempo: f32::NAN,
        rms: vec![f32::NAN, 0.1],
        spectral_centroid: vec![f32::INFINITY],
        chroma: vec![vec![f32::NAN]; 12],
        ..sample_primitives()
    };
    let features = aggregate(&primitives);

    for score in [features.valence, features.intensity, features.complexity] {
        assert!(score.is_finite());
        assert!((0.0..=1.0).contains(&score));
    }
    assert!(features.energy.is_finite());
    assert!(serde_json::to_string(&features).is_ok());
}

#[test]
fn test_scores_stay_in_unit_range() {
    let tempos = [0.0, 1.0, 60.0, 79.9, 80.0, 100.0, 140.0, 180.0, 240.0, 1e6];
    let energies = [0.0, 0.01, 0.1, 0.15, 0.5, 10.0];
    let variances = [0.0, 1.0, 5e5, 1e6, 1e9];

    for key in PitchClass::ALL {
        for &tempo in &tempos {
            for &rms in &energies {
                let v = valence(key, tempo, rms);
                let i = intensity(rms, tempo);
                assert!((0.0..=1.0).contains(&v), "valence {} out of range", v);
                assert!((0.0..=1.0).contains(&i), "intensity {} out of range", i);
            }
        }
    }
    for &cv in &variances {
        for &mv in &variances {
            let c = complexity(cv, &[mv; 13]);
            assert!((0.0..=1.0).contains(&c), "complexity {} out of range", c);
        }
    }
}

#[test]
fn test_valence_terms() {
    assert_relative_eq!(valence(PitchClass::A, 0.0, 0.0), 0.4);
    assert_relative_eq!(valence(PitchClass::FSharp, 0.0, 0.0), 0.2);
    assert_relative_eq!(valence(PitchClass::FSharp, 90.0, 0.05), 0.2 + 0.15 + 0.15, epsilon = 1e-12);
    assert_relative_eq!(valence(PitchClass::C, 360.0, 1.0), 1.0);
}

#[test]
fn test_complexity_averages_mfcc_variances() {
    let mut variances = vec![0.0; 13];
    variances[0] = 130.0;
    // mean is 10 -> 0.1 -> half weight
    assert_relative_eq!(complexity(0.0, &variances), 0.05, epsilon = 1e-12);
    assert_relative_eq!(complexity(2e6, &[1e4; 13]), 1.0);
}

#[test]
fn test_key_labels_cover_chromatic_scale() {
    let labels: Vec<&str> = PitchClass::ALL.iter().map(|p| p.label()).collect();
    assert_eq!(
        labels,
        vec!["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"]
    );
    for (i, class) in PitchClass::ALL.iter().enumerate() {
        assert_eq!(class.index(), i);
        assert_eq!(PitchClass::from_index(i), *class);
        assert_eq!(serde_json::to_value(class).unwrap(), class.label());
    }
}

#[test]
fn test_major_set() {
    let major: Vec<usize> = PitchClass::ALL
        .iter()
        .filter(|p| p.is_major())
        .map(|p| p.index())
        .collect();
    assert_eq!(major, vec![0, 2, 4, 5, 7, 9, 11]);
}

#[test]
fn test_key_estimation_picks_max_energy() {
    for class in 0..12 {
        let energy = chroma_energy(&chroma_peaking_at(class, 3));
        assert_eq!(estimate_key(&energy).index(), class);
    }
}

#[test]
fn test_key_ties_resolve_to_lowest_index() {
    let mut energy = [1.0; 12];
    assert_eq!(estimate_key(&energy), PitchClass::C);

    energy[3] = 5.0;
    energy[8] = 5.0;
    assert_eq!(estimate_key(&energy), PitchClass::DSharp);
}

#[test]
fn test_chroma_energy_sums_over_time() {
    let chroma: Vec<Vec<f32>> = (0..12).map(|c| vec![c as f32; 4]).collect();
    let energy = chroma_energy(&chroma);
    assert_relative_eq!(energy[0], 0.0);
    assert_relative_eq!(energy[11], 44.0);
}

/// Straight transcription of the rule list, used as an oracle
fn expected_mood(tempo: f64, rms: f64, major: bool) -> Mood {
    let rule = if tempo > 140.0 && rms > 0.15 {
        0
    } else if tempo > 100.0 && rms > 0.1 {
        1
    } else if tempo < 80.0 {
        2
    } else {
        3
    };
    let table = [
        (Mood::Energetic, Mood::Intense),
        (Mood::Upbeat, Mood::Dramatic),
        (Mood::Calm, Mood::Melancholic),
        (Mood::Moderate, Mood::Contemplative),
    ];
    if major {
        table[rule].0
    } else {
        table[rule].1
    }
}

#[test]
fn test_mood_rules_across_grid() {
    let tempos = [0.0, 79.0, 80.0, 100.0, 100.5, 140.0, 140.5, 200.0];
    let energies = [0.0, 0.1, 0.11, 0.15, 0.16, 0.5];
    let mut seen = std::collections::HashSet::new();

    for &tempo in &tempos {
        for &rms in &energies {
            for major in [true, false] {
                let mood = Mood::determine(tempo, rms, major);
                assert_eq!(mood, expected_mood(tempo, rms, major), "tempo={} rms={} major={}", tempo, rms, major);
                assert!(Mood::ALL.contains(&mood));
                seen.insert(mood);
            }
        }
    }
    assert_eq!(seen.len(), 8);
}

#[test]
fn test_mood_priority_order() {
    // Satisfies rules 1 and 2; rule 1 wins
    assert_eq!(Mood::determine(150.0, 0.2, true), Mood::Energetic);
    assert_eq!(Mood::determine(150.0, 0.2, false), Mood::Intense);
    // Fast but quiet falls through to the default rule
    assert_eq!(Mood::determine(150.0, 0.05, true), Mood::Moderate);
    assert_eq!(Mood::determine(120.0, 0.12, false), Mood::Dramatic);
    assert_eq!(Mood::determine(70.0, 0.5, false), Mood::Melancholic);
}

#[test]
fn test_feature_vector_json_shape() {
    let features = aggregate(&sample_primitives());
    let json = serde_json::to_value(&features).unwrap();
    let object = json.as_object().unwrap();

    for field in [
        "duration",
        "tempo",
        "key",
        "energy",
        "energy_variance",
        "spectral_centroid",
        "spectral_centroid_variance",
        "spectral_rolloff",
        "zero_crossing_rate",
        "mfcc_mean",
        "mfcc_variance",
        "valence",
        "intensity",
        "complexity",
        "mood",
    ] {
        assert!(object.contains_key(field), "missing {}", field);
    }
    assert_eq!(object.len(), 15);
    assert_eq!(json["key"], "C");
    assert_eq!(json["mood"], "energetic");
}
