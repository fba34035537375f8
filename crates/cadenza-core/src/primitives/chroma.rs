//! Chroma filter bank and chromagram
//!
//! Each FFT bin is spread over the 12 pitch classes with a Gaussian bump one
//! semitone wide, and weighted by a broad Gaussian over octaves so that very
//! low and very high partials contribute little. Rows start at C.

/// Octave that receives the largest weight (C5 region)
const CENTER_OCTAVE: f32 = 5.0;
/// Standard deviation of the octave weighting, in octaves
const OCTAVE_WIDTH: f32 = 2.0;
/// Frequency of A0, the reference of the octave scale
const A0_HZ: f32 = 27.5;

/// Dense chroma filter bank ([pitch_class][fft_bin])
#[derive(Debug, Clone)]
pub struct ChromaFilterBank {
    weights: Vec<Vec<f32>>,
}

impl ChromaFilterBank {
    pub fn new(sample_rate: u32, n_fft: usize, n_chroma: usize) -> Self {
        let n_bins = n_fft / 2 + 1;
        let n_chroma_f = n_chroma as f32;

        // Position of each bin on a continuous pitch-class axis
        let bin_to_chroma = |k: usize| -> f32 {
            let hz = k as f32 * sample_rate as f32 / n_fft as f32;
            n_chroma_f * (hz / A0_HZ).log2()
        };
        let mut frq_bins: Vec<f32> = (0..=n_bins).map(|k| if k == 0 { 0.0 } else { bin_to_chroma(k) }).collect();
        frq_bins[0] = frq_bins[1] - 1.5 * n_chroma_f;

        let bin_widths: Vec<f32> = (0..n_bins)
            .map(|k| (frq_bins[k + 1] - frq_bins[k]).max(1.0))
            .collect();

        let half = (n_chroma_f / 2.0).round();
        let mut weights = vec![vec![0.0f32; n_bins]; n_chroma];

        for k in 0..n_bins {
            let mut column: Vec<f32> = (0..n_chroma)
                .map(|c| {
                    let d = (frq_bins[k] - c as f32 + half + 10.0 * n_chroma_f).rem_euclid(n_chroma_f) - half;
                    (-0.5 * (2.0 * d / bin_widths[k]).powi(2)).exp()
                })
                .collect();

            let norm = column.iter().map(|w| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                column.iter_mut().for_each(|w| *w /= norm);
            }

            let octave = frq_bins[k] / n_chroma_f;
            let octave_weight = (-0.5 * ((octave - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();

            // Row 0 of the A-based axis is A; rotate so that row 0 is C
            for (c, w) in column.into_iter().enumerate() {
                let row = (c + n_chroma - 3 * (n_chroma / 12)) % n_chroma;
                weights[row][k] = w * octave_weight;
            }
        }

        Self { weights }
    }

    /// Chromagram ([pitch_class][frame]) from power frames ([frame][bin]),
    /// each frame scaled so that its strongest class is 1
    pub fn chromagram(&self, power: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let n_chroma = self.weights.len();
        let mut rows = vec![Vec::with_capacity(power.len()); n_chroma];

        for frame in power {
            let energies: Vec<f32> = self
                .weights
                .iter()
                .map(|filter| filter.iter().zip(frame).map(|(w, p)| w * p).sum())
                .collect();

            let peak = energies.iter().fold(0.0f32, |acc, &e| acc.max(e.abs()));
            for (row, energy) in rows.iter_mut().zip(energies) {
                row.push(if peak > f32::MIN_POSITIVE { energy / peak } else { 0.0 });
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::transform::compute_stft;
    use std::f32::consts::PI;

    fn dominant_class(freq: f32) -> usize {
        let config = AnalysisConfig::default();
        let sr = config.sample_rate;
        let samples: Vec<f32> = (0..sr)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect();
        let power = compute_stft(&samples, sr, &config).unwrap().power();
        let chroma = ChromaFilterBank::new(sr, config.n_fft, 12).chromagram(&power);

        let sums: Vec<f32> = chroma.iter().map(|row| row.iter().sum()).collect();
        sums.iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_a440_maps_to_a() {
        assert_eq!(dominant_class(440.0), 9);
    }

    #[test]
    fn test_c5_maps_to_c() {
        assert_eq!(dominant_class(523.25), 0);
    }

    #[test]
    fn test_frames_are_max_normalised() {
        let bank = ChromaFilterBank::new(22050, 2048, 12);
        let power = vec![vec![1.0; 1025], vec![0.0; 1025]];
        let chroma = bank.chromagram(&power);
        assert_eq!(chroma.len(), 12);
        let peak = chroma.iter().map(|row| row[0]).fold(0.0f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(chroma.iter().all(|row| row[1] == 0.0));
    }
}
