//! Frame-wise spectral shape and time-domain energy descriptors

use crate::transform::{frame_count, frames, pad_center, PadMode, Spectrogram};

/// Magnitude-weighted mean frequency of every frame, 0 for silent frames
pub fn spectral_centroid(spec: &Spectrogram) -> Vec<f32> {
    let freqs = spec.bin_frequencies();

    spec.magnitudes
        .iter()
        .map(|frame| {
            let magnitude_sum: f32 = frame.iter().sum();
            if magnitude_sum <= f32::EPSILON {
                return 0.0;
            }
            let weighted_sum: f32 = frame.iter().zip(&freqs).map(|(m, f)| m * f).sum();
            weighted_sum / magnitude_sum
        })
        .collect()
}

/// Lowest frequency below which `roll_percent` of each frame's magnitude lies
pub fn spectral_rolloff(spec: &Spectrogram, roll_percent: f32) -> Vec<f32> {
    let freqs = spec.bin_frequencies();

    spec.magnitudes
        .iter()
        .map(|frame| {
            let total: f32 = frame.iter().sum();
            let threshold = roll_percent * total;

            let mut cumulative = 0.0;
            for (m, f) in frame.iter().zip(&freqs) {
                cumulative += m;
                if cumulative >= threshold {
                    return *f;
                }
            }
            freqs.last().copied().unwrap_or(0.0)
        })
        .collect()
}

/// Fraction of sign changes inside each centred frame
///
/// Zero counts as positive.
pub fn zero_crossing_rate(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let num_frames = frame_count(samples.len(), hop_length);
    let padded = pad_center(samples, frame_length / 2, PadMode::Edge);

    frames(&padded, frame_length, hop_length, num_frames)
        .map(|frame| {
            if frame.len() < 2 {
                return 0.0;
            }
            let crossings = frame
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            crossings as f32 / frame.len() as f32
        })
        .collect()
}

/// Root-mean-square amplitude of each centred frame
pub fn rms(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let num_frames = frame_count(samples.len(), hop_length);
    let padded = pad_center(samples, frame_length / 2, PadMode::Constant);

    frames(&padded, frame_length, hop_length, num_frames)
        .map(|frame| {
            let energy: f32 = frame.iter().map(|s| s * s).sum();
            (energy / frame_length as f32).sqrt()
        })
        .collect()
}
