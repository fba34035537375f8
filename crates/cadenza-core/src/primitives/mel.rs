//! Mel filter bank, decibel scaling and MFCC

use std::f32::consts::PI;

const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4f32.ln() / 27.0
}

/// Slaney-style Hz to mel (linear below 1 kHz, logarithmic above)
pub fn hz_to_mel(hz: f32) -> f32 {
    if hz < MIN_LOG_HZ {
        hz / F_SP
    } else {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    }
}

/// Inverse of [`hz_to_mel`]
pub fn mel_to_hz(mel: f32) -> f32 {
    if mel < MIN_LOG_MEL {
        mel * F_SP
    } else {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    }
}

/// One triangular filter, stored from its first non-zero bin
#[derive(Debug, Clone)]
struct MelFilter {
    start: usize,
    weights: Vec<f32>,
}

/// Area-normalised triangular mel filter bank over FFT bins
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    filters: Vec<MelFilter>,
}

impl MelFilterBank {
    /// Filters spanning 0 Hz to Nyquist
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let fmax = sample_rate as f32 / 2.0;
        let min_mel = hz_to_mel(0.0);
        let max_mel = hz_to_mel(fmax);

        let mel_f: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(min_mel + (max_mel - min_mel) * i as f32 / (n_mels + 1) as f32))
            .collect();

        let fft_freqs: Vec<f32> = (0..=n_fft / 2)
            .map(|k| k as f32 * sample_rate as f32 / n_fft as f32)
            .collect();

        let filters = (0..n_mels)
            .map(|i| {
                let lower_width = mel_f[i + 1] - mel_f[i];
                let upper_width = mel_f[i + 2] - mel_f[i + 1];
                let enorm = 2.0 / (mel_f[i + 2] - mel_f[i]);

                let dense: Vec<f32> = fft_freqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - mel_f[i]) / lower_width;
                        let upper = (mel_f[i + 2] - f) / upper_width;
                        lower.min(upper).max(0.0) * enorm
                    })
                    .collect();

                let start = dense.iter().position(|&w| w > 0.0).unwrap_or(dense.len());
                let end = dense.iter().rposition(|&w| w > 0.0).map_or(start, |p| p + 1);
                MelFilter {
                    start,
                    weights: dense[start..end].to_vec(),
                }
            })
            .collect();

        Self { filters }
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Project one power-spectrum frame onto the mel bands
    pub fn apply(&self, power_frame: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                power_frame
                    .iter()
                    .skip(filter.start)
                    .zip(&filter.weights)
                    .map(|(p, w)| p * w)
                    .sum()
            })
            .collect()
    }
}

/// Convert a power matrix to decibels (ref 1.0), limited to `top_db` below its peak
pub fn power_to_db(power: &[Vec<f32>], top_db: f32) -> Vec<Vec<f32>> {
    const AMIN: f32 = 1e-10;

    let mut db: Vec<Vec<f32>> = power
        .iter()
        .map(|frame| frame.iter().map(|&p| 10.0 * p.max(AMIN).log10()).collect())
        .collect();

    let peak = db
        .iter()
        .flat_map(|frame| frame.iter().copied())
        .fold(f32::NEG_INFINITY, f32::max);

    if peak.is_finite() {
        let floor = peak - top_db;
        for value in db.iter_mut().flat_map(|frame| frame.iter_mut()) {
            *value = value.max(floor);
        }
    }

    db
}

/// Orthonormal DCT-II basis, `n_out` rows of `n_in` columns
pub fn dct_matrix(n_in: usize, n_out: usize) -> Vec<Vec<f32>> {
    let scale = (2.0 / n_in as f32).sqrt();
    (0..n_out)
        .map(|k| {
            let norm = if k == 0 { std::f32::consts::FRAC_1_SQRT_2 } else { 1.0 };
            (0..n_in)
                .map(|n| scale * norm * (PI / n_in as f32 * (n as f32 + 0.5) * k as f32).cos())
                .collect()
        })
        .collect()
}

/// MFCC rows ([coefficient][frame]) from a dB mel spectrogram ([frame][band])
pub fn mfcc_from_log_mel(log_mel: &[Vec<f32>], n_mfcc: usize) -> Vec<Vec<f32>> {
    let n_mels = log_mel.first().map_or(0, |frame| frame.len());
    let mut rows = vec![Vec::with_capacity(log_mel.len()); n_mfcc];
    if n_mels == 0 {
        return rows;
    }

    let basis = dct_matrix(n_mels, n_mfcc);
    for frame in log_mel {
        for (row, coeffs) in rows.iter_mut().zip(&basis) {
            row.push(frame.iter().zip(coeffs).map(|(x, c)| x * c).sum());
        }
    }
    rows
}
