//! Short-time Fourier transform and framing helpers
//!
//! Frames are centred: the signal is padded by `n_fft / 2` on both sides so
//! that frame `t` is centred on sample `t * hop_length`.

use crate::config::AnalysisConfig;
use anyhow::Result;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Magnitude spectrogram
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Magnitude values [time_frame][frequency_bin]
    pub magnitudes: Vec<Vec<f32>>,
    /// Number of time frames
    pub num_frames: usize,
    /// Number of frequency bins (n_fft / 2 + 1)
    pub num_bins: usize,
    pub n_fft: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    /// Squared magnitudes
    pub fn power(&self) -> Vec<Vec<f32>> {
        self.magnitudes
            .iter()
            .map(|frame| frame.iter().map(|m| m * m).collect())
            .collect()
    }

    /// Centre frequency of every bin in Hz
    pub fn bin_frequencies(&self) -> Vec<f32> {
        fft_frequencies(self.sample_rate, self.n_fft)
    }
}

/// Padding applied to the edges of a centred signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    /// Mirror the signal without repeating the edge sample
    Reflect,
    /// Repeat the edge sample
    Edge,
    /// Pad with zeros
    Constant,
}

/// Number of centred frames for a signal of `len` samples
pub fn frame_count(len: usize, hop_length: usize) -> usize {
    if len == 0 {
        0
    } else {
        1 + len / hop_length
    }
}

/// Pad `samples` by `pad` on both sides
pub fn pad_center(samples: &[f32], pad: usize, mode: PadMode) -> Vec<f32> {
    let len = samples.len();
    let mut out = Vec::with_capacity(len + 2 * pad);

    // Reflection needs more samples than the pad width
    let mode = if mode == PadMode::Reflect && len <= pad {
        PadMode::Constant
    } else {
        mode
    };

    let left = |i: usize| -> f32 {
        match mode {
            PadMode::Reflect => samples[pad - i],
            PadMode::Edge => samples.first().copied().unwrap_or(0.0),
            PadMode::Constant => 0.0,
        }
    };
    let right = |i: usize| -> f32 {
        match mode {
            PadMode::Reflect => samples[len - 2 - i],
            PadMode::Edge => samples.last().copied().unwrap_or(0.0),
            PadMode::Constant => 0.0,
        }
    };

    out.extend((0..pad).map(left));
    out.extend_from_slice(samples);
    out.extend((0..pad).map(right));
    out
}

/// Iterate over centred frames of `frame_length` samples
pub fn frames<'a>(
    padded: &'a [f32],
    frame_length: usize,
    hop_length: usize,
    num_frames: usize,
) -> impl Iterator<Item = &'a [f32]> + 'a {
    (0..num_frames).map(move |t| {
        let start = t * hop_length;
        let end = (start + frame_length).min(padded.len());
        &padded[start.min(end)..end]
    })
}

/// Frequencies of the non-negative FFT bins
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    (0..=n_fft / 2)
        .map(|k| k as f32 * sample_rate as f32 / n_fft as f32)
        .collect()
}

/// Compute the centred STFT magnitude spectrogram
pub fn compute_stft(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Result<Spectrogram> {
    let fft_size = config.n_fft;
    let hop_size = config.hop_length;
    let num_bins = fft_size / 2 + 1;
    let num_frames = frame_count(samples.len(), hop_size);

    let padded = pad_center(samples, fft_size / 2, PadMode::Reflect);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    let window = create_hann_window(fft_size);

    let mut magnitudes = Vec::with_capacity(num_frames);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); fft_size];

    for frame in frames(&padded, fft_size, hop_size, num_frames) {
        for (i, slot) in buffer.iter_mut().enumerate() {
            let s = frame.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(s * window[i], 0.0);
        }

        fft.process(&mut buffer);

        magnitudes.push(buffer[..num_bins].iter().map(|c| c.norm()).collect());
    }

    log::debug!(
        "STFT: {} samples -> {} frames x {} bins",
        samples.len(),
        num_frames,
        num_bins
    );

    Ok(Spectrogram {
        magnitudes,
        num_frames,
        num_bins,
        n_fft: fft_size,
        sample_rate,
    })
}

/// Create periodic Hann window
fn create_hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / size as f32).cos())
        .collect()
}
