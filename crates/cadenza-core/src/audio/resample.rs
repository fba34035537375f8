//! Audio resampling using rubato

use anyhow::{Context, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Resample mono audio from `from_rate` to `to_rate`
pub fn resample_to_target(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;

    // Whole signal as a single chunk
    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        samples.len(),
        1,
    )
    .context("Failed to create resampler")?;

    let output = resampler
        .process(&[samples], None)
        .context("Resampling failed")?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut mono = output.into_iter().next().unwrap_or_default();
    mono.truncate(expected);

    log::debug!(
        "Resampled {} samples @ {}Hz to {} samples @ {}Hz",
        samples.len(),
        from_rate,
        mono.len(),
        to_rate
    );

    Ok(mono)
}
