//! Onset envelope, tempo estimation and dynamic-programming beat tracking

/// Tempo estimate and beat positions of a clip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatTrack {
    /// Beats per minute, 0 when no pulse was found
    pub tempo: f32,
    /// Beat positions in analysis frames
    pub beat_frames: Vec<usize>,
    /// Beat positions in seconds
    pub beat_times: Vec<f32>,
}

/// Spectral flux of a dB mel spectrogram ([frame][band])
///
/// The first frame has no predecessor and is 0.
pub fn onset_strength(log_mel: &[Vec<f32>]) -> Vec<f32> {
    let mut onset = Vec::with_capacity(log_mel.len());
    if log_mel.is_empty() {
        return onset;
    }
    onset.push(0.0);

    for pair in log_mel.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let bands = cur.len().max(1) as f32;
        let flux: f32 = cur.iter().zip(prev).map(|(c, p)| (c - p).max(0.0)).sum();
        onset.push(flux / bands);
    }
    onset
}

/// Estimate tempo from the autocorrelation of the onset envelope
///
/// Each lag up to `window_secs` is scored by its normalised autocorrelation
/// plus a log-normal prior centred on `start_bpm` with a one-octave spread.
pub fn estimate_tempo(
    onset: &[f32],
    frame_rate: f32,
    start_bpm: f32,
    max_bpm: f32,
    window_secs: f32,
) -> f32 {
    if onset.len() < 2 {
        return 0.0;
    }

    let max_lag = ((window_secs * frame_rate).round() as usize).min(onset.len() - 1);
    let autocorr: Vec<f64> = (0..=max_lag)
        .map(|lag| {
            onset[..onset.len() - lag]
                .iter()
                .zip(&onset[lag..])
                .map(|(a, b)| *a as f64 * *b as f64)
                .sum()
        })
        .collect();

    let energy = autocorr[0];
    if !(energy > 0.0) {
        return 0.0;
    }

    let log_start = (start_bpm as f64).log2();
    let mut best: Option<(f64, f64)> = None;

    for (lag, &ac) in autocorr.iter().enumerate().skip(1) {
        let bpm = 60.0 * frame_rate as f64 / lag as f64;
        if bpm > max_bpm as f64 {
            continue;
        }
        let prior = -0.5 * (bpm.log2() - log_start).powi(2);
        let score = (1e6 * (ac / energy).max(0.0)).ln_1p() + prior;
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, bpm));
        }
    }

    best.map_or(0.0, |(_, bpm)| bpm as f32)
}

/// Track beats through the onset envelope at a fixed `tempo`
pub fn track_beats(onset: &[f32], tempo: f32, frame_rate: f32, tightness: f32) -> Vec<usize> {
    let n = onset.len();
    if n < 2 || !(tempo > 0.0) {
        return Vec::new();
    }

    let std = sample_std(onset);
    if !(std > 0.0) {
        return Vec::new();
    }

    let period = (60.0 * frame_rate / tempo).round().max(1.0) as usize;
    let local = local_score(onset, std, period);

    // Candidate predecessors lie between two periods and half a period back
    let earliest = 2 * period as isize;
    let latest = ((period as f32 / 2.0).round() as isize).max(1);
    let penalties: Vec<(isize, f32)> = (latest..=earliest)
        .map(|back| {
            let ratio = back as f32 / period as f32;
            (back, -tightness * ratio.ln().powi(2))
        })
        .collect();

    let mut cumulative = vec![0.0f32; n];
    let mut backlink: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        let mut best: Option<(f32, usize)> = None;
        for &(back, penalty) in &penalties {
            let prev = i as isize - back;
            if prev < 0 {
                continue;
            }
            let prev = prev as usize;
            let score = cumulative[prev] + penalty;
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, prev));
            }
        }
        cumulative[i] = local[i] + best.map_or(0.0, |(s, _)| s);
        backlink[i] = best.map(|(_, prev)| prev);
    }

    let mut beats = vec![last_beat(&cumulative)];
    while let Some(prev) = beats.last().and_then(|&b| backlink[b]) {
        beats.push(prev);
    }
    beats.reverse();

    trim_weak_edges(&local, beats)
}

/// Run the full tracker: tempo estimate followed by beat placement
pub fn beat_track(
    onset: &[f32],
    frame_rate: f32,
    start_bpm: f32,
    max_bpm: f32,
    window_secs: f32,
    tightness: f32,
) -> BeatTrack {
    let tempo = estimate_tempo(onset, frame_rate, start_bpm, max_bpm, window_secs);
    let beat_frames = track_beats(onset, tempo, frame_rate, tightness);
    let beat_times = beat_frames.iter().map(|&f| f as f32 / frame_rate).collect();

    log::debug!("Beat track: {:.1} BPM, {} beats", tempo, beat_frames.len());

    BeatTrack {
        tempo,
        beat_frames,
        beat_times,
    }
}

fn sample_std(values: &[f32]) -> f32 {
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let ss: f32 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

/// Onset envelope normalised by `std` and smoothed with a Gaussian one period wide
fn local_score(onset: &[f32], std: f32, period: usize) -> Vec<f32> {
    let window: Vec<f32> = (0..=2 * period)
        .map(|j| {
            let x = (j as f32 - period as f32) * 32.0 / period as f32;
            (-0.5 * x * x).exp()
        })
        .collect();

    let n = onset.len() as isize;
    (0..n)
        .map(|i| {
            window
                .iter()
                .enumerate()
                .filter_map(|(j, w)| {
                    let src = i + period as isize - j as isize;
                    (0..n).contains(&src).then(|| onset[src as usize] / std * w)
                })
                .sum()
        })
        .collect()
}

/// Last local maximum of the cumulative score above half the median peak
fn last_beat(cumulative: &[f32]) -> usize {
    let n = cumulative.len();
    let is_peak = |i: usize| {
        let rises = i == 0 || cumulative[i] > cumulative[i - 1];
        let holds = i + 1 == n || cumulative[i] >= cumulative[i + 1];
        rises && holds
    };

    let mut peaks: Vec<f32> = (0..n).filter(|&i| is_peak(i)).map(|i| cumulative[i]).collect();
    if peaks.is_empty() {
        return n - 1;
    }
    peaks.sort_by(|a, b| a.total_cmp(b));
    let median = peaks[peaks.len() / 2];
    let threshold = 0.5 * median;

    (0..n)
        .rev()
        .find(|&i| is_peak(i) && cumulative[i] >= threshold)
        .unwrap_or(n - 1)
}

/// Drop leading and trailing beats whose onset support is weak
fn trim_weak_edges(local: &[f32], beats: Vec<usize>) -> Vec<usize> {
    if beats.is_empty() {
        return beats;
    }

    let strength: Vec<f32> = beats.iter().map(|&b| local[b]).collect();
    let rms = (strength.iter().map(|s| s * s).sum::<f32>() / strength.len() as f32).sqrt();
    let threshold = 0.5 * rms;

    let first = strength.iter().position(|&s| s >= threshold);
    let last = strength.iter().rposition(|&s| s >= threshold);
    match (first, last) {
        (Some(first), Some(last)) => beats[first..=last].to_vec(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_RATE: f32 = 22050.0 / 512.0;

    /// Impulse train with one onset every `period` frames
    fn pulse_train(len: usize, period: usize) -> Vec<f32> {
        (0..len).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_onset_strength_rises_only() {
        let log_mel = vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![0.0, 0.0]];
        let onset = onset_strength(&log_mel);
        assert_eq!(onset, vec![0.0, 5.0, 0.0]);
    }

    #[test]
    fn test_silence_has_no_tempo() {
        let onset = vec![0.0; 500];
        assert_eq!(estimate_tempo(&onset, FRAME_RATE, 120.0, 320.0, 8.0), 0.0);
        let track = beat_track(&onset, FRAME_RATE, 120.0, 320.0, 8.0, 100.0);
        assert_eq!(track.tempo, 0.0);
        assert!(track.beat_frames.is_empty());
    }

    #[test]
    fn test_empty_onset() {
        let track = beat_track(&[], FRAME_RATE, 120.0, 320.0, 8.0, 100.0);
        assert_eq!(track, BeatTrack::default());
    }

    #[test]
    fn test_tempo_of_pulse_train() {
        // 22 frames per beat at 43.07 fps ~ 117.5 BPM
        let onset = pulse_train(1500, 22);
        let tempo = estimate_tempo(&onset, FRAME_RATE, 120.0, 320.0, 8.0);
        let expected = 60.0 * FRAME_RATE / 22.0;
        assert!((tempo - expected).abs() < 1.0, "tempo {}", tempo);
    }

    #[test]
    fn test_beats_follow_pulses() {
        let onset = pulse_train(1000, 20);
        let track = beat_track(&onset, FRAME_RATE, 120.0, 320.0, 8.0, 100.0);
        assert!(track.beat_frames.len() > 30);
        assert!(track.beat_frames.windows(2).all(|w| w[1] > w[0]));
        let on_pulse = track.beat_frames.iter().filter(|&&b| b % 20 == 0).count();
        assert!(on_pulse * 10 >= track.beat_frames.len() * 9);
        assert_eq!(track.beat_times.len(), track.beat_frames.len());
    }
}
