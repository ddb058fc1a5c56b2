//! Dynamic-programming beat tracker
//!
//! Beats are placed where the onset envelope is strong while keeping
//! inter-beat intervals close to the target period. Transitions are
//! scored with a log-squared penalty on the ratio of interval to period.

/// How strictly beats follow the target period
pub const TIGHTNESS: f64 = 100.0;

/// Track beats over `envelope` at `bpm`, returning beat frames
pub fn track_beats(envelope: &[f32], bpm: f64, frames_per_sec: f64) -> Vec<usize> {
    let period = frames_per_sec * 60.0 / bpm;
    if envelope.is_empty() || !period.is_finite() || period < 1.0 {
        return Vec::new();
    }

    let local = local_score(envelope, period);
    let max_local = local.iter().copied().fold(0.0f64, f64::max);
    if max_local <= 0.0 {
        return Vec::new();
    }

    let (cumscore, backlink) = accumulate(&local, period, max_local);

    let Some(last) = last_beat(&cumscore) else {
        return Vec::new();
    };

    let mut beats = vec![last];
    let mut cursor = last;
    while let Some(prev) = backlink[cursor] {
        beats.push(prev);
        cursor = prev;
    }
    beats.reverse();

    trim_weak_beats(&beats, &local)
}

/// Onset envelope normalized by its standard deviation and smoothed with
/// a Gaussian a fraction of a period wide
fn local_score(envelope: &[f32], period: f64) -> Vec<f64> {
    let n = envelope.len() as f64;
    let mean = envelope.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = envelope.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    if std <= f64::EPSILON {
        return vec![0.0; envelope.len()];
    }

    let radius = period.round() as isize;
    let kernel: Vec<f64> = (-radius..=radius)
        .map(|j| (-0.5 * (j as f64 * 32.0 / period).powi(2)).exp())
        .collect();

    let len = envelope.len() as isize;
    (0..len)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(k, w)| {
                    let idx = i + k as isize - radius;
                    (0..len).contains(&idx).then(|| w * envelope[idx as usize] as f64 / std)
                })
                .sum()
        })
        .collect()
}

/// Cumulative beat score and best predecessor for every frame
fn accumulate(local: &[f64], period: f64, max_local: f64) -> (Vec<f64>, Vec<Option<usize>>) {
    let far = (2.0 * period).round() as usize;
    let near = ((period / 2.0).round() as usize).max(1);

    // offsets back to a candidate predecessor, with their transition cost
    let transitions: Vec<(usize, f64)> = (near..=far)
        .map(|back| {
            let ratio = back as f64 / period;
            (back, -TIGHTNESS * ratio.ln().powi(2))
        })
        .collect();

    let mut cumscore = vec![0.0f64; local.len()];
    let mut backlink = vec![None; local.len()];
    let mut first_beat = true;

    for i in 0..local.len() {
        let best = transitions
            .iter()
            .filter(|(back, _)| *back <= i)
            .map(|&(back, cost)| (i - back, cumscore[i - back] + cost))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((prev, score)) => {
                cumscore[i] = local[i] + score;
                if first_beat && local[i] < 0.01 * max_local {
                    backlink[i] = None;
                } else {
                    backlink[i] = Some(prev);
                    first_beat = false;
                }
            }
            None => cumscore[i] = local[i],
        }
    }

    (cumscore, backlink)
}

/// Last local maximum of the cumulative score that reaches half the median
/// of all local maxima
fn last_beat(cumscore: &[f64]) -> Option<usize> {
    let len = cumscore.len();
    let is_peak = |i: usize| {
        let left = i == 0 || cumscore[i] > cumscore[i - 1];
        let right = i + 1 == len || cumscore[i] >= cumscore[i + 1];
        left && right
    };

    let peaks: Vec<usize> = (0..len).filter(|&i| is_peak(i)).collect();
    if peaks.is_empty() {
        return None;
    }

    let mut values: Vec<f64> = peaks.iter().map(|&i| cumscore[i]).collect();
    values.sort_by(f64::total_cmp);
    let median = values[values.len() / 2];
    let threshold = 0.5 * median;

    peaks.into_iter().rev().find(|&i| cumscore[i] >= threshold)
}

/// Drop leading and trailing beats whose smoothed onset strength falls
/// below half the RMS of all beats
fn trim_weak_beats(beats: &[usize], local: &[f64]) -> Vec<usize> {
    if beats.is_empty() {
        return Vec::new();
    }

    let strength: Vec<f64> = beats.iter().map(|&b| local[b]).collect();
    let smoothed: Vec<f64> = (0..strength.len())
        .map(|j| {
            let prev = if j > 0 { strength[j - 1] } else { 0.0 };
            let next = strength.get(j + 1).copied().unwrap_or(0.0);
            0.5 * prev + strength[j] + 0.5 * next
        })
        .collect();

    let rms = (smoothed.iter().map(|s| s * s).sum::<f64>() / smoothed.len() as f64).sqrt();
    let threshold = 0.5 * rms;

    let Some(start) = smoothed.iter().position(|&s| s >= threshold) else {
        return Vec::new();
    };
    let end = smoothed.iter().rposition(|&s| s >= threshold).unwrap_or(start);

    beats[start..=end].to_vec()
}
