//! Energy, loudness and danceability descriptors
//!
//! Danceability uses detrended fluctuation analysis of the frame-level
//! amplitude envelope: strongly periodic music has a low scaling exponent
//! over beat-length time scales, and danceability is the mean inverse
//! exponent.

use super::traits::{DescriptorBackend, LevelDescriptors};
use crate::audio::AudioBuffer;
use crate::error::BackendError;

/// Frame length of the amplitude envelope
const FRAME_SECS: f64 = 0.01;
/// Shortest and longest fluctuation scales
const MIN_SCALE_SECS: f64 = 0.31;
const MAX_SCALE_SECS: f64 = 8.8;
/// Ratio between consecutive scales
const SCALE_STEP: f64 = 1.1;

/// Native descriptor backend
#[derive(Debug, Clone, Default)]
pub struct NativeDescriptors;

impl NativeDescriptors {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptorBackend for NativeDescriptors {
    fn describe(&self, audio: &AudioBuffer) -> Result<LevelDescriptors, BackendError> {
        if audio.is_empty() {
            return Err(BackendError::TooShort { samples: 0 });
        }

        let mean_square =
            audio.samples.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / audio.len() as f64;
        let energy = mean_square.sqrt();
        if energy <= 0.0 {
            return Err(BackendError::Silent);
        }
        let loudness = 10.0 * mean_square.log10();

        let danceability = danceability(audio)?;

        Ok(LevelDescriptors {
            energy,
            loudness,
            danceability,
        })
    }

    fn name(&self) -> &'static str {
        "native-descriptors"
    }
}

/// Mean inverse DFA exponent across the scale range
fn danceability(audio: &AudioBuffer) -> Result<f64, BackendError> {
    let frame_len = ((FRAME_SECS * audio.sample_rate as f64) as usize).max(1);

    // standard deviation per frame
    let envelope: Vec<f64> = audio
        .samples
        .chunks_exact(frame_len)
        .map(|frame| {
            let mean = frame.iter().map(|&s| s as f64).sum::<f64>() / frame_len as f64;
            let var = frame
                .iter()
                .map(|&s| (s as f64 - mean).powi(2))
                .sum::<f64>()
                / frame_len as f64;
            var.sqrt()
        })
        .collect();

    let mean = envelope.iter().sum::<f64>() / envelope.len().max(1) as f64;
    let mut integrated = Vec::with_capacity(envelope.len());
    let mut acc = 0.0;
    for v in &envelope {
        acc += v - mean;
        integrated.push(acc);
    }

    let frames_per_sec = 1.0 / FRAME_SECS;
    let mut scales = Vec::new();
    let mut scale = MIN_SCALE_SECS * frames_per_sec;
    while scale <= MAX_SCALE_SECS * frames_per_sec {
        let tau = scale.round() as usize;
        if tau * 2 > integrated.len() {
            break;
        }
        if scales.last() != Some(&tau) {
            scales.push(tau);
        }
        scale *= SCALE_STEP;
    }

    if scales.len() < 2 {
        return Err(BackendError::TooShort {
            samples: audio.len(),
        });
    }

    // a perfectly steady envelope has no fluctuation at any scale
    let fluctuations: Vec<(f64, f64)> = scales
        .iter()
        .filter_map(|&tau| {
            let f = fluctuation(&integrated, tau);
            (f > 1e-12).then(|| ((tau as f64).log10(), f.log10()))
        })
        .collect();

    let inverse_alphas: Vec<f64> = fluctuations
        .windows(2)
        .filter_map(|w| {
            let alpha = (w[1].1 - w[0].1) / (w[1].0 - w[0].0);
            (alpha > 0.0).then(|| 1.0 / alpha)
        })
        .collect();

    if inverse_alphas.is_empty() {
        return Ok(0.0);
    }
    Ok(inverse_alphas.iter().sum::<f64>() / inverse_alphas.len() as f64)
}

/// Root-mean-square residual after removing a linear trend from each
/// non-overlapping segment of length `tau`
fn fluctuation(integrated: &[f64], tau: usize) -> f64 {
    let segments = integrated.len() / tau;
    if segments == 0 || tau < 2 {
        return 0.0;
    }

    let x_mean = (tau as f64 - 1.0) / 2.0;
    let x_var: f64 = (0..tau).map(|x| (x as f64 - x_mean).powi(2)).sum();

    let total: f64 = integrated
        .chunks_exact(tau)
        .map(|seg| {
            let y_mean = seg.iter().sum::<f64>() / tau as f64;
            let cov: f64 = seg
                .iter()
                .enumerate()
                .map(|(x, y)| (x as f64 - x_mean) * (y - y_mean))
                .sum();
            let slope = cov / x_var;
            seg.iter()
                .enumerate()
                .map(|(x, y)| {
                    let fit = y_mean + slope * (x as f64 - x_mean);
                    (y - fit).powi(2)
                })
                .sum::<f64>()
                / tau as f64
        })
        .sum();

    (total / segments as f64).sqrt()
}
