//! Tempo candidates from local autocorrelation of the onset envelope
//!
//! Each analysis window is autocorrelated (Wiener-Khinchin, via FFT) and
//! the best lag is chosen under a log-normal tempo prior centered on
//! 120 BPM. One candidate per window, in time order.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Autocorrelation window length
pub const AC_WINDOW_SECS: f64 = 16.0;

/// Spacing between candidate windows
pub const CANDIDATE_STRIDE_SECS: f64 = 1.0;

const PRIOR_CENTER_BPM: f64 = 120.0;
const PRIOR_STD_OCTAVES: f64 = 1.0;
const MIN_TEMPO: f64 = 30.0;
const MAX_TEMPO: f64 = 320.0;

/// Local-autocorrelation tempo estimator
#[derive(Debug, Clone)]
pub struct TempoEstimator {
    frames_per_sec: f64,
    win_length: usize,
    stride: usize,
}

impl TempoEstimator {
    pub fn new(frames_per_sec: f64) -> Self {
        Self {
            frames_per_sec,
            win_length: ((AC_WINDOW_SECS * frames_per_sec).round() as usize).max(2),
            stride: ((CANDIDATE_STRIDE_SECS * frames_per_sec).round() as usize).max(1),
        }
    }

    /// One tempo estimate per window, in time order. Silent windows
    /// contribute nothing.
    pub fn candidates(&self, envelope: &[f32]) -> Vec<f64> {
        (0..envelope.len())
            .step_by(self.stride)
            .filter_map(|center| self.window_acf(envelope, center))
            .filter_map(|acf| self.best_tempo(&acf))
            .collect()
    }

    /// Single tempo from the mean autocorrelation of all windows
    pub fn global_tempo(&self, envelope: &[f32]) -> Option<f64> {
        let mut mean = vec![0.0f32; self.win_length];
        let mut count = 0usize;

        for center in (0..envelope.len()).step_by(self.stride) {
            if let Some(acf) = self.window_acf(envelope, center) {
                for (m, a) in mean.iter_mut().zip(&acf) {
                    *m += a;
                }
                count += 1;
            }
        }

        if count == 0 {
            return None;
        }
        for m in mean.iter_mut() {
            *m /= count as f32;
        }
        self.best_tempo(&mean)
    }

    /// Hann-weighted window centered on `center`, autocorrelated and
    /// normalized to lag 0
    fn window_acf(&self, envelope: &[f32], center: usize) -> Option<Vec<f32>> {
        let half = self.win_length / 2;
        let window: Vec<f32> = (0..self.win_length)
            .map(|i| {
                let idx = (center + i).checked_sub(half);
                let value = idx.and_then(|idx| envelope.get(idx)).copied().unwrap_or(0.0);
                let t = i as f32 / self.win_length as f32;
                value * (0.5 - 0.5 * (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        let acf = autocorrelate(&window);
        let energy = acf[0];
        if energy <= f32::EPSILON {
            return None;
        }
        Some(acf.into_iter().map(|a| a / energy).collect())
    }

    /// Lag with the best prior-weighted autocorrelation, as BPM
    fn best_tempo(&self, acf: &[f32]) -> Option<f64> {
        let log_center = PRIOR_CENTER_BPM.log2();

        acf.iter()
            .enumerate()
            .skip(1)
            .filter_map(|(lag, &ac)| {
                let bpm = 60.0 * self.frames_per_sec / lag as f64;
                if !(MIN_TEMPO..=MAX_TEMPO).contains(&bpm) {
                    return None;
                }
                let prior = -0.5 * ((bpm.log2() - log_center) / PRIOR_STD_OCTAVES).powi(2);
                let score = (1.0 + 1e6 * ac.max(0.0) as f64).ln() + prior;
                Some((bpm, score))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(bpm, _)| bpm)
    }
}

/// Linear autocorrelation via zero-padded FFT, lags `0..input.len()`
pub fn autocorrelate(input: &[f32]) -> Vec<f32> {
    if input.is_empty() {
        return Vec::new();
    }

    let fft_len = (input.len() * 2).next_power_of_two();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    let mut buffer: Vec<Complex<f32>> = input
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_len)
        .collect();

    fft.process(&mut buffer);

    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }

    ifft.process(&mut buffer);

    let scale = 1.0 / fft_len as f32;
    buffer.iter().take(input.len()).map(|c| c.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPS: f64 = 44_100.0 / 512.0;

    /// Pulse train with one impulse every `period` frames
    fn pulses(len: usize, period: f64) -> Vec<f32> {
        let mut env = vec![0.0f32; len];
        let mut t = 0.0;
        while (t as usize) < len {
            env[t as usize] = 1.0;
            t += period;
        }
        env
    }

    #[test]
    fn test_autocorrelate_matches_direct_sum() {
        let x = [1.0f32, 2.0, 0.5, -1.0];
        let acf = autocorrelate(&x);
        let direct: Vec<f32> = (0..4)
            .map(|lag| (0..4 - lag).map(|i| x[i] * x[i + lag]).sum())
            .collect();
        for (a, d) in acf.iter().zip(&direct) {
            assert!((a - d).abs() < 1e-4);
        }
    }

    #[test]
    fn test_candidates_follow_pulse_tempo() {
        let period = FPS * 60.0 / 125.0;
        let env = pulses((FPS * 30.0) as usize, period);
        let estimator = TempoEstimator::new(FPS);
        let candidates = estimator.candidates(&env);

        assert!(!candidates.is_empty());
        let near = candidates.iter().filter(|&&c| (c - 125.0).abs() < 4.0).count();
        assert!(near * 2 > candidates.len(), "candidates: {:?}", candidates);
    }

    #[test]
    fn test_global_tempo() {
        let period = FPS * 60.0 / 128.0;
        let env = pulses((FPS * 20.0) as usize, period);
        let bpm = TempoEstimator::new(FPS).global_tempo(&env).unwrap();
        assert!((bpm - 128.0).abs() < 4.0, "bpm = {}", bpm);
    }

    #[test]
    fn test_silence_has_no_candidates() {
        let env = vec![0.0f32; 2000];
        let estimator = TempoEstimator::new(FPS);
        assert!(estimator.candidates(&env).is_empty());
        assert!(estimator.global_tempo(&env).is_none());
    }
}
