//! Onset strength envelope and onset event picking

/// Floor of the log-power spectrum, relative to its peak
const TOP_DB: f32 = 80.0;

/// Log-spectral flux: mean positive dB increase across bins, per frame
pub fn onset_strength(magnitude: &[Vec<f32>]) -> Vec<f32> {
    let to_db = |m: f32| 10.0 * (m * m).max(1e-10).log10();

    let peak_db = magnitude
        .iter()
        .flat_map(|frame| frame.iter())
        .map(|&m| to_db(m))
        .fold(f32::NEG_INFINITY, f32::max);
    let floor = peak_db - TOP_DB;

    let mut envelope = Vec::with_capacity(magnitude.len());
    let mut prev: Option<Vec<f32>> = None;

    for frame in magnitude {
        let db: Vec<f32> = frame.iter().map(|&m| to_db(m).max(floor)).collect();

        let flux = match &prev {
            Some(prev) if !db.is_empty() => {
                db.iter()
                    .zip(prev)
                    .map(|(cur, old)| (cur - old).max(0.0))
                    .sum::<f32>()
                    / db.len() as f32
            }
            _ => 0.0,
        };

        envelope.push(flux);
        prev = Some(db);
    }

    envelope
}

/// Adaptive-threshold peak picker over a normalized onset envelope
#[derive(Debug, Clone)]
pub struct PeakPicker {
    /// Frames before `n` that must not exceed it
    pub pre_max: usize,
    /// Frames after `n` (inclusive of `n`) that must not exceed it
    pub post_max: usize,
    /// Frames before `n` in the moving average
    pub pre_avg: usize,
    /// Frames after `n` (inclusive of `n`) in the moving average
    pub post_avg: usize,
    /// Margin above the moving average
    pub delta: f32,
    /// Minimum frames between picked onsets
    pub wait: usize,
}

impl PeakPicker {
    /// Window sizes for a given frame rate: 30 ms max window,
    /// 100 ms averaging window, 30 ms refractory period
    pub fn for_frame_rate(frames_per_sec: f64) -> Self {
        let frames = |secs: f64| (secs * frames_per_sec).floor() as usize;
        Self {
            pre_max: frames(0.03),
            post_max: 1,
            pre_avg: frames(0.10),
            post_avg: frames(0.10) + 1,
            delta: 0.07,
            wait: frames(0.03),
        }
    }

    /// Pick onset frames. The envelope is rescaled to [0, 1] first.
    pub fn pick(&self, envelope: &[f32]) -> Vec<usize> {
        let min = envelope.iter().copied().fold(f32::INFINITY, f32::min);
        let max = envelope.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if envelope.is_empty() || max - min <= f32::EPSILON {
            return Vec::new();
        }
        let norm: Vec<f32> = envelope.iter().map(|&v| (v - min) / (max - min)).collect();

        let len = norm.len();
        let mut onsets = Vec::new();
        let mut last: Option<usize> = None;

        for n in 0..len {
            let x = norm[n];

            let max_window = &norm[n.saturating_sub(self.pre_max)..(n + self.post_max).min(len)];
            if max_window.iter().any(|&v| v > x) {
                continue;
            }

            let avg_window = &norm[n.saturating_sub(self.pre_avg)..(n + self.post_avg).min(len)];
            let avg = avg_window.iter().sum::<f32>() / avg_window.len() as f32;
            if x < avg + self.delta {
                continue;
            }

            if let Some(prev) = last {
                if n <= prev + self.wait {
                    continue;
                }
            }

            onsets.push(n);
            last = Some(n);
        }

        onsets
    }
}
