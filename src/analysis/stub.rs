//! Scripted backend for tests
//!
//! Ignores the audio content (only its length and sample rate are used)
//! and reports a fixed set of tempo candidates, a fixed key and onsets on
//! a regular grid. Beats are laid on a grid at the requested tempo.

use super::traits::{Chroma, FeatureBackend, FeatureSet, SpectralStats};
use crate::audio::AudioBuffer;
use crate::error::BackendError;
use crate::model::{PitchClass, PITCH_CLASSES};

const HOP_LENGTH: usize = 512;

/// Backend returning scripted features
#[derive(Debug, Clone)]
pub struct StubBackend {
    tempo_candidates: Vec<f64>,
    key: PitchClass,
    onset_times: Option<Vec<f64>>,
    spectral: SpectralStats,
    reject_hints: bool,
    panic_on_extract: bool,
}

impl StubBackend {
    /// 128 BPM, key of A, an onset on every beat
    pub fn new() -> Self {
        Self {
            tempo_candidates: vec![128.0],
            key: PitchClass::A,
            onset_times: None,
            spectral: SpectralStats {
                centroid: 1500.1234,
                bandwidth: 1800.5678,
                rolloff: 3200.9876,
            },
            reject_hints: false,
            panic_on_extract: false,
        }
    }

    pub fn with_tempo_candidates(mut self, candidates: Vec<f64>) -> Self {
        self.tempo_candidates = candidates;
        self
    }

    pub fn with_key(mut self, key: PitchClass) -> Self {
        self.key = key;
        self
    }

    /// Report exactly these onsets (seconds) instead of one per beat
    pub fn with_onsets(mut self, onset_times: Vec<f64>) -> Self {
        self.onset_times = Some(onset_times);
        self
    }

    /// Fail every hinted beat-tracking call
    pub fn rejecting_hints(mut self) -> Self {
        self.reject_hints = true;
        self
    }

    /// Panic inside `extract`
    pub fn panicking(mut self) -> Self {
        self.panic_on_extract = true;
        self
    }

    fn grid_bpm(&self) -> f64 {
        self.tempo_candidates
            .first()
            .copied()
            .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
            .unwrap_or(120.0)
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames of a regular grid at `bpm`, starting at frame 0
fn grid_frames(num_frames: usize, bpm: f64, frame_rate: f64) -> Vec<usize> {
    let period = frame_rate * 60.0 / bpm;
    if !period.is_finite() || period < 1.0 {
        return Vec::new();
    }
    (0usize..)
        .map(|i| (i as f64 * period).round() as usize)
        .take_while(|&f| f < num_frames)
        .collect()
}

impl FeatureBackend for StubBackend {
    fn extract(&self, audio: &AudioBuffer) -> Result<FeatureSet, BackendError> {
        if self.panic_on_extract {
            panic!("stub backend asked to panic");
        }
        if audio.is_empty() {
            return Err(BackendError::TooShort { samples: 0 });
        }

        let num_frames = audio.len() / HOP_LENGTH + 1;
        let frame_rate = audio.sample_rate as f64 / HOP_LENGTH as f64;

        let onset_frames = match &self.onset_times {
            Some(times) => times
                .iter()
                .map(|t| (t * frame_rate).round() as usize)
                .filter(|&f| f < num_frames)
                .collect(),
            None => grid_frames(num_frames, self.grid_bpm(), frame_rate),
        };

        let mut onset_envelope = vec![0.0f32; num_frames];
        for &f in &onset_frames {
            onset_envelope[f] = 1.0;
        }

        let mut frame = [0.1f32; PITCH_CLASSES];
        frame[self.key.index()] = 1.0;

        Ok(FeatureSet {
            sample_rate: audio.sample_rate,
            hop_length: HOP_LENGTH,
            onset_envelope,
            tempo_candidates: self.tempo_candidates.clone(),
            onset_frames,
            chroma: Chroma::new(vec![frame; num_frames]),
            spectral: self.spectral,
        })
    }

    fn track_beats(
        &self,
        features: &FeatureSet,
        tempo_hint: Option<f64>,
    ) -> Result<Vec<usize>, BackendError> {
        let bpm = match tempo_hint {
            Some(bpm) if self.reject_hints => return Err(BackendError::InvalidTempoHint(bpm)),
            Some(bpm) => bpm,
            None => self.grid_bpm(),
        };

        let frame_rate = features.sample_rate as f64 / features.hop_length as f64;
        let beats = grid_frames(features.onset_envelope.len(), bpm, frame_rate);
        if beats.is_empty() {
            return Err(BackendError::NoBeats);
        }
        Ok(beats)
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
