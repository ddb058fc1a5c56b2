//! Analysis trait definitions and data structures

use crate::audio::AudioBuffer;
use crate::error::BackendError;
use crate::model::PITCH_CLASSES;

/// Feature-extraction backend - allows swapping the native DSP for a
/// scripted stub in tests
pub trait FeatureBackend: Send + Sync {
    /// Extract every feature the core needs from one decoded file
    fn extract(&self, audio: &AudioBuffer) -> Result<FeatureSet, BackendError>;

    /// Track beats over the extracted onset envelope, optionally locked to
    /// a tempo hint. Returns beat positions in frames.
    fn track_beats(
        &self,
        features: &FeatureSet,
        tempo_hint: Option<f64>,
    ) -> Result<Vec<usize>, BackendError>;

    /// Name of this backend (for logging)
    fn name(&self) -> &'static str;
}

/// Optional backend for energy, loudness and danceability
pub trait DescriptorBackend: Send + Sync {
    fn describe(&self, audio: &AudioBuffer) -> Result<LevelDescriptors, BackendError>;

    /// Name of this backend (for logging)
    fn name(&self) -> &'static str;
}

/// Everything the backend extracts from one file
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Sample rate the frames refer to
    pub sample_rate: u32,

    /// Samples between consecutive frames
    pub hop_length: usize,

    /// Onset strength per frame
    pub onset_envelope: Vec<f32>,

    /// Tempo estimates in priority order (BPM)
    pub tempo_candidates: Vec<f64>,

    /// Percussive onset events (frames, increasing)
    pub onset_frames: Vec<usize>,

    pub chroma: Chroma,

    pub spectral: SpectralStats,
}

impl FeatureSet {
    /// Convert frame indices to seconds
    pub fn frames_to_times(&self, frames: &[usize]) -> Vec<f64> {
        let secs_per_frame = self.hop_length as f64 / self.sample_rate as f64;
        frames.iter().map(|&f| f as f64 * secs_per_frame).collect()
    }

    /// Onset events in seconds
    pub fn onset_times(&self) -> Vec<f64> {
        self.frames_to_times(&self.onset_frames)
    }
}

/// Pitch-class energy over time, one 12-bin frame per analysis frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chroma {
    frames: Vec<[f32; PITCH_CLASSES]>,
}

impl Chroma {
    pub fn new(frames: Vec<[f32; PITCH_CLASSES]>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[[f32; PITCH_CLASSES]] {
        &self.frames
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Mean energy of each pitch class across all frames
    pub fn mean_energy(&self) -> Option<[f64; PITCH_CLASSES]> {
        if self.frames.is_empty() {
            return None;
        }

        let mut sums = [0.0f64; PITCH_CLASSES];
        for frame in &self.frames {
            for (sum, &value) in sums.iter_mut().zip(frame) {
                *sum += value as f64;
            }
        }

        let n = self.frames.len() as f64;
        Some(sums.map(|s| s / n))
    }
}

/// Frame-averaged spectral shape (Hz)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectralStats {
    pub centroid: f64,
    pub bandwidth: f64,
    pub rolloff: f64,
}

/// Output of a [`DescriptorBackend`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelDescriptors {
    /// RMS amplitude of the analyzed signal
    pub energy: f64,

    /// Level in dBFS
    pub loudness: f64,

    /// Detrended-fluctuation danceability (0..3, higher is more danceable)
    pub danceability: f64,
}
