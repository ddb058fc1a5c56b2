//! Native feature-extraction backend
//!
//! Pure-Rust DSP on top of rustfft: one STFT per file, median-filter
//! harmonic/percussive separation, onset envelope and onset events from
//! the percussive part, chroma from the harmonic part, local
//! autocorrelation tempo candidates and a dynamic-programming beat tracker.

mod beats;
mod chroma;
mod hpss;
mod onset;
mod spectral;
mod stft;
mod tempogram;

pub use onset::PeakPicker;
pub use stft::Spectrogram;
pub use tempogram::{autocorrelate, TempoEstimator};

use super::traits::{FeatureBackend, FeatureSet};
use crate::audio::AudioBuffer;
use crate::error::BackendError;

/// Native DSP backend
#[derive(Debug, Clone)]
pub struct NativeBackend {
    n_fft: usize,
    hop_length: usize,
    hpss_kernel: usize,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            hpss_kernel: 31,
        }
    }

    /// Use a different STFT geometry
    pub fn with_fft(mut self, n_fft: usize, hop_length: usize) -> Self {
        self.n_fft = n_fft;
        self.hop_length = hop_length;
        self
    }

    fn frame_rate(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 / self.hop_length as f64
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureBackend for NativeBackend {
    fn extract(&self, audio: &AudioBuffer) -> Result<FeatureSet, BackendError> {
        if audio.len() < self.n_fft * 2 {
            return Err(BackendError::TooShort {
                samples: audio.len(),
            });
        }
        if audio.samples.iter().all(|&s| s == 0.0) {
            return Err(BackendError::Silent);
        }

        let spec = Spectrogram::compute(
            &audio.samples,
            audio.sample_rate,
            self.n_fft,
            self.hop_length,
        );
        let frame_rate = spec.frame_rate();
        log::debug!(
            "STFT: {} frames x {} bins ({:.1} frames/s)",
            spec.num_frames(),
            spec.num_bins(),
            frame_rate
        );

        let separated = hpss::separate(&spec.frames, self.hpss_kernel);

        let onset_envelope = onset::onset_strength(&separated.percussive);
        let onset_frames = PeakPicker::for_frame_rate(frame_rate).pick(&onset_envelope);

        let tempo_candidates = TempoEstimator::new(frame_rate).candidates(&onset_envelope);
        if tempo_candidates.is_empty() {
            return Err(BackendError::Other(
                "tempo estimation produced no candidates".to_string(),
            ));
        }

        let chroma = chroma::chroma_from_spectrogram(&spec, &separated.harmonic);
        let spectral = spectral::spectral_stats(&spec);

        log::debug!(
            "Features: {} onsets, {} tempo candidates, {} chroma frames",
            onset_frames.len(),
            tempo_candidates.len(),
            chroma.num_frames()
        );

        Ok(FeatureSet {
            sample_rate: audio.sample_rate,
            hop_length: self.hop_length,
            onset_envelope,
            tempo_candidates,
            onset_frames,
            chroma,
            spectral,
        })
    }

    fn track_beats(
        &self,
        features: &FeatureSet,
        tempo_hint: Option<f64>,
    ) -> Result<Vec<usize>, BackendError> {
        let frame_rate = self.frame_rate(features.sample_rate);

        let bpm = match tempo_hint {
            Some(bpm) => {
                // period must span at least one frame
                if !bpm.is_finite() || bpm <= 0.0 || bpm > frame_rate * 60.0 {
                    return Err(BackendError::InvalidTempoHint(bpm));
                }
                bpm
            }
            None => TempoEstimator::new(frame_rate)
                .global_tempo(&features.onset_envelope)
                .ok_or(BackendError::NoBeats)?,
        };

        let beats = beats::track_beats(&features.onset_envelope, bpm, frame_rate);
        if beats.is_empty() {
            return Err(BackendError::NoBeats);
        }
        Ok(beats)
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
