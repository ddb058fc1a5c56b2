//! Audio input and debug output
//!
//! Decoding is done once per file; the resulting buffer is shared by the
//! feature and descriptor backends.

mod clicks;
mod decode;

pub use clicks::{render_click_track, write_debug_click_track};
pub use decode::{
    load_for_analysis, resample_linear, trim_silence, ANALYSIS_SAMPLE_RATE, MAX_ANALYSIS_SECS,
};

/// Mono f32 samples at a known sample rate
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
