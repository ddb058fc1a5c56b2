//! Audio analysis layer
//!
//! Feature extraction sits behind the [`FeatureBackend`] trait so the
//! native DSP can be swapped for the scripted [`StubBackend`] in tests.
//! Tempo resolution, drum pattern quantization and key estimation are pure
//! functions of the backend's output.

#[cfg(feature = "descriptors")]
mod descriptors;
mod key;
mod native;
mod pattern;
mod stub;
mod tempo;
mod traits;

#[cfg(feature = "descriptors")]
pub use descriptors::NativeDescriptors;
pub use key::estimate_key;
pub use native::{autocorrelate, NativeBackend, PeakPicker, Spectrogram, TempoEstimator};
pub use pattern::{quantize_pattern, ONSET_LEAD_SECS};
pub use stub::StubBackend;
pub use tempo::{ResolvedTempo, TempoResolver, TempoRule};
pub use traits::{
    Chroma, DescriptorBackend, FeatureBackend, FeatureSet, LevelDescriptors, SpectralStats,
};

/// Descriptor backend compiled into this build, if any
pub fn default_descriptor_backend() -> Option<Box<dyn DescriptorBackend>> {
    #[cfg(feature = "descriptors")]
    {
        Some(Box::new(NativeDescriptors::new()))
    }
    #[cfg(not(feature = "descriptors"))]
    {
        None
    }
}
