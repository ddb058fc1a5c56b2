//! Data model for analysis results
//!
//! These structures are independent of both the feature-extraction
//! backend and the on-disk artifact format.

mod collection;
mod key;
mod record;

pub use collection::AnalysisCollection;
pub use key::{PitchClass, PITCH_CLASSES};
pub use record::{round_to, AnalysisRecord, Descriptors, DrumPattern, PATTERN_STEPS};
