//! Validation utilities
//!
//! Checks a written artifact independently of the analysis pipeline

mod artifact;

pub use artifact::{validate_artifact, ValidationSummary};
