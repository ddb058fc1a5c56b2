//! Typed errors for per-file analysis
//!
//! Batch-level code wraps these in `anyhow` with file context.

use std::path::PathBuf;

/// Failure reported by a feature-extraction backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("audio too short for analysis ({samples} samples)")]
    TooShort { samples: usize },

    #[error("audio is silent")]
    Silent,

    #[error("invalid tempo hint: {0}")]
    InvalidTempoHint(f64),

    #[error("beat tracking produced no beats")]
    NoBeats,

    #[error("{0}")]
    Other(String),
}

/// Tempo resolution failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TempoError {
    #[error("no tempo candidates")]
    NoCandidates,
}

/// Drum pattern quantization failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("tempo must be positive and finite, got {0}")]
    InvalidTempo(f64),
}

/// Why a single file could not be analyzed
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("failed to decode {path:?}: {source:#}")]
    Decode {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("feature extraction failed: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Tempo(#[from] TempoError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("chroma has no usable frames, cannot estimate key")]
    EmptyChroma,

    #[error("analysis task panicked: {0}")]
    Panicked(String),
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
