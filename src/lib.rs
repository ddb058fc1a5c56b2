//! Groove Analyzer - tempo, key and drum pattern extraction for sample libraries
//!
//! This library analyzes folders of short electronic-music files and keeps
//! an incremental JSON collection of BPM, key and 16-step onset patterns.

pub mod analysis;
pub mod audio;
pub mod batch;
pub mod error;
pub mod model;
pub mod validation;

pub use batch::{AnalysisCoordinator, AnalyzerConfig, BatchReport, FileOutcome, ReportMode};
pub use error::AnalysisError;
