//! Incremental batch analysis: discovery, per-file pipeline and persistence

pub mod config;
pub mod discovery;
pub mod pipeline;
pub mod report;
pub mod store;

pub use config::{
    default_output_path, AnalyzerConfig, Capabilities, ReportMode, DEFAULT_EXTENSIONS,
    DEFAULT_OUTPUT_NAME,
};
pub use discovery::discover_audio_files;
pub use pipeline::AnalysisCoordinator;
pub use report::{BatchReport, FileOutcome};
pub use store::{load_collection, persist_collection};
