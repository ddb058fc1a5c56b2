//! Batch analysis configuration

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default artifact name, placed next to the analyzed files
pub const DEFAULT_OUTPUT_NAME: &str = "music_analysis.json";

/// Extensions recognized when enumerating a folder (lowercase, no dot)
pub const DEFAULT_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "aac", "ogg", "m4a"];

/// Configuration for one batch run
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Where the collection is loaded from and persisted to
    pub output_path: PathBuf,

    /// Recognized audio extensions, lowercase without the dot
    pub extensions: Vec<String>,

    /// Write a `<stem>_debug.wav` click track next to every analyzed file
    pub debug: bool,

    /// Worker threads (1 = sequential)
    pub jobs: usize,

    /// Which fields each record carries
    pub report_mode: ReportMode,

    /// Optional capabilities available to this run
    pub capabilities: Capabilities,
}

/// Record shape written to the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// filename, bpm, key, drum_pattern
    #[default]
    Basic,

    /// Basic plus energy, loudness, danceability and spectral statistics
    Extended,
}

/// Capabilities decided once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Energy/loudness/danceability can be computed
    pub descriptors: bool,
}

impl Capabilities {
    /// What this build supports
    pub fn detect() -> Self {
        Self {
            descriptors: cfg!(feature = "descriptors"),
        }
    }

    /// Nothing optional
    pub fn none() -> Self {
        Self { descriptors: false }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// Artifact location when none is given: inside the folder being
/// analyzed, or the working directory for a single file
pub fn default_output_path(input: &Path) -> Result<PathBuf> {
    if input.is_dir() {
        return Ok(input.join(DEFAULT_OUTPUT_NAME));
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(DEFAULT_OUTPUT_NAME))
}

impl AnalyzerConfig {
    /// Create a configuration persisting to `output_path`
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            debug: false,
            jobs: 1,
            report_mode: ReportMode::Basic,
            capabilities: Capabilities::detect(),
        }
    }

    /// Replace the recognized extensions (leading dots and case are ignored)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Enable debug click tracks
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the number of worker threads (0 is treated as 1)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_report_mode(mut self, mode: ReportMode) -> Self {
        self.report_mode = mode;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Whether descriptor fields should be computed for this run
    pub fn wants_descriptors(&self) -> bool {
        self.report_mode == ReportMode::Extended && self.capabilities.descriptors
    }
}
