//! Batch analysis orchestration

use super::config::{AnalyzerConfig, ReportMode};
use super::discovery::discover_audio_files;
use super::report::{BatchReport, FileOutcome};
use super::store::{load_collection, persist_collection};
use crate::analysis::{
    default_descriptor_backend, estimate_key, quantize_pattern, DescriptorBackend,
    FeatureBackend, FeatureSet, TempoResolver,
};
use crate::audio::{load_for_analysis, write_debug_click_track, AudioBuffer};
use crate::error::AnalysisError;
use crate::model::{AnalysisCollection, AnalysisRecord, Descriptors, PATTERN_STEPS};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Runs the per-file analysis over a folder and keeps the artifact up to date
pub struct AnalysisCoordinator<B: FeatureBackend> {
    config: AnalyzerConfig,
    backend: B,
    descriptors: Option<Box<dyn DescriptorBackend>>,
    resolver: TempoResolver,
}

impl<B: FeatureBackend> AnalysisCoordinator<B> {
    /// Create a coordinator; the descriptor backend compiled into this
    /// build is used when the configuration allows it
    pub fn new(config: AnalyzerConfig, backend: B) -> Self {
        let descriptors = if config.capabilities.descriptors {
            default_descriptor_backend()
        } else {
            None
        };

        Self {
            config,
            backend,
            descriptors,
            resolver: TempoResolver::new(),
        }
    }

    /// Replace the descriptor backend
    pub fn with_descriptor_backend(
        mut self,
        backend: Option<Box<dyn DescriptorBackend>>,
    ) -> Self {
        self.descriptors = backend;
        self
    }

    pub fn with_resolver(mut self, resolver: TempoResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze every new file under `input` and persist the merged collection
    pub fn run(&self, input: &Path) -> Result<BatchReport> {
        log::info!("Analyzing {:?} with {} backend", input, self.backend.name());
        log::info!("Results: {:?}", self.config.output_path);

        let mut collection = load_collection(&self.config.output_path)?;
        let mode = self.effective_mode(&collection);
        let files = discover_audio_files(input, &self.config.extensions)?;

        if files.is_empty() {
            log::warn!("No audio files found in {:?}", input);
        }

        // Step 1: split into already analyzed and pending
        let mut outcomes: Vec<Option<FileOutcome>> = Vec::with_capacity(files.len());
        let mut pending: Vec<(usize, PathBuf, String)> = Vec::new();
        for (index, path) in files.into_iter().enumerate() {
            let filename = file_name_of(&path);
            if collection.contains(&filename) {
                log::info!("Skipping {} (already analyzed)", filename);
                outcomes.push(Some(FileOutcome::Skipped { filename }));
            } else {
                outcomes.push(None);
                pending.push((index, path, filename));
            }
        }

        log::info!(
            "{} files to analyze, {} already analyzed",
            pending.len(),
            outcomes.len() - pending.len()
        );

        // Step 2: analyze, preserving enumeration order
        let analyzed = self.analyze_pending(&pending, mode)?;
        for ((index, _, _), outcome) in pending.iter().zip(analyzed) {
            outcomes[*index] = Some(outcome);
        }

        // Step 3: merge
        let mut report = BatchReport::new(self.config.output_path.clone());
        for outcome in outcomes.into_iter().flatten() {
            if let FileOutcome::Analyzed(record) = &outcome {
                if !collection.push(record.clone()) {
                    log::debug!(
                        "{} already in results, keeping the first record",
                        record.filename
                    );
                }
            }
            report.record(&outcome);
        }

        // Step 4: persist
        persist_collection(&self.config.output_path, &collection)
            .with_context(|| format!("Failed to save results to {:?}", self.config.output_path))?;
        report.total_records = collection.len();

        if report.has_failures() {
            log::warn!("{} files failed to analyze", report.failed.len());
        }

        Ok(report)
    }

    /// Records appended to an existing artifact keep the artifact's shape
    fn effective_mode(&self, collection: &AnalysisCollection) -> ReportMode {
        let existing = match collection.has_descriptors() {
            Some(true) => ReportMode::Extended,
            Some(false) => ReportMode::Basic,
            None => return self.config.report_mode,
        };
        if existing != self.config.report_mode {
            log::warn!(
                "{:?} holds {:?} records, appending in that shape instead of {:?}",
                self.config.output_path,
                existing,
                self.config.report_mode
            );
        }
        existing
    }

    fn analyze_pending(
        &self,
        pending: &[(usize, PathBuf, String)],
        mode: ReportMode,
    ) -> Result<Vec<FileOutcome>> {
        let total = pending.len();

        if self.config.jobs <= 1 || total <= 1 {
            return Ok(pending
                .iter()
                .enumerate()
                .map(|(i, (_, path, filename))| {
                    log::info!("[{}/{}] Analyzing: {}", i + 1, total, filename);
                    self.analyze_isolated(path, filename, mode)
                })
                .collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
            .context("Failed to start worker pool")?;
        log::info!("Using {} worker threads", self.config.jobs);

        Ok(pool.install(|| {
            pending
                .par_iter()
                .enumerate()
                .map(|(i, (_, path, filename))| {
                    log::info!("[{}/{}] Analyzing: {}", i + 1, total, filename);
                    self.analyze_isolated(path, filename, mode)
                })
                .collect()
        }))
    }

    /// Analyze one file; errors and panics become a failed outcome
    fn analyze_isolated(&self, path: &Path, filename: &str, mode: ReportMode) -> FileOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.analyze_file_as(path, filename, mode)
        }))
        .unwrap_or_else(|payload| {
            Err(AnalysisError::Panicked(panic_message(payload.as_ref())))
        });

        match result {
            Ok(record) => {
                log::info!(
                    "{}: {:.1} BPM, key {}, pattern {}",
                    filename,
                    record.bpm,
                    record.key,
                    record.drum_pattern.visualize()
                );
                FileOutcome::Analyzed(record)
            }
            Err(e) => {
                log::error!("Error processing {}: {}", filename, e);
                FileOutcome::Failed {
                    filename: filename.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Full per-file analysis in the configured report mode
    pub fn analyze_file(
        &self,
        path: &Path,
        filename: &str,
    ) -> crate::error::Result<AnalysisRecord> {
        self.analyze_file_as(path, filename, self.config.report_mode)
    }

    fn analyze_file_as(
        &self,
        path: &Path,
        filename: &str,
        mode: ReportMode,
    ) -> crate::error::Result<AnalysisRecord> {
        let audio = load_for_analysis(path).map_err(|source| AnalysisError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("{}: {:.1}s of audio after trimming", filename, audio.duration_secs());

        let features = self.backend.extract(&audio)?;

        let tempo = self.resolver.resolve(&features.tempo_candidates)?;
        log::debug!(
            "{}: {:.2} BPM via {:?} from candidates {:?}",
            filename,
            tempo.bpm,
            tempo.rule,
            features.tempo_candidates
        );

        let beat_frames = match self.backend.track_beats(&features, Some(tempo.bpm)) {
            Ok(beats) => beats,
            Err(e) => {
                log::warn!(
                    "{}: beat tracking at {:.1} BPM failed ({}), retrying without tempo hint",
                    filename,
                    tempo.bpm,
                    e
                );
                self.backend.track_beats(&features, None)?
            }
        };

        let beat_times = features.frames_to_times(&beat_frames);
        if beat_times.len() < PATTERN_STEPS {
            log::warn!(
                "{}: only {} beats detected, drum pattern padded to {} steps",
                filename,
                beat_times.len(),
                PATTERN_STEPS
            );
        }

        let pattern = quantize_pattern(&beat_times, &features.onset_times(), tempo.bpm)?;
        let key = estimate_key(&features.chroma).ok_or(AnalysisError::EmptyChroma)?;

        let descriptors = match mode {
            ReportMode::Basic => None,
            ReportMode::Extended => Some(self.describe(&audio, &features, filename)),
        };

        if self.config.debug {
            match write_debug_click_track(path, &audio, &beat_times) {
                Ok(out) => log::info!("Debug click track written to {:?}", out),
                Err(e) => log::warn!("{}: failed to write debug click track: {:#}", filename, e),
            }
        }

        Ok(AnalysisRecord::new(filename, tempo.bpm, key, pattern, descriptors))
    }

    /// Extended-mode fields; level descriptors degrade to null
    fn describe(
        &self,
        audio: &AudioBuffer,
        features: &FeatureSet,
        filename: &str,
    ) -> Descriptors {
        let level = if self.config.capabilities.descriptors {
            self.descriptors
                .as_ref()
                .and_then(|backend| match backend.describe(audio) {
                    Ok(level) => Some(level),
                    Err(e) => {
                        log::warn!(
                            "{}: {} descriptors unavailable: {}",
                            filename,
                            backend.name(),
                            e
                        );
                        None
                    }
                })
        } else {
            None
        };

        Descriptors {
            energy: level.map(|l| l.energy),
            loudness: level.map(|l| l.loudness),
            danceability: level.map(|l| l.danceability),
            spectral_centroid: features.spectral.centroid,
            spectral_bandwidth: features.spectral.bandwidth,
            spectral_rolloff: features.spectral.rolloff,
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
