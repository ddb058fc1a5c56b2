//! Per-file outcomes and the batch summary

use crate::model::AnalysisRecord;
use std::path::PathBuf;

/// What happened to one enumerated file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Analyzed(AnalysisRecord),

    /// Already present in the collection
    Skipped { filename: String },

    Failed { filename: String, reason: String },
}

impl FileOutcome {
    pub fn filename(&self) -> &str {
        match self {
            FileOutcome::Analyzed(record) => &record.filename,
            FileOutcome::Skipped { filename } | FileOutcome::Failed { filename, .. } => filename,
        }
    }
}

/// Summary of one batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Filenames analyzed in this run, in enumeration order
    pub analyzed: Vec<String>,

    pub skipped: Vec<String>,

    /// Filename and cause of each failure
    pub failed: Vec<(String, String)>,

    /// Where the collection was written
    pub output_path: PathBuf,

    /// Records in the persisted collection
    pub total_records: usize,
}

impl BatchReport {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            ..Default::default()
        }
    }

    /// Account for one outcome
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Analyzed(record) => self.analyzed.push(record.filename.clone()),
            FileOutcome::Skipped { filename } => self.skipped.push(filename.clone()),
            FileOutcome::Failed { filename, reason } => {
                self.failed.push((filename.clone(), reason.clone()))
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
