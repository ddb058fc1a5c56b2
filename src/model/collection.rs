use super::AnalysisRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered, append-only set of analysis records, unique by filename
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AnalysisRecord>", into = "Vec<AnalysisRecord>")]
pub struct AnalysisCollection {
    /// Records in insertion order
    records: Vec<AnalysisRecord>,

    /// Filenames present in `records`
    filenames: HashSet<String>,
}

impl AnalysisCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; returns false (and keeps the existing one) when
    /// the filename is already present
    pub fn push(&mut self, record: AnalysisRecord) -> bool {
        if self.filenames.contains(&record.filename) {
            return false;
        }
        self.filenames.insert(record.filename.clone());
        self.records.push(record);
        true
    }

    /// Whether a record for this filename exists
    pub fn contains(&self, filename: &str) -> bool {
        self.filenames.contains(filename)
    }

    /// Get a record by filename
    pub fn get(&self, filename: &str) -> Option<&AnalysisRecord> {
        self.records.iter().find(|r| r.filename == filename)
    }

    /// All filenames already analyzed
    pub fn filenames(&self) -> &HashSet<String> {
        &self.filenames
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the stored records carry extended fields; `None` when empty
    pub fn has_descriptors(&self) -> Option<bool> {
        self.records.first().map(|r| r.descriptors.is_some())
    }
}

impl From<Vec<AnalysisRecord>> for AnalysisCollection {
    /// Later duplicates of a filename are dropped
    fn from(records: Vec<AnalysisRecord>) -> Self {
        let mut collection = Self::new();
        for record in records {
            let filename = record.filename.clone();
            if !collection.push(record) {
                log::warn!("Dropping duplicate record for {}", filename);
            }
        }
        collection
    }
}

impl From<AnalysisCollection> for Vec<AnalysisRecord> {
    fn from(collection: AnalysisCollection) -> Self {
        collection.records
    }
}
