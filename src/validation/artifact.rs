//! Artifact validation
//!
//! Parses the results file record by record (so duplicates are seen rather
//! than silently dropped) and checks the collection invariants.

use crate::model::AnalysisRecord;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// What a valid artifact contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    pub records: usize,

    /// Records carry the extended descriptor fields
    pub extended: bool,

    /// Extended records whose level descriptors are null
    pub degraded: usize,
}

/// Validate the artifact at `path`
///
/// Checks that every record parses (16 binary pattern slots, a known key),
/// that filenames are unique, that every bpm is positive and finite and
/// that all records share one shape.
pub fn validate_artifact(path: &Path) -> Result<ValidationSummary> {
    log::info!("Validating results at: {:?}", path);

    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let records: Vec<AnalysisRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("{:?} is not a valid analysis list", path))?;

    let mut seen = HashSet::new();
    for record in &records {
        if !seen.insert(record.filename.as_str()) {
            bail!("Duplicate record for {}", record.filename);
        }
        if !record.bpm.is_finite() || record.bpm <= 0.0 {
            bail!("{}: invalid bpm {}", record.filename, record.bpm);
        }
    }

    let extended = records.first().map(|r| r.descriptors.is_some()).unwrap_or(false);
    if let Some(odd) = records.iter().find(|r| r.descriptors.is_some() != extended) {
        bail!("{}: record shape differs from the rest of the file", odd.filename);
    }

    let degraded = records
        .iter()
        .filter_map(|r| r.descriptors.as_ref())
        .filter(|d| d.energy.is_none() || d.loudness.is_none() || d.danceability.is_none())
        .count();

    log::info!(
        "{} records, {} mode{}",
        records.len(),
        if extended { "extended" } else { "basic" },
        if degraded > 0 {
            format!(", {} without level descriptors", degraded)
        } else {
            String::new()
        }
    );

    Ok(ValidationSummary {
        records: records.len(),
        extended,
        degraded,
    })
}
