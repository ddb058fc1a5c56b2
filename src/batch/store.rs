//! Loading and persisting the analysis artifact

use crate::model::AnalysisCollection;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Load the collection at `path`, or an empty one if it does not exist.
///
/// A present but unparseable artifact is an error so it is never
/// overwritten with a partial collection.
pub fn load_collection(path: &Path) -> Result<AnalysisCollection> {
    if !path.exists() {
        log::debug!("No existing results at {:?}", path);
        return Ok(AnalysisCollection::new());
    }

    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let collection: AnalysisCollection = serde_json::from_str(&contents)
        .with_context(|| format!("Existing results at {:?} are not a valid analysis list", path))?;

    log::info!("Loaded {} existing results from {:?}", collection.len(), path);
    Ok(collection)
}

/// Serialize as a pretty-printed JSON array with a trailing newline
pub fn render_collection(collection: &AnalysisCollection) -> Result<String> {
    let mut json =
        serde_json::to_string_pretty(collection).context("Failed to serialize results")?;
    json.push('\n');
    Ok(json)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Overwrite `path` with `collection`, via a sibling temp file and rename
pub fn persist_collection(path: &Path, collection: &AnalysisCollection) -> Result<()> {
    let json = render_collection(collection)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, json).with_context(|| format!("Failed to write {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move {:?} to {:?}", tmp, path))?;

    log::debug!("Wrote {} results to {:?}", collection.len(), path);
    Ok(())
}
