//! Input file enumeration

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix of generated click tracks, never analyzed themselves
pub const DEBUG_SUFFIX: &str = "_debug";

/// Whether `path` has one of `extensions` (lowercase, compared
/// case-insensitively)
pub fn has_recognized_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            extensions.iter().any(|known| *known == e)
        })
        .unwrap_or(false)
}

fn is_debug_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.ends_with(DEBUG_SUFFIX))
        .unwrap_or(false)
}

/// Files to analyze under `input`.
///
/// A directory yields its direct children (not recursive) with a
/// recognized extension, sorted by file name. A single file must itself
/// have a recognized extension.
pub fn discover_audio_files(input: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        bail!("Path does not exist: {:?}", input);
    }

    if input.is_file() {
        if !has_recognized_extension(input, extensions) {
            bail!(
                "Unsupported file type: {:?} (recognized: {})",
                input,
                extensions.join(", ")
            );
        }
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to read directory {:?}", input))?;
        let path = entry.path();

        if !entry.file_type().is_file() || !has_recognized_extension(path, extensions) {
            continue;
        }
        if is_debug_output(path) {
            log::debug!("Skipping debug output: {:?}", path);
            continue;
        }

        files.push(path.to_path_buf());
    }

    log::debug!("Found {} audio files in {:?}", files.len(), input);
    Ok(files)
}
