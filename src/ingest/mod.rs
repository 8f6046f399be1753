//! Directory loaders for the two raw inputs.
//!
//! Both loaders follow the same contract:
//! - scan one directory (non-recursive) for files with the right extension
//! - skip unreadable or wrong-shaped files, recording a `FileError` per skip
//! - collect row-level problems as `RowError`s instead of aborting the file
//! - return the aggregated rows plus a `LoadReport`; an empty directory or a
//!   directory where every file failed is a *report*, not an error
//!
//! No cleaning logic lives here: rows keep `Option` readings, and missing
//! values survive until the preprocessor drops them.

use std::path::{Path, PathBuf};

use crate::domain::LoadReport;
use crate::error::AppError;

pub mod usage;
pub mod weather;

/// Rows plus the load report describing how they were obtained.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    pub report: LoadReport,
}

/// List files in `dir` with the given extension (case-insensitive), sorted by
/// name for deterministic concatenation order.
pub(crate) fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, AppError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        AppError::config(format!("Failed to read directory '{}': {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            AppError::config(format!("Failed to read directory '{}': {e}", dir.display()))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
