//! Export the cleaned dataset to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per cleaned observation, calendar features included.

use std::path::Path;

use tracing::info;

use crate::domain::CleanDataset;
use crate::error::AppError;

/// Write the cleaned dataset to `path`. Headers come from the row fields.
pub fn write_clean_csv(path: &Path, dataset: &CleanDataset) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::config(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    for row in &dataset.rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::config(format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::config(format!("Failed to flush export CSV: {e}")))?;

    info!(path = %path.display(), rows = dataset.len(), "cleaned dataset exported");
    Ok(())
}
