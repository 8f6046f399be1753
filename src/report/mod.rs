//! Report tables: summary statistics, model metrics, coefficients, errors.
//!
//! Tables are plain `Vec<Vec<String>>` grids so the TUI can render them as
//! ratatui rows and the CLI can render them through `report::format` without
//! either side touching the analysis types. Every builder has a placeholder
//! counterpart carrying the failure cause, so the dashboard always hands
//! back the same set of tables no matter which stage degraded.

use crate::analyze::EdaOutput;
use crate::domain::LoadReport;
use crate::fit::ModelOutput;
use crate::prep::PrepOutput;

pub mod format;

/// A titled grid of cells. `rows` may be empty (placeholder or no data).
#[derive(Debug, Clone)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Set when the stage behind this table failed or produced nothing.
    pub note: Option<String>,
}

impl Table {
    pub fn placeholder(title: &str, note: impl Into<String>) -> Self {
        Table {
            title: title.to_string(),
            headers: Vec::new(),
            rows: Vec::new(),
            note: Some(note.into()),
        }
    }
}

/// Per-column describe statistics, one row per column.
pub fn summary_table(eda: &EdaOutput) -> Table {
    let headers = [
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max", "skew", "kurtosis",
    ]
    .map(str::to_string)
    .to_vec();

    let rows = eda
        .summaries
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                s.count.to_string(),
                format!("{:.3}", s.mean),
                format!("{:.3}", s.std),
                format!("{:.3}", s.min),
                format!("{:.3}", s.q25),
                format!("{:.3}", s.q50),
                format!("{:.3}", s.q75),
                format!("{:.3}", s.max),
                format!("{:.3}", s.skewness),
                format!("{:.3}", s.kurtosis),
            ]
        })
        .collect();

    Table {
        title: "Summary statistics".to_string(),
        headers,
        rows,
        note: None,
    }
}

/// Held-out metrics plus the advisory residual flags.
pub fn metrics_table(model: &ModelOutput) -> Table {
    let m = &model.metrics;
    let d = &model.diagnostics;
    let rows = vec![
        vec!["train rows".to_string(), model.train_rows.to_string()],
        vec!["test rows".to_string(), model.test_rows.to_string()],
        vec!["MAE".to_string(), format!("{:.4}", m.mae)],
        vec!["MSE".to_string(), format!("{:.4}", m.mse)],
        vec!["RMSE".to_string(), format!("{:.4}", m.rmse)],
        vec!["R²".to_string(), format!("{:.4}", m.r2)],
        vec![
            "residual skewness".to_string(),
            format!("{:.4}{}", d.skewness, flag(d.skewed)),
        ],
        vec![
            "mean |residual|".to_string(),
            format!("{:.4}{}", d.mean_abs_residual, flag(d.large_errors)),
        ],
        vec![
            "residual std".to_string(),
            format!("{:.4}{}", d.residual_std, flag(d.heteroscedastic_risk)),
        ],
    ];

    Table {
        title: "Model metrics".to_string(),
        headers: vec!["metric".to_string(), "value".to_string()],
        rows,
        note: None,
    }
}

/// Intercept plus coefficients in the model's (signed-descending) order.
pub fn coefficients_table(model: &ModelOutput) -> Table {
    let mut rows = vec![vec![
        "(intercept)".to_string(),
        format!("{:.4}", model.model.intercept),
    ]];
    rows.extend(
        model
            .model
            .coefficients
            .iter()
            .map(|(name, coef)| vec![name.clone(), format!("{coef:.4}")]),
    );

    Table {
        title: "Regression coefficients".to_string(),
        headers: vec!["feature".to_string(), "coefficient".to_string()],
        rows,
        note: None,
    }
}

/// Typed per-file and per-row ingest problems, one row each.
pub fn error_table(usage: &LoadReport, weather: &LoadReport) -> Table {
    let mut rows = Vec::new();
    for (source, report) in [("usage", usage), ("weather", weather)] {
        for e in &report.file_errors {
            rows.push(vec![
                source.to_string(),
                "file".to_string(),
                e.path.display().to_string(),
                e.cause.clone(),
            ]);
        }
        for e in &report.row_errors {
            rows.push(vec![
                source.to_string(),
                "row".to_string(),
                format!("{}:{}", e.file.display(), e.line),
                e.message.clone(),
            ]);
        }
    }

    let note = rows.is_empty().then(|| "no ingest errors".to_string());
    Table {
        title: "Ingest errors".to_string(),
        headers: ["source", "kind", "location", "cause"]
            .map(str::to_string)
            .to_vec(),
        rows,
        note,
    }
}

/// Cleaning counters for the run summary.
pub fn cleaning_table(prep: &PrepOutput) -> Table {
    Table {
        title: "Cleaning".to_string(),
        headers: vec!["step".to_string(), "rows".to_string()],
        rows: vec![
            vec!["merged".to_string(), prep.merged_rows.to_string()],
            vec![
                "outliers removed".to_string(),
                prep.outlier_rows_removed.to_string(),
            ],
            vec![
                "missing dropped".to_string(),
                prep.missing_rows_dropped.to_string(),
            ],
            vec!["clean".to_string(), prep.dataset.len().to_string()],
        ],
        note: None,
    }
}

fn flag(raised: bool) -> &'static str {
    if raised { " [!]" } else { "" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileError, LoadReport, RowError};
    use std::path::PathBuf;

    #[test]
    fn error_table_interleaves_file_and_row_problems() {
        let usage = LoadReport {
            file_errors: vec![FileError {
                path: PathBuf::from("a.json"),
                cause: "not valid JSON".to_string(),
            }],
            row_errors: vec![RowError {
                file: PathBuf::from("b.json"),
                line: 3,
                message: "bad period".to_string(),
            }],
            ..LoadReport::default()
        };
        let weather = LoadReport::default();

        let t = error_table(&usage, &weather);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0][1], "file");
        assert_eq!(t.rows[1][2], "b.json:3");
        assert!(t.note.is_none());
    }

    #[test]
    fn clean_run_notes_no_errors() {
        let t = error_table(&LoadReport::default(), &LoadReport::default());
        assert!(t.rows.is_empty());
        assert_eq!(t.note.as_deref(), Some("no ingest errors"));
    }

    #[test]
    fn placeholder_carries_the_cause() {
        let t = Table::placeholder("Model metrics", "model training failed: singular");
        assert!(t.rows.is_empty());
        assert_eq!(t.note.as_deref(), Some("model training failed: singular"));
    }
}
