//! Formatted terminal output for batch runs.
//!
//! We keep formatting code in one place so:
//! - the analysis/modeling code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::analyze::{EdaOutput, SeasonalReport};
use crate::domain::{LoadReport, Stage};
use crate::fit::ModelOutput;
use crate::prep::PrepOutput;
use crate::report::Table;

/// Format the full run summary (ingest counters + stage statuses + findings).
pub fn format_run_summary(
    usage: &LoadReport,
    weather: &LoadReport,
    prep: &Stage<PrepOutput>,
    eda: &Stage<EdaOutput>,
    model: &Stage<ModelOutput>,
) -> String {
    let mut out = String::new();

    out.push_str("=== demand - Electricity Demand Analysis ===\n");
    out.push_str(&format!(
        "Usage files: {}/{} loaded | rows: {}/{} used\n",
        usage.files_loaded, usage.files_seen, usage.rows_used, usage.rows_read
    ));
    out.push_str(&format!(
        "Weather files: {}/{} loaded | rows: {}/{} used\n",
        weather.files_loaded, weather.files_seen, weather.rows_used, weather.rows_read
    ));

    out.push_str(&format!(
        "\nStages: clean={} | eda={} | model={}\n",
        prep.status_label(),
        eda.status_label(),
        model.status_label()
    ));

    if let Stage::Ready(prep) = prep {
        out.push_str(&format!(
            "Cleaning: merged={} outliers_removed={} missing_dropped={} clean={}\n",
            prep.merged_rows,
            prep.outlier_rows_removed,
            prep.missing_rows_dropped,
            prep.dataset.len()
        ));
    }

    if let Stage::Ready(eda) = eda {
        out.push_str(&format_findings(eda));
    }
    if let Stage::Failed(cause) = eda {
        out.push_str(&format!("EDA failed: {cause}\n"));
    }
    if let Stage::Failed(cause) = model {
        out.push_str(&format!("Modeling failed: {cause}\n"));
    }

    out
}

fn format_findings(eda: &EdaOutput) -> String {
    let mut out = String::new();

    out.push_str("\nFindings:\n");
    if let Some(trend) = eda.trend {
        out.push_str(&format!(
            "- trend: {:+.4} usage per row (intercept {:.2})\n",
            trend.slope, trend.intercept
        ));
    }
    if !eda.peaks.is_empty() {
        let peaks: Vec<String> = eda
            .peaks
            .iter()
            .map(|(idx, v)| format!("row {idx} ({v:.1})"))
            .collect();
        out.push_str(&format!("- peaks: {}\n", peaks.join(", ")));
    }
    for (a, b, r) in &eda.collinearity_warnings {
        out.push_str(&format!("- high correlation: {a} vs {b} (r={r:.3})\n"));
    }
    match &eda.seasonal {
        SeasonalReport::Insufficient { rows, required } => {
            out.push_str(&format!(
                "- seasonal analysis skipped: {rows} rows, {required} required\n"
            ));
        }
        SeasonalReport::Ready { adf, .. } => {
            out.push_str("- seasonal decomposition: period 24 (additive)\n");
            if let Some(adf) = adf {
                out.push_str(&format!(
                    "- ADF: statistic={:.4} p={:.4} lags={} -> {}\n",
                    adf.statistic,
                    adf.p_value,
                    adf.lags,
                    if adf.stationary {
                        "stationary"
                    } else {
                        "non-stationary"
                    }
                ));
            }
        }
    }

    out
}

/// Render a table as fixed-width text. Column widths fit the content.
pub fn format_table(table: &Table) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}:\n", table.title));

    if let Some(note) = &table.note {
        out.push_str(&format!("  ({note})\n"));
        if table.rows.is_empty() {
            return out;
        }
    }

    let columns = table.headers.len().max(
        table.rows.iter().map(Vec::len).max().unwrap_or(0),
    );
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(&table.headers).chain(table.rows.iter()) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |row: &[String]| -> String {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        format!("{}\n", cells.join("  ").trim_end())
    };

    if !table.headers.is_empty() {
        out.push_str(&format_row(&table.headers));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format!("{}\n", rule.join("  ").trim_end()));
    }
    for row in &table.rows {
        out.push_str(&format_row(row));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_align_to_the_widest_cell() {
        let table = Table {
            title: "T".to_string(),
            headers: vec!["a".to_string(), "b".to_string()],
            rows: vec![
                vec!["x".to_string(), "1".to_string()],
                vec!["longer".to_string(), "22".to_string()],
            ],
            note: None,
        };
        let txt = format_table(&table);
        let expected = concat!(
            "T:\n",
            "a       b\n",
            "------  --\n",
            "x       1\n",
            "longer  22\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn placeholder_table_prints_only_the_note() {
        let table = Table::placeholder("Model metrics", "model training failed");
        let txt = format_table(&table);
        assert_eq!(txt, "Model metrics:\n  (model training failed)\n");
    }

    #[test]
    fn summary_mentions_stage_statuses() {
        let txt = format_run_summary(
            &LoadReport::default(),
            &LoadReport::default(),
            &Stage::Empty,
            &Stage::Empty,
            &Stage::Failed("x".to_string()),
        );
        assert!(txt.contains("clean=no data"));
        assert!(txt.contains("model=failed"));
        assert!(txt.contains("Modeling failed: x"));
    }
}
