//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load usage + weather -> clean/merge -> EDA -> regression
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//!
//! Only configuration problems (unreadable input directories) surface as
//! `Err`; every downstream stage degrades to `Stage::Empty`/`Stage::Failed`
//! and the dashboard builder substitutes placeholders, so one broken stage
//! never takes down the rest of the run.

use crate::analyze::{EdaOutput, SeasonalReport, analyze};
use crate::domain::{LoadReport, PipelineConfig, Stage};
use crate::error::AppError;
use crate::fit::{ModelOutput, train_model};
use crate::ingest;
use crate::plot::{self, Figure};
use crate::prep::{PrepOutput, preprocess};
use crate::report::{self, Table};

/// All computed outputs of a single `demand run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub usage_report: LoadReport,
    pub weather_report: LoadReport,
    pub prep: Stage<PrepOutput>,
    pub eda: Stage<EdaOutput>,
    pub model: Stage<ModelOutput>,
}

/// The dashboard's fixed set of outputs: four figures, three tables, and the
/// ingest error table. Every slot is always present; a degraded stage fills
/// its slots with placeholders carrying the cause.
#[derive(Debug, Clone)]
pub struct DashboardBundle {
    pub time_series: Figure,
    pub univariate: Figure,
    pub correlation: Figure,
    pub residual: Figure,
    pub summary_table: Table,
    pub metrics_table: Table,
    pub coefficients_table: Table,
    pub errors: Table,
    /// Extra panel when the seasonal analysis ran (a week or more of data).
    pub decomposition: Option<Figure>,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let _span = tracing::info_span!("pipeline").entered();

    let usage = ingest::usage::load_usage_dir(&config.usage_dir)?;
    let weather = ingest::weather::load_weather_dir(&config.weather_dir)?;

    let prep = preprocess(&usage.rows, &weather.rows, config);

    let (eda, model) = match &prep {
        Stage::Ready(p) => (analyze(&p.dataset, config), train_model(&p.dataset, config)),
        Stage::Empty => (Stage::Empty, Stage::Empty),
        Stage::Failed(cause) => (Stage::Failed(cause.clone()), Stage::Failed(cause.clone())),
    };

    Ok(RunOutput {
        usage_report: usage.report,
        weather_report: weather.report,
        prep,
        eda,
        model,
    })
}

/// Load, clean, and analyze only; the model slot stays `Empty`.
pub fn run_eda_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let _span = tracing::info_span!("pipeline", mode = "eda").entered();

    let usage = ingest::usage::load_usage_dir(&config.usage_dir)?;
    let weather = ingest::weather::load_weather_dir(&config.weather_dir)?;

    let prep = preprocess(&usage.rows, &weather.rows, config);
    let eda = match &prep {
        Stage::Ready(p) => analyze(&p.dataset, config),
        Stage::Empty => Stage::Empty,
        Stage::Failed(cause) => Stage::Failed(cause.clone()),
    };

    Ok(RunOutput {
        usage_report: usage.report,
        weather_report: weather.report,
        prep,
        eda,
        model: Stage::Empty,
    })
}

/// Assemble the dashboard from whatever the run produced.
pub fn build_dashboard(run: &RunOutput) -> DashboardBundle {
    let dataset = run.prep.ready().map(|p| &p.dataset);

    let (time_series, univariate, correlation, summary_table) =
        match (dataset, run.eda.ready()) {
            (Some(dataset), Some(eda)) => (
                plot::time_series_figure(dataset, eda),
                plot::univariate_figure(dataset),
                plot::correlation_figure(eda),
                report::summary_table(eda),
            ),
            _ => {
                let note = stage_note(&run.eda);
                (
                    Figure::placeholder("Electricity usage over time", note.clone()),
                    Figure::placeholder("Usage distribution", note.clone()),
                    Figure::placeholder("Feature correlations", note.clone()),
                    Table::placeholder("Summary statistics", note),
                )
            }
        };

    let (residual, metrics_table, coefficients_table) = match run.model.ready() {
        Some(model) => (
            plot::residual_figure(model),
            report::metrics_table(model),
            report::coefficients_table(model),
        ),
        None => {
            let note = stage_note(&run.model);
            (
                Figure::placeholder("Model diagnostics", note.clone()),
                Table::placeholder("Model metrics", note.clone()),
                Table::placeholder("Regression coefficients", note),
            )
        }
    };

    let decomposition = match (dataset, run.eda.ready()) {
        (Some(dataset), Some(eda)) => match &eda.seasonal {
            SeasonalReport::Ready { decomposition, .. } => Some(plot::decomposition_figure(
                decomposition,
                &dataset.usage(),
            )),
            SeasonalReport::Insufficient { .. } => None,
        },
        _ => None,
    };

    DashboardBundle {
        time_series,
        univariate,
        correlation,
        residual,
        summary_table,
        metrics_table,
        coefficients_table,
        errors: report::error_table(&run.usage_report, &run.weather_report),
        decomposition,
    }
}

fn stage_note<T>(stage: &Stage<T>) -> String {
    match stage {
        Stage::Ready(_) => "unavailable".to_string(),
        Stage::Empty => "no data available".to_string(),
        Stage::Failed(cause) => cause.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Table;

    fn empty_run() -> RunOutput {
        RunOutput {
            usage_report: LoadReport::default(),
            weather_report: LoadReport::default(),
            prep: Stage::Empty,
            eda: Stage::Empty,
            model: Stage::Empty,
        }
    }

    #[test]
    fn empty_run_yields_a_full_placeholder_dashboard() {
        let bundle = build_dashboard(&empty_run());

        for figure in [
            &bundle.time_series,
            &bundle.univariate,
            &bundle.correlation,
            &bundle.residual,
        ] {
            assert!(matches!(figure, Figure::Placeholder { .. }));
        }
        for table in [
            &bundle.summary_table,
            &bundle.metrics_table,
            &bundle.coefficients_table,
        ] {
            assert!(table.rows.is_empty());
            assert_eq!(table.note.as_deref(), Some("no data available"));
        }
        assert!(bundle.decomposition.is_none());
    }

    #[test]
    fn failed_model_keeps_its_cause_in_the_placeholders() {
        let mut run = empty_run();
        run.model = Stage::Failed("singular design matrix".to_string());

        let bundle = build_dashboard(&run);
        match &bundle.residual {
            Figure::Placeholder { message, .. } => {
                assert_eq!(message, "singular design matrix");
            }
            other => panic!("expected placeholder, got {other:?}"),
        }
        assert_eq!(
            bundle.metrics_table.note.as_deref(),
            Some("singular design matrix")
        );
    }

    #[test]
    fn missing_usage_directory_is_a_config_error() {
        let config = PipelineConfig {
            usage_dir: "/definitely/not/here".into(),
            ..PipelineConfig::default()
        };
        let err = run_pipeline(&config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn placeholder_tables_match_the_fixed_titles() {
        let bundle = build_dashboard(&empty_run());
        let titles: Vec<&str> = [
            &bundle.summary_table,
            &bundle.metrics_table,
            &bundle.coefficients_table,
            &bundle.errors,
        ]
        .iter()
        .map(|t: &&Table| t.title.as_str())
        .collect();
        assert_eq!(
            titles,
            vec![
                "Summary statistics",
                "Model metrics",
                "Regression coefficients",
                "Ingest errors"
            ]
        );
    }
}
