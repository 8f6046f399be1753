//! End-to-end pipeline tests over generated input files.

use chrono::NaiveDate;
use tempfile::TempDir;

use demand_curves::analyze::SeasonalReport;
use demand_curves::app::pipeline::{build_dashboard, run_pipeline};
use demand_curves::data::generate_sample_inputs;
use demand_curves::domain::{PipelineConfig, Stage};
use demand_curves::plot::Figure;

fn generated_config(dir: &TempDir, days: usize) -> PipelineConfig {
    let usage_dir = dir.path().join("usage");
    let weather_dir = dir.path().join("weather");
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    generate_sample_inputs(&usage_dir, &weather_dir, start, days, 42).unwrap();

    PipelineConfig {
        usage_dir,
        weather_dir,
        export_path: Some(dir.path().join("cleaned_combined_data.csv")),
        ..PipelineConfig::default()
    }
}

#[test]
fn full_run_over_a_month_of_generated_data() {
    let dir = tempfile::tempdir().unwrap();
    let config = generated_config(&dir, 30);

    let run = run_pipeline(&config).unwrap();

    let prep = run.prep.ready().expect("cleaning should produce data");
    assert!(prep.dataset.len() <= 720);
    assert!(prep.dataset.len() > 600, "cleaning removed too much");
    // Cleaned rows are chronological and fully populated by construction.
    let ts: Vec<_> = prep.dataset.rows.iter().map(|r| r.ts).collect();
    let mut sorted = ts.clone();
    sorted.sort();
    assert_eq!(ts, sorted);

    let eda = run.eda.ready().expect("eda should run");
    assert_eq!(eda.summaries.len(), 2);
    assert_eq!(eda.peaks.len(), 3);
    assert!(matches!(eda.seasonal, SeasonalReport::Ready { .. }));

    let model = run.model.ready().expect("model should fit");
    assert!(model.metrics.rmse.is_finite());
    assert!(model.metrics.mae > 0.0);
    assert!(model.metrics.r2 > 0.0, "r2 = {}", model.metrics.r2);
    assert_eq!(model.train_rows + model.test_rows, prep.dataset.len());
    // Trailing ~20% of rows in chronological order.
    let expected = prep.dataset.len().div_ceil(5);
    assert!(model.test_rows >= expected && model.test_rows <= expected + 1);
}

#[test]
fn dashboard_is_fully_populated_on_a_good_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = generated_config(&dir, 30);

    let run = run_pipeline(&config).unwrap();
    let bundle = build_dashboard(&run);

    assert!(matches!(bundle.time_series, Figure::TimeSeries(_)));
    assert!(matches!(bundle.univariate, Figure::Univariate(_)));
    assert!(matches!(bundle.correlation, Figure::Correlation(_)));
    assert!(matches!(bundle.residual, Figure::Residual(_)));
    assert!(bundle.decomposition.is_some());

    assert!(!bundle.summary_table.rows.is_empty());
    assert!(!bundle.metrics_table.rows.is_empty());
    // Intercept row plus nine features.
    assert_eq!(bundle.coefficients_table.rows.len(), 10);
}

#[test]
fn short_range_skips_seasonal_but_still_models() {
    let dir = tempfile::tempdir().unwrap();
    // Five days: under the one-week seasonal gate, enough for the regression.
    let config = generated_config(&dir, 5);

    let run = run_pipeline(&config).unwrap();
    let eda = run.eda.ready().expect("eda should run");
    assert!(matches!(eda.seasonal, SeasonalReport::Insufficient { .. }));
    assert!(run.model.is_ready());
}

#[test]
fn empty_directories_degrade_without_panicking() {
    let dir = tempfile::tempdir().unwrap();
    let usage_dir = dir.path().join("usage");
    let weather_dir = dir.path().join("weather");
    std::fs::create_dir_all(&usage_dir).unwrap();
    std::fs::create_dir_all(&weather_dir).unwrap();

    let config = PipelineConfig {
        usage_dir,
        weather_dir,
        ..PipelineConfig::default()
    };

    let run = run_pipeline(&config).unwrap();
    assert!(matches!(run.prep, Stage::Empty));
    assert!(matches!(run.eda, Stage::Empty));
    assert!(matches!(run.model, Stage::Empty));

    let bundle = build_dashboard(&run);
    assert!(matches!(bundle.time_series, Figure::Placeholder { .. }));
    assert_eq!(bundle.errors.note.as_deref(), Some("no ingest errors"));
}

#[test]
fn export_writes_the_cleaned_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = generated_config(&dir, 10);

    let run = run_pipeline(&config).unwrap();
    let prep = run.prep.ready().unwrap();
    let path = config.export_path.as_ref().unwrap();
    demand_curves::io::export::write_clean_csv(path, &prep.dataset).unwrap();

    let text = std::fs::read_to_string(path).unwrap();
    // Header plus one line per cleaned row.
    assert_eq!(text.lines().count(), prep.dataset.len() + 1);
    assert!(text.lines().next().unwrap().contains("temperature"));
}
