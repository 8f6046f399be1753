//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs the tracing subscriber (log file always, stderr for batch runs)
//! - runs the shared pipeline
//! - prints reports/plots or launches the TUI
//! - writes the cleaned-dataset export

use std::path::Path;

use clap::Parser;

use crate::app::pipeline::{RunOutput, build_dashboard, run_eda_pipeline, run_pipeline};
use crate::cli::{Command, RunArgs, SampleArgs};
use crate::domain::{PipelineConfig, Stage};
use crate::error::AppError;
use crate::plot::ascii::render_figure;
use crate::report::format::{format_run_summary, format_table};

pub mod pipeline;

/// Entry point for the `demand` binary.
pub fn run() -> Result<(), AppError> {
    // We want `demand` and `demand -u data/usage` to behave like
    // `demand tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let with_stderr = !matches!(cli.command, Command::Tui(_));
    let _log_guard = crate::logging::init(Path::new("."), with_stderr);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Eda(args) => handle_eda(args),
        Command::Tui(args) => handle_tui(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args);
    let run = run_pipeline(&config)?;
    let bundle = build_dashboard(&run);

    println!(
        "{}",
        format_run_summary(
            &run.usage_report,
            &run.weather_report,
            &run.prep,
            &run.eda,
            &run.model
        )
    );

    for table in [
        &bundle.summary_table,
        &bundle.metrics_table,
        &bundle.coefficients_table,
        &bundle.errors,
    ] {
        println!("{}", format_table(table));
    }

    if !args.no_plot {
        println!("{}", render_figure(&bundle.time_series, args.width, args.height));
        println!("{}", render_figure(&bundle.residual, args.width, args.height));
    }

    export_if_ready(&run, &config)?;
    require_clean_data(&run)
}

fn handle_eda(args: RunArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args);
    let run = run_eda_pipeline(&config)?;
    let bundle = build_dashboard(&run);

    println!(
        "{}",
        format_run_summary(
            &run.usage_report,
            &run.weather_report,
            &run.prep,
            &run.eda,
            &run.model
        )
    );
    println!("{}", format_table(&bundle.summary_table));
    println!("{}", format_table(&bundle.errors));

    if !args.no_plot {
        println!("{}", render_figure(&bundle.time_series, args.width, args.height));
    }

    export_if_ready(&run, &config)?;
    require_clean_data(&run)
}

fn handle_tui(args: RunArgs) -> Result<(), AppError> {
    crate::tui::run(pipeline_config_from_args(&args))
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let summary = crate::data::generate_sample_inputs(
        &args.usage_dir,
        &args.weather_dir,
        args.start,
        args.days,
        args.seed,
    )?;
    println!(
        "Generated {} usage files ({} hourly rows) in '{}' and {} weather rows in '{}'.",
        summary.usage_files,
        summary.usage_rows,
        args.usage_dir.display(),
        summary.weather_rows,
        args.weather_dir.display()
    );
    Ok(())
}

/// Write the cleaned dataset when cleaning produced one and export is on.
fn export_if_ready(run: &RunOutput, config: &PipelineConfig) -> Result<(), AppError> {
    if let (Some(prep), Some(path)) = (run.prep.ready(), config.export_path.as_ref()) {
        crate::io::export::write_clean_csv(path, &prep.dataset)?;
        println!("Cleaned dataset written to '{}'.", path.display());
    }
    Ok(())
}

/// Batch runs exit 3 when cleaning produced no usable rows; a failed model on
/// top of usable data still exits 0 (the report shows the cause).
fn require_clean_data(run: &RunOutput) -> Result<(), AppError> {
    match &run.prep {
        Stage::Ready(_) => Ok(()),
        Stage::Empty => Err(AppError::no_data(
            "No usable data after loading and cleaning.",
        )),
        Stage::Failed(cause) => Err(AppError::no_data(format!(
            "Cleaning failed: {cause}"
        ))),
    }
}

pub fn pipeline_config_from_args(args: &RunArgs) -> PipelineConfig {
    PipelineConfig {
        usage_dir: args.usage_dir.clone(),
        weather_dir: args.weather_dir.clone(),
        export_path: (!args.no_export).then(|| args.export.clone()),
        iqr_k: args.iqr_k,
        z_threshold: args.z_threshold,
        corr_warn: args.corr_warn,
        top_peaks: args.top_peaks,
        test_fraction: args.test_fraction,
        ..PipelineConfig::default()
    }
}

/// Rewrite argv so `demand` defaults to `demand tui`.
///
/// Rules:
/// - `demand`                      -> `demand tui`
/// - `demand -u dir ...`           -> `demand tui -u dir ...`
/// - `demand --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "eda" | "tui" | "sample");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(args(&["demand"])), args(&["demand", "tui"]));
        assert_eq!(
            rewrite_args(args(&["demand", "-u", "x"])),
            args(&["demand", "tui", "-u", "x"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["demand", "run"])),
            args(&["demand", "run"])
        );
        assert_eq!(
            rewrite_args(args(&["demand", "--help"])),
            args(&["demand", "--help"])
        );
    }
}
