//! Command-line parsing for the electricity demand analyzer.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the analysis/modeling code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "demand", version, about = "Electricity Demand Analysis Pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: load, clean, analyze, model, report, export.
    Run(RunArgs),
    /// Run loading, cleaning, and exploratory analysis only.
    Eda(RunArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `demand run`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(RunArgs),
    /// Generate synthetic usage/weather input files.
    Sample(SampleArgs),
}

/// Common options for batch runs, EDA-only runs, and the TUI.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Directory of hourly usage JSON files.
    #[arg(short = 'u', long, default_value = "data/usage")]
    pub usage_dir: PathBuf,

    /// Directory of daily weather CSV files.
    #[arg(short = 'w', long, default_value = "data/weather")]
    pub weather_dir: PathBuf,

    /// Where to write the cleaned dataset.
    #[arg(long, default_value = "cleaned_combined_data.csv")]
    pub export: PathBuf,

    /// Disable the cleaned-dataset export.
    #[arg(long)]
    pub no_export: bool,

    /// IQR multiplier for the robust outlier bounds.
    #[arg(long, default_value_t = 1.5)]
    pub iqr_k: f64,

    /// |z| threshold for the standard-score outlier detector.
    #[arg(long, default_value_t = 3.0)]
    pub z_threshold: f64,

    /// Off-diagonal |r| above which feature pairs are flagged as collinear.
    #[arg(long, default_value_t = 0.75)]
    pub corr_warn: f64,

    /// Number of top usage peaks annotated on the time-series plot.
    #[arg(long, default_value_t = 3)]
    pub top_peaks: usize,

    /// Fraction of rows held out as the chronological test set.
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Disable the terminal plots (rendered by default).
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for synthetic input generation.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Directory to write usage JSON files into.
    #[arg(short = 'u', long, default_value = "data/usage")]
    pub usage_dir: PathBuf,

    /// Directory to write the weather CSV into.
    #[arg(short = 'w', long, default_value = "data/weather")]
    pub weather_dir: PathBuf,

    /// First day of the generated range.
    #[arg(long, default_value = "2024-01-01")]
    pub start: NaiveDate,

    /// Number of days to generate (24 hourly readings each).
    #[arg(short = 'd', long, default_value_t = 30)]
    pub days: usize,

    /// Random seed for reproducible generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::parse_from(argv).command {
            Command::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn plots_render_unless_no_plot_is_given() {
        assert!(!run_args(&["demand", "run"]).no_plot);
        assert!(run_args(&["demand", "run", "--no-plot"]).no_plot);
    }
}
