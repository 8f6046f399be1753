//! Tracing setup: a log file always, stderr only outside the TUI.
//!
//! The file layer is non-blocking; the returned guard must be held for the
//! lifetime of the process or buffered log lines are lost on exit.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_FILE: &str = "demand-curves.log";

/// Install the global subscriber. `with_stderr` is off for TUI sessions
/// (stderr writes would corrupt the alternate screen).
///
/// Returns `None` when the log file cannot be created or a subscriber is
/// already installed; the run proceeds unlogged rather than failing.
pub fn init(log_dir: &Path, with_stderr: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // `rolling::never` panics when the file cannot be created; the builder
    // reports that as an error instead.
    let file_appender = Builder::new()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(log_dir)
        .ok()?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);
    let stderr_layer = with_stderr.then(|| fmt::layer().with_writer(std::io::stderr));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    installed.then_some(guard)
}
