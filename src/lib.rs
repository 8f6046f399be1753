//! `demand-curves` library crate.
//!
//! The binary (`demand`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future GUI/daemon, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod analyze;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod ingest;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod prep;
pub mod report;
pub mod stats;
pub mod tui;
