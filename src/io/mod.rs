//! Output helpers.
//!
//! - cleaned-dataset CSV export (`export`)
//!
//! (Input loading lives in `ingest`, next to the per-format parsers.)

pub mod export;

pub use export::*;
