//! Output formatting and persistence for derived views.
//!
//! Supports pretty-printing, JSON serialization, and CSV append of feedback
//! summaries.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::summary::FeedbackSummaryRow;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a view using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(view: &T) {
    debug!("{:#?}", view);
}

/// Logs a view as pretty-printed JSON.
pub fn print_json<T: Serialize>(view: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(view)?);
    Ok(())
}

/// Appends a [`FeedbackSummaryRow`] to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_summary(path: &str, row: &FeedbackSummaryRow) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}
