//! Export the message table for downstream fact-table builders.

pub mod csv;
pub mod json;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}
