//! Ingestion: from export files to a numbered, feature-enriched message table.

pub mod features;
pub mod pipeline;
pub mod summary;

pub use pipeline::{ingest_file, ingest_files, run_ingestion, IngestOptions, IngestRun};
