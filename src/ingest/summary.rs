//! Per-file and per-run ingestion counts.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RowError;

/// How many rows hit each kind of row error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowErrorCounts {
    pub malformed_timestamp: usize,
    pub malformed_size: usize,
    pub unresolved_sender: usize,
    pub no_valid_recipients: usize,
}

impl RowErrorCounts {
    pub fn record(&mut self, error: RowError) {
        match error {
            RowError::MalformedTimestamp => self.malformed_timestamp += 1,
            RowError::MalformedSize => self.malformed_size += 1,
            RowError::UnresolvedSender => self.unresolved_sender += 1,
            RowError::NoValidRecipients => self.no_valid_recipients += 1,
        }
    }

    /// Counts paired with their error kind, in validation order.
    pub fn by_kind(&self) -> [(RowError, usize); 4] {
        [
            (RowError::MalformedTimestamp, self.malformed_timestamp),
            (RowError::MalformedSize, self.malformed_size),
            (RowError::UnresolvedSender, self.unresolved_sender),
            (RowError::NoValidRecipients, self.no_valid_recipients),
        ]
    }

    /// Rows that were dropped (size errors are recovered, not dropped).
    pub fn dropped(&self) -> usize {
        self.by_kind()
            .iter()
            .filter(|(kind, _)| kind.drops_row())
            .map(|(_, n)| n)
            .sum()
    }

    pub fn merge(&mut self, other: &Self) {
        self.malformed_timestamp += other.malformed_timestamp;
        self.malformed_size += other.malformed_size;
        self.unresolved_sender += other.unresolved_sender;
        self.no_valid_recipients += other.no_valid_recipients;
    }
}

/// Outcome counts for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file: PathBuf,
    /// Logical lines seen after the header.
    pub logical_lines: usize,
    /// Records emitted.
    pub records: usize,
    pub errors: RowErrorCounts,
}

impl FileSummary {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            logical_lines: 0,
            records: 0,
            errors: RowErrorCounts::default(),
        }
    }

    pub fn dropped(&self) -> usize {
        self.errors.dropped()
    }
}

/// Outcome counts for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Files in processing order.
    pub files: Vec<FileSummary>,
    /// True when the table was read back from a fresh cache.
    #[serde(default)]
    pub from_cache: bool,
}

impl RunSummary {
    pub fn total_records(&self) -> usize {
        self.files.iter().map(|f| f.records).sum()
    }

    pub fn total_dropped(&self) -> usize {
        self.files.iter().map(FileSummary::dropped).sum()
    }

    pub fn total_errors(&self) -> RowErrorCounts {
        let mut total = RowErrorCounts::default();
        for file in &self.files {
            total.merge(&file.errors);
        }
        total
    }
}
