//! Turn export files into a [`MessageTable`].
//!
//! Each file is read once, front to back:
//!
//! 1. **open**: the file is opened and wrapped in [`LogicalLines`]; failure
//!    here is the only fatal error for a file.
//! 2. **stream**: every logical line is scanned and validated; rows that
//!    fail are counted and skipped.
//! 3. **close**: the handle is released and the calendar columns are
//!    computed for all surviving rows at once.
//!
//! Message ids are threaded explicitly from file to file, so a file's ids
//! depend only on how many rows the files before it produced.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::cache;
use crate::config::{discover_csv_files, DatasetConfig};
use crate::error::{Result, RowError};
use crate::ingest::features;
use crate::ingest::summary::{FileSummary, RunSummary};
use crate::model::address::AddressToken;
use crate::model::record::{MessageRecord, MessageTable};
use crate::parser::address::{resolve_address, resolve_recipients};
use crate::parser::fields::{scan_fields, RawFields};
use crate::parser::lines::LogicalLines;
use crate::parser::normalize::{is_distribution_list, normalize_email, normalize_name};
use crate::parser::size::decode_size;

/// A validated row, before ids and calendar columns are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub timestamp: NaiveDateTime,
    pub size_bytes: u64,
    /// Set when the size field was unreadable and `size_bytes` defaulted to 0.
    pub size_recovered: bool,
    pub from: AddressToken,
    /// Normalized recipients; never empty.
    pub recipients: Vec<AddressToken>,
}

/// Validate one row's raw fields.
///
/// Checks run in a fixed order: timestamp, size (recovered to 0), sender,
/// recipients. The first dropping failure is returned.
pub fn parse_row(fields: &RawFields, date_format: &str) -> std::result::Result<ParsedRow, RowError> {
    let timestamp = NaiveDateTime::parse_from_str(fields.date.trim(), date_format)
        .map_err(|_| RowError::MalformedTimestamp)?;

    let (size_bytes, size_recovered) = match decode_size(&fields.size) {
        Some(bytes) => (bytes, false),
        None => (0, true),
    };

    let from = resolve_address(&fields.from_raw);
    if !from.is_resolved() {
        return Err(RowError::UnresolvedSender);
    }
    let from = normalize_token(&from);

    let recipients: Vec<AddressToken> = resolve_recipients(&fields.to_raw)
        .iter()
        .map(normalize_token)
        .filter(AddressToken::is_resolved)
        .collect();
    if recipients.is_empty() {
        return Err(RowError::NoValidRecipients);
    }

    Ok(ParsedRow {
        timestamp,
        size_bytes,
        size_recovered,
        from,
        recipients,
    })
}

fn normalize_token(token: &AddressToken) -> AddressToken {
    AddressToken::new(
        normalize_name(&token.display_name),
        normalize_email(&token.email),
    )
}

/// Records and counts produced by one file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub records: Vec<MessageRecord>,
    pub summary: FileSummary,
}

/// Ingest one export file, numbering its records from `first_id`.
///
/// Returns an error only if the file cannot be opened or read; malformed
/// rows are counted in the summary instead.
pub fn ingest_file(path: &Path, dataset: &DatasetConfig, first_id: u64) -> Result<FileOutcome> {
    let lines = LogicalLines::open(path)?;
    let outcome = ingest_lines(lines, path, dataset, first_id)?;
    info!(
        file = %path.display(),
        records = outcome.summary.records,
        dropped = outcome.summary.dropped(),
        "Ingested file"
    );
    Ok(outcome)
}

/// Ingest an already-open reader. `label` names the source in summaries.
pub fn ingest_reader<R: BufRead>(
    reader: R,
    label: impl Into<PathBuf>,
    dataset: &DatasetConfig,
    first_id: u64,
) -> Result<FileOutcome> {
    let label = label.into();
    let lines = LogicalLines::new(reader, label.clone());
    ingest_lines(lines, &label, dataset, first_id)
}

fn ingest_lines<R: BufRead>(
    lines: LogicalLines<R>,
    label: &Path,
    dataset: &DatasetConfig,
    first_id: u64,
) -> Result<FileOutcome> {
    let mut summary = FileSummary::new(label);
    let mut rows: Vec<ParsedRow> = Vec::new();

    for (line_no, line) in lines.enumerate() {
        let line = line?;
        summary.logical_lines += 1;

        match parse_row(&scan_fields(&line), &dataset.date_format) {
            Ok(row) => {
                if row.size_recovered {
                    summary.errors.record(RowError::MalformedSize);
                    debug!(file = %label.display(), line = line_no, "Unreadable size, using 0");
                }
                rows.push(row);
            }
            Err(e) => {
                summary.errors.record(e);
                debug!(
                    file = %label.display(),
                    line = line_no,
                    kind = e.label(),
                    "Dropping row"
                );
            }
        }
    }

    let records = finish_rows(rows, dataset, first_id);
    summary.records = records.len();
    Ok(FileOutcome { records, summary })
}

/// Attach ids and calendar columns to a file's validated rows.
fn finish_rows(rows: Vec<ParsedRow>, dataset: &DatasetConfig, first_id: u64) -> Vec<MessageRecord> {
    let timestamps: Vec<NaiveDateTime> = rows.iter().map(|r| r.timestamp).collect();
    let temporal = features::compute(&timestamps, dataset);

    rows.into_iter()
        .zip(temporal)
        .zip(first_id..)
        .map(|((row, t), msg_id)| {
            let from_is_distribution_list =
                is_distribution_list(&row.from.email, &row.from.display_name);
            let to_is_distribution_list = row
                .recipients
                .iter()
                .map(|r| is_distribution_list(&r.email, &r.display_name))
                .collect();
            let (to_emails, to_names): (Vec<String>, Vec<String>) = row
                .recipients
                .into_iter()
                .map(|r| (r.email, r.display_name))
                .unzip();

            MessageRecord {
                msg_id,
                timestamp: row.timestamp,
                size_bytes: row.size_bytes,
                from_email: row.from.email,
                from_name: row.from.display_name,
                n_recipients: to_emails.len(),
                to_emails,
                to_names,
                week_id: t.week_id,
                hour: t.hour,
                day_of_week: t.day_of_week,
                is_after_hours: t.is_after_hours,
                is_weekend: t.is_weekend,
                from_is_distribution_list,
                to_is_distribution_list,
            }
        })
        .collect()
}

/// The table and counts of one run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IngestRun {
    pub table: MessageTable,
    pub summary: RunSummary,
}

/// Ingest `files` in the given order, numbering records contiguously.
///
/// Stops at the first file that cannot be read.
pub fn ingest_files(files: &[PathBuf], dataset: &DatasetConfig) -> Result<IngestRun> {
    ingest_files_with_progress(files, dataset, None)
}

/// Like [`ingest_files`], calling `progress(done, total)` after each file.
pub fn ingest_files_with_progress(
    files: &[PathBuf],
    dataset: &DatasetConfig,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Result<IngestRun> {
    dataset.validate()?;

    let mut records: Vec<MessageRecord> = Vec::new();
    let mut summary = RunSummary::default();
    let mut next_id: u64 = 0;

    for (i, path) in files.iter().enumerate() {
        let outcome = ingest_file(path, dataset, next_id)?;
        next_id += outcome.records.len() as u64;
        records.extend(outcome.records);
        summary.files.push(outcome.summary);
        if let Some(cb) = progress {
            cb(i + 1, files.len());
        }
    }

    info!(
        dataset = %dataset.name,
        records = summary.total_records(),
        dropped = summary.total_dropped(),
        "Ingestion complete"
    );

    Ok(IngestRun {
        table: MessageTable::from_records(records),
        summary,
    })
}

/// Where and how a cache-aware run reads its inputs.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// Ignore a fresh cache and re-parse everything.
    pub force: bool,
}

/// Discover the exports in `data_dir` and ingest them, reusing the cached
/// table when it is newer than every export and the directory itself.
pub fn run_ingestion(
    options: &IngestOptions,
    dataset: &DatasetConfig,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Result<IngestRun> {
    let files = discover_csv_files(&options.data_dir)?;
    if files.is_empty() {
        info!(dir = %options.data_dir.display(), "No CSV files found in data directory");
        return Ok(IngestRun::default());
    }

    let cache_path = cache::store::cache_path_for(&options.cache_dir, &options.data_dir);
    let mut sources = files.clone();
    sources.push(options.data_dir.clone());

    if !options.force && cache::store::is_fresh(&cache_path, &sources) {
        match cache::store::load_run(&cache_path, dataset) {
            Ok(Some(mut run)) => {
                debug!(
                    path = %cache_path.display(),
                    records = run.table.len(),
                    "Loaded cached message table"
                );
                run.summary.from_cache = true;
                return Ok(run);
            }
            Ok(None) => debug!("Cached message table is stale"),
            Err(e) => warn!(error = %e, "Ignoring unreadable cache"),
        }
    }

    info!(files = files.len(), dir = %options.data_dir.display(), "Ingesting exports");
    let run = ingest_files_with_progress(&files, dataset, progress)?;

    if let Err(e) = cache::store::write_run(&cache_path, &run, dataset) {
        warn!(error = %e, "Could not write cache; continuing without persistence");
    }

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "Date,Size,From,To\n";

    fn ingest_str(body: &str, first_id: u64) -> FileOutcome {
        let input = format!("{HEADER}{body}");
        ingest_reader(
            Cursor::new(input.into_bytes()),
            "<memory>",
            &DatasetConfig::default(),
            first_id,
        )
        .unwrap()
    }

    fn raw(date: &str, size: &str, from: &str, to: &str) -> RawFields {
        RawFields {
            date: date.into(),
            size: size.into(),
            from_raw: from.into(),
            to_raw: to.into(),
        }
    }

    #[test]
    fn test_parse_row_success() {
        let row = parse_row(
            &raw(
                "11/30/2010 13:27",
                "10.8K",
                "Hopp, Bryan <BHopp@spokanecounty.org>",
                "\"Smith, John\" <JSmith@spokanecounty.org>",
            ),
            "%m/%d/%Y %H:%M",
        )
        .unwrap();
        assert_eq!(row.size_bytes, 11059);
        assert!(!row.size_recovered);
        assert_eq!(row.from, AddressToken::new("Bryan Hopp", "bhopp@spokanecounty.org"));
        assert_eq!(
            row.recipients,
            vec![AddressToken::new("John Smith", "jsmith@spokanecounty.org")]
        );
    }

    #[test]
    fn test_parse_row_validation_order() {
        let fmt = "%m/%d/%Y %H:%M";
        // Bad timestamp wins over everything else.
        assert_eq!(
            parse_row(&raw("yesterday", "x", "", ""), fmt),
            Err(RowError::MalformedTimestamp)
        );
        assert_eq!(
            parse_row(&raw("11/30/2010 13:27", "x", "nobody", ""), fmt),
            Err(RowError::UnresolvedSender)
        );
        assert_eq!(
            parse_row(&raw("11/30/2010 13:27", "1K", "a@x.org", "nobody, nowhere"), fmt),
            Err(RowError::NoValidRecipients)
        );
    }

    #[test]
    fn test_parse_row_recovers_size() {
        let row = parse_row(
            &raw("11/30/2010 13:27", "huge", "a@x.org", "b@x.org"),
            "%m/%d/%Y %H:%M",
        )
        .unwrap();
        assert_eq!(row.size_bytes, 0);
        assert!(row.size_recovered);
    }

    #[test]
    fn test_single_digit_date_parts() {
        let row = parse_row(&raw("1/5/2011 9:05", "1K", "a@x.org", "b@x.org"), "%m/%d/%Y %H:%M");
        assert!(row.is_ok());
    }

    #[test]
    fn test_end_to_end_single_line() {
        let outcome = ingest_str(
            "11/30/2010 13:27,10.8K,\"Hopp, Bryan\" <BHopp@spokanecounty.org>,\"Smith, John\" <JSmith@spokanecounty.org>,,,,,\n",
            0,
        );
        assert_eq!(outcome.records.len(), 1);
        let r = &outcome.records[0];
        assert_eq!(r.msg_id, 0);
        assert_eq!(r.from_email, "bhopp@spokanecounty.org");
        assert_eq!(r.from_name, "Bryan Hopp");
        assert_eq!(r.to_emails, vec!["jsmith@spokanecounty.org"]);
        assert_eq!(r.to_names, vec!["John Smith"]);
        assert_eq!(r.size_bytes, 11059);
        assert_eq!(r.n_recipients, 1);
        assert_eq!(r.week_id, "2010-W48");
        assert_eq!(r.hour, 13);
        assert_eq!(r.day_of_week, 1);
        assert!(!r.is_after_hours);
        assert!(!r.is_weekend);
        assert!(!r.from_is_distribution_list);
        assert_eq!(r.to_is_distribution_list, vec![false]);
    }

    #[test]
    fn test_dropped_rows_do_not_consume_ids() {
        let outcome = ingest_str(
            "11/30/2010 13:27,1K,a@x.org,b@x.org\n\
             11/30/2010 13:28,1K,nobody,b@x.org\n\
             11/30/2010 13:29,bad,c@x.org,d@x.org\n\
             11/30/2010 13:30,1K,e@x.org,,,,\n\
             11/30/2010 13:31,1K,f@x.org,g@x.org\n",
            10,
        );
        let ids: Vec<u64> = outcome.records.iter().map(|r| r.msg_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(outcome.summary.logical_lines, 5);
        assert_eq!(outcome.summary.records, 3);
        assert_eq!(outcome.summary.dropped(), 2);
        assert_eq!(outcome.summary.errors.unresolved_sender, 1);
        assert_eq!(outcome.summary.errors.no_valid_recipients, 1);
        assert_eq!(outcome.summary.errors.malformed_size, 1);
        assert_eq!(outcome.records[1].size_bytes, 0);
    }

    #[test]
    fn test_wrapped_recipients_and_duplicates() {
        let outcome = ingest_str(
            "12/4/2010 22:15,2M,all-staff@spokanecounty.org,\"Doe, Jane\" <JD@x.org>,\n\
             \"Roe, Rick\" <rr@x.org>, \"Doe, Jane\" <jd@x.org>\n",
            0,
        );
        assert_eq!(outcome.records.len(), 1);
        let r = &outcome.records[0];
        assert_eq!(r.to_emails, vec!["jd@x.org", "rr@x.org", "jd@x.org"]);
        assert_eq!(r.to_names, vec!["Jane Doe", "Rick Roe", "Jane Doe"]);
        assert_eq!(r.n_recipients, 3);
        assert!(r.from_is_distribution_list);
        assert!(r.is_after_hours);
        assert!(r.is_weekend);
    }

    #[test]
    fn test_legacy_sender_resolved() {
        let outcome = ingest_str(
            "11/30/2010 8:00,3K,Bryan Hopp <IMCEAEX-_O=SPOKANE+20COUNTY_OU=GALACTIC_CN=RECIPIENTS_CN=BHOPP@spokanecounty.org>,tedw@pro-msi.com\n",
            0,
        );
        assert_eq!(outcome.records[0].from_email, "bhopp@spokanecounty.org");
        assert_eq!(outcome.records[0].to_emails, vec!["tedw@pro-msi.com"]);
    }

    #[test]
    fn test_empty_file_yields_no_records() {
        let outcome = ingest_str("", 0);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary.logical_lines, 0);
    }

    #[test]
    fn test_invariants_hold_for_every_record() {
        let outcome = ingest_str(
            "11/30/2010 13:27,1K,a@x.org,b@x.org, c@x.org\n\
             11/30/2010 13:28,1K,\"A, B\" <ab@x.org>,\"C, D\" <cd@x.org>, E <e@x.org>\n\
             bogus continuation\n\
             11/30/2010 13:29,1K,x@x.org,Nobody <>, y@x.org\n",
            0,
        );
        assert_eq!(outcome.records.len(), 3);
        for r in &outcome.records {
            assert!(!r.from_email.is_empty());
            assert!(!r.to_emails.is_empty());
            assert_eq!(r.to_emails.len(), r.to_names.len());
            assert_eq!(r.to_emails.len(), r.to_is_distribution_list.len());
            assert_eq!(r.n_recipients, r.to_emails.len());
        }
    }
}
