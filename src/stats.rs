//! Descriptive statistics over a message table.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::model::record::MessageTable;
use crate::parser::normalize::{extract_domain, is_internal};

/// Return the timestamp range (oldest, newest) across the table.
pub fn date_range(table: &MessageTable) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let mut it = table.iter().map(|r| r.timestamp);
    let first = it.next()?;
    Some(it.fold((first, first), |(min, max), ts| (min.min(ts), max.max(ts))))
}

/// Return the top N senders by message count, ties broken by address.
pub fn top_senders(table: &MessageTable, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in table {
        *counts.entry(record.from_email.as_str()).or_default() += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(email, count)| (email.to_string(), count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(n);
    sorted
}

/// Return the top N recipient domains by number of deliveries.
pub fn top_recipient_domains(table: &MessageTable, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for email in table.iter().flat_map(|r| r.to_emails.iter()) {
        *counts.entry(extract_domain(email)).or_default() += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(n);
    sorted
}

/// Headline counts for a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TableStats {
    pub messages: usize,
    pub total_bytes: u64,
    pub deliveries: usize,
    pub internal_senders: usize,
    pub external_deliveries: usize,
    pub after_hours: usize,
    pub weekend: usize,
    pub distribution_list_senders: usize,
}

/// Count messages and deliveries by the configured internal domains and
/// the calendar flags.
pub fn summarize(table: &MessageTable, internal_domains: &[String]) -> TableStats {
    let mut stats = TableStats::default();
    for r in table {
        stats.messages += 1;
        stats.total_bytes += r.size_bytes;
        stats.deliveries += r.n_recipients;
        if is_internal(&r.from_email, internal_domains) {
            stats.internal_senders += 1;
        }
        stats.external_deliveries += r
            .to_emails
            .iter()
            .filter(|e| !is_internal(e, internal_domains))
            .count();
        stats.after_hours += usize::from(r.is_after_hours);
        stats.weekend += usize::from(r.is_weekend);
        stats.distribution_list_senders += usize::from(r.from_is_distribution_list);
    }
    stats
}
