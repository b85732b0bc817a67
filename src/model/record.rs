//! Message records and the table the pipeline produces.

use chrono::NaiveDateTime;

/// One recovered message.
///
/// Created only by the ingestion pipeline from a validated logical line and
/// never modified afterwards. `to_emails`, `to_names` and
/// `to_is_distribution_list` are parallel and never empty.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MessageRecord {
    /// Position in the run, contiguous from 0 across all input files.
    pub msg_id: u64,

    /// Send time as written in the export (no timezone information).
    pub timestamp: NaiveDateTime,

    /// Message size in bytes; 0 when the size field was unreadable.
    pub size_bytes: u64,

    pub from_email: String,
    pub from_name: String,

    /// Recipient emails in blob order. Duplicates are kept.
    pub to_emails: Vec<String>,
    pub to_names: Vec<String>,

    /// Always `to_emails.len()`.
    pub n_recipients: usize,

    /// ISO week, e.g. `2010-W48`.
    pub week_id: String,
    pub hour: u32,
    /// 0 = Monday … 6 = Sunday.
    pub day_of_week: u32,
    pub is_after_hours: bool,
    pub is_weekend: bool,

    /// Advisory group-alias hints; never used to filter.
    pub from_is_distribution_list: bool,
    pub to_is_distribution_list: Vec<bool>,
}

/// The pipeline's output: every record of a run, ordered by `msg_id`.
///
/// The table is replaced wholesale on re-ingestion; there is no API to
/// modify it in place.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MessageTable {
    records: Vec<MessageRecord>,
}

impl MessageTable {
    /// Build a table from records already in `msg_id` order.
    pub(crate) fn from_records(records: Vec<MessageRecord>) -> Self {
        debug_assert!(records
            .iter()
            .enumerate()
            .all(|(i, r)| r.msg_id == i as u64));
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MessageRecord> {
        self.records.iter()
    }

    pub fn get(&self, msg_id: u64) -> Option<&MessageRecord> {
        usize::try_from(msg_id)
            .ok()
            .and_then(|i| self.records.get(i))
    }
}

impl<'a> IntoIterator for &'a MessageTable {
    type Item = &'a MessageRecord;
    type IntoIter = std::slice::Iter<'a, MessageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
