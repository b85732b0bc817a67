//! Identity normalization and distribution-list detection.

use std::sync::OnceLock;

use regex::Regex;

fn whitespace_re() -> &'static Regex {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Patterns that make an address or name look like a group alias.
fn distribution_list_res() -> &'static [Regex] {
    static DL_RES: OnceLock<Vec<Regex>> = OnceLock::new();
    DL_RES.get_or_init(|| {
        [
            r"(?i)^(all[-_.]?|everyone|staff|team|group|dept|department)",
            r"(?i)([-_.]list|[-_.]all|[-_.]group|[-_.]team|[-_.]dept)@",
            r"(?i)^dl[-_.]",
            r"(?i)undisclosed",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid distribution list regex"))
        .collect()
    })
}

/// Trim and lower-case an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Clean up a display name.
///
/// Strips surrounding quotes, collapses whitespace, and turns a
/// `"Last, First"` name (exactly one comma, no `@`) into `"First Last"`.
pub fn normalize_name(name: &str) -> String {
    let name = name.trim().trim_matches('"').trim_matches('\'').trim();
    let name = whitespace_re().replace_all(name, " ").into_owned();

    if name.contains('@') || name.matches(',').count() != 1 {
        return name;
    }
    match name.split_once(',') {
        Some((last, first)) => {
            let (last, first) = (last.trim(), first.trim());
            if last.is_empty() || first.is_empty() {
                name
            } else {
                format!("{first} {last}")
            }
        }
        None => name,
    }
}

/// Heuristic check for a group alias (`all-staff@`, `dl-finance@`, ...).
///
/// Advisory only: the result is recorded alongside the address and never
/// used to drop or rewrite data.
pub fn is_distribution_list(email: &str, name: &str) -> bool {
    distribution_list_res()
        .iter()
        .any(|re| re.is_match(email) || (!name.is_empty() && re.is_match(name)))
}

/// Whether `email` ends in `@<domain>` for one of `internal_domains`
/// (case-insensitive).
pub fn is_internal(email: &str, internal_domains: &[String]) -> bool {
    let email = email.to_lowercase();
    internal_domains
        .iter()
        .any(|domain| email.ends_with(&format!("@{}", domain.to_lowercase())))
}

/// The part after the first `@`, lower-cased, or empty if there is none.
pub fn extract_domain(email: &str) -> String {
    email
        .split_once('@')
        .map(|(_, domain)| domain.to_lowercase())
        .unwrap_or_default()
}
