//! Address extraction from recipient blobs and single address tokens.
//!
//! Exchange exports carry three address shapes:
//! - `"Last, First" <user@domain>` (display name plus bracketed address)
//! - a bare `user@domain` somewhere in the token
//! - a legacy directory name in place of the address, e.g.
//!   `IMCEAEX-_O=ORG_OU=UNIT_CN=RECIPIENTS_CN=USER@domain`
//!
//! Resolution tries each shape in order and reports which one matched, so
//! every strategy can be tested on its own.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::address::AddressToken;

fn bracketed_re() -> &'static Regex {
    static BRACKETED_RE: OnceLock<Regex> = OnceLock::new();
    BRACKETED_RE.get_or_init(|| {
        Regex::new(
            r#"(?x)
            (?:             # optional display name
                "?'?
                ([^"<]*?)   # name
                '?"?
                \s*
            )?
            <([^>]+)>       # bracketed address
            "#,
        )
        .expect("valid bracketed address regex")
    })
}

fn bare_email_re() -> &'static Regex {
    static BARE_EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    BARE_EMAIL_RE.get_or_init(|| {
        Regex::new(r"[\w.+-]+@[\w.-]+\.\w+").expect("valid bare email regex")
    })
}

fn legacy_dn_re() -> &'static Regex {
    static LEGACY_DN_RE: OnceLock<Regex> = OnceLock::new();
    LEGACY_DN_RE.get_or_init(|| {
        Regex::new(r"(?i)IMCEAEX-.*_CN=RECIPIENTS_CN=(\w+)@([\w.]+)")
            .expect("valid legacy address regex")
    })
}

fn whitespace_re() -> &'static Regex {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Which extraction strategy matched a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressMatch {
    /// `[name] <email>`; `email` is the raw bracketed text.
    Bracketed { name: String, email: String },
    /// A bare `user@host` found somewhere in the token.
    BareEmail { email: String },
    NoMatch,
}

impl AddressMatch {
    /// Try the bracketed form first, then a bare address.
    ///
    /// `raw` should already have its enclosing quotes and whitespace removed.
    pub fn classify(raw: &str) -> Self {
        if let Some(caps) = bracketed_re().captures(raw) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let email = caps.get(2).map_or("", |m| m.as_str()).trim();
            return Self::Bracketed {
                name: clean_display_name(name),
                email: email.to_string(),
            };
        }

        if let Some(m) = bare_email_re().find(raw) {
            return Self::BareEmail {
                email: m.as_str().to_string(),
            };
        }

        Self::NoMatch
    }

    /// Turn the match into a token, resolving legacy directory names.
    pub fn into_token(self) -> AddressToken {
        match self {
            Self::Bracketed { name, email } => AddressToken::new(name, resolve_legacy(&email)),
            Self::BareEmail { email } => AddressToken::new("", resolve_legacy(&email)),
            Self::NoMatch => AddressToken::unresolved(),
        }
    }
}

/// Strip quotes, collapse inner whitespace, and trim stray commas/spaces.
fn clean_display_name(name: &str) -> String {
    let name = name.trim().trim_matches('"').trim_matches('\'').trim();
    let collapsed = whitespace_re().replace_all(name, " ");
    collapsed
        .trim_matches(|c: char| c == ',' || c == ' ')
        .to_string()
}

/// Resolve a legacy directory-encoded address to `user@domain`.
///
/// `IMCEAEX-_O=SPOKANE+20COUNTY_OU=GALACTIC_CN=RECIPIENTS_CN=BHOPP@spokanecounty.org`
/// becomes `bhopp@spokanecounty.org`. Anything else is returned lower-cased.
pub fn resolve_legacy(email: &str) -> String {
    match legacy_dn_re().captures(email) {
        Some(caps) => {
            let user = caps.get(1).map_or("", |m| m.as_str()).to_lowercase();
            let domain = caps.get(2).map_or("", |m| m.as_str()).to_lowercase();
            format!("{user}@{domain}")
        }
        None => email.to_lowercase(),
    }
}

/// Parse one address token into a display name and lower-cased email.
///
/// Returns [`AddressToken::unresolved`] when nothing in the token looks
/// like an address.
pub fn resolve_address(raw: &str) -> AddressToken {
    let raw = raw.trim().trim_matches('"').trim_matches('\'').trim();
    if raw.is_empty() {
        return AddressToken::unresolved();
    }
    let token = AddressMatch::classify(raw).into_token();
    if token.is_resolved() {
        token
    } else {
        AddressToken::unresolved()
    }
}

/// Split a recipient blob into individual address tokens.
///
/// Entries such as `"Last, First" <a@b>` carry commas of their own, so a
/// plain comma split would break names apart. When the blob contains any
/// bracketed address the split happens only on `">, "`, which does not
/// normally occur inside a display name, and the bracket is restored on
/// every part but the last. A display name that itself contains `">, "`
/// will be split wrongly.
///
/// Blobs without brackets are bare addresses and are split on unquoted
/// commas. Empty parts are discarded.
pub fn split_recipients(blob: &str) -> Vec<String> {
    let blob = blob.trim().trim_end_matches(',').trim();
    if blob.is_empty() {
        return Vec::new();
    }

    if blob.contains('>') {
        let parts: Vec<&str> = blob.split(">, ").collect();
        let last = parts.len() - 1;
        return parts
            .iter()
            .enumerate()
            .filter_map(|(i, part)| {
                let part = part.trim().trim_end_matches(',').trim();
                if part.is_empty() {
                    return None;
                }
                if i < last && !part.ends_with('>') {
                    Some(format!("{part}>"))
                } else {
                    Some(part.to_string())
                }
            })
            .collect();
    }

    split_unquoted_commas(blob)
}

fn split_unquoted_commas(blob: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in blob.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                let token = current.trim();
                if !token.is_empty() {
                    tokens.push(token.to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    let token = current.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
    tokens
}

/// Split a recipient blob and resolve every part, keeping only the
/// tokens that produced an address.
pub fn resolve_recipients(blob: &str) -> Vec<AddressToken> {
    split_recipients(blob)
        .iter()
        .map(|token| resolve_address(token))
        .filter(AddressToken::is_resolved)
        .collect()
}
