//! Resolved address tokens.

/// One address as recovered from the log: an optional display name and a
/// lower-cased email.
///
/// An empty `email` is the failure sentinel returned when nothing in the
/// token looked like an address. Callers must treat it as unparseable.
///
/// # Examples
/// - `"Hopp, Bryan" <BHopp@spokanecounty.org>` → `display_name = "Hopp, Bryan"`, `email = "bhopp@spokanecounty.org"`
/// - `tedw@pro-msi.com` → `display_name = ""`, `email = "tedw@pro-msi.com"`
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct AddressToken {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The resolved email address, or empty if resolution failed.
    pub email: String,
}

impl AddressToken {
    pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email: email.into(),
        }
    }

    /// The `("", "")` sentinel for an unmatchable token.
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// Whether resolution produced an address.
    pub fn is_resolved(&self) -> bool {
        !self.email.is_empty()
    }
}
