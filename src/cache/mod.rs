//! Persisted message table with modification-time freshness checks.

pub mod format;
pub mod store;
