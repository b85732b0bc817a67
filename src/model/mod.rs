//! Core data model types: address tokens, message records, and the output table.

pub mod address;
pub mod record;
