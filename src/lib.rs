//! `mailsift`: recover clean message records from malformed email-header
//! CSV exports.
//!
//! Exports of this kind spill recipient lists across CSV columns, wrap long
//! records onto several physical lines, and sometimes carry legacy Exchange
//! directory names instead of addresses. This crate rebuilds one record per
//! message, resolves every address, and produces a numbered table with
//! calendar features, cached on disk between runs.

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod model;
pub mod parser;
pub mod stats;
