//! Parsing of malformed header-log exports: logical lines, fields, sizes,
//! addresses, and identity normalization.

pub mod address;
pub mod fields;
pub mod lines;
pub mod normalize;
pub mod size;
