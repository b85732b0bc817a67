//! Cache file format.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ HEADER (64 bytes, fixed)             │
//! │  magic: [u8; 8] = b"MSIFT\0\0\0"     │
//! │  version: u32                        │
//! │  record_count: u64                   │
//! │  dataset_hash: [u8; 32]              │
//! │  (padding to 64 bytes)               │
//! ├──────────────────────────────────────┤
//! │ BODY (variable)                      │
//! │  bincode-serialized IngestRun        │
//! └──────────────────────────────────────┘
//! ```

/// Magic bytes identifying a mailsift cache file.
pub const MAGIC: &[u8; 8] = b"MSIFT\0\0\0";

/// Current cache format version.
pub const VERSION: u32 = 1;

/// Fixed header size in bytes.
pub const HEADER_SIZE: usize = 64;

/// Serializable cache header.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CacheHeader {
    /// Magic bytes (must equal [`MAGIC`]).
    pub magic: [u8; 8],
    /// Format version (must equal [`VERSION`]).
    pub version: u32,
    /// Number of records in the cached table.
    pub record_count: u64,
    /// SHA-256 of the dataset settings the table was built with.
    pub dataset_hash: [u8; 32],
}

impl CacheHeader {
    /// Validate that the header is well-formed and matches the current format.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.magic != *MAGIC {
            return Err("Invalid magic bytes".into());
        }
        if self.version != VERSION {
            return Err(format!(
                "Incompatible version: expected {VERSION}, found {}",
                self.version
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_fits_fixed_size() {
        let header = CacheHeader {
            magic: *MAGIC,
            version: VERSION,
            record_count: u64::MAX,
            dataset_hash: [0xAB; 32],
        };
        let bytes = bincode::serialize(&header).unwrap();
        assert!(bytes.len() <= HEADER_SIZE);
        assert!(header.validate().is_ok());
    }

    #[test]
    fn test_header_rejects_wrong_version() {
        let header = CacheHeader {
            magic: *MAGIC,
            version: VERSION + 1,
            record_count: 0,
            dataset_hash: [0; 32],
        };
        assert!(header.validate().is_err());
    }
}
