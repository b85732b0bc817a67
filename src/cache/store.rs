//! Reading, writing and freshness of the cached message table.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::cache::format::{CacheHeader, HEADER_SIZE, MAGIC, VERSION};
use crate::config::DatasetConfig;
use crate::error::{Result, SiftError};
use crate::ingest::pipeline::IngestRun;

/// Cache file for the exports in `data_dir`.
///
/// Example: `~/.cache/mailsift/message_table-3f9a0c1d2e4b5a69.bin`
pub fn cache_path_for(cache_dir: &Path, data_dir: &Path) -> PathBuf {
    let resolved = data_dir
        .canonicalize()
        .unwrap_or_else(|_| data_dir.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(resolved.to_string_lossy().as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    cache_dir.join(format!("message_table-{}.bin", &hash[..16]))
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Whether `cache_path` exists and is strictly newer than every existing
/// source.
///
/// A tie counts as stale: filesystems with coarse timestamps can give a
/// cache and a later change the same mtime. Sources that do not exist are
/// ignored. `sources` should include every
/// input file and the directory they were discovered in, so that added or
/// removed files also invalidate the cache.
pub fn is_fresh(cache_path: &Path, sources: &[PathBuf]) -> bool {
    let Some(cache_mtime) = modified(cache_path) else {
        return false;
    };
    for src in sources {
        if let Some(src_mtime) = modified(src) {
            if src_mtime >= cache_mtime {
                debug!(source = %src.display(), "Source not older than cache");
                return false;
            }
        }
    }
    true
}

/// SHA-256 of the dataset settings, so a config change invalidates the cache.
fn dataset_hash(dataset: &DatasetConfig) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(dataset).unwrap_or_default());
    hasher.finalize().into()
}

/// Load a cached run.
///
/// Returns `Ok(None)` when the file is missing, from another format
/// version, or was built with different dataset settings.
pub fn load_run(cache_path: &Path, dataset: &DatasetConfig) -> Result<Option<IngestRun>> {
    if !cache_path.exists() {
        return Ok(None);
    }
    let data = std::fs::read(cache_path).map_err(|e| SiftError::io(cache_path, e))?;

    if data.len() < HEADER_SIZE {
        debug!("Cache file too small");
        return Ok(None);
    }

    let header: CacheHeader =
        bincode::deserialize(&data[..HEADER_SIZE]).map_err(|e| SiftError::InvalidCache {
            path: cache_path.to_path_buf(),
            reason: format!("Header deserialization failed: {e}"),
        })?;

    if let Err(reason) = header.validate() {
        debug!(reason = %reason, "Cache header invalid");
        return Ok(None);
    }

    if header.dataset_hash != dataset_hash(dataset) {
        debug!("Dataset settings changed since cache was written");
        return Ok(None);
    }

    let run: IngestRun =
        bincode::deserialize(&data[HEADER_SIZE..]).map_err(|e| SiftError::InvalidCache {
            path: cache_path.to_path_buf(),
            reason: format!("Table deserialization failed: {e}"),
        })?;

    if run.table.len() as u64 != header.record_count {
        debug!("Record count mismatch");
        return Ok(None);
    }

    Ok(Some(run))
}

/// Write `run` to `cache_path`, replacing any previous table.
pub fn write_run(cache_path: &Path, run: &IngestRun, dataset: &DatasetConfig) -> Result<()> {
    let header = CacheHeader {
        magic: *MAGIC,
        version: VERSION,
        record_count: run.table.len() as u64,
        dataset_hash: dataset_hash(dataset),
    };

    let encode_err = |e: bincode::Error| SiftError::InvalidCache {
        path: cache_path.to_path_buf(),
        reason: format!("Serialization failed: {e}"),
    };
    let header_bytes = bincode::serialize(&header).map_err(encode_err)?;
    let body_bytes = bincode::serialize(run).map_err(encode_err)?;

    // Pad header to HEADER_SIZE
    let mut padded_header = vec![0u8; HEADER_SIZE];
    let copy_len = header_bytes.len().min(HEADER_SIZE);
    padded_header[..copy_len].copy_from_slice(&header_bytes[..copy_len]);

    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SiftError::io(parent, e))?;
    }

    let mut file = File::create(cache_path).map_err(|e| SiftError::io(cache_path, e))?;
    file.write_all(&padded_header)
        .map_err(|e| SiftError::io(cache_path, e))?;
    file.write_all(&body_bytes)
        .map_err(|e| SiftError::io(cache_path, e))?;
    file.flush().map_err(|e| SiftError::io(cache_path, e))?;

    info!(path = %cache_path.display(), records = run.table.len(), "Cache written");
    Ok(())
}
