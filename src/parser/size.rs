//! Human-readable size strings ("10.8K", "1.2M", "512") to byte counts.

use std::sync::OnceLock;

use regex::Regex;

fn size_re() -> &'static Regex {
    static SIZE_RE: OnceLock<Regex> = OnceLock::new();
    SIZE_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*([\d.]+)\s*([BKMG]?)\s*$").expect("valid size regex")
    })
}

/// Multiplier for a (case-insensitive) unit suffix.
fn multiplier(suffix: &str) -> f64 {
    match suffix.to_ascii_uppercase().as_str() {
        "K" => 1024.0,
        "M" => 1024.0 * 1024.0,
        "G" => 1024.0 * 1024.0 * 1024.0,
        // "" and "B"
        _ => 1.0,
    }
}

/// Decode a size string into whole bytes.
///
/// Accepts an integer or decimal literal with an optional `B`, `K`, `M` or
/// `G` suffix (binary multiples). Fractional byte counts are truncated
/// toward zero, so `"10.8K"` is `11059`.
///
/// Returns `None` for empty input or anything that does not have that shape.
pub fn decode_size(raw: &str) -> Option<u64> {
    if raw.is_empty() {
        return None;
    }
    let caps = size_re().captures(raw.trim())?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let suffix = caps.get(2).map_or("", |m| m.as_str());
    let bytes = value * multiplier(suffix);
    if !bytes.is_finite() {
        return None;
    }
    Some(bytes.trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kilobytes_truncate() {
        assert_eq!(decode_size("10.8K"), Some(11059));
    }

    #[test]
    fn test_suffix_is_case_insensitive() {
        assert_eq!(decode_size("10k"), decode_size("10K"));
        assert_eq!(decode_size("10k"), Some(10240));
    }

    #[test]
    fn test_plain_and_byte_suffix() {
        assert_eq!(decode_size("512"), Some(512));
        assert_eq!(decode_size("512B"), Some(512));
        assert_eq!(decode_size(" 7 b "), Some(7));
    }

    #[test]
    fn test_larger_units() {
        assert_eq!(decode_size("1M"), Some(1024 * 1024));
        assert_eq!(decode_size("1.5M"), Some(1_572_864));
        assert_eq!(decode_size("2G"), Some(2 * 1024 * 1024 * 1024));
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(decode_size(""), None);
        assert_eq!(decode_size("   "), None);
        assert_eq!(decode_size("abc"), None);
        assert_eq!(decode_size("10KB"), None);
        assert_eq!(decode_size("1.2.3K"), None);
        assert_eq!(decode_size("-5"), None);
    }
}
