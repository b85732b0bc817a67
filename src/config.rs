//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILSIFT_CONFIG` (environment variable)
//! 2. `~/.config/mailsift/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailsift\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locations and logging.
    pub general: GeneralConfig,
    /// How the exported logs are interpreted.
    pub dataset: DatasetConfig,
}

/// Locations and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory scanned for `*.csv` exports.
    pub data_dir: PathBuf,
    /// Override cache directory for the message table and logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Interpretation of one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Label used in logs and summaries.
    pub name: String,
    /// `strftime` format of the date column.
    pub date_format: String,
    /// Domains whose addresses count as internal.
    pub internal_domains: Vec<String>,
    /// Hours at or after this are after hours.
    pub after_hours_start: u32,
    /// Hours before this are after hours.
    pub after_hours_end: u32,
    /// Weekend days, 0 = Monday.
    pub weekend_days: Vec<u32>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            name: "all-data".to_string(),
            date_format: "%m/%d/%Y %H:%M".to_string(),
            internal_domains: vec!["spokanecounty.org".to_string()],
            after_hours_start: 18,
            after_hours_end: 7,
            weekend_days: vec![5, 6],
        }
    }
}

impl DatasetConfig {
    /// Reject values the pipeline cannot interpret.
    pub fn validate(&self) -> Result<()> {
        if self.date_format.trim().is_empty() {
            return Err(SiftError::Config("date_format must not be empty".into()));
        }
        if self.after_hours_start > 24 || self.after_hours_end > 24 {
            return Err(SiftError::Config(format!(
                "after-hours window {}..{} is outside 0..=24",
                self.after_hours_start, self.after_hours_end
            )));
        }
        if let Some(day) = self.weekend_days.iter().find(|&&d| d > 6) {
            return Err(SiftError::Config(format!(
                "weekend day {day} is outside 0..=6"
            )));
        }
        Ok(())
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILSIFT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailsift").join("config.toml"))
}

/// Return the cache directory for the message table and logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("mailsift")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mailsift.log")
}

/// List the `*.csv` files directly inside `data_dir`, sorted by file name.
///
/// The order fixes message id assignment, so it must not depend on the
/// directory iteration order of the platform.
pub fn discover_csv_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Err(SiftError::DataDirNotFound(data_dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(data_dir).map_err(|e| SiftError::io(data_dir, e))? {
        let path = entry.map_err(|e| SiftError::io(data_dir, e))?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.dataset.date_format, "%m/%d/%Y %H:%M");
        assert_eq!(cfg.dataset.after_hours_start, 18);
        assert_eq!(cfg.dataset.after_hours_end, 7);
        assert_eq!(cfg.dataset.weekend_days, vec![5, 6]);
        assert_eq!(cfg.dataset.internal_domains, vec!["spokanecounty.org"]);
        assert_eq!(cfg.general.log_level, "warn");
        assert!(cfg.dataset.validate().is_ok());
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.dataset.date_format, cfg.dataset.date_format);
        assert_eq!(parsed.general.data_dir, cfg.general.data_dir);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[general]
data_dir = "/srv/exports"

[dataset]
internal_domains = ["example.org", "example.com"]
after_hours_start = 20
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.general.data_dir, PathBuf::from("/srv/exports"));
        assert_eq!(cfg.dataset.internal_domains.len(), 2);
        assert_eq!(cfg.dataset.after_hours_start, 20);
        // Other fields use defaults
        assert_eq!(cfg.dataset.after_hours_end, 7);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_validate_rejects_bad_weekend_day() {
        let dataset = DatasetConfig {
            weekend_days: vec![6, 7],
            ..DatasetConfig::default()
        };
        assert!(matches!(dataset.validate(), Err(SiftError::Config(_))));
    }

    #[test]
    fn test_discover_csv_files_sorted_and_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.csv", "a.CSV", "notes.txt", "c.csv"] {
            std::fs::write(tmp.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(tmp.path().join("nested.csv")).unwrap();

        let files = discover_csv_files(tmp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.CSV", "b.csv", "c.csv"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let err = discover_csv_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, SiftError::DataDirNotFound(_)));
    }
}
