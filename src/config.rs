//! Runtime configuration.
//!
//! Defaults are overridden by environment variables, which are in turn
//! overridden by command-line flags in `main.rs`.

use std::path::PathBuf;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    File,
    Stdout,
    /// File when the dashboard owns a terminal, stdout otherwise.
    #[default]
    Auto,
}

impl LogMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "stdout" => Some(Self::Stdout),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding `fall_risk_train.csv` and `fall_risk_test.csv`
    pub data_dir: PathBuf,

    /// Directory holding the four model artifacts
    pub model_dir: PathBuf,

    /// Directory receiving exported assessment reports
    pub report_dir: PathBuf,

    /// Cohort generator seed
    pub seed: u64,

    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            model_dir: PathBuf::from("models"),
            report_dir: PathBuf::from("reports"),
            seed: 42,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("fallwatch.log"),
        }
    }
}

impl AppConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - FALLWATCH_DATA_DIR
    /// - FALLWATCH_MODEL_DIR
    /// - FALLWATCH_REPORT_DIR
    /// - FALLWATCH_SEED
    /// - FALLWATCH_LOG_MODE="file|stdout|auto"
    /// - FALLWATCH_LOG_FILE
    ///
    /// Unparseable or empty values keep the default.
    #[must_use]
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("FALLWATCH_DATA_DIR") {
            cfg.data_dir = PathBuf::from(v);
        }

        if let Some(v) = non_empty("FALLWATCH_MODEL_DIR") {
            cfg.model_dir = PathBuf::from(v);
        }

        if let Some(v) = non_empty("FALLWATCH_REPORT_DIR") {
            cfg.report_dir = PathBuf::from(v);
        }

        if let Some(v) = non_empty("FALLWATCH_SEED") {
            if let Ok(seed) = v.trim().parse::<u64>() {
                cfg.seed = seed;
            }
        }

        if let Some(mode) = non_empty("FALLWATCH_LOG_MODE").and_then(|v| LogMode::parse(&v)) {
            cfg.log_mode = mode;
        }

        if let Some(v) = non_empty("FALLWATCH_LOG_FILE") {
            cfg.log_file = PathBuf::from(v);
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let cfg = AppConfig::from_lookup(|_| None);
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.log_mode, LogMode::Auto);
    }

    #[test]
    fn test_env_overrides() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("FALLWATCH_DATA_DIR", "/tmp/cohort"),
            ("FALLWATCH_MODEL_DIR", "/tmp/models"),
            ("FALLWATCH_REPORT_DIR", "/tmp/reports"),
            ("FALLWATCH_SEED", " 7 "),
            ("FALLWATCH_LOG_MODE", "STDOUT"),
            ("FALLWATCH_LOG_FILE", "/var/log/fw.log"),
        ]));
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/cohort"));
        assert_eq!(cfg.model_dir, PathBuf::from("/tmp/models"));
        assert_eq!(cfg.report_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.log_mode, LogMode::Stdout);
        assert_eq!(cfg.log_file, PathBuf::from("/var/log/fw.log"));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("FALLWATCH_SEED", "-3"),
            ("FALLWATCH_LOG_MODE", "syslog"),
            ("FALLWATCH_DATA_DIR", "  "),
        ]));
        assert_eq!(cfg, AppConfig::default());
    }
}
