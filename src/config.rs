//! Configuration module for the analyzer.
//!
//! Layers, lowest first: built-in defaults, the prober's JSON config file,
//! environment variables. Command-line flags are applied on top by the
//! binary through [`AnalyzerConfig::with_overrides`].

use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// File name of the sample log inside a log directory.
pub const SAMPLE_LOG_FILE: &str = "netlog.csv";

/// Config file consulted when `NETLOG_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Analyzer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Directory holding the sample log and trace dumps (default: "logs")
    pub log_dir: PathBuf,
    /// Explicit sample log path; `<log_dir>/netlog.csv` when unset
    pub sample_log: Option<PathBuf>,
    /// Directory tried when the configured sample log does not exist (default: "logs")
    pub fallback_log_dir: PathBuf,
    /// Length of the worst-hours list (default: 3)
    pub top_hours: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            sample_log: None,
            fallback_log_dir: PathBuf::from("logs"),
            top_hours: 3,
        }
    }
}

/// The part of the prober's config file the analyzer reads.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    log_dir: Option<PathBuf>,
}

/// `log_dir` from a JSON config file. A missing, unreadable or invalid
/// file yields `None`.
pub fn log_dir_from_file(path: &Path) -> Option<PathBuf> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<ConfigFile>(&text) {
        Ok(file) => file.log_dir,
        Err(e) => {
            tracing::warn!("Ignoring config file {}: {}", path.display(), e);
            None
        }
    }
}

/// Where the sample log was found and which directory traces resolve against.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLocation {
    pub sample_log: PathBuf,
    pub log_dir: PathBuf,
    /// The configured log was missing and the fallback directory was used.
    pub fallback: bool,
}

fn is_readable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    match File::open(path) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Cannot open {}: {}", path.display(), e);
            false
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `NETLOG_CONFIG`: config file path (default: "config.json")
    /// - `NETLOG_LOG_DIR`: log directory, overrides the config file
    /// - `NETLOG_SAMPLE_LOG`: sample log path
    pub fn load() -> Self {
        Self::load_from(|key| env::var(key).ok())
    }

    fn load_from<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        let config_file = var("NETLOG_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        if let Some(log_dir) = log_dir_from_file(Path::new(&config_file)) {
            cfg.log_dir = log_dir;
        }

        if let Some(log_dir) = var("NETLOG_LOG_DIR").filter(|s| !s.is_empty()) {
            cfg.log_dir = PathBuf::from(log_dir);
        }

        if let Some(sample_log) = var("NETLOG_SAMPLE_LOG").filter(|s| !s.is_empty()) {
            cfg.sample_log = Some(PathBuf::from(sample_log));
        }

        cfg
    }

    /// Apply command-line overrides; `None` keeps the loaded value.
    pub fn with_overrides(
        mut self,
        sample_log: Option<PathBuf>,
        log_dir: Option<PathBuf>,
        top_hours: Option<usize>,
    ) -> Self {
        if let Some(log_dir) = log_dir {
            self.log_dir = log_dir;
        }
        if sample_log.is_some() {
            self.sample_log = sample_log;
        }
        if let Some(n) = top_hours {
            self.top_hours = n;
        }
        self
    }

    /// Configured path, then the fallback directory's log.
    pub fn candidate_logs(&self) -> [PathBuf; 2] {
        let primary = self
            .sample_log
            .clone()
            .unwrap_or_else(|| self.log_dir.join(SAMPLE_LOG_FILE));
        [primary, self.fallback_log_dir.join(SAMPLE_LOG_FILE)]
    }

    /// Resolve the sample log to read. `None` when no candidate can be opened.
    pub fn locate_sample_log(&self) -> Option<LogLocation> {
        let [primary, fallback] = self.candidate_logs();
        if is_readable(&primary) {
            return Some(LogLocation {
                sample_log: primary,
                log_dir: self.log_dir.clone(),
                fallback: false,
            });
        }
        if is_readable(&fallback) {
            return Some(LogLocation {
                sample_log: fallback,
                log_dir: self.fallback_log_dir.clone(),
                fallback: true,
            });
        }
        None
    }
}
