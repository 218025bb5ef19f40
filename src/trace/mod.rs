//! Trace module for first-hop correlation.
//!
//! Parses trace dumps captured by the prober during failures. Supports the
//! mtr report summary and plain traceroute output.

mod mtr;
mod traceroute;

pub use mtr::*;
pub use traceroute::*;

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Marker mtr prints for a hop that never answered.
pub const UNKNOWN_HOP: &str = "???";

/// First hop beyond the local router, as parsed from a trace dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum TraceHop {
    /// Full statistics from an mtr report line.
    Measured(HopStats),
    /// Only the address could be recovered from traceroute output.
    Fallback { ip: String },
}

impl TraceHop {
    pub fn ip(&self) -> &str {
        match self {
            TraceHop::Measured(stats) => &stats.ip,
            TraceHop::Fallback { ip } => ip,
        }
    }

    pub fn stats(&self) -> Option<&HopStats> {
        match self {
            TraceHop::Measured(stats) => Some(stats),
            TraceHop::Fallback { .. } => None,
        }
    }

    pub fn note(&self) -> Option<&'static str> {
        match self {
            TraceHop::Measured(_) => None,
            TraceHop::Fallback { .. } => Some("parsed from traceroute"),
        }
    }
}

/// Loss and latency figures for one hop, in percent and milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HopStats {
    pub ip: String,
    pub loss_pct: f64,
    pub last_ms: f64,
    pub avg_ms: f64,
    pub best_ms: f64,
    pub worst_ms: f64,
    pub stdev_ms: f64,
}

/// Parse a trace dump. Tries the mtr summary first, then traceroute.
pub fn parse_trace(text: &str) -> Option<TraceHop> {
    if let Some(stats) = parse_mtr_first_hop(text) {
        return Some(TraceHop::Measured(stats));
    }
    parse_traceroute_first_hop(text).map(|ip| TraceHop::Fallback { ip })
}

/// Supplies trace text for an opaque trace reference.
pub trait TraceSource {
    /// Returns `None` when the reference cannot be resolved or read.
    fn load(&self, reference: &str) -> Option<String>;

    /// Load and parse a reference in one step.
    fn first_hop(&self, reference: &str) -> Option<TraceHop> {
        self.load(reference).and_then(|text| parse_trace(&text))
    }
}

/// Trace dumps stored as files in the log directory.
#[derive(Debug, Clone)]
pub struct TraceDir {
    root: PathBuf,
}

impl TraceDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Relative references resolve against the log directory.
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl TraceSource for TraceDir {
    fn load(&self, reference: &str) -> Option<String> {
        if reference.trim().is_empty() {
            return None;
        }
        let path = self.resolve(reference.trim());
        match std::fs::read(&path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                tracing::debug!("Trace {} unavailable: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemorySource(HashMap<&'static str, &'static str>);

    impl TraceSource for MemorySource {
        fn load(&self, reference: &str) -> Option<String> {
            self.0.get(reference).map(|s| s.to_string())
        }
    }

    #[test]
    fn test_parse_trace_prefers_mtr() {
        let text = "HOST: box  Loss%   Snt   Last   Avg  Best  Wrst StDev\n  1.|-- 100.64.0.1  20.0%     5    8.1   9.2   7.5  12.3   1.9\n";
        let hop = parse_trace(text).unwrap();
        assert_eq!(hop.ip(), "100.64.0.1");
        assert_eq!(hop.stats().map(|s| s.loss_pct), Some(20.0));
        assert_eq!(hop.note(), None);
    }

    #[test]
    fn test_parse_trace_falls_back_to_traceroute() {
        let text = "traceroute to 1.1.1.1 (1.1.1.1), 30 hops max\n 1  192.168.2.1  0.612 ms  0.540 ms\n 2  * * *\n";
        let hop = parse_trace(text).unwrap();
        assert_eq!(hop, TraceHop::Fallback { ip: "192.168.2.1".to_string() });
        assert_eq!(hop.note(), Some("parsed from traceroute"));
    }

    #[test]
    fn test_parse_trace_none() {
        assert_eq!(parse_trace(""), None);
        assert_eq!(parse_trace("COMMAND FAILED: mtr\nno route"), None);
    }

    #[test]
    fn test_source_first_hop() {
        let source = MemorySource(HashMap::from([(
            "trace_a.log",
            " 1  203.0.113.9  1.0 ms\n",
        )]));
        assert_eq!(source.first_hop("trace_a.log").map(|h| h.ip().to_string()), Some("203.0.113.9".to_string()));
        assert_eq!(source.first_hop("missing.log"), None);
    }

    #[test]
    fn test_trace_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = TraceDir::new(dir.path());
        assert_eq!(source.load("nope.log"), None);
        assert_eq!(source.load(""), None);

        std::fs::write(dir.path().join("t.log"), b"  1.|-- 198.51.100.1  0.0%  5  1.0  1.1  0.9  1.4  0.2\n").unwrap();
        assert_eq!(source.first_hop("t.log").map(|h| h.ip().to_string()), Some("198.51.100.1".to_string()));
    }
}
