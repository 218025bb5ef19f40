//! mtr report parsing.

use regex::Regex;
use std::sync::OnceLock;

use super::HopStats;

/// Find the first-hop line of an `mtr -r` report and parse its figures.
///
/// The line looks like `  1.|-- 10.0.0.1  0.0%  5  0.5  0.6  0.4  0.9  0.1`,
/// columns being loss, sent, last, avg, best, worst and stdev.
pub fn parse_mtr_first_hop(text: &str) -> Option<HopStats> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"^\s*1\.\|--\s+(?P<ip>\S+)\s+(?P<loss>\d+\.\d+)%\s+\S+\s+(?P<last>\d+\.\d+)\s+(?P<avg>\d+\.\d+)\s+(?P<best>\d+\.\d+)\s+(?P<worst>\d+\.\d+)\s+(?P<stdev>\d+\.\d+)",
        )
        .expect("first hop pattern is valid")
    });

    text.lines().find_map(|line| {
        let caps = re.captures(line)?;
        let num = |name: &str| caps.name(name)?.as_str().parse::<f64>().ok();
        Some(HopStats {
            ip: caps.name("ip")?.as_str().to_string(),
            loss_pct: num("loss")?,
            last_ms: num("last")?,
            avg_ms: num("avg")?,
            best_ms: num("best")?,
            worst_ms: num("worst")?,
            stdev_ms: num("stdev")?,
        })
    })
}
