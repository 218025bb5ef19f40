//! Upstream vs local-network hypothesis from outage gateway latency.

use serde::Serialize;

use crate::outage::Outage;

/// Mean gateway latency below this counts as a healthy LAN.
pub const HEALTHY_GATEWAY_MS: f64 = 5.0;

/// Where the outages most likely originate, judged from gateway latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyHypothesis {
    /// Some outage kept a fast gateway: the LAN held up.
    Upstream,
    /// No outage had a fast gateway reading.
    LocalNetwork,
}

impl LatencyHypothesis {
    pub fn describe(&self) -> &'static str {
        match self {
            LatencyHypothesis::Upstream => {
                "Local LAN and router are fine (low gateway latency during outages). \
                 Issue likely upstream (ISP/last mile or peering)."
            }
            LatencyHypothesis::LocalNetwork => {
                "Gateway latency missing/high during outages. Could indicate LAN/router issues."
            }
        }
    }
}

/// `None` without outages.
pub fn latency_hypothesis(outages: &[Outage]) -> Option<LatencyHypothesis> {
    if outages.is_empty() {
        return None;
    }
    let healthy = outages
        .iter()
        .filter_map(Outage::gateway_stats)
        .any(|stats| stats.mean_ms < HEALTHY_GATEWAY_MS);
    Some(if healthy {
        LatencyHypothesis::Upstream
    } else {
        LatencyHypothesis::LocalNetwork
    })
}
