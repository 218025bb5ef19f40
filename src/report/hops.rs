//! Per-outage trace correlation and recurring first-hop tally.

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use super::serialize_secs;
use crate::outage::{LatencyStats, Outage};
use crate::sample::{Reachability, RootCause, Status};
use crate::trace::{TraceHop, TraceSource, UNKNOWN_HOP};

/// One outage with its derived statistics and correlated first hop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutageDetail {
    /// 1-based position in the outage list.
    pub index: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: TimeDelta,
    pub reason: Status,
    pub samples: usize,
    pub reachability: Reachability,
    pub gateway: Option<LatencyStats>,
    pub cause: RootCause,
    pub trace_file: Option<String>,
    pub first_hop: Option<TraceHop>,
}

/// Describe every outage, loading the lead trace of each through `traces`.
pub fn correlate_outages(outages: &[Outage], traces: &dyn TraceSource) -> Vec<OutageDetail> {
    outages
        .iter()
        .enumerate()
        .map(|(i, outage)| {
            let trace_file = outage.trace_reference().map(str::to_string);
            let first_hop = trace_file.as_deref().and_then(|r| traces.first_hop(r));
            if trace_file.is_some() && first_hop.is_none() {
                tracing::debug!("Outage #{}: trace could not be parsed", i + 1);
            }
            OutageDetail {
                index: i + 1,
                start: outage.start,
                end: outage.end,
                duration: outage.duration(),
                reason: outage.reason.clone(),
                samples: outage.samples.len(),
                reachability: outage.mean_reachability(),
                gateway: outage.gateway_stats(),
                cause: outage.dominant_cause(),
                trace_file,
                first_hop,
            }
        })
        .collect()
}

/// False for RFC 1918 IPv4 addresses and for hops that never answered.
pub fn is_beyond_router(ip: &str) -> bool {
    if ip == UNKNOWN_HOP {
        return false;
    }
    match ip.parse::<Ipv4Addr>() {
        Ok(addr) => !addr.is_private(),
        Err(_) => true,
    }
}

/// Outages whose first hop was a given address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopCount {
    pub ip: String,
    pub outages: usize,
}

/// Count first hops beyond the router across outages, most frequent first.
pub fn recurring_hops(details: &[OutageDetail]) -> Vec<HopCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for hop in details.iter().filter_map(|d| d.first_hop.as_ref()) {
        if is_beyond_router(hop.ip()) {
            *counts.entry(hop.ip()).or_default() += 1;
        }
    }
    let mut hops: Vec<HopCount> = counts
        .into_iter()
        .map(|(ip, outages)| HopCount {
            ip: ip.to_string(),
            outages,
        })
        .collect();
    hops.sort_by(|a, b| b.outages.cmp(&a.outages));
    hops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outage::group_outages;
    use crate::outage::tests::sample;
    use std::collections::HashMap;

    struct MemorySource(HashMap<&'static str, &'static str>);

    impl TraceSource for MemorySource {
        fn load(&self, reference: &str) -> Option<String> {
            self.0.get(reference).map(|s| s.to_string())
        }
    }

    #[test]
    fn test_is_beyond_router() {
        for private in ["10.1.2.3", "172.16.0.1", "172.31.255.1", "192.168.178.1", "???"] {
            assert!(!is_beyond_router(private), "{}", private);
        }
        for public in ["172.32.0.1", "100.64.0.1", "84.116.0.1", "2001:db8::1"] {
            assert!(is_beyond_router(public), "{}", public);
        }
    }

    #[test]
    fn test_correlate_and_tally() {
        let traced = |minute: u32, file: &str| {
            let mut s = sample(minute, Status::WanDown);
            s.trace_file = Some(file.to_string());
            s
        };
        let samples = vec![
            traced(0, "a.log"),
            sample(1, Status::Ok),
            traced(2, "b.log"),
            sample(3, Status::Ok),
            traced(4, "c.log"),
            sample(5, Status::Ok),
            traced(6, "missing.log"),
            sample(7, Status::Ok),
            sample(8, Status::LanDown),
        ];
        let source = MemorySource(HashMap::from([
            ("a.log", "  1.|-- 84.116.0.1  10.0%  5  9.0  9.5  8.8  11.0  0.7\n"),
            ("b.log", " 1  84.116.0.1  9.1 ms\n"),
            ("c.log", "  1.|-- 192.168.1.1  0.0%  5  0.4  0.5  0.3  0.9  0.1\n"),
        ]));

        let grouped = group_outages(&samples);
        let details = correlate_outages(&grouped.outages, &source);
        assert_eq!(details.len(), 5);
        assert_eq!(details[0].index, 1);
        assert!(matches!(details[0].first_hop, Some(TraceHop::Measured(_))));
        assert!(matches!(details[1].first_hop, Some(TraceHop::Fallback { .. })));
        assert_eq!(details[3].trace_file.as_deref(), Some("missing.log"));
        assert_eq!(details[3].first_hop, None);
        assert_eq!(details[4].trace_file, None);
        assert_eq!(details[4].duration, TimeDelta::zero());

        let hops = recurring_hops(&details);
        assert_eq!(hops, vec![HopCount { ip: "84.116.0.1".to_string(), outages: 2 }]);
    }
}
