//! Outage grouping.
//!
//! Folds a time-ordered sample stream into maximal runs of non-OK samples.
//! The fold is order-dependent and must run sequentially.

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;
use std::collections::HashMap;

use crate::sample::{Reachability, RootCause, Sample, Status};

/// A maximal contiguous run of non-OK samples.
#[derive(Debug, Clone)]
pub struct Outage {
    pub start: NaiveDateTime,
    /// Timestamp of the OK sample that closed the run, or of the last
    /// member when the stream ended mid-outage.
    pub end: NaiveDateTime,
    /// Status of the first member.
    pub reason: Status,
    pub samples: Vec<Sample>,
}

/// Gateway latency over the members that have one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    pub min_ms: f64,
    pub mean_ms: f64,
    pub max_ms: f64,
}

impl Outage {
    fn open(sample: &Sample) -> Self {
        Self {
            start: sample.local_time,
            end: sample.local_time,
            reason: sample.status.clone(),
            samples: vec![sample.clone()],
        }
    }

    fn extend(&mut self, sample: &Sample) {
        self.samples.push(sample.clone());
        self.end = sample.local_time;
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn gateway_stats(&self) -> Option<LatencyStats> {
        let values: Vec<f64> = self.samples.iter().filter_map(|s| s.gateway_ms).collect();
        if values.is_empty() {
            return None;
        }
        let min_ms = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ms = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_ms = values.iter().sum::<f64>() / values.len() as f64;
        Some(LatencyStats { min_ms, mean_ms, max_ms })
    }

    /// Mean reachable/total over members that attempted any target, each
    /// rounded half to even. `0/0` when no member did.
    pub fn mean_reachability(&self) -> Reachability {
        let attempted: Vec<&Reachability> = self
            .samples
            .iter()
            .map(|s| &s.targets)
            .filter(|t| t.total > 0)
            .collect();
        if attempted.is_empty() {
            return Reachability::default();
        }
        let n = attempted.len() as f64;
        let reachable = attempted.iter().map(|t| t.reachable as f64).sum::<f64>() / n;
        let total = attempted.iter().map(|t| t.total as f64).sum::<f64>() / n;
        Reachability::new(reachable.round_ties_even() as u32, total.round_ties_even() as u32)
    }

    /// Majority vote over the members' non-empty hints. Ties, and outages
    /// without any hint, resolve to `Mixed`.
    pub fn dominant_cause(&self) -> RootCause {
        let mut votes: HashMap<&RootCause, usize> = HashMap::new();
        for cause in self.samples.iter().map(|s| &s.root_cause) {
            if cause.is_attributed() {
                *votes.entry(cause).or_default() += 1;
            }
        }
        let Some(top) = votes.values().copied().max() else {
            return RootCause::Mixed;
        };
        let mut leaders = votes.into_iter().filter(|(_, n)| *n == top);
        match (leaders.next(), leaders.next()) {
            (Some((cause, _)), None) => cause.clone(),
            _ => RootCause::Mixed,
        }
    }

    /// First trace reference recorded by any member.
    pub fn trace_reference(&self) -> Option<&str> {
        self.samples.iter().find_map(|s| s.trace_file.as_deref())
    }
}

#[derive(Debug)]
enum GrouperState {
    NoOutage,
    OutageOpen(Outage),
}

/// Streaming outage grouper. Feed samples in time order, then `finish`.
#[derive(Debug)]
pub struct OutageGrouper {
    state: GrouperState,
    outages: Vec<Outage>,
    total: usize,
    ok: usize,
}

impl Default for OutageGrouper {
    fn default() -> Self {
        Self::new()
    }
}

impl OutageGrouper {
    pub fn new() -> Self {
        Self {
            state: GrouperState::NoOutage,
            outages: Vec::new(),
            total: 0,
            ok: 0,
        }
    }

    pub fn push(&mut self, sample: &Sample) {
        self.total += 1;
        let state = std::mem::replace(&mut self.state, GrouperState::NoOutage);

        self.state = match (state, sample.is_ok()) {
            (GrouperState::NoOutage, true) => GrouperState::NoOutage,
            (GrouperState::OutageOpen(mut current), true) => {
                current.end = sample.local_time;
                self.outages.push(current);
                GrouperState::NoOutage
            }
            (GrouperState::NoOutage, false) => GrouperState::OutageOpen(Outage::open(sample)),
            (GrouperState::OutageOpen(mut current), false) => {
                current.extend(sample);
                GrouperState::OutageOpen(current)
            }
        };

        if sample.is_ok() {
            self.ok += 1;
        }
    }

    /// Close the stream. An outage still open is emitted as-is.
    pub fn finish(mut self) -> GroupedOutages {
        if let GrouperState::OutageOpen(current) = self.state {
            self.outages.push(current);
        }
        GroupedOutages {
            outages: self.outages,
            total_samples: self.total,
            ok_samples: self.ok,
        }
    }
}

/// Result of grouping a whole sample stream.
#[derive(Debug, Clone, Default)]
pub struct GroupedOutages {
    pub outages: Vec<Outage>,
    pub total_samples: usize,
    pub ok_samples: usize,
}

impl GroupedOutages {
    /// Share of OK samples; 1.0 for an empty stream.
    pub fn availability(&self) -> f64 {
        if self.total_samples == 0 {
            1.0
        } else {
            self.ok_samples as f64 / self.total_samples as f64
        }
    }
}

/// Group an ordered sample slice in one pass.
pub fn group_outages(samples: &[Sample]) -> GroupedOutages {
    let mut grouper = OutageGrouper::new();
    for sample in samples {
        grouper.push(sample);
    }
    grouper.finish()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};

    pub(crate) fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
            + TimeDelta::minutes(minute as i64)
    }

    pub(crate) fn sample(minute: u32, status: Status) -> Sample {
        let local_time = at(minute);
        Sample {
            local_time,
            utc_time: DateTime::from_naive_utc_and_offset(local_time, chrono::Utc),
            gateway_ms: Some(1.0),
            targets: Reachability::new(2, 2),
            dns_ok: true,
            http_dns_ok: true,
            http_ip_ok: true,
            tcp443_ok: true,
            status,
            root_cause: RootCause::Unattributed,
            trace_file: None,
            isp_reachable: None,
            isp_detail: None,
        }
    }

    fn with_cause(mut s: Sample, cause: RootCause) -> Sample {
        s.root_cause = cause;
        s
    }

    #[test]
    fn test_closed_outage_ends_at_closing_ok_sample() {
        let samples = vec![
            sample(0, Status::Ok),
            sample(1, Status::WanDown),
            sample(2, Status::WanDown),
            sample(3, Status::Ok),
        ];
        let grouped = group_outages(&samples);
        assert_eq!(grouped.outages.len(), 1);
        let o = &grouped.outages[0];
        assert_eq!(o.start, at(1));
        assert_eq!(o.end, at(3));
        assert_eq!(o.samples.len(), 2);
        assert_eq!(o.duration(), TimeDelta::minutes(2));
        assert_eq!(o.reason, Status::WanDown);
        assert_eq!(grouped.availability(), 0.5);
    }

    #[test]
    fn test_trailing_outage_is_emitted() {
        let samples = vec![
            sample(0, Status::Ok),
            sample(1, Status::LanDown),
            sample(2, Status::WanDown),
        ];
        let grouped = group_outages(&samples);
        assert_eq!(grouped.outages.len(), 1);
        let o = &grouped.outages[0];
        assert_eq!(o.end, at(2));
        assert_eq!(o.reason, Status::LanDown);
    }

    #[test]
    fn test_isolated_sample_has_zero_duration_at_stream_end() {
        let grouped = group_outages(&[sample(5, Status::DnsAppFail)]);
        let o = &grouped.outages[0];
        assert_eq!(o.start, o.end);
        assert_eq!(o.duration(), TimeDelta::zero());
        assert_eq!(grouped.availability(), 0.0);
    }

    #[test]
    fn test_empty_stream() {
        let grouped = group_outages(&[]);
        assert!(grouped.outages.is_empty());
        assert_eq!(grouped.availability(), 1.0);
    }

    #[test]
    fn test_members_account_for_every_non_ok_sample() {
        let statuses = [
            Status::WanDown,
            Status::Ok,
            Status::LanDown,
            Status::LanDown,
            Status::Ok,
            Status::Ok,
            Status::Other("FLAPPING".to_string()),
            Status::Ok,
            Status::AppLayerFail,
        ];
        let samples: Vec<Sample> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| sample(i as u32, s.clone()))
            .collect();
        let grouped = group_outages(&samples);

        let members: usize = grouped.outages.iter().map(|o| o.samples.len()).sum();
        let non_ok = samples.iter().filter(|s| !s.is_ok()).count();
        assert_eq!(members, non_ok);
        assert_eq!(grouped.outages.len(), 4);
        assert!(grouped
            .outages
            .iter()
            .all(|o| o.samples.iter().all(|s| !s.is_ok())));
        assert!((grouped.availability() - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_dominant_cause_majority_and_tie() {
        let mut o = Outage::open(&with_cause(sample(0, Status::WanDown), RootCause::Dns));
        o.extend(&with_cause(sample(1, Status::WanDown), RootCause::Dns));
        o.extend(&with_cause(sample(2, Status::WanDown), RootCause::Transport));
        assert_eq!(o.dominant_cause(), RootCause::Dns);

        let mut tie = Outage::open(&with_cause(sample(0, Status::WanDown), RootCause::Dns));
        tie.extend(&with_cause(sample(1, Status::WanDown), RootCause::Transport));
        assert_eq!(tie.dominant_cause(), RootCause::Mixed);

        let unhinted = Outage::open(&sample(0, Status::LanDown));
        assert_eq!(unhinted.dominant_cause(), RootCause::Mixed);
    }

    #[test]
    fn test_gateway_stats_and_reachability() {
        let mut a = sample(0, Status::WanDown);
        a.gateway_ms = Some(2.0);
        a.targets = Reachability::new(0, 2);
        let mut b = sample(1, Status::WanDown);
        b.gateway_ms = None;
        b.targets = Reachability::new(0, 0);
        let mut c = sample(2, Status::WanDown);
        c.gateway_ms = Some(4.0);
        c.targets = Reachability::new(1, 2);

        let mut o = Outage::open(&a);
        o.extend(&b);
        o.extend(&c);

        let stats = o.gateway_stats().unwrap();
        assert_eq!(stats.min_ms, 2.0);
        assert_eq!(stats.mean_ms, 3.0);
        assert_eq!(stats.max_ms, 4.0);
        // Mean of 0 and 1 is 0.5, which rounds to even.
        assert_eq!(o.mean_reachability(), Reachability::new(0, 2));

        let silent = Outage::open(&b);
        assert!(silent.gateway_stats().is_none());
        assert_eq!(silent.mean_reachability(), Reachability::default());
    }

    #[test]
    fn test_trace_reference_skips_empty_members() {
        let mut second = sample(1, Status::WanDown);
        second.trace_file = Some("trace_1.1.1.1_20240501_120100.log".to_string());
        let mut o = Outage::open(&sample(0, Status::WanDown));
        o.extend(&second);
        assert_eq!(o.trace_reference(), Some("trace_1.1.1.1_20240501_120100.log"));
    }
}
