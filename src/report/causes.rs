//! Root-cause tallies across samples and outages.

use chrono::TimeDelta;
use serde::Serialize;
use std::collections::BTreeMap;

use super::serialize_secs;
use crate::classify::classify;
use crate::outage::Outage;
use crate::sample::{RootCause, Sample};

/// Non-OK sample counts per root-cause hint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CauseTally {
    pub dns: usize,
    pub icmp_only: usize,
    pub transport: usize,
    pub mixed: usize,
    /// Non-OK samples without a hint.
    pub unattributed: usize,
    /// Hints this crate does not know, by their stored tag.
    pub other: BTreeMap<String, usize>,
}

impl CauseTally {
    fn add(&mut self, cause: &RootCause) {
        match cause {
            RootCause::Dns => self.dns += 1,
            RootCause::IcmpOnly => self.icmp_only += 1,
            RootCause::Transport => self.transport += 1,
            RootCause::Mixed => self.mixed += 1,
            RootCause::Unattributed => self.unattributed += 1,
            RootCause::Other(tag) => *self.other.entry(tag.clone()).or_default() += 1,
        }
    }

    pub fn get(&self, cause: &RootCause) -> usize {
        match cause {
            RootCause::Dns => self.dns,
            RootCause::IcmpOnly => self.icmp_only,
            RootCause::Transport => self.transport,
            RootCause::Mixed => self.mixed,
            RootCause::Unattributed => self.unattributed,
            RootCause::Other(tag) => self.other.get(tag).copied().unwrap_or(0),
        }
    }
}

pub fn cause_tally(samples: &[Sample]) -> CauseTally {
    let mut tally = CauseTally::default();
    for sample in samples.iter().filter(|s| !s.is_ok()) {
        tally.add(&sample.root_cause);
    }
    tally
}

/// Samples whose stored status or hint differs from what the classifier
/// derives from their probe results.
pub fn classification_mismatches(samples: &[Sample]) -> usize {
    samples
        .iter()
        .filter(|s| {
            let derived = classify(&s.probe_inputs());
            derived.status != s.status || derived.root_cause != s.root_cause
        })
        .count()
}

/// Outage count and time lost for one dominant cause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutageCauseSummary {
    pub cause: RootCause,
    pub outages: usize,
    #[serde(rename = "total_secs", serialize_with = "serialize_secs")]
    pub total: TimeDelta,
    #[serde(rename = "mean_secs", serialize_with = "serialize_secs")]
    pub mean: TimeDelta,
}

/// Group outages by their dominant cause. Known causes come first in
/// report order, then any other tags alphabetically.
pub fn outage_cause_summary(outages: &[Outage]) -> Vec<OutageCauseSummary> {
    let mut by_cause: BTreeMap<RootCause, (usize, TimeDelta)> = BTreeMap::new();
    for outage in outages {
        let entry = by_cause
            .entry(outage.dominant_cause())
            .or_insert((0, TimeDelta::zero()));
        entry.0 += 1;
        entry.1 += outage.duration();
    }

    by_cause
        .into_iter()
        .map(|(cause, (count, total))| OutageCauseSummary {
            cause,
            outages: count,
            total,
            mean: total / count as i32,
        })
        .collect()
}

/// How often non-OK samples also lost some or all ISP hops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IspImpact {
    pub partial: usize,
    pub down: usize,
    /// Non-OK samples that carried an ISP reachability pair.
    pub total: usize,
}

impl IspImpact {
    pub fn partial_pct(&self) -> f64 {
        percent(self.partial, self.total)
    }

    pub fn down_pct(&self) -> f64 {
        percent(self.down, self.total)
    }
}

pub fn isp_impact(outages: &[Outage]) -> IspImpact {
    let mut impact = IspImpact::default();
    let members = outages.iter().flat_map(|o| o.samples.iter());
    for sample in members.filter(|s| !s.is_ok()) {
        let Some(isp) = sample.isp_reachable else {
            continue;
        };
        impact.total += 1;
        if isp.total > 0 && isp.none_reachable() {
            impact.down += 1;
        } else if isp.is_partial() {
            impact.partial += 1;
        }
    }
    impact
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
