//! ISP-hop target ranking and down-event heatmap.

use serde::Serialize;
use std::collections::BTreeMap;

use super::hourly::HOURS;
use crate::outage::Outage;
use crate::sample::{IspState, Sample};

/// Which samples a view is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleScope {
    AllSamples,
    OutageSamples,
}

/// Down observations for one ISP-hop address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IspTargetRank {
    pub address: String,
    pub down: usize,
    pub seen: usize,
}

impl IspTargetRank {
    /// Down share in percent.
    pub fn down_rate(&self) -> f64 {
        if self.seen == 0 {
            0.0
        } else {
            self.down as f64 / self.seen as f64 * 100.0
        }
    }
}

/// Rank every address in the samples' detail maps, worst first: most down
/// observations, then most observations, then address.
pub fn rank_isp_targets<'a, I>(samples: I) -> Vec<IspTargetRank>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for detail in samples.into_iter().filter_map(|s| s.isp_detail.as_ref()) {
        for (address, state) in detail {
            let entry = counts.entry(address.as_str()).or_default();
            entry.1 += 1;
            if *state == IspState::Down {
                entry.0 += 1;
            }
        }
    }

    let mut ranking: Vec<IspTargetRank> = counts
        .into_iter()
        .map(|(address, (down, seen))| IspTargetRank {
            address: address.to_string(),
            down,
            seen,
        })
        .collect();
    // Stable sort keeps address order among equals.
    ranking.sort_by(|a, b| (b.down, b.seen).cmp(&(a.down, a.seen)));
    ranking
}

/// Per local hour, samples with at least one ISP-hop address down.
pub fn isp_down_by_hour<'a, I>(samples: I) -> [usize; HOURS]
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut hours = [0usize; HOURS];
    for sample in samples.into_iter().filter(|s| s.any_isp_down()) {
        hours[sample.hour()] += 1;
    }
    hours
}

/// ISP ranking and down heatmap over one sample scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IspView {
    pub scope: SampleScope,
    pub ranking: Vec<IspTargetRank>,
    pub down_by_hour: [usize; HOURS],
}

impl IspView {
    pub fn compute(scope: SampleScope, samples: &[Sample], outages: &[Outage]) -> Self {
        let (ranking, down_by_hour) = match scope {
            SampleScope::AllSamples => (rank_isp_targets(samples), isp_down_by_hour(samples)),
            SampleScope::OutageSamples => {
                let members = || outages.iter().flat_map(|o| o.samples.iter());
                (rank_isp_targets(members()), isp_down_by_hour(members()))
            }
        };
        Self {
            scope,
            ranking,
            down_by_hour,
        }
    }

    pub fn has_down_events(&self) -> bool {
        self.down_by_hour.iter().any(|&n| n > 0)
    }
}
