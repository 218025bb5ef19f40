//! Report module for aggregate views over samples and outages.
//!
//! Every view is a pure fold over read-only inputs. `build_report` runs the
//! independent groups on the blocking pool and joins them.

mod causes;
mod hops;
mod hourly;
mod hypothesis;
mod isp;

pub use causes::*;
pub use hops::*;
pub use hourly::*;
pub use hypothesis::*;
pub use isp::*;

use chrono::TimeDelta;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;

use crate::outage::GroupedOutages;
use crate::sample::Sample;
use crate::trace::TraceSource;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report task failed: {0}")]
    Task(#[from] JoinError),
}

pub(crate) fn serialize_secs<S: Serializer>(d: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_seconds())
}

/// Everything the analyzer reports about one sample log.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub samples: usize,
    /// OK share of all samples, 0.0..=1.0.
    pub availability: f64,
    pub hourly: Vec<HourBucket>,
    pub worst_hours: Vec<HourBucket>,
    pub outages: Vec<OutageDetail>,
    pub cause_counts: CauseTally,
    pub cause_heatmap: Vec<HeatRow>,
    pub outage_causes: Vec<OutageCauseSummary>,
    pub isp_impact: IspImpact,
    pub recurring_hops: Vec<HopCount>,
    pub isp_all: IspView,
    pub isp_outages: IspView,
    pub hypothesis: Option<LatencyHypothesis>,
    /// Records whose stored status or hint disagrees with the classifier.
    pub classification_mismatches: usize,
}

struct SampleViews {
    hourly: Vec<HourBucket>,
    worst_hours: Vec<HourBucket>,
    cause_counts: CauseTally,
    cause_heatmap: Vec<HeatRow>,
    mismatches: usize,
}

struct IspViews {
    all: IspView,
    outages: IspView,
    impact: IspImpact,
}

struct OutageViews {
    details: Vec<OutageDetail>,
    causes: Vec<OutageCauseSummary>,
    hypothesis: Option<LatencyHypothesis>,
}

/// Build the full report. `top_hours` caps the worst-hours list.
pub async fn build_report(
    samples: Arc<[Sample]>,
    grouped: Arc<GroupedOutages>,
    traces: Arc<dyn TraceSource + Send + Sync>,
    top_hours: usize,
) -> Result<Report, ReportError> {
    let sample_task = {
        let samples = samples.clone();
        tokio::task::spawn_blocking(move || {
            let hourly = hourly_breakdown(&samples);
            let worst_hours = worst_hours(&hourly, top_hours);
            SampleViews {
                worst_hours,
                hourly,
                cause_counts: cause_tally(&samples),
                cause_heatmap: cause_heatmap(&samples),
                mismatches: classification_mismatches(&samples),
            }
        })
    };

    let isp_task = {
        let samples = samples.clone();
        let grouped = grouped.clone();
        tokio::task::spawn_blocking(move || IspViews {
            all: IspView::compute(SampleScope::AllSamples, &samples, &grouped.outages),
            outages: IspView::compute(SampleScope::OutageSamples, &samples, &grouped.outages),
            impact: isp_impact(&grouped.outages),
        })
    };

    let outage_task = {
        let grouped = grouped.clone();
        tokio::task::spawn_blocking(move || OutageViews {
            details: correlate_outages(&grouped.outages, traces.as_ref()),
            causes: outage_cause_summary(&grouped.outages),
            hypothesis: latency_hypothesis(&grouped.outages),
        })
    };

    let (by_sample, isp, by_outage) = tokio::try_join!(sample_task, isp_task, outage_task)?;

    if by_sample.mismatches > 0 {
        tracing::warn!(
            "{} records carry a stored status or hint that differs from their probe results",
            by_sample.mismatches
        );
    }

    Ok(Report {
        samples: grouped.total_samples,
        availability: grouped.availability(),
        hourly: by_sample.hourly,
        worst_hours: by_sample.worst_hours,
        recurring_hops: recurring_hops(&by_outage.details),
        outages: by_outage.details,
        cause_counts: by_sample.cause_counts,
        cause_heatmap: by_sample.cause_heatmap,
        outage_causes: by_outage.causes,
        isp_impact: isp.impact,
        isp_all: isp.all,
        isp_outages: isp.outages,
        hypothesis: by_outage.hypothesis,
        classification_mismatches: by_sample.mismatches,
    })
}
