//! Hour-of-day breakdowns.

use serde::Serialize;

use crate::sample::{RootCause, Sample};

pub const HOURS: usize = 24;

/// Sample counts for one local hour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    pub hour: usize,
    pub total: usize,
    pub non_ok: usize,
}

impl HourBucket {
    /// Non-OK share in percent.
    pub fn non_ok_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.non_ok as f64 / self.total as f64 * 100.0
        }
    }
}

/// Total and non-OK counts for each of the 24 local hours.
pub fn hourly_breakdown(samples: &[Sample]) -> Vec<HourBucket> {
    let mut buckets: Vec<HourBucket> = (0..HOURS)
        .map(|hour| HourBucket {
            hour,
            ..Default::default()
        })
        .collect();
    for sample in samples {
        let bucket = &mut buckets[sample.hour()];
        bucket.total += 1;
        if !sample.is_ok() {
            bucket.non_ok += 1;
        }
    }
    buckets
}

/// The `n` hours with the most non-OK samples, then the most samples.
/// Equal hours keep clock order.
pub fn worst_hours(buckets: &[HourBucket], n: usize) -> Vec<HourBucket> {
    let mut ranked = buckets.to_vec();
    ranked.sort_by(|a, b| (b.non_ok, b.total).cmp(&(a.non_ok, a.total)));
    ranked.truncate(n);
    ranked
}

/// Non-OK counts by cause for one hour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeatRow {
    pub hour: usize,
    pub dns: usize,
    pub icmp_only: usize,
    pub transport: usize,
    pub mixed: usize,
}

impl HeatRow {
    fn add(&mut self, cause: &RootCause) {
        match cause.heat_column() {
            0 => self.dns += 1,
            1 => self.icmp_only += 1,
            2 => self.transport += 1,
            _ => self.mixed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.dns + self.icmp_only + self.transport + self.mixed
    }
}

/// 24 x 4 grid of non-OK samples by hour and cause.
pub fn cause_heatmap(samples: &[Sample]) -> Vec<HeatRow> {
    let mut rows: Vec<HeatRow> = (0..HOURS)
        .map(|hour| HeatRow {
            hour,
            ..Default::default()
        })
        .collect();
    for sample in samples.iter().filter(|s| !s.is_ok()) {
        rows[sample.hour()].add(&sample.root_cause);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outage::tests::sample;
    use crate::sample::Status;

    #[test]
    fn test_hourly_breakdown() {
        // Minutes 0..120 from 14:00 spread over hours 14 and 15.
        let samples = vec![
            sample(0, Status::Ok),
            sample(10, Status::WanDown),
            sample(70, Status::Ok),
        ];
        let buckets = hourly_breakdown(&samples);
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[14], HourBucket { hour: 14, total: 2, non_ok: 1 });
        assert_eq!(buckets[15], HourBucket { hour: 15, total: 1, non_ok: 0 });
        assert_eq!(buckets[14].non_ok_rate(), 50.0);
        assert_eq!(buckets[3].non_ok_rate(), 0.0);
    }

    #[test]
    fn test_worst_hours_ordering() {
        let mut buckets: Vec<HourBucket> = (0..HOURS)
            .map(|hour| HourBucket { hour, ..Default::default() })
            .collect();
        buckets[2] = HourBucket { hour: 2, total: 10, non_ok: 3 };
        buckets[5] = HourBucket { hour: 5, total: 20, non_ok: 3 };
        buckets[9] = HourBucket { hour: 9, total: 4, non_ok: 4 };
        buckets[11] = HourBucket { hour: 11, total: 7, non_ok: 0 };
        buckets[12] = HourBucket { hour: 12, total: 7, non_ok: 0 };

        let worst: Vec<usize> = worst_hours(&buckets, 5).iter().map(|b| b.hour).collect();
        assert_eq!(worst, vec![9, 5, 2, 11, 12]);
    }

    #[test]
    fn test_cause_heatmap_collapses_unknown_hints() {
        let mut dns = sample(0, Status::DnsAppFail);
        dns.root_cause = RootCause::Dns;
        let mut odd = sample(1, Status::WanDown);
        odd.root_cause = RootCause::Other("Routing".to_string());
        let unhinted = sample(2, Status::LanDown);
        let mut ok = sample(3, Status::Ok);
        ok.root_cause = RootCause::Transport;

        let rows = cause_heatmap(&[dns, odd, unhinted, ok]);
        let row = rows[14];
        assert_eq!(row.dns, 1);
        assert_eq!(row.mixed, 2);
        assert_eq!(row.transport, 0);
        assert_eq!(row.total(), 3);
    }
}
