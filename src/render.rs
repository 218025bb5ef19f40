//! Plain-text rendering of a [`Report`].

use chrono::TimeDelta;
use std::fmt;

use crate::report::{IspView, OutageDetail, Report, SampleScope};
use crate::trace::TraceHop;

const NEXT_STEPS: [&str; 4] = [
    "Add a TCP connectivity check (e.g., TLS connect to 1.1.1.1:443) to distinguish ICMP filtering from real packet loss.",
    "Add an HTTP GET to an IP-only endpoint (e.g., https://1.1.1.1) to bypass DNS and separate DNS from transport.",
    "Run 'mtr -rwzc 20 1.1.1.1' during an outage to see where loss starts; consider longer samples (60-120 seconds).",
    "Log WAN interface state around outages: 'ip addr', 'ip -s link', 'dmesg | grep -i eth|enp', 'journalctl -u NetworkManager -r --since \"5 min ago\"'.",
];

/// Format a duration as `H:MM:SS`, prefixed with whole days when longer
/// than one (`"1 day, 2:03:04"`). Negative spans borrow from the day
/// count the way `-1 day, 23:59:00` reads.
pub fn format_duration(d: TimeDelta) -> String {
    let secs = d.num_seconds();
    let days = secs.div_euclid(86_400);
    let rest = secs.rem_euclid(86_400);
    let clock = format!("{}:{:02}:{:02}", rest / 3600, rest % 3600 / 60, rest % 60);
    match days {
        0 => clock,
        1 | -1 => format!("{} day, {}", days, clock),
        _ => format!("{} days, {}", days, clock),
    }
}

fn hour_range(hour: usize) -> String {
    format!("{:02}:00 - {:02}:59", hour, hour)
}

fn latency(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}", v))
}

fn write_outage(f: &mut fmt::Formatter<'_>, o: &OutageDetail) -> fmt::Result {
    writeln!(
        f,
        "#{} {} -> {}  dur={}  status={}",
        o.index,
        o.start,
        o.end,
        format_duration(o.duration),
        o.reason
    )?;
    writeln!(
        f,
        "   reach: ~{} targets; gateway_ms min/avg/max: {} / {} / {}",
        o.reachability,
        latency(o.gateway.map(|g| g.min_ms)),
        latency(o.gateway.map(|g| g.mean_ms)),
        latency(o.gateway.map(|g| g.max_ms)),
    )?;
    let Some(trace) = &o.trace_file else {
        return Ok(());
    };
    match &o.first_hop {
        Some(TraceHop::Measured(stats)) => writeln!(
            f,
            "   trace: {}  hop1 {} loss={:.1}% avg={:.1}ms",
            trace, stats.ip, stats.loss_pct, stats.avg_ms
        ),
        Some(hop) => writeln!(
            f,
            "   trace: {}  hop1 {} ({})",
            trace,
            hop.ip(),
            hop.note().unwrap_or_default()
        ),
        None => writeln!(f, "   trace: {} (could not parse)", trace),
    }
}

fn write_isp_view(f: &mut fmt::Formatter<'_>, view: &IspView) -> fmt::Result {
    let (rows, events) = match view.scope {
        SampleScope::AllSamples => ("all rows", ""),
        SampleScope::OutageSamples => ("outage rows", " (outages)"),
    };
    if !view.ranking.is_empty() {
        writeln!(f, "\nISP target down ranking ({}):", rows)?;
        for target in &view.ranking {
            writeln!(
                f,
                "  {}: down {}/{} ({:.1}%)",
                target.address,
                target.down,
                target.seen,
                target.down_rate()
            )?;
        }
    }
    if view.has_down_events() {
        writeln!(f, "\nHours with ISP target down events{}:", events)?;
        for (hour, n) in view.down_by_hour.iter().enumerate().filter(|(_, n)| **n > 0) {
            writeln!(f, "  {}  {} events", hour_range(hour), n)?;
        }
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Netlog Summary ===")?;
        writeln!(
            f,
            "Rows: {}  Availability (by row count): {:.2}%",
            self.samples,
            self.availability * 100.0
        )?;
        if self.classification_mismatches > 0 {
            writeln!(
                f,
                "Rows whose stored status disagrees with their probe results: {}",
                self.classification_mismatches
            )?;
        }

        writeln!(f, "\nTop hours by non-OK counts:")?;
        for bucket in &self.worst_hours {
            writeln!(
                f,
                "  {}  non-OK {}/{} ({:.1}%)",
                hour_range(bucket.hour),
                bucket.non_ok,
                bucket.total,
                bucket.non_ok_rate()
            )?;
        }

        if self.outages.is_empty() {
            writeln!(f, "\nNo outages detected.")?;
            return write_isp_view(f, &self.isp_all);
        }

        writeln!(f, "\n=== Outages ===")?;
        for outage in &self.outages {
            write_outage(f, outage)?;
        }

        writeln!(f, "\nRoot-cause counts (non-OK rows):")?;
        writeln!(f, "  {:<11}: {}", "DNS", self.cause_counts.dns)?;
        writeln!(f, "  {:<11}: {}", "ICMP-only", self.cause_counts.icmp_only)?;
        writeln!(f, "  {:<11}: {}", "Transport", self.cause_counts.transport)?;
        writeln!(f, "  {:<11}: {}", "Mixed", self.cause_counts.mixed)?;

        writeln!(f, "\nNon-OK heatmap by hour and root cause:")?;
        writeln!(f, "  Hour  DNS  ICMP  Trans  Mixed  Total")?;
        for row in self.cause_heatmap.iter().filter(|r| r.total() > 0) {
            writeln!(
                f,
                "  {:02}    {:>3}   {:>4}   {:>5}   {:>5}   {:>5}",
                row.hour,
                row.dns,
                row.icmp_only,
                row.transport,
                row.mixed,
                row.total()
            )?;
        }

        if !self.outage_causes.is_empty() {
            writeln!(f, "\nOutage summary by root cause:")?;
            for summary in &self.outage_causes {
                writeln!(
                    f,
                    "  {:<11}: {} outages, total {}, avg {}",
                    summary.cause.as_str(),
                    summary.outages,
                    format_duration(summary.total),
                    format_duration(summary.mean)
                )?;
            }
        }

        let impact = &self.isp_impact;
        if impact.total > 0 {
            writeln!(
                f,
                "\nISP impact summary (non-OK rows with isp_targets): partial {} ({:.1}%), down {} ({:.1}%), total {}",
                impact.partial,
                impact.partial_pct(),
                impact.down,
                impact.down_pct(),
                impact.total
            )?;
        }

        if !self.recurring_hops.is_empty() {
            writeln!(f, "\nRecurring first-hop issues beyond router (count across outages):")?;
            for hop in &self.recurring_hops {
                writeln!(f, "  {}: {}", hop.ip, hop.outages)?;
            }
        }

        write_isp_view(f, &self.isp_outages)?;

        if let Some(hypothesis) = self.hypothesis {
            writeln!(f, "\nHypothesis: {}", hypothesis.describe())?;
        }

        writeln!(f, "\nNext steps suggestions:")?;
        for step in NEXT_STEPS {
            writeln!(f, "- {}", step)?;
        }
        Ok(())
    }
}
