//! CSV sample-log reader.
//!
//! Every optional cell has a documented default; a bad cell never fails the
//! batch. Only a row with no parseable timestamp at all is dropped.

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ByteRecord, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::models::*;
use crate::classify::classify;

/// Local timestamp layout written by the prober.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sample log error types.
#[derive(Error, Debug)]
pub enum SampleLogError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Column positions resolved from the header row. Unknown columns are
/// ignored; a missing column reads as an empty cell.
#[derive(Debug, Default)]
struct Columns {
    local_timestamp: Option<usize>,
    utc_timestamp: Option<usize>,
    gateway_ms: Option<usize>,
    targets_reachable: Option<usize>,
    dns_ok: Option<usize>,
    http_dns_ok: Option<usize>,
    http_ip_ok: Option<usize>,
    tcp443_ok: Option<usize>,
    overall_status: Option<usize>,
    trace_file: Option<usize>,
    root_cause_hint: Option<usize>,
    isp_reachable: Option<usize>,
    isp_detail: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Self {
            local_timestamp: find("local_timestamp"),
            utc_timestamp: find("utc_timestamp"),
            gateway_ms: find("gateway_ms"),
            targets_reachable: find("targets_reachable"),
            dns_ok: find("dns_ok"),
            // Older logs only carried a single HTTP check.
            http_dns_ok: find("http_dns_ok").or_else(|| find("http_ok")),
            http_ip_ok: find("http_ip_ok"),
            tcp443_ok: find("tcp443_ok"),
            overall_status: find("overall_status"),
            trace_file: find("trace_file"),
            root_cause_hint: find("root_cause_hint"),
            isp_reachable: find("isp_reachable"),
            isp_detail: find("isp_detail"),
        }
    }
}

fn cell(record: &StringRecord, column: Option<usize>) -> &str {
    column.and_then(|i| record.get(i)).unwrap_or("")
}

/// Outcome of reading a sample log.
#[derive(Debug, Default)]
pub struct SampleLog {
    pub samples: Vec<Sample>,
    /// Rows dropped because neither timestamp parsed, or the row itself was unreadable.
    pub skipped_rows: usize,
    /// Rows whose status was missing and had to be derived.
    pub derived_status: usize,
}

/// Read a sample log from disk.
pub fn read_sample_log(path: &Path) -> Result<SampleLog, SampleLogError> {
    let file = File::open(path).map_err(|source| SampleLogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_samples(file)
}

/// Read samples from any CSV source with a header row.
pub fn read_samples<R: Read>(source: R) -> Result<SampleLog, SampleLogError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);

    // Fail early on an unreadable header; row-level problems are tolerated below.
    let columns = Columns::from_headers(&decode_lossy(reader.byte_headers()?));

    let mut log = SampleLog::default();
    for (line, result) in reader.byte_records().enumerate() {
        let record = match result {
            Ok(record) => decode_lossy(&record),
            Err(e) => {
                tracing::debug!("Skipping unreadable row {}: {}", line + 2, e);
                log.skipped_rows += 1;
                continue;
            }
        };
        match sample_from_record(&record, &columns) {
            Some((sample, derived)) => {
                if derived {
                    log.derived_status += 1;
                }
                log.samples.push(sample);
            }
            None => {
                tracing::debug!("Skipping row {}: no parseable timestamp", line + 2);
                log.skipped_rows += 1;
            }
        }
    }

    if log.skipped_rows > 0 {
        tracing::warn!("Skipped {} unparseable rows", log.skipped_rows);
    }

    Ok(log)
}

/// Decode every cell on its own so invalid UTF-8 only damages that cell.
fn decode_lossy(record: &ByteRecord) -> StringRecord {
    record.iter().map(String::from_utf8_lossy).collect()
}

/// Interpret one raw row. Returns the sample and whether its status had to
/// be derived by the classifier.
fn sample_from_record(record: &StringRecord, cols: &Columns) -> Option<(Sample, bool)> {
    let field = |column| cell(record, column);
    let local = parse_local_time(field(cols.local_timestamp));
    let utc = parse_utc_time(field(cols.utc_timestamp));
    let (local_time, utc_time) = match (local, utc) {
        (Some(l), Some(u)) => (l, u),
        (Some(l), None) => (l, l.and_utc()),
        (None, Some(u)) => (u.naive_utc(), u),
        (None, None) => return None,
    };

    let mut sample = Sample {
        local_time,
        utc_time,
        gateway_ms: parse_latency(field(cols.gateway_ms)),
        targets: Reachability::parse(field(cols.targets_reachable)).unwrap_or_default(),
        dns_ok: parse_flag(field(cols.dns_ok)),
        http_dns_ok: parse_flag(field(cols.http_dns_ok)),
        http_ip_ok: parse_flag(field(cols.http_ip_ok)),
        tcp443_ok: parse_flag(field(cols.tcp443_ok)),
        status: Status::Ok,
        root_cause: RootCause::from_wire(field(cols.root_cause_hint)),
        trace_file: non_empty(field(cols.trace_file)),
        isp_reachable: Reachability::parse(field(cols.isp_reachable)),
        isp_detail: parse_isp_detail(field(cols.isp_detail)),
    };

    let derived = match Status::from_wire(field(cols.overall_status)) {
        Some(status) => {
            sample.status = status;
            false
        }
        None => {
            let c = classify(&sample.probe_inputs());
            sample.status = c.status;
            sample.root_cause = c.root_cause;
            true
        }
    };

    Some((sample, derived))
}

fn parse_local_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, LOCAL_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

fn parse_utc_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less ISO strings are taken as UTC.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|n| n.and_utc())
}

fn parse_latency(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `1`, `True` and `true` are truthy; anything else is false.
pub fn parse_flag(s: &str) -> bool {
    matches!(s.trim(), "1" | "True" | "true")
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
