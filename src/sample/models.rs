//! Sample model types.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::classify::ProbeInputs;

/// Overall health of a single sample.
///
/// The wire form is the upper-case tag written by the prober. Tags this
/// crate does not know are kept verbatim in `Other` and count as non-OK.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    LanDown,
    WanDown,
    DnsAppFail,
    AppLayerFail,
    Other(String),
}

impl Status {
    /// Parse a stored status tag. Returns `None` for an empty cell.
    pub fn from_wire(s: &str) -> Option<Self> {
        let s = s.trim();
        let status = match s {
            "" => return None,
            "OK" => Status::Ok,
            "LAN_DOWN" => Status::LanDown,
            "WAN_DOWN" => Status::WanDown,
            "DNS_APP_FAIL" => Status::DnsAppFail,
            "APP_LAYER_FAIL" => Status::AppLayerFail,
            other => Status::Other(other.to_string()),
        };
        Some(status)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Ok => "OK",
            Status::LanDown => "LAN_DOWN",
            Status::WanDown => "WAN_DOWN",
            Status::DnsAppFail => "DNS_APP_FAIL",
            Status::AppLayerFail => "APP_LAYER_FAIL",
            Status::Other(s) => s,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Heuristic attribution of a non-OK sample to a network layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RootCause {
    /// Empty hint: OK samples, or rows written before hints existed.
    Unattributed,
    Dns,
    IcmpOnly,
    Transport,
    Mixed,
    Other(String),
}

impl RootCause {
    /// The four attributions the classifier produces, in report order.
    pub const KNOWN: [RootCause; 4] = [
        RootCause::Dns,
        RootCause::IcmpOnly,
        RootCause::Transport,
        RootCause::Mixed,
    ];

    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "" => RootCause::Unattributed,
            "DNS" => RootCause::Dns,
            "ICMP-only" => RootCause::IcmpOnly,
            "Transport" => RootCause::Transport,
            "Mixed" => RootCause::Mixed,
            other => RootCause::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RootCause::Unattributed => "",
            RootCause::Dns => "DNS",
            RootCause::IcmpOnly => "ICMP-only",
            RootCause::Transport => "Transport",
            RootCause::Mixed => "Mixed",
            RootCause::Other(s) => s,
        }
    }

    /// Column in the hour x cause heatmap. Anything outside the three
    /// specific causes lands in the `Mixed` column.
    pub fn heat_column(&self) -> usize {
        match self {
            RootCause::Dns => 0,
            RootCause::IcmpOnly => 1,
            RootCause::Transport => 2,
            _ => 3,
        }
    }

    pub fn is_attributed(&self) -> bool {
        !matches!(self, RootCause::Unattributed)
    }
}

impl fmt::Display for RootCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RootCause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A `reachable/total` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Reachability {
    pub reachable: u32,
    pub total: u32,
}

impl Reachability {
    pub fn new(reachable: u32, total: u32) -> Self {
        Self { reachable, total }
    }

    /// Parse `"<reachable>/<total>"`. A pair claiming more reachable than
    /// attempted is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let (a, b) = s.trim().split_once('/')?;
        let reachable = a.trim().parse().ok()?;
        let total = b.trim().parse().ok()?;
        if reachable > total {
            return None;
        }
        Some(Self { reachable, total })
    }

    pub fn none_reachable(&self) -> bool {
        self.reachable == 0
    }

    /// Some but not all targets answered.
    pub fn is_partial(&self) -> bool {
        self.reachable > 0 && self.reachable < self.total
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.reachable, self.total)
    }
}

/// State of one ISP-hop address in a sample's detail map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IspState {
    Ok,
    Down,
    Unknown,
}

impl IspState {
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "ok" => IspState::Ok,
            "down" => IspState::Down,
            _ => IspState::Unknown,
        }
    }
}

/// Parse an ISP detail cell like `"ip1:ok;ip2:down"`.
///
/// Entries split at their last `:` so IPv6 addresses stay intact. A single
/// entry without a state invalidates the whole map.
pub fn parse_isp_detail(s: &str) -> Option<BTreeMap<String, IspState>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let mut detail = BTreeMap::new();
    for part in s.split(';').filter(|p| !p.is_empty()) {
        let (addr, state) = part.rsplit_once(':')?;
        detail.insert(addr.trim().to_string(), IspState::from_wire(state));
    }
    Some(detail)
}

/// One multi-layer probe observation.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub local_time: NaiveDateTime,
    pub utc_time: DateTime<Utc>,
    /// Gateway round-trip in milliseconds; `None` when the gateway was silent.
    pub gateway_ms: Option<f64>,
    pub targets: Reachability,
    pub dns_ok: bool,
    pub http_dns_ok: bool,
    pub http_ip_ok: bool,
    pub tcp443_ok: bool,
    pub status: Status,
    pub root_cause: RootCause,
    /// Name of the trace dump captured for this sample, relative to the log dir.
    pub trace_file: Option<String>,
    pub isp_reachable: Option<Reachability>,
    pub isp_detail: Option<BTreeMap<String, IspState>>,
}

impl Sample {
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Local hour of day, 0..24.
    pub fn hour(&self) -> usize {
        self.local_time.hour() as usize
    }

    pub fn probe_inputs(&self) -> ProbeInputs {
        ProbeInputs {
            gateway_ms: self.gateway_ms,
            targets: self.targets,
            http_dns_ok: self.http_dns_ok,
            http_ip_ok: self.http_ip_ok,
            tcp443_ok: self.tcp443_ok,
        }
    }

    /// At least one ISP-hop address was marked down.
    pub fn any_isp_down(&self) -> bool {
        self.isp_detail
            .as_ref()
            .is_some_and(|d| d.values().any(|s| *s == IspState::Down))
    }
}
