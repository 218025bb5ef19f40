//! Layered status classification for a single sample.
//!
//! Each rule isolates one layer by triangulating the three independent
//! reachability checks: name resolution, ICMP filtering, raw transport.

use serde::Serialize;

use crate::sample::{Reachability, RootCause, Status};

/// The probe results the classifier looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeInputs {
    pub gateway_ms: Option<f64>,
    pub targets: Reachability,
    pub http_dns_ok: bool,
    pub http_ip_ok: bool,
    pub tcp443_ok: bool,
}

/// A (status, root cause) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub status: Status,
    pub root_cause: RootCause,
}

/// Classify one sample. Total over every input combination.
pub fn classify(inputs: &ProbeInputs) -> Classification {
    let status = classify_status(inputs);
    let root_cause = if status.is_ok() {
        RootCause::Unattributed
    } else {
        infer_root_cause(inputs)
    };
    Classification { status, root_cause }
}

/// First matching rule wins.
pub fn classify_status(inputs: &ProbeInputs) -> Status {
    if inputs.gateway_ms.is_none() {
        Status::LanDown
    } else if inputs.targets.none_reachable() {
        Status::WanDown
    } else if !inputs.http_dns_ok {
        if inputs.http_ip_ok {
            Status::DnsAppFail
        } else {
            Status::AppLayerFail
        }
    } else {
        Status::Ok
    }
}

/// Root-cause rules, independent of the status axis: a `WAN_DOWN` sample
/// can still be attributed `ICMP-only`.
pub fn infer_root_cause(inputs: &ProbeInputs) -> RootCause {
    let icmp_all_down = inputs.targets.none_reachable();

    if !inputs.http_dns_ok && inputs.http_ip_ok {
        RootCause::Dns
    } else if icmp_all_down && inputs.tcp443_ok && inputs.http_ip_ok {
        RootCause::IcmpOnly
    } else if !inputs.http_ip_ok && !inputs.tcp443_ok {
        RootCause::Transport
    } else {
        RootCause::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> ProbeInputs {
        ProbeInputs {
            gateway_ms: Some(1.2),
            targets: Reachability::new(2, 2),
            http_dns_ok: true,
            http_ip_ok: true,
            tcp443_ok: true,
        }
    }

    #[test]
    fn test_healthy_sample_is_ok_without_cause() {
        let c = classify(&healthy());
        assert_eq!(c.status, Status::Ok);
        assert_eq!(c.root_cause, RootCause::Unattributed);
    }

    #[test]
    fn test_gateway_silent_is_lan_down() {
        let inputs = ProbeInputs {
            gateway_ms: None,
            ..healthy()
        };
        let c = classify(&inputs);
        assert_eq!(c.status, Status::LanDown);
        // Everything above the gateway still answered, so no layer stands out.
        assert_eq!(c.root_cause, RootCause::Mixed);
    }

    #[test]
    fn test_icmp_filtered_is_wan_down_with_icmp_only_cause() {
        let inputs = ProbeInputs {
            targets: Reachability::new(0, 2),
            ..healthy()
        };
        let c = classify(&inputs);
        assert_eq!(c.status, Status::WanDown);
        assert_eq!(c.root_cause, RootCause::IcmpOnly);
    }

    #[test]
    fn test_dns_failure() {
        let inputs = ProbeInputs {
            http_dns_ok: false,
            ..healthy()
        };
        let c = classify(&inputs);
        assert_eq!(c.status, Status::DnsAppFail);
        assert_eq!(c.root_cause, RootCause::Dns);
    }

    #[test]
    fn test_transport_failure() {
        let inputs = ProbeInputs {
            http_dns_ok: false,
            http_ip_ok: false,
            tcp443_ok: false,
            ..healthy()
        };
        let c = classify(&inputs);
        assert_eq!(c.status, Status::AppLayerFail);
        assert_eq!(c.root_cause, RootCause::Transport);
    }

    #[test]
    fn test_total_and_deterministic() {
        let gateways = [None, Some(0.8)];
        let targets = [Reachability::new(0, 2), Reachability::new(1, 2)];
        for gateway_ms in gateways {
            for t in targets {
                for bits in 0..8u8 {
                    let inputs = ProbeInputs {
                        gateway_ms,
                        targets: t,
                        http_dns_ok: bits & 1 != 0,
                        http_ip_ok: bits & 2 != 0,
                        tcp443_ok: bits & 4 != 0,
                    };
                    let first = classify(&inputs);
                    assert_eq!(first, classify(&inputs));
                    assert_eq!(first.status.is_ok(), !first.root_cause.is_attributed());
                }
            }
        }
    }
}
