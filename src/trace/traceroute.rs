//! Degraded first-hop parsing for plain traceroute output.

/// Return the address of hop 1 from traceroute-style output such as
/// ` 1  192.168.2.1  0.6 ms`. Only the second token is trusted.
pub fn parse_traceroute_first_hop(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| line.starts_with("1 ") || line.starts_with("1."))
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
}
