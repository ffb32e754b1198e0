//! Parsers for the kernel files the collectors read.
//!
//! Pure functions over file contents, so they are testable with string
//! inputs.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

/// Parses a single-integer sysfs attribute such as `statistics/rx_dropped`.
pub fn parse_counter(content: &str) -> Result<i64, ParseError> {
    let s = content.trim();
    s.parse()
        .map_err(|_| ParseError::new(format!("invalid counter value {:?}", s)))
}

/// Selected counters per `/proc/net/snmp` section (`Ip`, `Udp`, ...).
pub type SnmpSections = BTreeMap<String, BTreeMap<String, i64>>;

/// Parses `/proc/net/snmp`, keeping only the `wanted` section/counter pairs.
///
/// Format: each protocol has a header line and a value line.
/// ```text
/// Udp: InDatagrams NoPorts InErrors ...
/// Udp: 1000 5 0 ...
/// ```
/// Sections listed in `wanted` but absent from the file are omitted.
/// Values that do not fit an `i64` are skipped.
pub fn parse_net_snmp(content: &str, wanted: &[(&str, &[&str])]) -> SnmpSections {
    let mut out = SnmpSections::new();
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

    let mut i = 0;
    while i + 1 < lines.len() {
        let key_parts: Vec<&str> = lines[i].split_whitespace().collect();
        let val_parts: Vec<&str> = lines[i + 1].split_whitespace().collect();

        // Header and value lines must share the same prefix, e.g. "Udp:".
        if key_parts.is_empty() || val_parts.is_empty() || key_parts[0] != val_parts[0] {
            i += 1;
            continue;
        }

        let section = key_parts[0].trim_end_matches(':');
        if let Some((_, counters)) = wanted.iter().find(|(name, _)| *name == section) {
            let entry = out.entry(section.to_string()).or_default();
            for (key, val) in key_parts[1..].iter().zip(&val_parts[1..]) {
                if counters.contains(key)
                    && let Ok(v) = val.parse::<i64>()
                {
                    entry.insert(key.to_string(), v);
                }
            }
        }
        i += 2;
    }

    out
}

/// Per-CPU totals from `/proc/net/softnet_stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftnetTotals {
    /// Packets dropped because the backlog queue was full.
    pub dropped: i64,
    /// Times the NET_RX softirq ran out of budget.
    pub time_squeeze: i64,
}

/// Parses `/proc/net/softnet_stat`, summing across CPUs.
///
/// Each row is one CPU; columns are hexadecimal:
/// `processed dropped time_squeeze ...`. Rows with fewer than three columns
/// are ignored.
pub fn parse_softnet_stat(content: &str) -> Result<SoftnetTotals, ParseError> {
    let mut totals = SoftnetTotals::default();
    let hex = |s: &str| {
        i64::from_str_radix(s, 16)
            .map_err(|_| ParseError::new(format!("invalid hex value {:?}", s)))
    };

    for line in content.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 3 {
            continue;
        }
        totals.dropped += hex(cols[1])?;
        totals.time_squeeze += hex(cols[2])?;
    }

    Ok(totals)
}
