//! Running totals over every delta record of a log.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::classify::{self, Bucket, Layer};

/// Line counters gathered during ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestStats {
    /// Non-blank lines seen.
    pub lines: u64,
    /// Delta records whose payload was scanned.
    pub delta_records: u64,
    /// Records of another type (snapshots).
    pub other_records: u64,
    /// Lines that were not a usable record.
    pub malformed: u64,
    /// Values dropped because a total would overflow.
    pub overflowed: u64,
}

/// What happened to one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Blank,
    Malformed,
    Ignored,
    /// Delta record; carries the number of values admitted.
    Admitted(usize),
}

/// Wire name of [`crate::record::RecordType::Delta`].
const DELTA_RECORD_TYPE: &str = "delta";

/// The fields the report needs. Everything else on the line is ignored.
#[derive(Deserialize)]
struct DeltaLine {
    record_type: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Four nested accumulators plus per-counter source annotations.
///
/// Every admitted value is added at all four levels at once, so the
/// per-layer totals always sum to `global`, per-bucket totals to their
/// layer, and per-counter totals to their bucket.
#[derive(Debug, Default)]
pub struct Totals {
    pub global: i64,
    pub by_layer: BTreeMap<Layer, i64>,
    pub by_bucket: BTreeMap<Bucket, i64>,
    pub by_counter: BTreeMap<String, i64>,
    pub sources: BTreeMap<String, &'static str>,
    pub stats: IngestStats,
}

impl Totals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one counter value. Zero is not admitted.
    ///
    /// Fractional values are truncated toward zero before summing. A value
    /// that would overflow any of the four totals is rejected as a whole.
    pub fn add(&mut self, path: &str, value: f64) -> bool {
        if value == 0.0 || !value.is_finite() {
            return false;
        }
        let v = value as i64;
        let bucket = classify::classify(path);

        let sums = (
            self.global.checked_add(v),
            self.layer_total(bucket.layer).checked_add(v),
            self.bucket_total(bucket).checked_add(v),
            self.by_counter.get(path).copied().unwrap_or(0).checked_add(v),
        );
        let (Some(global), Some(layer), Some(bucket_sum), Some(counter)) = sums else {
            warn!("skipping {} = {}: total would overflow", path, v);
            self.stats.overflowed += 1;
            return false;
        };

        self.global = global;
        self.by_layer.insert(bucket.layer, layer);
        self.by_bucket.insert(bucket, bucket_sum);
        self.by_counter.insert(path.to_string(), counter);
        self.sources
            .entry(path.to_string())
            .or_insert_with(|| classify::source_of(path));
        true
    }

    /// Parses one log line and folds its payload in if it is a delta record.
    pub fn ingest_line(&mut self, line: &str) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() {
            return LineOutcome::Blank;
        }
        self.stats.lines += 1;

        let record: DeltaLine = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                debug!("skipping malformed line {}: {}", self.stats.lines, e);
                self.stats.malformed += 1;
                return LineOutcome::Malformed;
            }
        };
        if record.record_type != DELTA_RECORD_TYPE {
            self.stats.other_records += 1;
            return LineOutcome::Ignored;
        }
        let serde_json::Value::Object(payload) = record.payload else {
            debug!("skipping delta record without object payload");
            self.stats.malformed += 1;
            return LineOutcome::Malformed;
        };

        self.stats.delta_records += 1;
        let mut admitted = 0;
        for (path, value) in &payload {
            if let Some(v) = value.as_f64()
                && self.add(path, v)
            {
                admitted += 1;
            }
        }
        LineOutcome::Admitted(admitted)
    }

    /// Sum of the counters in `bucket`.
    pub fn bucket_total(&self, bucket: Bucket) -> i64 {
        self.by_bucket.get(&bucket).copied().unwrap_or(0)
    }

    pub fn layer_total(&self, layer: Layer) -> i64 {
        self.by_layer.get(&layer).copied().unwrap_or(0)
    }

    /// Buckets that received at least one value, restricted to `layer`.
    pub fn buckets_in(&self, layer: Layer) -> impl Iterator<Item = (&Bucket, &i64)> {
        self.by_bucket.iter().filter(move |(b, _)| b.layer == layer)
    }

    /// Counters that belong to `bucket`.
    pub fn counters_in(&self, bucket: Bucket) -> impl Iterator<Item = (&String, &i64)> {
        self.by_counter
            .iter()
            .filter(move |(path, _)| classify::classify(path) == bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_nonzero_numbers_only() {
        let mut t = Totals::new();
        let line = r#"{"record_type":"delta","payload":{"snmp.Udp.InErrors":5,"softnet.dropped":0,"sys_net.carrier":"1","x":null}}"#;
        assert_eq!(t.ingest_line(line), LineOutcome::Admitted(1));
        assert_eq!(t.global, 5);
        assert_eq!(t.by_counter.len(), 1);
    }

    #[test]
    fn test_skips_snapshots_and_garbage() {
        let mut t = Totals::new();
        assert_eq!(t.ingest_line(""), LineOutcome::Blank);
        assert_eq!(t.ingest_line("not json"), LineOutcome::Malformed);
        assert_eq!(t.ingest_line(r#"{"payload":{}}"#), LineOutcome::Malformed);
        assert_eq!(
            t.ingest_line(r#"{"record_type":"alert","payload":{"a":1}}"#),
            LineOutcome::Ignored
        );
        assert_eq!(
            t.ingest_line(r#"{"record_type":"delta","payload":[1,2]}"#),
            LineOutcome::Malformed
        );
        assert_eq!(
            t.ingest_line(r#"{"record_type":"snapshot","payload":{"softnet":{"dropped":4}}}"#),
            LineOutcome::Ignored
        );
        assert_eq!(t.global, 0);
        assert_eq!(
            t.stats,
            IngestStats {
                lines: 5,
                delta_records: 0,
                other_records: 2,
                malformed: 3,
                overflowed: 0,
            }
        );
    }

    #[test]
    fn test_overflowing_value_is_rejected() {
        let mut t = Totals::new();
        let line = r#"{"record_type":"delta","payload":{"sys_net.statistics.rx_bytes":9000000000000000000}}"#;
        assert_eq!(t.ingest_line(line), LineOutcome::Admitted(1));
        assert_eq!(t.ingest_line(line), LineOutcome::Admitted(0));

        assert_eq!(t.global, 9_000_000_000_000_000_000);
        assert_eq!(t.layer_total(Layer::Other), 9_000_000_000_000_000_000);
        assert_eq!(t.by_counter["sys_net.statistics.rx_bytes"], 9_000_000_000_000_000_000);
        assert_eq!(t.stats.overflowed, 1);

        // Overflow in one counter leaves the others untouched.
        assert!(t.add("softnet.dropped", 4.0));
        assert_eq!(t.global, 9_000_000_000_000_000_004);
    }

    #[test]
    fn test_fractional_values_truncate() {
        let mut t = Totals::new();
        t.add("snmp.Ip.FragFails", 2.9);
        t.add("snmp.Ip.FragFails", -1.5);
        assert_eq!(t.by_counter["snmp.Ip.FragFails"], 1);
    }

    #[test]
    fn test_rollups_are_consistent() {
        let mut t = Totals::new();
        for (path, v) in [
            ("sys_net.statistics.rx_crc_errors", 4.0),
            ("sys_net.statistics.rx_dropped", 3.0),
            ("sys_net.statistics.tx_errors", 2.0),
            ("softnet.dropped", 11.0),
            ("snmp.Ip.OutNoRoutes", 1.0),
            ("snmp.Udp.InErrors", 5.0),
            ("snmp.Udp.RcvbufErrors", 5.0),
            ("sys_net.carrier_changes", 1.0),
        ] {
            t.add(path, v);
        }

        assert_eq!(t.by_layer.values().sum::<i64>(), t.global);
        for layer in Layer::ALL {
            let buckets: i64 = t.buckets_in(layer).map(|(_, v)| *v).sum();
            assert_eq!(buckets, t.layer_total(layer), "{layer}");
        }
        for (bucket, total) in &t.by_bucket {
            let counters: i64 = t.counters_in(*bucket).map(|(_, v)| *v).sum();
            assert_eq!(counters, *total, "{bucket:?}");
        }
    }

    #[test]
    fn test_first_source_sticks() {
        let mut t = Totals::new();
        t.add("softnet.dropped", 1.0);
        t.sources.insert("softnet.dropped".into(), "custom");
        t.add("softnet.dropped", 1.0);
        assert_eq!(t.sources["softnet.dropped"], "custom");
    }
}
