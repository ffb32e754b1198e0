//! NDJSON log records written by the agent and read back by the report.

use serde::{Deserialize, Serialize};

use crate::delta::Delta;
use crate::value::Value;

/// Version stamped on every record.
pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Full collected payload, nested.
    Snapshot,
    /// Filtered interval deltas, flat `path -> number`.
    Delta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub interval_sec: f64,
}

/// Identity of the sampling run shared by every record it writes.
#[derive(Clone, Debug)]
pub struct Origin {
    pub host: String,
    pub iface: String,
    pub interval_sec: f64,
}

/// One line of the event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord<P> {
    pub schema_version: String,
    pub record_type: RecordType,
    pub host: String,
    pub iface: String,
    pub ts_unix: f64,
    pub seq: u64,
    pub payload: P,
    pub meta: Meta,
}

impl<P> LogRecord<P> {
    fn new(origin: &Origin, record_type: RecordType, ts_unix: f64, seq: u64, payload: P) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            record_type,
            host: origin.host.clone(),
            iface: origin.iface.clone(),
            ts_unix,
            seq,
            payload,
            meta: Meta {
                interval_sec: origin.interval_sec,
            },
        }
    }
}

impl<'a> LogRecord<&'a Value> {
    pub fn snapshot(origin: &Origin, ts_unix: f64, seq: u64, payload: &'a Value) -> Self {
        Self::new(origin, RecordType::Snapshot, ts_unix, seq, payload)
    }
}

impl<'a> LogRecord<&'a Delta> {
    pub fn delta(origin: &Origin, ts_unix: f64, seq: u64, payload: &'a Delta) -> Self {
        Self::new(origin, RecordType::Delta, ts_unix, seq, payload)
    }
}
