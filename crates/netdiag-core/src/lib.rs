//! netdiag-core - shared library for the netdiag tools.
//!
//! Provides:
//! - `value` - nested snapshot tree (integer, float, text, map)
//! - `delta` - stateful snapshot differ with counter-reset handling
//! - `classify` - layer/component taxonomy for counter paths
//! - `report` - log aggregation and layered share report
//! - `collector` - sysfs/procfs readers producing snapshots
//! - `record`, `sink` - NDJSON event log records and writer
//! - `agent` - one sampling tick wiring collector, differ and sink
//! - `config` - agent configuration (YAML + environment)
//! - `fmt` - shared formatting helpers

pub mod agent;
pub mod classify;
pub mod collector;
pub mod config;
pub mod delta;
pub mod fmt;
pub mod record;
pub mod report;
pub mod sink;
pub mod value;

pub use delta::{Delta, DeltaEngine};
pub use value::Value;
