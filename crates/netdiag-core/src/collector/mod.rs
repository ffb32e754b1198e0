//! Snapshot source: network counters from sysfs and procfs.
//!
//! ```text
//!  NetCollector ── /sys/class/net/<iface>/{carrier,carrier_changes,statistics/*}
//!       │       ── /proc/net/snmp         (Ip, Udp)
//!       │       ── /proc/net/softnet_stat (per-CPU drops)
//!       ▼
//!   FileSystem (trait)
//!       ├── RealFs  (production)
//!       └── MockFs  (tests, typical_host fixture)
//! ```
//!
//! ```
//! use netdiag_core::collector::{MockFs, NetCollector, counter_tree};
//!
//! let collector = NetCollector::new(MockFs::typical_host("eth0"), "eth0");
//! let snapshot = collector.collect().unwrap();
//! let counters = counter_tree(&snapshot);
//! assert!(counters.get("softnet").is_some());
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod parser;
pub mod traits;

pub use collector::{CollectError, NetCollector, SNMP_COUNTERS, counter_tree};
pub use mock::MockFs;
pub use parser::ParseError;
pub use traits::{FileSystem, RealFs};
