//! Composes the per-source readers into one snapshot tree.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::parser::{self, ParseError};
use super::traits::FileSystem;
use crate::value::{Value, ValueMap};

/// `/proc/net/snmp` counters worth keeping, per section.
pub const SNMP_COUNTERS: &[(&str, &[&str])] = &[
    ("Ip", &["OutNoRoutes", "FragFails", "ReasmFails"]),
    (
        "Udp",
        &[
            "InErrors",
            "InCsumErrors",
            "RcvbufErrors",
            "SndbufErrors",
            "NoPorts",
        ],
    ),
];

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse { path: PathBuf, source: ParseError },
}

/// Reads interface, IP/UDP and softnet counters for one interface.
pub struct NetCollector<F: FileSystem> {
    fs: F,
    iface: String,
    sys_path: PathBuf,
    proc_path: PathBuf,
}

impl<F: FileSystem> NetCollector<F> {
    /// Creates a collector reading from `/sys` and `/proc`.
    pub fn new(fs: F, iface: impl Into<String>) -> Self {
        Self {
            fs,
            iface: iface.into(),
            sys_path: PathBuf::from("/sys"),
            proc_path: PathBuf::from("/proc"),
        }
    }

    /// Overrides the sysfs mount point.
    pub fn with_sys_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sys_path = path.into();
        self
    }

    /// Overrides the procfs mount point.
    pub fn with_proc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proc_path = path.into();
        self
    }

    pub fn iface(&self) -> &str {
        &self.iface
    }

    fn iface_dir(&self) -> PathBuf {
        self.sys_path.join("class/net").join(&self.iface)
    }

    /// Collects the full snapshot payload: `{sys_net, snmp, softnet}`.
    pub fn collect(&self) -> Result<Value, CollectError> {
        let mut root = ValueMap::new();
        root.insert("sys_net".into(), self.read_sys_net());
        root.insert("snmp".into(), self.read_snmp()?);
        root.insert("softnet".into(), self.read_softnet()?);
        Ok(Value::Map(root))
    }

    /// Interface link state and statistics from `/sys/class/net/<iface>`.
    ///
    /// Never fails: a missing interface yields `carrier = "unknown"` and
    /// empty statistics.
    pub fn read_sys_net(&self) -> Value {
        let dir = self.iface_dir();
        let carrier_path = dir.join("carrier");
        let changes_path = dir.join("carrier_changes");
        let stats_dir = dir.join("statistics");

        let mut out = ValueMap::new();
        out.insert(
            "_source".into(),
            format!("{}, {}", carrier_path.display(), stats_dir.display()).into(),
        );

        let carrier = self
            .fs
            .read_to_string(&carrier_path)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        out.insert("carrier".into(), carrier.into());

        if let Ok(content) = self.fs.read_to_string(&changes_path) {
            match parser::parse_counter(&content) {
                Ok(v) => {
                    out.insert("carrier_changes".into(), v.into());
                }
                Err(e) => debug!("{}: {}", changes_path.display(), e),
            }
        }

        out.insert("statistics".into(), Value::Map(self.read_statistics(&stats_dir)));
        Value::Map(out)
    }

    fn read_statistics(&self, stats_dir: &Path) -> ValueMap {
        let mut stats = ValueMap::new();
        let Ok(entries) = self.fs.read_dir(stats_dir) else {
            debug!("{} not readable, no interface statistics", stats_dir.display());
            return stats;
        };
        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Ok(content) = self.fs.read_to_string(&path) else {
                continue;
            };
            if let Ok(v) = parser::parse_counter(&content) {
                stats.insert(name.to_string(), v.into());
            }
        }
        stats
    }

    /// Selected IP and UDP counters from `/proc/net/snmp`.
    pub fn read_snmp(&self) -> Result<Value, CollectError> {
        let path = self.proc_path.join("net/snmp");
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|source| CollectError::Io {
                path: path.clone(),
                source,
            })?;

        let mut out: ValueMap = parser::parse_net_snmp(&content, SNMP_COUNTERS)
            .into_iter()
            .map(|(section, counters)| {
                let counters: Value = counters.into_iter().collect();
                (section, counters)
            })
            .collect();
        out.insert("_source".into(), path.display().to_string().into());
        Ok(Value::Map(out))
    }

    /// Backlog drops and budget squeezes summed over CPUs.
    ///
    /// A missing file reads as zero; unparsable content is an error.
    pub fn read_softnet(&self) -> Result<Value, CollectError> {
        let path = self.proc_path.join("net/softnet_stat");
        let totals = match self.fs.read_to_string(&path) {
            Ok(content) => parser::parse_softnet_stat(&content).map_err(|source| {
                CollectError::Parse {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) => {
                debug!("{}: {}, assuming zero drops", path.display(), e);
                parser::SoftnetTotals::default()
            }
        };

        let mut out = ValueMap::new();
        out.insert("_source".into(), path.display().to_string().into());
        out.insert("dropped".into(), totals.dropped.into());
        out.insert("time_squeeze".into(), totals.time_squeeze.into());
        Ok(Value::Map(out))
    }
}

/// Extracts the counters the delta engine tracks from a full snapshot.
///
/// Text fields (`_source`, `carrier`) are left out; absent branches are
/// replaced by empty maps, and a missing softnet drop count by zero, so the
/// tree keeps the same shape from tick to tick.
pub fn counter_tree(snapshot: &Value) -> Value {
    let empty = Value::empty_map;
    let branch = |name: &str| snapshot.get(name).cloned().unwrap_or_else(empty);

    let sys_net = branch("sys_net");
    let snmp = branch("snmp");
    let softnet = branch("softnet");

    [
        (
            "sys_net",
            [
                ("carrier_changes", sys_net.get_or("carrier_changes", empty())),
                ("statistics", sys_net.get_or("statistics", empty())),
            ]
            .into_iter()
            .collect::<Value>(),
        ),
        (
            "snmp",
            [
                ("Ip", snmp.get_or("Ip", empty())),
                ("Udp", snmp.get_or("Udp", empty())),
            ]
            .into_iter()
            .collect(),
        ),
        (
            "softnet",
            [("dropped", softnet.get_or("dropped", Value::Integer(0)))]
                .into_iter()
                .collect(),
        ),
    ]
    .into_iter()
    .collect()
}
