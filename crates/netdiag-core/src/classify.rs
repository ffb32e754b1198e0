//! Counter taxonomy: which network-stack tier a metric path belongs to.
//!
//! Classification is an ordered rule table evaluated first-match-wins.
//! Keeping the rules as data makes the priority explicit: a `sys_net`
//! counter ending in `.rx_crc_errors` is a physical-layer signal problem
//! even though it would also satisfy looser data-link patterns.

use std::fmt;

use serde::{Serialize, Serializer};

/// Network-stack tier, in canonical report order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Physical,
    DataLink,
    Network,
    Udp,
    Other,
}

impl Layer {
    /// All layers in canonical order.
    pub const ALL: [Layer; 5] = [
        Layer::Physical,
        Layer::DataLink,
        Layer::Network,
        Layer::Udp,
        Layer::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Physical => "L1:Physical",
            Layer::DataLink => "L2:DataLink",
            Layer::Network => "L3:Network",
            Layer::Udp => "L4:UDP",
            Layer::Other => "Other",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Layer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A (layer, component) pair. Component names are scoped to their layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Bucket {
    pub layer: Layer,
    pub component: &'static str,
}

impl Bucket {
    pub const fn new(layer: Layer, component: &'static str) -> Self {
        Self { layer, component }
    }
}

pub const OTHER: Bucket = Bucket::new(Layer::Other, "Other");

/// Test applied to a path after its prefix has matched.
#[derive(Clone, Copy, Debug)]
pub enum Matcher {
    /// Any path under the prefix.
    Any,
    EndsWith(&'static str),
    ContainsAny(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::EndsWith(suffix) => path.ends_with(suffix),
            Matcher::ContainsAny(needles) => needles.iter().any(|n| path.contains(n)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub prefix: &'static str,
    pub matcher: Matcher,
    pub bucket: Bucket,
}

impl Rule {
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(self.prefix) && self.matcher.matches(path)
    }
}

/// Classification rules in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        prefix: "sys_net.",
        matcher: Matcher::EndsWith(".rx_crc_errors"),
        bucket: Bucket::new(Layer::Physical, "CRC/Signal"),
    },
    Rule {
        prefix: "sys_net.",
        matcher: Matcher::ContainsAny(&[
            ".rx_dropped",
            ".rx_missed_errors",
            ".collisions",
            ".tx_errors",
            ".tx_carrier_errors",
            ".tx_window_errors",
        ]),
        bucket: Bucket::new(Layer::DataLink, "NIC/MAC"),
    },
    Rule {
        prefix: "softnet.",
        matcher: Matcher::Any,
        bucket: Bucket::new(Layer::DataLink, "KernelPath"),
    },
    Rule {
        prefix: "snmp.Ip.",
        matcher: Matcher::ContainsAny(&["OutNoRoutes", "FragFails", "ReasmFails"]),
        bucket: Bucket::new(Layer::Network, "IP"),
    },
    Rule {
        prefix: "snmp.Udp.",
        matcher: Matcher::ContainsAny(&[
            "InErrors",
            "InCsumErrors",
            "RcvbufErrors",
            "SndbufErrors",
            "NoPorts",
        ]),
        bucket: Bucket::new(Layer::Udp, "UDP"),
    },
];

/// Maps a metric path to its bucket using [`RULES`].
pub fn classify(path: &str) -> Bucket {
    classify_with(RULES, path)
}

/// Maps a metric path using a caller-supplied rule table.
pub fn classify_with(rules: &[Rule], path: &str) -> Bucket {
    rules
        .iter()
        .find(|r| r.matches(path))
        .map(|r| r.bucket)
        .unwrap_or(OTHER)
}

/// Where a counter was read from, for display only.
pub fn source_of(path: &str) -> &'static str {
    if path.starts_with("sys_net.") {
        if path.ends_with(".carrier") {
            return "/sys/class/net/<iface>/*";
        }
        return "/sys/class/net/<iface>/statistics/*";
    }
    if path.starts_with("snmp.") {
        return "/proc/net/snmp";
    }
    if path.starts_with("softnet.") {
        return "/proc/net/softnet_stat";
    }
    "(unknown)"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_wins_over_datalink() {
        let b = classify("sys_net.statistics.rx_crc_errors");
        assert_eq!(b, Bucket::new(Layer::Physical, "CRC/Signal"));
    }

    #[test]
    fn test_nic_mac_counters() {
        for path in [
            "sys_net.statistics.rx_dropped",
            "sys_net.statistics.rx_missed_errors",
            "sys_net.statistics.collisions",
            "sys_net.statistics.tx_errors",
            "sys_net.statistics.tx_carrier_errors",
            "sys_net.eth0.tx_window_errors",
        ] {
            assert_eq!(classify(path), Bucket::new(Layer::DataLink, "NIC/MAC"), "{path}");
        }
    }

    #[test]
    fn test_softnet_is_kernel_path() {
        assert_eq!(
            classify("softnet.dropped"),
            Bucket::new(Layer::DataLink, "KernelPath")
        );
    }

    #[test]
    fn test_snmp_ip_and_udp() {
        assert_eq!(classify("snmp.Ip.FragFails"), Bucket::new(Layer::Network, "IP"));
        assert_eq!(classify("snmp.Udp.RcvbufErrors"), Bucket::new(Layer::Udp, "UDP"));
        assert_eq!(classify("snmp.Udp.NoPorts"), Bucket::new(Layer::Udp, "UDP"));
    }

    #[test]
    fn test_unmatched_paths_fall_through_to_other() {
        assert_eq!(classify("snmp.Ip.InReceives"), OTHER);
        assert_eq!(classify("snmp.Udp.InDatagrams"), OTHER);
        assert_eq!(classify("sys_net.statistics.rx_bytes"), OTHER);
        assert_eq!(classify("sys_net.carrier_changes"), OTHER);
        // Prefix must match exactly, not just the needle.
        assert_eq!(classify("snmp.Ip.Udp.InErrors"), OTHER);
        assert_eq!(classify(""), OTHER);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let path = "sys_net.statistics.tx_errors";
        assert_eq!(classify(path), classify(path));
    }

    #[test]
    fn test_custom_rule_table() {
        const TCP: &[Rule] = &[Rule {
            prefix: "snmp.Tcp.",
            matcher: Matcher::Any,
            bucket: Bucket::new(Layer::Other, "TCP"),
        }];
        assert_eq!(classify_with(TCP, "snmp.Tcp.RetransSegs").component, "TCP");
        assert_eq!(classify_with(TCP, "softnet.dropped"), OTHER);
    }

    #[test]
    fn test_canonical_layer_order() {
        let mut layers = Layer::ALL.to_vec();
        layers.sort();
        assert_eq!(layers, Layer::ALL.to_vec());
        assert_eq!(Layer::Udp.to_string(), "L4:UDP");
    }

    #[test]
    fn test_sources() {
        assert_eq!(source_of("sys_net.carrier"), "/sys/class/net/<iface>/*");
        assert_eq!(
            source_of("sys_net.statistics.rx_dropped"),
            "/sys/class/net/<iface>/statistics/*"
        );
        assert_eq!(source_of("snmp.Udp.InErrors"), "/proc/net/snmp");
        assert_eq!(source_of("softnet.dropped"), "/proc/net/softnet_stat");
        assert_eq!(source_of("tcp.x"), "(unknown)");
    }
}
