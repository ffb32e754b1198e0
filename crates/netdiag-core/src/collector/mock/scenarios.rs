//! Canned host layouts for collector and agent tests.

use super::filesystem::MockFs;

/// `/proc/net/snmp` of a quiet host with a few UDP buffer drops.
pub const SNMP_TYPICAL: &str = "\
Ip: Forwarding DefaultTTL InReceives InHdrErrors InAddrErrors ForwDatagrams InUnknownProtos InDiscards InDelivers OutRequests OutDiscards OutNoRoutes ReasmTimeout ReasmReqds ReasmOKs ReasmFails FragOKs FragFails FragCreates
Ip: 1 64 2510734 0 0 0 0 0 2510560 2320985 40 1 0 0 0 0 0 0 0
Icmp: InMsgs InErrors InCsumErrors InDestUnreachs
Icmp: 120 3 0 118
Tcp: RtoAlgorithm RtoMin RtoMax MaxConn ActiveOpens PassiveOpens AttemptFails EstabResets CurrEstab InSegs OutSegs RetransSegs InErrs OutRsts InCsumErrors
Tcp: 1 200 120000 -1 5000 300 12 40 25 2300000 2100000 800 0 150 0
Udp: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors SndbufErrors InCsumErrors IgnoredMulti MemErrors
Udp: 200000 4 17 198000 17 0 0 30 0
UdpLite: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors SndbufErrors InCsumErrors IgnoredMulti MemErrors
UdpLite: 0 0 0 0 0 0 0 0 0
";

/// Two CPUs: 3 + 2 drops, 2 squeezes in total.
pub const SOFTNET_TYPICAL: &str = "\
0003a2f1 00000003 00000001 00000000 00000000 00000000 00000000 00000000 00000000 00000000 00000000 00000000 00000000
0001b7e4 00000002 00000001 00000000 00000000 00000000 00000000 00000000 00000000 00000000 00000000 00000000 00000001
";

impl MockFs {
    /// A host with one interface `iface`, link up, a handful of errors.
    pub fn typical_host(iface: &str) -> Self {
        let mut fs = Self::new();
        let dir = format!("/sys/class/net/{iface}");

        fs.add_file(format!("{dir}/carrier"), "1\n");
        fs.add_file(format!("{dir}/carrier_changes"), "3\n");
        for (name, value) in [
            ("rx_bytes", 987654321),
            ("tx_bytes", 123456789),
            ("rx_packets", 2510000),
            ("tx_packets", 2320000),
            ("rx_dropped", 120),
            ("rx_crc_errors", 2),
            ("rx_missed_errors", 0),
            ("collisions", 0),
            ("tx_errors", 0),
            ("tx_carrier_errors", 0),
            ("tx_window_errors", 0),
        ] {
            fs.add_file(format!("{dir}/statistics/{name}"), format!("{value}\n"));
        }

        fs.add_file("/proc/net/snmp", SNMP_TYPICAL);
        fs.add_file("/proc/net/softnet_stat", SOFTNET_TYPICAL);
        fs
    }

    /// Sets one interface statistic, e.g. to simulate traffic between ticks.
    pub fn set_statistic(&mut self, iface: &str, name: &str, value: i64) {
        self.add_file(
            format!("/sys/class/net/{iface}/statistics/{name}"),
            format!("{value}\n"),
        );
    }
}
