//! One sampling tick: collect, diff, persist.

use thiserror::Error;
use tracing::debug;

use crate::collector::{CollectError, FileSystem, NetCollector, counter_tree};
use crate::delta::{Delta, DeltaEngine};
use crate::record::{LogRecord, Origin};
use crate::sink::{JsonSink, SinkError};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("collect failed: {0}")]
    Collect(#[from] CollectError),
    #[error("write failed: {0}")]
    Sink(#[from] SinkError),
}

/// What one tick wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub snapshot_seq: u64,
    /// `None` when nothing changed (or on the priming tick).
    pub delta_seq: Option<u64>,
    pub delta_entries: usize,
}

/// Keeps only entries worth persisting: numeric and nonzero.
pub fn persistable(delta: Delta) -> Delta {
    delta
        .into_iter()
        .filter(|(_, v)| v.is_nonzero_number())
        .collect()
}

/// Sampling pipeline for one interface.
pub struct Agent<F: FileSystem> {
    collector: NetCollector<F>,
    engine: DeltaEngine,
    sink: JsonSink,
    origin: Origin,
    seq: u64,
}

impl<F: FileSystem> Agent<F> {
    pub fn new(
        collector: NetCollector<F>,
        sink: JsonSink,
        host: impl Into<String>,
        interval_sec: f64,
    ) -> Self {
        let origin = Origin {
            host: host.into(),
            iface: collector.iface().to_string(),
            interval_sec,
        };
        Self {
            collector,
            engine: DeltaEngine::new(),
            sink,
            origin,
            seq: 0,
        }
    }

    /// Sequence number of the last record written.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn sink(&self) -> &JsonSink {
        &self.sink
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Samples once at `ts_unix`.
    ///
    /// Always writes a snapshot record; writes a delta record only when at
    /// least one counter moved. A collect failure writes nothing and leaves
    /// the delta baseline untouched.
    pub fn tick(&mut self, ts_unix: f64) -> Result<TickSummary, AgentError> {
        let snapshot = self.collector.collect()?;
        let delta = persistable(self.engine.update(counter_tree(&snapshot)));

        let snapshot_seq = self.next_seq();
        let record = LogRecord::snapshot(&self.origin, ts_unix, snapshot_seq, &snapshot);
        self.sink.write(&record)?;

        let delta_seq = if delta.is_empty() {
            None
        } else {
            let seq = self.next_seq();
            self.sink
                .write(&LogRecord::delta(&self.origin, ts_unix, seq, &delta))?;
            Some(seq)
        };

        debug!("tick seq={} delta_entries={}", snapshot_seq, delta.len());
        Ok(TickSummary {
            snapshot_seq,
            delta_seq,
            delta_entries: delta.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::record::RecordType;
    use crate::report::{Analysis, analyze_file};
    use crate::value::Value;
    use tempfile::TempDir;

    fn read_records(sink: &JsonSink) -> Vec<LogRecord<serde_json::Value>> {
        std::fs::read_to_string(sink.path())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_persistable_drops_zero_and_text() {
        let mut d = Delta::new();
        d.insert("a".into(), Value::Integer(0));
        d.insert("b".into(), Value::Integer(4));
        d.insert("c".into(), Value::Text("down".into()));
        d.insert("d".into(), Value::Float(-0.5));
        let kept = persistable(d);
        assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["b", "d"]);
    }

    #[test]
    fn test_ticks_write_snapshot_then_delta() {
        let dir = TempDir::new().unwrap();
        let sink = JsonSink::new(dir.path().join("events.ndjson")).unwrap();

        let mut fs = MockFs::typical_host("eth0");
        let collector = NetCollector::new(fs.clone(), "eth0");
        let mut agent = Agent::new(collector, sink.clone(), "node1", 1.0);

        // Priming tick: snapshot only.
        let first = agent.tick(100.0).unwrap();
        assert_eq!(
            first,
            TickSummary {
                snapshot_seq: 1,
                delta_seq: None,
                delta_entries: 0
            }
        );

        // Nothing moved: snapshot only.
        let idle = agent.tick(101.0).unwrap();
        assert_eq!(idle.snapshot_seq, 2);
        assert_eq!(idle.delta_seq, None);

        // rx_dropped 120 -> 150 and rx_crc_errors reset 2 -> 1.
        fs.set_statistic("eth0", "rx_dropped", 150);
        fs.set_statistic("eth0", "rx_crc_errors", 1);
        agent.collector = NetCollector::new(fs, "eth0");
        let busy = agent.tick(102.0).unwrap();
        assert_eq!(busy.snapshot_seq, 3);
        assert_eq!(busy.delta_seq, Some(4));
        assert_eq!(busy.delta_entries, 2);
        assert_eq!(agent.seq(), 4);

        let records = read_records(&sink);
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].record_type, RecordType::Delta);
        assert_eq!(records[3].host, "node1");
        assert_eq!(records[3].iface, "eth0");
        assert_eq!(records[3].payload["sys_net.statistics.rx_dropped"], 30);
        assert_eq!(records[3].payload["sys_net.statistics.rx_crc_errors"], 1);
        assert_eq!(records[0].payload["softnet"]["dropped"], 5);

        let Analysis::Report(report) = analyze_file(sink.path()).unwrap() else {
            panic!("expected a report");
        };
        assert_eq!(report.total, 31);
    }

    #[test]
    fn test_collect_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let sink = JsonSink::new(dir.path().join("events.ndjson")).unwrap();
        let collector = NetCollector::new(MockFs::new(), "eth0");
        let mut agent = Agent::new(collector, sink.clone(), "node1", 1.0);

        assert!(matches!(agent.tick(1.0), Err(AgentError::Collect(_))));
        assert_eq!(agent.seq(), 0);
        assert!(!sink.path().exists());
    }
}
