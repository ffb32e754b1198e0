//! Offline analysis of an event log.
//!
//! The report scans every `delta` record of a log, attributes each nonzero
//! counter to a network-stack layer and component (see [`crate::classify`]),
//! and renders shares at three levels: layer, component, counter.
//!
//! ```
//! use netdiag_core::report::{Analysis, analyze};
//!
//! let log = [
//!     r#"{"record_type":"delta","payload":{"snmp.Udp.InErrors":5,"sys_net.eth0.rx_dropped":3}}"#,
//!     r#"{"record_type":"delta","payload":{"snmp.Udp.InErrors":5,"sys_net.eth0.rx_dropped":3}}"#,
//! ];
//! let Analysis::Report(report) = analyze(log) else { panic!("expected data") };
//! assert_eq!(report.total, 16);
//! ```

mod render;
mod totals;

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

pub use render::{
    ComponentDetail, CounterDetail, LayerDetail, LayerShare, NO_DATA_MESSAGE, Report,
};
pub use totals::{IngestStats, LineOutcome, Totals};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of one analysis run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Analysis {
    NoData,
    Report(Report),
}

impl Analysis {
    pub fn from_totals(totals: &Totals) -> Self {
        match Report::build(totals) {
            Some(r) => Analysis::Report(r),
            None => Analysis::NoData,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Analysis::NoData)
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analysis::NoData => writeln!(f, "{NO_DATA_MESSAGE}"),
            Analysis::Report(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// Analyzes an in-memory sequence of log lines.
pub fn analyze<I, S>(lines: I) -> Analysis
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut totals = Totals::new();
    for line in lines {
        ingest(&mut totals, line.as_ref());
    }
    Analysis::from_totals(&totals)
}

fn ingest(totals: &mut Totals, line: &str) {
    match totals.ingest_line(line) {
        LineOutcome::Admitted(n) => trace!(
            "delta record #{}: {} values admitted",
            totals.stats.delta_records, n
        ),
        LineOutcome::Ignored => trace!("line {}: not a delta record", totals.stats.lines),
        LineOutcome::Blank | LineOutcome::Malformed => {}
    }
}

/// Folds every line of `reader` into `totals`.
///
/// Lines that are not valid UTF-8 count as malformed rather than aborting.
pub fn ingest_reader<R: BufRead>(totals: &mut Totals, reader: R) -> std::io::Result<()> {
    for raw in reader.split(b'\n') {
        let raw = raw?;
        match std::str::from_utf8(&raw) {
            Ok(line) => ingest(totals, line),
            Err(e) => {
                debug!("skipping non-UTF-8 line: {}", e);
                totals.stats.lines += 1;
                totals.stats.malformed += 1;
            }
        }
    }
    Ok(())
}

/// Reads and analyzes the log at `path`.
pub fn analyze_file(path: &Path) -> Result<Analysis, ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;

    let mut totals = Totals::new();
    ingest_reader(&mut totals, BufReader::new(file)).map_err(io_err)?;
    debug!(
        "ingested {} lines: {} delta records, {} other, {} malformed",
        totals.stats.lines,
        totals.stats.delta_records,
        totals.stats.other_records,
        totals.stats.malformed
    );
    Ok(Analysis::from_totals(&totals))
}
