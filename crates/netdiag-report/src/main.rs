//! netdiag-report - summarize an NDJSON event log by network layer.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{Level, error};
use tracing_subscriber::EnvFilter;

use netdiag_core::report::{Analysis, analyze_file};

const USAGE: &str = "Usage: netdiag-report /path/to/events.ndjson";

#[derive(Parser)]
#[command(
    name = "netdiag-report",
    about = "Attribute counted errors and drops to network layers"
)]
struct Cli {
    /// Path to the NDJSON event log
    path: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["netdiag_report", "netdiag_core"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn render(analysis: &Analysis, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string_pretty(analysis).map(|s| s + "\n")
    } else {
        Ok(analysis.to_string())
    }
}

/// Runs one invocation, writing the report to `out` and diagnostics to
/// `err`. Returns the process exit code.
fn run(cli: &Cli, out: &mut impl Write, err: &mut impl Write) -> i32 {
    let Some(path) = cli.path.as_deref() else {
        let _ = writeln!(err, "{USAGE}");
        return 1;
    };

    let analysis = match analyze_file(path) {
        Ok(a) => a,
        Err(e) => {
            error!("{}", e);
            let _ = writeln!(err, "Error: {e}");
            return 1;
        }
    };

    match render(&analysis, cli.json) {
        Ok(text) => match out.write_all(text.as_bytes()) {
            Ok(()) => 0,
            Err(e) => {
                let _ = writeln!(err, "Error: cannot write report: {e}");
                1
            }
        },
        Err(e) => {
            let _ = writeln!(err, "Error: cannot encode report: {e}");
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = run(&cli, &mut io::stdout().lock(), &mut io::stderr());
    process::exit(code);
}
