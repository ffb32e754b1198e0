//! netdiagd - network counter sampling daemon.
//!
//! Samples interface, IP/UDP and softnet counters at a fixed interval and
//! appends snapshot and delta records to an NDJSON event log.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use netdiag_core::agent::Agent;
use netdiag_core::collector::{NetCollector, RealFs};
use netdiag_core::config::AgentConfig;
use netdiag_core::fmt::now_unix;
use netdiag_core::sink::JsonSink;

/// Network counter sampling daemon.
#[derive(Parser)]
#[command(name = "netdiagd", about = "Network counter sampling daemon", version)]
struct Args {
    /// YAML configuration file. Missing file means defaults.
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Interface to sample (overrides config and NETDIAG_IFACE).
    #[arg(long)]
    iface: Option<String>,

    /// Sampling interval in seconds (overrides config and NETDIAG_POLL_INTERVAL).
    #[arg(short, long)]
    interval: Option<f64>,

    /// Event log path (overrides config and NETDIAG_OUTPUT_PATH).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to sysfs (for testing/mocking).
    #[arg(long, default_value = "/sys")]
    sys_path: PathBuf,

    /// Path to procfs (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: PathBuf,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber. Logs go to stderr.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["netdiagd", "netdiag_core"] {
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

/// Machine hostname via the `hostname` command.
fn get_hostname() -> String {
    process::Command::new("hostname")
        .output()
        .ok()
        .and_then(|out| {
            if out.status.success() {
                String::from_utf8(out.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// File config, then environment, then command line. Returns the validated
/// config and its sampling interval.
fn resolve_config(args: &Args) -> Result<(AgentConfig, Duration), String> {
    let mut cfg = AgentConfig::load(&args.config).map_err(|e| e.to_string())?;
    cfg.apply_process_env();
    if let Some(ref iface) = args.iface {
        cfg.iface = iface.clone();
    }
    if let Some(interval) = args.interval {
        cfg.poll_interval_sec = interval;
    }
    if let Some(ref output) = args.output {
        cfg.output.path = output.clone();
    }
    cfg.validate().map_err(|e| e.to_string())?;
    let interval = cfg.poll_interval().map_err(|e| e.to_string())?;
    Ok((cfg, interval))
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let (cfg, interval) = match resolve_config(&args) {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    info!("netdiagd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: iface={}, interval={}s, output={}",
        cfg.iface,
        cfg.poll_interval_sec,
        cfg.output.path.display()
    );

    let sink = match JsonSink::new(&cfg.output.path) {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let collector = NetCollector::new(RealFs::new(), &cfg.iface)
        .with_sys_path(&args.sys_path)
        .with_proc_path(&args.proc_path);
    let mut agent = Agent::new(collector, sink, get_hostname(), cfg.poll_interval_sec);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting sampling loop");
    let mut ticks: u64 = 0;
    let mut deltas: u64 = 0;

    while running.load(Ordering::SeqCst) {
        match agent.tick(now_unix()) {
            Ok(summary) => {
                ticks += 1;
                if let Some(seq) = summary.delta_seq {
                    deltas += 1;
                    debug!(
                        "Delta #{} (seq {}): {} counters changed",
                        deltas, seq, summary.delta_entries
                    );
                }
                // Heartbeat every 600 ticks (~10 minutes at 1s)
                if ticks.is_multiple_of(600) {
                    info!(
                        "Sampled {} ticks, {} with changes, last seq {}",
                        ticks,
                        deltas,
                        agent.seq()
                    );
                }
            }
            Err(e) => {
                error!("Tick failed: {}", e);
            }
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!(
        "Shutdown complete: {} ticks, {} delta records, log {}",
        ticks,
        deltas,
        agent.sink().path().display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_overrides_config() {
        let args = Args::parse_from([
            "netdiagd",
            "--config",
            "/nonexistent/netdiag/config.yml",
            "--iface",
            "enp1s0",
            "-i",
            "5",
            "-o",
            "/tmp/netdiag.ndjson",
        ]);
        let (cfg, interval) = resolve_config(&args).unwrap();
        assert_eq!(interval, Duration::from_secs(5));
        assert_eq!(cfg.iface, "enp1s0");
        assert_eq!(cfg.poll_interval_sec, 5.0);
        assert_eq!(cfg.output.path, PathBuf::from("/tmp/netdiag.ndjson"));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let args = Args::parse_from([
            "netdiagd",
            "--config",
            "/nonexistent/netdiag/config.yml",
            "--interval",
            "0",
        ]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_huge_interval_is_rejected() {
        let args = Args::parse_from([
            "netdiagd",
            "--config",
            "/nonexistent/netdiag/config.yml",
            "--interval",
            "1e300",
        ]);
        let err = resolve_config(&args).unwrap_err();
        assert!(err.contains("out of range"), "{err}");
    }
}
