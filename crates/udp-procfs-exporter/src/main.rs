//! udp-procfs-exporter - UDP socket buffer exporter for a single process.
//!
//! Resolves a process by name once at startup, then samples its
//! `/proc/[pid]/net/udp` and `/proc/[pid]/net/udp6` tables on a fixed
//! interval and serves queued/dropped metrics for Prometheus.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod server;

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use udp_procfs_core::collector::{ProcessLocator, RealFs, SocketTableReader};
use udp_procfs_core::metrics::PrometheusSink;
use udp_procfs_core::sampler::SamplingLoop;

/// Exports UDP buffer queue and drop metrics of one process.
#[derive(Parser, Debug)]
#[command(
    name = "udp-procfs-exporter",
    about = "Exports UDP buffer queue and drop metrics of one process",
    version = udp_procfs_core::VERSION
)]
struct Args {
    /// Registered name of the process to watch (the `Name:` line of /proc/[pid]/status).
    process_name: String,

    /// Listen address for the metrics endpoint.
    #[arg(long, default_value = "0.0.0.0:8125", env = "UDP_PROCFS_LISTEN")]
    listen: SocketAddr,

    /// HTTP path serving the metrics.
    #[arg(
        long,
        default_value = "/metrics",
        env = "UDP_PROCFS_METRICS_PATH",
        value_parser = parse_metrics_path
    )]
    metrics_path: String,

    /// Sampling interval in seconds.
    #[arg(
        short,
        long,
        default_value = "10",
        env = "UDP_PROCFS_INTERVAL",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Path to /proc filesystem.
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Validates the metrics path; it is routed literally, so axum's capture
/// and wildcard syntax is not allowed.
fn parse_metrics_path(s: &str) -> Result<String, String> {
    if !s.starts_with('/') {
        return Err(format!("metrics path '{}' must start with '/'", s));
    }
    if let Some(c) = s.chars().find(|c| matches!(c, '{' | '}' | '*')) {
        return Err(format!("metrics path '{}' must not contain '{}'", s, c));
    }
    Ok(s.to_string())
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
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
    for target in ["udp_procfs_exporter", "udp_procfs_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    if !cfg!(target_os = "linux") {
        error!("ProcFS is only supported on linux!");
        process::exit(1);
    }

    info!("udp-procfs-exporter {} starting", udp_procfs_core::VERSION);
    info!(
        "Config: process={}, interval={}s, listen={}, path={}, proc={}",
        args.process_name, args.interval, args.listen, args.metrics_path, args.proc_path
    );

    let locator = ProcessLocator::new(RealFs::new(), &args.proc_path);
    let identity = match locator.locate(&args.process_name) {
        Ok(identity) => identity,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    info!("UDP Procfs Exporter started, watching PID {}", identity.pid);

    let sink = match PrometheusSink::new() {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            error!("Failed to register metrics: {}", e);
            process::exit(1);
        }
    };

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let shutdown = Arc::new(Notify::new());
    {
        let running = running.clone();
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::SeqCst);
            shutdown.notify_one();
        }) {
            warn!("Failed to set Ctrl-C handler: {}", e);
        }
    }

    let sampler = {
        let reader = SocketTableReader::new(RealFs::new(), args.proc_path.clone());
        let mut sampling_loop = SamplingLoop::new(
            reader,
            identity,
            sink.clone(),
            Duration::from_secs(args.interval),
        );
        let running = running.clone();
        thread::Builder::new()
            .name("sampler".to_string())
            .spawn(move || sampling_loop.run(&running))
    };
    let sampler = match sampler {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start sampling thread: {}", e);
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to build tokio runtime: {}", e);
            process::exit(1);
        }
    };

    let served = runtime.block_on(server::serve(
        args.listen,
        &args.metrics_path,
        sink,
        shutdown,
    ));
    if let Err(e) = served {
        error!("Metrics server failed on {}: {}", args.listen, e);
        process::exit(1);
    }

    info!("Shutting down...");
    running.store(false, Ordering::SeqCst);
    if sampler.join().is_err() {
        error!("Sampling thread panicked");
        process::exit(1);
    }
}
