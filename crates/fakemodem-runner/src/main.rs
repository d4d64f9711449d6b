//! Modem emulator binary.
//!
//! # Usage
//!
//! ```bash
//! # Serve one session at a time on TCP port 7000
//! fakemodem tcp --bind 127.0.0.1:7000
//!
//! # Use one end of a virtual serial pair, with a custom command table
//! fakemodem --config modem.yaml device --path /dev/pts/4
//!
//! # Talk to the emulator on the terminal, dumping metrics on exit
//! fakemodem --metrics-output metrics.json stdio
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use fakemodem_core::{ModemConfig, ModemProfile, ModemSession};
use fakemodem_runner::config::load_config;
use fakemodem_runner::metrics_export::InMemoryRecorder;
use fakemodem_runner::tcp_server::{ServerOptions, TcpModemServer};
use fakemodem_runner::transport::{log_session_end, open_device, run_session, stdio};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// AT command modem emulator
#[derive(Parser, Debug)]
#[command(name = "fakemodem")]
#[command(about = "Emulates a cellular modem's AT command channel")]
#[command(version)]
struct Args {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Reply to unknown commands with `+CME ERROR: invalid command`
    #[arg(long, global = true)]
    verbose_errors: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Collect metrics in memory and write them to this JSON file on exit
    #[arg(long, global = true)]
    metrics_output: Option<PathBuf>,

    /// Serve Prometheus metrics on this address
    #[cfg(feature = "prometheus")]
    #[arg(long, global = true, conflicts_with = "metrics_output")]
    prometheus: Option<std::net::SocketAddr>,

    #[command(subcommand)]
    transport: TransportCommand,
}

#[derive(Subcommand, Debug)]
enum TransportCommand {
    /// Serve sessions over TCP
    Tcp {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:7000")]
        bind: String,

        /// Maximum concurrent sessions
        #[arg(long, default_value_t = 1)]
        max_sessions: usize,
    },

    /// Use stdin/stdout as the control channel
    Stdio,

    /// Use a character device as the control channel
    Device {
        /// Device path
        #[arg(short, long)]
        path: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so the stdio transport owns stdout.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ModemConfig::default(),
    };
    if args.verbose_errors {
        config.verbose_errors = true;
    }
    let read_timeout = config.read_timeout();
    let profile = Arc::new(config.build_profile()?);

    let recorder = match &args.metrics_output {
        Some(_) => {
            let recorder = Arc::new(InMemoryRecorder::new());
            metrics::set_global_recorder(recorder.clone())
                .map_err(|_| "a metrics recorder is already installed")?;
            Some(recorder)
        }
        None => None,
    };
    #[cfg(feature = "prometheus")]
    if let Some(addr) = args.prometheus {
        fakemodem_metrics::install_prometheus(addr)?;
        tracing::info!(%addr, "serving Prometheus metrics");
    }
    fakemodem_metrics::describe_metrics();

    tracing::info!(
        commands = profile.table.len(),
        verbose_errors = profile.verbosity.is_verbose(),
        message_slots = profile.message_slots,
        "modem profile loaded"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed))?;
    }

    match args.transport {
        TransportCommand::Tcp { bind, max_sessions } => {
            let options = ServerOptions {
                max_sessions,
                read_timeout,
            };
            run_tcp(&bind, profile, options, shutdown)?;
        }
        TransportCommand::Stdio => {
            let mut transport = stdio(read_timeout)?;
            run_blocking(&mut transport, profile, "stdio", &shutdown)?;
        }
        TransportCommand::Device { path } => {
            tracing::info!(path = %path.display(), "opening device");
            let mut transport = open_device(&path, read_timeout)?;
            run_blocking(&mut transport, profile, "device", &shutdown)?;
        }
    }

    if let (Some(recorder), Some(path)) = (recorder, &args.metrics_output) {
        write_metrics(&recorder, path)?;
    }

    tracing::info!("emulator stopped");
    Ok(())
}

fn run_tcp(
    bind: &str,
    profile: Arc<ModemProfile>,
    options: ServerOptions,
    shutdown: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let server = TcpModemServer::bind(bind, profile, options).await?;
        tracing::info!("Listening on {}", server.local_addr()?);
        server.run(shutdown).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn run_blocking<T: std::io::Read + std::io::Write>(
    transport: &mut T,
    profile: Arc<ModemProfile>,
    name: &str,
    shutdown: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ModemSession::with_transport(0, profile, name);
    let stats = run_session(transport, &mut session, shutdown)?;
    log_session_end(session.id(), &stats);
    Ok(())
}

fn write_metrics(recorder: &InMemoryRecorder, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, recorder.snapshot().to_json()?)?;
    tracing::info!(path = %path.display(), "metrics written");
    Ok(())
}
