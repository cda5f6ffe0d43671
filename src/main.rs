//! Keyvo Server Entry Point

use clap::Parser;
use keyvo::daemon::{self, Shutdown, SingletonGuard};
use keyvo::{Config, Result, UdpServer};
use std::fs::OpenOptions;
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chrono::Utc;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

struct ChronoUtc;

impl FormatTime for ChronoUtc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        // Format as RFC3339 UTC
        write!(w, "{}", Utc::now().to_rfc3339())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short = 'f', long = "configuration-filename")]
    configuration_filename: Option<PathBuf>,

    /// Address to bind to
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Largest request datagram accepted, in bytes
    #[arg(long)]
    max_payload_len: Option<usize>,

    /// Longest key accepted, in bytes
    #[arg(long)]
    max_key_len: Option<usize>,

    /// Longest value accepted, in bytes
    #[arg(long)]
    max_value_len: Option<usize>,

    /// Lock file guaranteeing a single running instance
    #[arg(long, default_value = "keyvo.lock")]
    lock_file: PathBuf,

    /// Detach from the terminal and run in the background
    #[arg(long)]
    daemonize: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log every request
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    info!("Starting Keyvo server...");

    match run(args) {
        Ok(()) => {
            info!("Server stopped gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(e)
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    config.validate()?;
    info!("Bind: {}, limits: {:?}", config.socket_addr(), config.limits());

    // Resolved now; detaching moves the working directory to `/`.
    let lock_path = std::path::absolute(&args.lock_file)?;
    let mut guard = SingletonGuard::acquire(&lock_path)?;

    if args.daemonize {
        daemon::daemonize()?;
    }
    guard.record_pid()?;
    info!("Holding lock {:?} as pid {}", guard.path(), std::process::id());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let shutdown = Shutdown::register()?;
        let server = UdpServer::bind(&config).await?;
        server.run(shutdown.wait()).await
    })?;

    drop(guard);
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.configuration_filename {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(len) = args.max_payload_len {
        config.max_payload_len = len;
    }
    if let Some(len) = args.max_key_len {
        config.max_key_len = len;
    }
    if let Some(len) = args.max_value_len {
        config.max_value_len = len;
    }

    Ok(config)
}

fn init_logging(args: &Args) -> Result<()> {
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoUtc)
        .with_env_filter(filter);

    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }

    Ok(())
}
