//! Binary entrypoint for the fallwatch CLI.
//!
//! Commands:
//! - `start [--port <path>]` - read the radar and publish fall-status events until Ctrl-C
//! - `init` - create a starter `config.toml`
//! - `status` - print the effective configuration
//! - `replay <file> [--hex]` - run a captured byte stream through the frame pipeline
//! - `simulate --status <normal|fall> [--count <n>]` - print well-formed frames as hex
//!
//! See the library crate docs for module‑level details: `fallwatch::`.
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use fallwatch::config::Config;
use fallwatch::ld6002::{encode_frame, Event};
use fallwatch::logutil::{hex_spaced, parse_hex};
use fallwatch::publish::LineSink;
use fallwatch::receiver::FrameReceiver;

#[derive(Parser)]
#[command(name = "fallwatch")]
#[command(about = "Fall detection bridge for HLK-LD6002 radar modules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the radar and publish fall-status events
    Start {
        /// Radar serial port (e.g., /dev/ttyUSB0); overrides sensor.port
        #[arg(short, long)]
        port: Option<String>,
    },
    /// Write a default configuration file
    Init,
    /// Show the effective configuration
    Status,
    /// Feed a captured byte stream through the frame pipeline
    Replay {
        /// Capture file (raw bytes, or hex text with --hex)
        file: PathBuf,
        /// Treat the file as hex text
        #[arg(long)]
        hex: bool,
    },
    /// Print well-formed fall-status frames as hex
    Simulate {
        #[arg(short, long, value_enum, default_value_t = StatusArg::Fall)]
        status: StatusArg,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Normal,
    Fall,
}

impl From<StatusArg> for Event {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Normal => Event::Normal,
            StatusArg::Fall => Event::Fall,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { port } => {
            let mut config = load_config(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting fallwatch v{}", env!("CARGO_PKG_VERSION"));
            if let Some(port) = port {
                config.sensor.port = port;
            }
            run_device(config).await?;
        }
        Commands::Init => {
            init_logging(&None, cli.verbose);
            if Path::new(&cli.config).exists() {
                warn!("{} already exists; leaving it untouched", cli.config);
                return Ok(());
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = load_config(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            show_status(&config);
        }
        Commands::Replay { file, hex } => {
            let config = load_config(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let raw = tokio::fs::read(&file)
                .await
                .map_err(|e| anyhow!("Failed to read capture {}: {}", file.display(), e))?;
            let bytes = if hex {
                let text = String::from_utf8(raw)
                    .map_err(|_| anyhow!("{} is not valid UTF-8 hex text", file.display()))?;
                parse_hex(&text).map_err(|e| anyhow!("{}: {}", file.display(), e))?
            } else {
                raw
            };
            info!("Replaying {} bytes from {}", bytes.len(), file.display());

            let mut receiver = FrameReceiver::from_config(&config);
            let metrics = receiver.metrics();
            let mut sink = LineSink::stdout();
            for &b in &bytes {
                receiver.ingest(b);
                receiver.poll(&mut sink, Instant::now());
            }
            receiver.scan_cycle(&mut sink, Instant::now());
            println!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);
        }
        Commands::Simulate { status, count } => {
            let config = load_config(&cli.config).await?;
            let event = Event::from(status);
            let frame = encode_frame(
                config.framing.sof_marker,
                config.framing.fall_frame_type,
                &[event.status_byte()],
            )?;
            for _ in 0..count {
                println!("{}", hex_spaced(&frame));
            }
        }
    }

    Ok(())
}

/// Load the config file, or fall back to defaults when it does not exist.
async fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::load(path).await
    } else {
        Ok(Config::default())
    }
}

fn show_status(config: &Config) {
    println!("fallwatch v{}", env!("CARGO_PKG_VERSION"));
    println!("Sensor:   {} @ {} baud", config.sensor.port, config.sensor.baud_rate);
    println!(
        "Framing:  {} byte buffer, scan every {} ms, SOF {:#04x}, fall type {:#06x}, carry partial: {}",
        config.framing.buffer_capacity,
        config.framing.scan_interval_ms,
        config.framing.sof_marker,
        config.framing.fall_frame_type,
        config.framing.carry_partial_frame
    );
    println!(
        "Publish:  {:?} -> {}{}",
        config.publish.sink,
        config.publish.topic,
        config
            .publish
            .file
            .as_deref()
            .map(|f| format!(" ({})", f))
            .unwrap_or_default()
    );
}

#[cfg(feature = "serial")]
async fn run_device(config: Config) -> Result<()> {
    use fallwatch::publish::sink_from_config;
    use fallwatch::source::SerialSource;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let port = config.sensor.port.clone();
    let mut source = SerialSource::open(&port, config.sensor.baud_rate)
        .map_err(|e| anyhow!("Cannot start without the radar: {}", e))?;
    info!("UART {} initialized at {} bps", port, config.sensor.baud_rate);

    let mut sink = sink_from_config(&config.publish)?;
    let mut receiver = FrameReceiver::from_config(&config);
    let metrics = receiver.metrics();
    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = Arc::clone(&stop);

    let mut worker = tokio::task::spawn_blocking(move || {
        receiver.run(&mut source, &mut sink, &worker_stop)
    });
    info!("Fall detection worker started");

    let joined = tokio::select! {
        res = &mut worker => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested; waiting for the current cycle to finish");
            stop.store(true, Ordering::Relaxed);
            worker.await
        }
    };

    info!("Receiver metrics: {}", serde_json::to_string(&metrics.snapshot())?);
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(anyhow!("Frame receiver on {} failed: {}", port, e)),
        Err(e) => Err(anyhow!("Frame receiver task aborted: {}", e)),
    }
}

#[cfg(not(feature = "serial"))]
async fn run_device(_config: Config) -> Result<()> {
    Err(anyhow!("`start` requires the 'serial' feature"))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only in the foreground
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
