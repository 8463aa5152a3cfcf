//! Telegraf `execd` input for Argus Monitor.
//!
//! # Usage
//!
//! As a Telegraf input (one sample per line written to stdin):
//! ```toml
//! [[inputs.execd]]
//!   command = ["telegraf-argus"]
//!   signal = "STDIN"
//!   data_format = "influx"
//! ```
//!
//! Print every new sample until Ctrl-C:
//! ```bash
//! telegraf-argus watch --interval-ms 500 --format json
//! ```
//!
//! Capture the raw region for offline decoding, then replay it:
//! ```bash
//! telegraf-argus capture --output dump.bin
//! telegraf-argus --replay dump.bin execd
//! ```

#[cfg(not(test))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod line_protocol;

use anyhow::{Context, Result};
use argus_daq::{ArgusClient, ArgusConfig, Sample, SharedRegion, WatchConfig};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "telegraf-argus")]
#[command(about = "Export Argus Monitor sensors as InfluxDB line protocol", long_about = None)]
struct Cli {
    /// Configuration file (TOML); defaults to ./argus.toml if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read from a captured dump instead of the live mapping
    #[arg(long, global = true)]
    replay: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit one batch of line protocol per line read from stdin (default)
    Execd,

    /// Print every new sample until interrupted
    Watch {
        /// Poll interval in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Line)]
        format: OutputFormat,
    },

    /// Write the raw sample buffer to a file
    Capture {
        /// Destination file
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Line,
    Json,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: DateTime<Utc>,
    sample: &'a Sample,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ArgusConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ArgusConfig::load().context("Failed to load configuration")?,
    };
    config.validate()?;

    // stdout carries data; logs go to stderr
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Execd);

    match &cli.replay {
        Some(path) => {
            let client = ArgusClient::replay(path)
                .with_context(|| format!("Failed to open dump {}", path.display()))?;
            run(client, command, &config).await
        }
        None => {
            let client = ArgusClient::attach_with(&config.region)
                .context("Failed to attach to Argus Monitor (is it running?)")?;
            run(client, command, &config).await
        }
    }
}

async fn run<R: SharedRegion + 'static>(
    client: ArgusClient<R>,
    command: Commands,
    config: &ArgusConfig,
) -> Result<()> {
    match command {
        Commands::Execd => {
            let stdin = BufReader::new(tokio::io::stdin());
            execd(&client, stdin, std::io::stdout()).await?;
            client.detach()?;
            Ok(())
        }
        Commands::Watch {
            interval_ms,
            format,
        } => {
            let watch = watch_config(&config.watch, interval_ms)?;
            watch_samples(Arc::new(client), &watch, format).await
        }
        Commands::Capture { output } => {
            let bytes = client.snapshot()?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(path = %output.display(), bytes = bytes.len(), "Captured sample buffer");
            client.detach()?;
            Ok(())
        }
    }
}

fn timestamp_ns(now: DateTime<Utc>) -> i64 {
    now.timestamp_nanos_opt().unwrap_or_default()
}

/// Apply the command-line interval override and validate the result.
fn watch_config(base: &WatchConfig, interval_ms: Option<u64>) -> Result<WatchConfig> {
    let watch = WatchConfig {
        interval_ms: interval_ms.unwrap_or(base.interval_ms),
        ..base.clone()
    };
    watch.validate()?;
    Ok(watch)
}

/// Write one line-protocol batch to `out` for every line read from `input`.
///
/// Reads can wait on the producer's mutex, so they run via `block_in_place`;
/// this needs the multi-threaded runtime.
async fn execd<R, I, W>(client: &ArgusClient<R>, input: I, mut out: W) -> Result<()>
where
    R: SharedRegion,
    I: AsyncBufRead + Unpin,
    W: Write,
{
    let mut cached = client.cached();
    let mut lines = input.lines();

    while lines.next_line().await?.is_some() {
        let sample = tokio::task::block_in_place(|| cached.read())?;
        let now = timestamp_ns(Utc::now());

        let written = line_protocol::write_sample(&mut out, &sample, now)?;
        out.flush()?;
        debug!(cycle = sample.cycle_counter, lines = written, "Wrote batch");
    }

    debug!("stdin closed, exiting");
    Ok(())
}

async fn watch_samples<R: SharedRegion + 'static>(
    client: Arc<ArgusClient<R>>,
    config: &WatchConfig,
    format: OutputFormat,
) -> Result<()> {
    let mut watcher = client.watch_with(config);
    info!(interval_ms = config.interval_ms, "Watching for new samples");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            next = watcher.recv() => {
                let Some(sample) = next else { break };
                let now = Utc::now();
                let mut out = std::io::stdout().lock();
                match format {
                    OutputFormat::Line => {
                        line_protocol::write_sample(&mut out, &sample, timestamp_ns(now))?;
                    }
                    OutputFormat::Json => {
                        let record = JsonRecord { timestamp: now, sample: &sample };
                        serde_json::to_writer(&mut out, &record)?;
                        writeln!(out)?;
                    }
                }
                out.flush()?;
            }
        }
    }

    watcher.shutdown().await?;
    Ok(())
}
