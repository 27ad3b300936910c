// src/main.rs
//! NMEA Link - decode the NMEA-0183 stream of a serial GPS receiver

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use nmea_link::{
    config::{MonitorConfig, OutputFormat},
    monitor::list_serial_ports,
    report::{json::JsonSink, log::TracingSink},
    NmeaMonitor, NmeaSource, ReportSink,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "nmea-link")]
#[command(author, version, about = "Frame and decode NMEA-0183 sentences from a GPS receiver")]
#[command(propagate_version = true)]
struct Cli {
    /// Log every line, including unrecognized sentences
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.config/nmea-link/config.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode sentences from a serial port
    Monitor {
        /// Serial port, e.g. /dev/ttyUSB0 or COM3
        #[arg(short, long)]
        port: Option<String>,

        #[arg(short, long)]
        baudrate: Option<u32>,

        /// Reject sentences without a checksum
        #[arg(long)]
        strict: bool,

        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,

        /// Remember the port and baud rate in the config file
        #[arg(long)]
        save: bool,
    },

    /// Decode a captured byte stream from a file
    Replay {
        path: PathBuf,

        #[arg(long)]
        strict: bool,

        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// List available serial ports
    Ports,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => MonitorConfig::config_path()?,
    };
    let mut config = MonitorConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Commands::Monitor {
            port,
            baudrate,
            strict,
            output,
            save,
        } => {
            let Some(port) = port.or_else(|| config.serial_port.clone()) else {
                bail!("no serial port given; pass --port or run `nmea-link ports` to find one");
            };
            let baudrate = baudrate.unwrap_or(config.baudrate);

            if save {
                config.update_serial(port.clone(), baudrate);
                config
                    .save_to(&config_path)
                    .with_context(|| format!("saving {}", config_path.display()))?;
                info!("Saved serial settings to {}", config_path.display());
            }

            config.strict_checksum |= strict;
            if let Some(output) = output {
                config.output = output;
            }
            run(config, NmeaSource::Serial { port, baudrate }).await?;
        }
        Commands::Replay {
            path,
            strict,
            output,
        } => {
            config.strict_checksum |= strict;
            if let Some(output) = output {
                config.output = output;
            }
            run(config, NmeaSource::Replay { path }).await?;
        }
        Commands::Ports => {
            let ports = list_serial_ports()?;
            if ports.is_empty() {
                println!("No serial ports found");
            }
            for port in ports {
                println!("{}  {:?}", port.port_name, port.port_type);
            }
        }
    }

    Ok(())
}

async fn run(config: MonitorConfig, source: NmeaSource) -> anyhow::Result<()> {
    let sink: Box<dyn ReportSink + Send> = match config.output {
        OutputFormat::Log => Box::new(TracingSink::new()),
        OutputFormat::Json => Box::new(JsonSink::new(std::io::stdout())),
    };

    let monitor = NmeaMonitor::new(config);
    tokio::select! {
        result = monitor.run(source, sink) => {
            let event_loop = result.context("reading NMEA stream")?;
            let stats = event_loop.stats();
            info!(
                "Done: {} lines, {} decoded, {} rejected, {} link faults",
                stats.lines, stats.decoded, stats.rejected, stats.link_faults
            );
        }
        _ = tokio::signal::ctrl_c() => {
            monitor.stop();
            info!("Interrupted, shutting down");
        }
    }

    Ok(())
}
