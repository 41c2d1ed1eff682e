use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use verdant_core::GatewayClient;
use verdant_types::{Metric, Zone};

mod commands;
mod util;

use util::Engine;

#[derive(Parser)]
#[command(name = "verdant")]
#[command(author, version, about = "Dashboard for the Verdant greenhouse gateway", long_about = None)]
struct Cli {
    /// Gateway base URL
    #[arg(
        long,
        global = true,
        env = "VERDANT_GATEWAY_URL",
        default_value = GatewayClient::DEFAULT_BASE_URL
    )]
    gateway_url: String,

    /// Catalog database path (defaults to the platform data directory)
    #[arg(long, global = true, env = "VERDANT_DB")]
    db: Option<PathBuf>,

    /// SSID hint recorded in the connection state
    #[arg(long, global = true, env = "VERDANT_SSID")]
    ssid: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check connectivity to the gateway
    Check,

    /// Poll live telemetry and render the dashboard
    Live {
        /// Poll interval in seconds (0 = serve cached data only)
        #[arg(short, long, default_value = "15")]
        interval: u64,

        /// Number of frames to render (default: until Ctrl-C)
        #[arg(short, long)]
        count: Option<u32>,
    },

    /// Download missing or provisional day logs from the gateway
    Sync,

    /// Upload unsynced local logs to the cloud backup
    Upload {
        /// Cloud backup base URL
        #[arg(long, env = "VERDANT_CLOUD_URL")]
        cloud_url: String,
    },

    /// Inspect locally held and remotely available day logs
    Logs {
        #[command(subcommand)]
        command: LogsCommands,
    },

    /// Show or change the irrigation schedule
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Start a manual irrigation run
    Irrigate {
        /// Zone to irrigate (A or B)
        #[arg(short, long)]
        zone: Zone,

        /// Liters to dispense
        #[arg(short, long)]
        liters: u32,
    },

    /// Stop a manual irrigation run
    Stop {
        /// Zone to stop (A or B)
        #[arg(short, long)]
        zone: Zone,
    },

    /// Show gateway hardware health (SD usage, RSSI, uptime)
    Status,
}

#[derive(Subcommand)]
enum LogsCommands {
    /// List known day logs and their local state
    List,

    /// Print the entries of one locally held day log
    Show {
        /// Log file name (DDMMYY or DDMMYY.json)
        file: String,
    },

    /// Min/max/mean of one metric over a locally held day log
    Stats {
        /// Log file name (DDMMYY or DDMMYY.json)
        file: String,

        /// Metric: temperature, humidity, co2, soil, lux, ph, flow
        #[arg(short, long, default_value = "temperature")]
        metric: Metric,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the irrigation schedule for both zones
    Show,

    /// Update one zone's schedule
    Set {
        /// Zone to configure (A or B)
        #[arg(short, long)]
        zone: Zone,

        /// Liters per scheduled run
        #[arg(short, long)]
        volume: u32,

        /// Hours between runs
        #[arg(short, long)]
        frequency: u32,

        /// Soil-moisture raw threshold
        #[arg(short, long)]
        threshold: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let engine = Engine::build(&cli.gateway_url, cli.db.as_deref(), cli.ssid.clone())?;

    match cli.command {
        Commands::Check => commands::check::cmd_check(&engine).await,
        Commands::Live { interval, count } => {
            commands::live::cmd_live(&engine, interval, count).await
        }
        Commands::Sync => commands::sync::cmd_sync(&engine).await,
        Commands::Upload { cloud_url } => commands::upload::cmd_upload(&engine, &cloud_url).await,
        Commands::Logs { command } => match command {
            LogsCommands::List => commands::logs::cmd_list(&engine).await,
            LogsCommands::Show { file } => commands::logs::cmd_show(&engine, &file).await,
            LogsCommands::Stats { file, metric } => {
                commands::logs::cmd_stats(&engine, &file, metric).await
            }
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config::cmd_show(&engine).await,
            ConfigCommands::Set {
                zone,
                volume,
                frequency,
                threshold,
            } => commands::config::cmd_set(&engine, zone, volume, frequency, threshold).await,
        },
        Commands::Irrigate { zone, liters } => {
            commands::control::cmd_irrigate(&engine, zone, liters).await
        }
        Commands::Stop { zone } => commands::control::cmd_irrigate(&engine, zone, 0).await,
        Commands::Status => commands::status::cmd_status(&engine).await,
    }
}
