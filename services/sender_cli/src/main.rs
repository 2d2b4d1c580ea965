//! Zabbix sender command line
//!
//! Usage:
//!   zbx-send --host proxy-a --host proxy-b send --host-name web-01 --key orders --value 12
//!   zbx-send --config sender.toml send --host-name web-01 --key agent.ping --value 1 --active
//!   zbx-send --host proxy-a register --host-name web-01 --metadata linux
//!   zbx-send --config sender.toml config

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use zbx_codec::{DeliveryMode, Metric, Response};
use zbx_config::SenderSettings;
use zbx_network::Sender;

#[derive(Parser, Debug)]
#[command(name = "zbx-send")]
#[command(about = "Send metrics to Zabbix servers and proxies")]
#[command(version)]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Collector address (repeatable, tried in order); replaces configured hosts
    #[arg(long = "host", value_name = "ADDRESS")]
    hosts: Vec<String>,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one value
    Send {
        /// Monitored host the item belongs to
        #[arg(long)]
        host_name: String,

        /// Item key
        #[arg(short, long)]
        key: String,

        /// Item value
        #[arg(short, long)]
        value: String,

        /// Deliver as active agent data instead of trapper data
        #[arg(long)]
        active: bool,

        /// Collection time as unix seconds
        #[arg(long)]
        clock: Option<i64>,
    },
    /// Register a host for active checks
    Register {
        #[arg(long)]
        host_name: String,

        /// Host metadata matched by autoregistration actions
        #[arg(short, long, default_value = "")]
        metadata: String,
    },
    /// Print the effective settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let settings = load_settings(&args)?;
    debug!("Collectors: {:?}", settings.hosts);

    match args.command {
        Command::Config => {
            print!("{}", settings.to_toml_string()?);
            Ok(())
        }
        Command::Send {
            host_name,
            key,
            value,
            active,
            clock,
        } => {
            let mode = if active {
                DeliveryMode::Active
            } else {
                DeliveryMode::Trapper
            };
            let mut metric = Metric::new(host_name, key, value, mode);
            if let Some(secs) = clock {
                metric = metric.with_clock(secs, 0);
            }

            let mut sender = Sender::from_settings(&settings)?;
            let outcome = sender.send_metrics(&[metric]).await;

            for (mode, result) in outcome.results() {
                match result {
                    Ok(response) => print_response(mode, response),
                    Err(e) => error!("{} delivery failed: {}", mode.as_str(), e),
                }
            }

            if !outcome.is_success() {
                bail!("delivery failed");
            }
            Ok(())
        }
        Command::Register {
            host_name,
            metadata,
        } => {
            let mut sender = Sender::from_settings(&settings)?;
            sender
                .register_host(&host_name, &metadata)
                .await
                .with_context(|| format!("Failed to register host '{}'", host_name))?;

            println!("registered: {}", host_name);
            Ok(())
        }
    }
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));

    // stdout carries results; logs go to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_settings(args: &Args) -> Result<SenderSettings> {
    let mut settings = SenderSettings::load(args.config.as_deref())?;

    if !args.hosts.is_empty() {
        info!("Using {} collector(s) from the command line", args.hosts.len());
        settings.hosts = args.hosts.clone();
        settings.expand_env_vars()?;
        settings.validate()?;
    }

    Ok(settings)
}

fn print_response(mode: DeliveryMode, response: &Response) {
    match response.statistics() {
        Ok(info) => println!(
            "{}: processed: {}; failed: {}; total: {}; seconds spent: {:.6}",
            mode.as_str(),
            info.processed,
            info.failed,
            info.total,
            info.spent.as_secs_f64()
        ),
        // Collectors are free to word the info field differently
        Err(_) => println!("{}: {} {}", mode.as_str(), response.status, response.info),
    }
}
