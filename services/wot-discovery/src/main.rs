//! WoT Discovery CLI
//!
//! Command-line interface for scanning, fetching and validating Thing Descriptions.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::Level;
use wot_discovery::model::DiscoveryPhase;
use wot_discovery::state::new_state_handle;
use wot_discovery::{build_discovery, load_config, serve, validator, Config};

#[derive(Parser)]
#[command(name = "wot-discovery")]
#[command(about = "Web of Things discovery and Thing Description validation")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan base URLs for /.well-known/wot documents
    Scan {
        /// Base URLs (defaults to the configured base_urls)
        urls: Vec<String>,
    },
    /// Fetch a single Thing Description from its URL
    Fetch { url: String },
    /// Validate a Thing Description file
    Validate { file: PathBuf },
    /// Serve the JSON API
    Serve {
        /// API port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    match args.command {
        Command::Scan { urls } => {
            let urls = if urls.is_empty() {
                config.discovery.base_urls.clone()
            } else {
                urls
            };
            if urls.is_empty() {
                return Err("no URLs given and none configured".into());
            }

            let discovery = Arc::new(build_discovery(&config, new_state_handle()));
            let canceller = Arc::clone(&discovery);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Cancelling discovery");
                    canceller.cancel();
                }
            });

            let outcome = discovery
                .discover_with_progress(&urls, |p| {
                    if p.status == DiscoveryPhase::Scanning {
                        tracing::info!("Scanned {}/{}", p.completed, p.total);
                    }
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Fetch { url } => {
            let discovery = build_discovery(&config, new_state_handle());
            let thing = discovery.discover_thing(&url).await?;
            println!("{}", serde_json::to_string_pretty(&thing)?);
        }
        Command::Validate { file } => {
            let text = std::fs::read_to_string(&file)?;
            let result = validator::validate(&text);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_valid {
                std::process::exit(1);
            }
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            tracing::info!("Starting WoT discovery API");
            serve(config).await?;
        }
    }

    Ok(())
}
