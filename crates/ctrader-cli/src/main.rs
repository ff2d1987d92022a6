//! ctrader CLI - Command-line dashboard for ctrader
//!
//! Lists trading campaigns and follows live exchange tickers.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ctrader_client::{ApiClient, ColumnFilter};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "ctrader")]
#[command(author, version, about = "ctrader campaigns and live tickers")]
#[command(propagate_version = true)]
struct Cli {
    /// Server URL [default: http://localhost:8080]
    #[arg(short, long, env = "CTRADER_SERVER")]
    server: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "CTRADER_CONFIG")]
    config: Option<PathBuf>,

    /// Output format [default: table]
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List trading campaigns
    Campaigns {
        /// Column filter as property=value (repeatable)
        #[arg(short, long = "filter", value_name = "PROPERTY=VALUE")]
        filters: Vec<ColumnFilter>,
    },

    /// Plot a live ticker until Ctrl+C or the stream ends
    Watch {
        /// Exchange provider (e.g. gdax)
        provider: Option<String>,

        /// Product as from-to pair (e.g. btc-eur)
        product: Option<String>,
    },

    /// Print the prices the server recorded for a product
    History {
        /// Exchange provider (e.g. gdax)
        provider: Option<String>,

        /// Product as from-to pair (e.g. btc-eur)
        product: Option<String>,

        /// Only the most recent N prices
        #[arg(short = 'n', long)]
        last: Option<usize>,
    },

    /// Print raw ticker events
    Ticker {
        /// Exchange provider (e.g. gdax)
        provider: Option<String>,

        /// Product as from-to pair (e.g. btc-eur)
        product: Option<String>,

        /// Stop after this many events
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(cli.server.as_deref(), cli.output, cli.no_color);

    // Create output context
    let ctx = OutputContext::new(merged.output, merged.no_color, cli.quiet);
    tracing::debug!(server = %merged.server, config = ?cli.config, "Resolved configuration");
    let client = create_client(&merged.server)?;

    // Execute command
    match &cli.command {
        Commands::Campaigns { filters } => {
            commands::campaigns(&client, filters, &ctx).await?;
        }

        Commands::Watch { provider, product } => {
            let provider = provider.as_deref().unwrap_or(&merged.provider);
            let product = product.as_deref().unwrap_or(&merged.product);
            commands::watch(&client, provider, product, &ctx).await?;
        }

        Commands::History {
            provider,
            product,
            last,
        } => {
            let provider = provider.as_deref().unwrap_or(&merged.provider);
            let product = product.as_deref().unwrap_or(&merged.product);
            commands::history(&client, provider, product, *last, &ctx).await?;
        }

        Commands::Ticker {
            provider,
            product,
            count,
        } => {
            let provider = provider.as_deref().unwrap_or(&merged.provider);
            let product = product.as_deref().unwrap_or(&merged.product);
            commands::ticker(&client, provider, product, *count, &ctx).await?;
        }
    }

    Ok(())
}

/// Create a ctrader client for the given server URL
fn create_client(server: &str) -> Result<ApiClient> {
    ApiClient::new(server).context("Failed to create ctrader client")
}
