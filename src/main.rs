//! settlement-relay command line.
//!
//! Runs one relay operation against the configured ledger endpoint and
//! prints the response body as JSON on stdout. Logs go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use settlement_relay::config::{load_config, ConfigError};
use settlement_relay::observability::logging::init_logging;
use settlement_relay::relay::{Relay, Reply};

#[derive(Parser)]
#[command(name = "settlement-relay")]
#[command(about = "Balance, prepare and settle token transfers against a ledger RPC endpoint", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,

    /// RPC API key, overriding `rpc.api_key`
    #[arg(long)]
    api_key: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Balance of an asset for a wallet (holiday override applies)
    Balance {
        #[arg(long)]
        wallet: String,
        /// Asset mint; defaults to the configured asset
        #[arg(long)]
        asset: Option<String>,
    },
    /// Ledger balance of the configured asset for a wallet
    AssetBalance {
        #[arg(long)]
        wallet: String,
    },
    /// Holding account and fresh checkpoint for building a transfer
    Prepare {
        #[arg(long)]
        wallet: String,
    },
    /// Submit a base64-encoded signed transaction and wait for confirmation
    Submit {
        /// Base64 transaction; read from stdin when omitted
        #[arg(long)]
        transaction: Option<String>,
    },
    /// Check the RPC endpoint is healthy
    Health,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                eprintln!("config: {}", error);
            }
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e.into()),
    };
    if let Some(key) = cli.api_key {
        config.rpc.api_key = Some(key);
    }
    if cli.json_logs {
        config.observability.json_logs = true;
    }

    init_logging(&config.observability);
    tracing::info!(
        endpoint = %config.rpc.endpoint,
        commitment = %config.rpc.commitment,
        asset = %config.asset.mint,
        "settlement-relay v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let relay = Relay::from_config(&config)?;

    let reply = match cli.command {
        Commands::Balance { wallet, asset } => {
            let asset = asset.unwrap_or_else(|| relay.asset().to_string());
            Reply::from_result(&relay.balance(&wallet, &asset).await)
        }
        Commands::AssetBalance { wallet } => {
            Reply::from_result(&relay.asset_balance(&wallet).await)
        }
        Commands::Prepare { wallet } => Reply::from_result(&relay.prepare_transfer(&wallet).await),
        Commands::Submit { transaction } => {
            let transaction = match transaction {
                Some(t) => t,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            Reply::from_outcome(&relay.submit(transaction.trim()).await)
        }
        Commands::Health => Reply::from_result(&relay.health().await.map(|()| "ok")),
    };

    println!("{}", serde_json::to_string_pretty(&reply.body)?);

    Ok(if reply.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
