//! RELAY: brokerage sell/buy/transfer workflow
//!
//! Entry point. Loads `.env` and configuration, initialises structured
//! logging, validates credentials before any request goes out, then runs
//! one command against the brokerage and prints the encoded result the
//! way the on-chain consumer would receive it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info;

use broker_relay::broker::alpaca::AlpacaClient;
use broker_relay::broker::{BrokerApi, OrderRequest};
use broker_relay::config::AppConfig;
use broker_relay::encoding;
use broker_relay::engine::balance;
use broker_relay::engine::workflow::{OrderTransferWorkflow, WorkflowRequest};
use broker_relay::types::OrderSide;

/// RELAY - sell, buy and transfer through a brokerage REST API.
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sell → buy → transfer workflow locally and print the result
    #[command(alias = "run")]
    Simulate {
        /// Quantity of the source asset to sell (reused for the buy leg)
        sell_qty: Decimal,
        /// Whole amount of the intermediate asset to transfer out
        transfer_amount: Decimal,
    },

    /// Print the portfolio value as an 18-decimal uint256
    Balance,

    /// Place a single market order and print the brokerage's answer
    PlaceOrder {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        qty: Decimal,
        /// buy or sell
        #[arg(long)]
        side: OrderSide,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    init_logging();

    let cfg = AppConfig::load_or_default(&cli.config)?;
    cfg.validate()?;
    cfg.check_host_budget();

    // Fails before any request if either credential is missing.
    let credentials = cfg.credentials()?;
    let broker = AlpacaClient::from_config(&cfg.broker, credentials)?;
    info!(base_url = %broker.base_url(), "Brokerage client ready");

    match cli.command {
        Commands::Simulate {
            sell_qty,
            transfer_amount,
        } => {
            let request = WorkflowRequest::new(sell_qty, transfer_amount)?;
            let workflow = OrderTransferWorkflow::new(broker, cfg.workflow_plan());
            let result = workflow.run(&request).await;
            info!(result = %result, failed = result.is_failure(), "Workflow finished");

            let encoded = result.to_hex();
            let decoded = encoding::decode_hex(&encoded)?;

            println!("Encoded response: {encoded}");
            println!("Response returned by workflow during local simulation: {decoded}");
        }
        Commands::Balance => {
            let value = balance::encoded_portfolio_balance(&broker)
                .await
                .context("Balance probe failed")?;
            let encoded = encoding::to_hex(&encoding::encode_uint256(value));
            let decoded = encoding::decode_hex(&encoded)?;

            println!("Encoded response: {encoded}");
            println!("Response returned by balance probe: {decoded}");
        }
        Commands::PlaceOrder { symbol, qty, side } => {
            let request = OrderRequest::market(&symbol, qty, side);
            let response = broker
                .place_order(&request)
                .await
                .context("Order request failed")?;

            println!("Response status: {}", response.status);
            match response.body {
                Some(placed) => {
                    println!("client_order_id: {}", placed.client_order_id);
                    println!("status: {}", placed.status);
                }
                None => println!("No order body returned"),
            }
        }
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("broker_relay=info,relay=info"));

    let json_logging = std::env::var("RELAY_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
