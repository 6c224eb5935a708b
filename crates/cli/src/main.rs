//! Cartwheel CLI - Drive a cart against a live stock service.
//!
//! # Usage
//!
//! ```bash
//! # Add one unit of product 1 to the cart
//! cartwheel add 1
//!
//! # Remove one unit of product 1
//! cartwheel remove 1
//!
//! # Set product 1's amount to exactly 4
//! cartwheel set-amount 1 4
//!
//! # Show the current cart
//! cartwheel show
//! ```
//!
//! # Environment Variables
//!
//! - `CARTWHEEL_STOCK_BASE_URL` - Base URL of the stock service (required)
//! - `CARTWHEEL_STOCK_TIMEOUT_SECS` - Stock request timeout (default: 10)
//! - `CARTWHEEL_STORAGE_PATH` - Cart persistence file
//!   (default: cartwheel-cart.json)
//!
//! The cart is persisted between invocations, so each command picks up
//! where the previous one left off - the CLI analogue of a page reload.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use cartwheel_store::CartStore;
use cartwheel_store::config::StoreConfig;
use cartwheel_store::persist::JsonFileStore;
use cartwheel_store::stock::HttpStockService;

mod commands;

#[derive(Parser)]
#[command(name = "cartwheel")]
#[command(author, version, about = "Cartwheel shopping cart CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add one unit of a product to the cart
    Add {
        /// Product ID
        product_id: i32,
    },
    /// Remove one unit of a product from the cart
    Remove {
        /// Product ID
        product_id: i32,
    },
    /// Set a product's amount to an exact value
    SetAmount {
        /// Product ID
        product_id: i32,

        /// Target amount (zero or negative is ignored)
        amount: i64,
    },
    /// Show the current cart
    Show,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cartwheel_store=info,cartwheel_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let stock = HttpStockService::new(&config.stock)?;
    let persistence = JsonFileStore::new(&config.storage_path);
    let store = CartStore::new(stock, persistence).await;

    match cli.command {
        Commands::Add { product_id } => {
            commands::cart::add(&store, product_id).await;
        }
        Commands::Remove { product_id } => {
            commands::cart::remove(&store, product_id).await;
        }
        Commands::SetAmount { product_id, amount } => {
            commands::cart::set_amount(&store, product_id, amount).await;
        }
        Commands::Show => {
            commands::cart::show(&store).await;
        }
    }
    Ok(())
}
