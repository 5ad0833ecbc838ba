//! Arwa Shop CLI - the cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog
//! arwa products --catalog products.json
//!
//! # Add products and change quantities
//! arwa add 1 --catalog products.json
//! arwa set 1 3
//! arwa remove 1
//!
//! # Watch the badge while another terminal edits the cart
//! arwa watch
//! ```
//!
//! # Commands
//!
//! - `show` / `total` / `count` - Inspect the cart
//! - `add` / `set` / `inc` / `dec` / `remove` - Change the cart
//! - `checkout` - Acknowledge an order (nothing is submitted)
//! - `clear` - Delete the stored cart
//! - `products` / `related` - Browse the catalog
//! - `watch` - Print the badge on every change until Ctrl-C

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use arwa_shop_core::ProductId;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::cart::ManualProduct;
use config::{CartConfig, LogFormat};

#[derive(Parser)]
#[command(name = "arwa")]
#[command(author, version, about = "Arwa Shop cart tools")]
struct Cli {
    /// Product catalog JSON file (overrides `ARWA_CATALOG`)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Data directory (overrides `ARWA_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,

        /// Product title (skips the catalog lookup together with --price)
        #[arg(long, requires = "price")]
        title: Option<String>,

        /// Unit price
        #[arg(long, requires = "title")]
        price: Option<Decimal>,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Set the quantity of a product
    Set {
        /// Product ID
        id: ProductId,

        /// New quantity (at least 1)
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Add one unit to a line
    Inc {
        /// Product ID
        id: ProductId,
    },
    /// Take one unit off a line
    Dec {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Print the cart total
    Total,
    /// Print the item count badge
    Count,
    /// Acknowledge an order for the cart
    Checkout,
    /// Delete the stored cart
    Clear,
    /// List catalog products
    Products {
        /// Only list this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List products in the same category as a product
    Related {
        /// Product ID
        id: ProductId,
    },
    /// Print the badge whenever the cart changes
    Watch,
}

fn init_tracing(format: LogFormat) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "arwa_cli=info,arwa_shop_cart=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            std::process::exit(1);
        }
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(catalog) = cli.catalog {
        config.catalog = Some(catalog);
    }

    init_tracing(config.log_format);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli.command, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Show => commands::cart::show(config)?,
        Commands::Add {
            id,
            title,
            price,
            image,
        } => {
            let manual = ManualProduct {
                title,
                price,
                image,
            };
            commands::cart::add(config, id, manual).await?;
        }
        Commands::Set { id, quantity } => commands::cart::set(config, id, quantity)?,
        Commands::Inc { id } => commands::cart::increment(config, id)?,
        Commands::Dec { id } => commands::cart::decrement(config, id)?,
        Commands::Remove { id } => commands::cart::remove(config, id)?,
        Commands::Total => commands::cart::total(config)?,
        Commands::Count => commands::cart::count(config)?,
        Commands::Checkout => commands::cart::checkout(config)?,
        Commands::Clear => commands::cart::clear(config)?,
        Commands::Products { category } => {
            commands::catalog::list(config.catalog.as_deref(), category.as_deref()).await?;
        }
        Commands::Related { id } => {
            commands::catalog::related(config.catalog.as_deref(), id).await?;
        }
        Commands::Watch => commands::watch::run(config).await?,
    }
    Ok(())
}
