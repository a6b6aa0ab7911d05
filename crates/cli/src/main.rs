//! RocketShoes CLI - Manage the local shopping cart.
//!
//! # Usage
//!
//! ```bash
//! # Add one unit of product 1 (appends it if new)
//! rocketshoes add 1
//!
//! # Set the quantity of product 1 to 3
//! rocketshoes update 1 3
//!
//! # Remove product 1
//! rocketshoes remove 1
//!
//! # Show the cart
//! rocketshoes show
//! ```
//!
//! # Commands
//!
//! - `add` - Add a product, or one more unit if already in the cart
//! - `remove` - Remove a product from the cart
//! - `update` - Set a product's quantity, checked against stock
//! - `show` - Print the cart and its total
//!
//! Configuration comes from the environment; see `rocketshoes_cart::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rocketshoes_cart::CartConfig;
use rocketshoes_core::ProductId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::cart::CartCommand;

#[derive(Parser)]
#[command(name = "rocketshoes")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a product to the cart
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product ID
        id: ProductId,

        /// New quantity (must be at least 1 and within stock)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Show the cart
    Show,
}

impl From<Commands> for CartCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Add { id } => Self::Add(id),
            Commands::Remove { id } => Self::Remove(id),
            Commands::Update { id, amount } => Self::Update {
                product_id: id,
                amount,
            },
            Commands::Show => Self::Show,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration is needed before tracing so Sentry can hook in first
    let config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Invalid configuration: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Defaults to warnings only; the command prints its own result
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=warn,rocketshoes_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match commands::cart::run(cli.command.into(), &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}
