//! Drape CLI - session-store migrations and shipping lookups.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront session table
//! drape-cli migrate storefront
//!
//! # Create the admin session schema and table
//! drape-cli migrate admin
//!
//! # Both
//! drape-cli migrate all
//!
//! # What does shipping to Pune cost on a ₹60 order?
//! drape-cli shipping quote --city Pune --state Maharashtra --subtotal 60
//!
//! # Print the zone table
//! drape-cli shipping zones
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "drape-cli")]
#[command(author, version, about = "Drape CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create session tables
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Look up shipping fees
    Shipping {
        #[command(subcommand)]
        action: ShippingAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Storefront session table
    Storefront,
    /// Admin session schema and table
    Admin,
    /// Both
    All,
}

#[derive(Subcommand)]
enum ShippingAction {
    /// Quote the fee for a destination and subtotal
    Quote {
        #[arg(long)]
        city: String,

        #[arg(long, default_value = "")]
        state: String,

        /// Order subtotal in rupees
        #[arg(long)]
        subtotal: Decimal,

        /// Subtotal at which shipping is free
        #[arg(long, default_value = "100")]
        free_threshold: Decimal,
    },
    /// List shipping zones, their rates and keywords
    Zones {
        /// Subtotal at which shipping is free
        #[arg(long, default_value = "100")]
        free_threshold: Decimal,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "drape_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Shipping { action } => match action {
            ShippingAction::Quote {
                city,
                state,
                subtotal,
                free_threshold,
            } => commands::shipping::quote(&city, &state, subtotal, free_threshold),
            ShippingAction::Zones { free_threshold } => commands::shipping::zones(free_threshold),
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_quote_arguments_parse_decimals() {
        let cli = Cli::try_parse_from([
            "drape-cli", "shipping", "quote", "--city", "Pune", "--subtotal", "59.50",
        ])
        .unwrap();
        let Commands::Shipping {
            action: ShippingAction::Quote {
                subtotal,
                free_threshold,
                state,
                ..
            },
        } = cli.command
        else {
            panic!("expected shipping quote");
        };
        assert_eq!(subtotal, "59.50".parse::<Decimal>().unwrap());
        assert_eq!(free_threshold, Decimal::ONE_HUNDRED);
        assert!(state.is_empty());
    }

    #[test]
    fn test_bad_subtotal_rejected() {
        assert!(
            Cli::try_parse_from(["drape-cli", "shipping", "quote", "--city", "Pune", "--subtotal", "lots"])
                .is_err()
        );
    }
}
