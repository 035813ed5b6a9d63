//! Taproot Wallet CLI
//!
//! Command-line interface for a single-key Taproot wallet backed by an Esplora explorer

use clap::Parser;
use std::process;
use taproot_wallet::cli::args::{Cli, Commands, ConfigAction, WalletAction};
use taproot_wallet::cli::commands;
use taproot_wallet::config::{ConfigOverrides, NetworkType};

fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let network = match cli.network.as_deref().map(str::parse::<NetworkType>) {
        Some(Ok(network)) => Some(network),
        Some(Err(_)) => {
            eprintln!(
                "Error: Invalid network '{}'. Use: regtest, signet, testnet, or mainnet",
                cli.network.as_deref().unwrap_or_default()
            );
            process::exit(1);
        }
        None => None,
    };

    // Build config overrides from global arguments
    let overrides = ConfigOverrides {
        network,
        esplora_url: cli.esplora_url.clone(),
        wallet_dir: cli.data_dir.clone(),
    };

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Init => commands::config::init(network).map_err(Into::into),
        },

        Commands::Wallet { action } => match action {
            WalletAction::Generate => commands::wallet::generate(overrides).map_err(Into::into),
            WalletAction::Address => commands::wallet::address(overrides).map_err(Into::into),
        },

        Commands::Balance => commands::bitcoin::get_balance(overrides).map_err(Into::into),

        Commands::Send { to, amount } => {
            commands::bitcoin::send_bitcoin(to, amount, overrides).map_err(Into::into)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
