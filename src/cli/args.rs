//! CLI argument definitions using clap

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "taproot-wallet",
    version,
    about = "Taproot Wallet - single-key P2TR wallet backed by an Esplora explorer",
    long_about = None
)]
pub struct Cli {
    /// Network to use: regtest, signet, testnet, mainnet (overrides config)
    #[arg(short, long, global = true)]
    pub network: Option<String>,

    /// Esplora server URL (overrides config)
    #[arg(long, global = true)]
    pub esplora_url: Option<String>,

    /// Custom data directory for the wallet key
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize or manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Wallet key management commands
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },

    /// Show the balance of the wallet address
    Balance,

    /// Send Bitcoin to an address
    Send {
        /// Destination address
        #[arg(short, long)]
        to: String,

        /// Amount in BTC (decimal, e.g. 0.001)
        #[arg(short, long)]
        amount: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize configuration file with defaults for `--network` (signet if omitted)
    Init,
}

#[derive(Subcommand, Debug)]
pub enum WalletAction {
    /// Generate a new key and save it to the data directory
    Generate,

    /// Show the P2TR address of the loaded key
    Address,
}
