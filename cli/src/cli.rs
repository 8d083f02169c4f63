//! # CLI Interface
//!
//! Defines the command-line argument structure for `ticketsign` using
//! `clap` derive.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Stake calculator, offline signer-request translation and purchase
/// journal inspection.
#[derive(Parser, Debug)]
#[command(
    name = "ticketsign",
    about = "Hardware-signer ticket tooling",
    version,
    propagate_version = true
)]
pub struct TicketsignCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Path to a TOML configuration file.
    #[arg(long, short = 'c', global = true, env = "TICKETSIGN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Network preset: mainnet, testnet or simnet. Overrides the config file.
    #[arg(long, short = 'n', global = true, env = "TICKETSIGN_NETWORK")]
    pub network: Option<String>,

    /// Log output format: pretty or json.
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: String,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "ticketsign=info,ticketsign_protocol=info")]
    pub log_level: String,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Block and per-vote subsidy at a height.
    Subsidy(SubsidyArgs),
    /// Pool fee for a ticket bought at a given price and height.
    PoolFee(PoolFeeArgs),
    /// Ticket commitment payload for a reward address.
    Commitment(CommitmentArgs),
    /// Hex and hash conversions.
    #[command(subcommand)]
    Hash(HashCommand),
    /// Translate a decoded transaction bundle into a signer request.
    Translate(TranslateArgs),
    /// Inspect the ticket purchase journal.
    #[command(subcommand)]
    Journal(JournalCommand),
    /// Print the effective configuration as JSON.
    Config(ConfigArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Parser, Debug)]
pub struct SubsidyArgs {
    /// Block height.
    #[arg(long)]
    pub height: u64,
}

#[derive(Parser, Debug)]
pub struct PoolFeeArgs {
    /// Ticket price in atoms.
    #[arg(long)]
    pub ticket_price: u64,

    /// Height the ticket is bought at.
    #[arg(long)]
    pub height: u64,

    /// Pool fee percentage, e.g. `2.59`. Falls back to the config file.
    #[arg(long)]
    pub rate: Option<String>,

    /// Relay fee in atoms per kB. Falls back to the config file.
    #[arg(long)]
    pub relay_fee: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct CommitmentArgs {
    /// Reward address the commitment pays back to.
    #[arg(long)]
    pub address: String,

    /// Committed amount in atoms.
    #[arg(long)]
    pub amount: u64,

    /// Treat the address as pay-to-script-hash.
    #[arg(long)]
    pub script_hash: bool,
}

#[derive(Subcommand, Debug)]
pub enum HashCommand {
    /// Reverse the byte order of a hex string (display ⇄ internal hash).
    Reverse { hex: String },
    /// Hex-encode a UTF-8 string.
    Utf8ToHex { text: String },
    /// Re-encode hex bytes as base64.
    HexToBase64 { hex: String },
}

#[derive(Parser, Debug)]
pub struct TranslateArgs {
    /// JSON bundle: the decoded transaction, its input transactions, the
    /// address ownership table and the change output indices.
    pub bundle: PathBuf,

    /// Pretty-print the resulting request.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Relay fee in atoms per kB. Falls back to the config file.
    #[arg(long)]
    pub relay_fee: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum JournalCommand {
    /// List every recorded purchase, oldest first.
    List {
        /// Only purchases that have not reached a terminal state.
        #[arg(long)]
        unfinished: bool,
        #[command(flatten)]
        location: JournalLocation,
    },
    /// Print one purchase record as JSON.
    Show {
        id: Uuid,
        #[command(flatten)]
        location: JournalLocation,
    },
}

#[derive(Args, Debug)]
pub struct JournalLocation {
    /// Journal directory. Overrides the config file.
    #[arg(long, env = "TICKETSIGN_JOURNAL")]
    pub journal: Option<PathBuf>,
}
