// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ticketsign
//!
//! Entry point for the `ticketsign` binary. Parses CLI arguments, loads the
//! configuration file, initializes logging and dispatches:
//!
//! - `subsidy`    block and vote subsidy at a height
//! - `pool-fee`   pool fee for a ticket
//! - `commitment` ticket commitment payload for a reward address
//! - `hash`       hex and hash conversions
//! - `translate`  offline signer-request translation
//! - `journal`    inspect recorded ticket purchases
//! - `config`     print the effective configuration
//! - `version`    print build version information

mod bundle;
mod cli;
mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use ticketsign_protocol::codec::{hex_to_base64, raw_to_hex, reverse_byte_order, utf8_to_hex};
use ticketsign_protocol::config::NetworkParams;
use ticketsign_protocol::stake::{
    block_subsidy, commitment_output_script, commitment_script, pool_ticket_fee, vote_subsidy,
};
use ticketsign_protocol::PurchaseJournal;

use bundle::TranslationBundle;
use cli::{Commands, HashCommand, JournalCommand, TicketsignCli};
use config::CliConfig;
use logging::LogFormat;

const ATOMS_PER_COIN: u64 = 100_000_000;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TicketsignCli::parse();

    logging::init_logging(
        &cli.global.log_level,
        LogFormat::from_str_lossy(&cli.global.log_format),
    );

    let config = CliConfig::load(cli.global.config.as_deref())?;
    let params = config.network_params(cli.global.network.as_deref())?;
    tracing::debug!(network = %params.name, "configuration loaded");

    match cli.command {
        Commands::Subsidy(args) => {
            print_subsidy(args.height, &params);
            Ok(())
        }
        Commands::PoolFee(args) => print_pool_fee(args, &config, &params),
        Commands::Commitment(args) => print_commitment(args, &params),
        Commands::Hash(cmd) => print_hash(cmd),
        Commands::Translate(args) => translate(args, &params).await,
        Commands::Journal(cmd) => journal(cmd, &config),
        Commands::Config(args) => print_config(args, &config, &params),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn print_subsidy(height: u64, params: &NetworkParams) {
    let block = block_subsidy(height, params);
    let vote = vote_subsidy(height, params);
    println!("Network       : {}", params.name);
    println!("Height        : {height}");
    println!("Block subsidy : {} ({} atoms)", coins(block), block);
    println!("Vote subsidy  : {} ({} atoms)", coins(vote), vote);
}

fn print_pool_fee(args: cli::PoolFeeArgs, config: &CliConfig, params: &NetworkParams) -> Result<()> {
    let rate = config.pool_fee_rate(args.rate.as_deref())?;
    let relay_fee = config.relay_fee(args.relay_fee);
    let fee = pool_ticket_fee(args.ticket_price, relay_fee, args.height, rate, params);

    tracing::info!(
        ticket_price = args.ticket_price,
        height = args.height,
        rate = %rate,
        relay_fee,
        fee,
        "pool fee computed"
    );
    println!("Ticket price : {}", coins(args.ticket_price));
    println!("Pool fee     : {} ({} atoms) at {}%", coins(fee), fee, rate);
    Ok(())
}

fn print_commitment(args: cli::CommitmentArgs, params: &NetworkParams) -> Result<()> {
    let payload = commitment_script(&args.address, args.amount, args.script_hash, params)
        .with_context(|| format!("cannot build commitment to {}", args.address))?;
    println!("Payload : {}", raw_to_hex(&payload));
    println!("Script  : {}", raw_to_hex(&commitment_output_script(&payload)));
    Ok(())
}

fn print_hash(cmd: HashCommand) -> Result<()> {
    let out = match cmd {
        HashCommand::Reverse { hex } => reverse_byte_order(&hex).context("invalid hex")?,
        HashCommand::Utf8ToHex { text } => utf8_to_hex(&text),
        HashCommand::HexToBase64 { hex } => hex_to_base64(&hex).context("invalid hex")?,
    };
    println!("{out}");
    Ok(())
}

async fn translate(args: cli::TranslateArgs, params: &NetworkParams) -> Result<()> {
    let bundle = TranslationBundle::load(&args.bundle)?;
    let request = bundle
        .translate(params)
        .await
        .with_context(|| format!("failed to translate {}", args.bundle.display()))?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&request)?
    } else {
        serde_json::to_string(&request)?
    };
    println!("{json}");
    Ok(())
}

fn journal(cmd: JournalCommand, config: &CliConfig) -> Result<()> {
    match cmd {
        JournalCommand::List {
            unfinished,
            location,
        } => {
            let journal = open_journal(config, location)?;
            let records = if unfinished {
                journal.unfinished()?
            } else {
                journal.list()?
            };
            if records.is_empty() {
                println!("No purchases recorded.");
            }
            for record in records {
                println!(
                    "{}  {:<16} {:<8} tickets={} created={}",
                    record.id,
                    record.state().to_string(),
                    record.network,
                    record.tickets.len(),
                    record.created_at.to_rfc3339(),
                );
            }
            Ok(())
        }
        JournalCommand::Show { id, location } => {
            let journal = open_journal(config, location)?;
            let record = journal
                .require(&id)
                .with_context(|| format!("no purchase {id} in journal"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
    }
}

fn open_journal(config: &CliConfig, location: cli::JournalLocation) -> Result<PurchaseJournal> {
    let path = config.journal_path(location.journal.as_deref());
    tracing::debug!(path = %path.display(), "opening journal");
    PurchaseJournal::open(&path)
        .with_context(|| format!("failed to open journal at {}", path.display()))
}

fn print_config(args: cli::ConfigArgs, config: &CliConfig, params: &NetworkParams) -> Result<()> {
    let effective = serde_json::json!({
        "network": params,
        "session": config.session_options(args.relay_fee),
        "vsp_url": config.vsp_url(),
        "pool_fee_rate": config.pool_fee_rate.map(|rate| rate.to_string()),
        "journal": config.journal_path(None),
    });
    println!("{}", serde_json::to_string_pretty(&effective)?);
    Ok(())
}

fn print_version() {
    println!("ticketsign {}", env!("CARGO_PKG_VERSION"));
    println!("rustc      {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}

/// Formats atoms as a decimal coin amount.
fn coins(atoms: u64) -> String {
    format!("{}.{:08}", atoms / ATOMS_PER_COIN, atoms % ATOMS_PER_COIN)
}
