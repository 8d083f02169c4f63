//! # Transaction Translator
//!
//! Turns a wallet-decoded transaction into the request a hardware signer
//! accepts. The signer re-derives every key it signs with, so each input
//! must be mapped back to the derivation path of the address it spends, and
//! each wallet-owned output must be named by path instead of address.
//!
//! ```text
//!   DecodedTransaction ─┬─ inputs  ──▶ to_signer_inputs ──┐
//!   InputTransactions ──┘                                 │
//!                                                         ├─ classify_special_inputs
//!   InputTransactions ─── to_reference_transaction ───────┘
//!
//!   DecodedTransaction ─── to_signer_outputs / to_ticket_outputs
//! ```
//!
//! Address ownership is looked up through an [`AddressOracle`]; nothing in
//! here decides on its own whether an address belongs to the wallet.

pub mod inputs;
pub mod outputs;
pub mod reference;

use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

pub use inputs::{classify_special_inputs, to_signer_inputs};
pub use outputs::{to_signer_outputs, to_ticket_outputs};
pub use reference::to_reference_transaction;

use crate::codec::Hash;
use crate::config::NetworkParams;
use crate::signer::SignRequest;
use crate::stake::StakeError;
use crate::transaction::{DecodedTransaction, InputTransactions};
use crate::wallet::{AddressOracle, WalletError};

/// Errors raised while translating a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// An input spends from a transaction we were not given.
    #[error("cannot sign without source transaction {hash}")]
    UnknownSourceTransaction { hash: Hash },

    /// The source transaction has no output at the spent index.
    #[error("input spends unknown outpoint {hash}:{index}")]
    UnknownOutpoint { hash: Hash, index: u32 },

    /// The spent output does not pay to exactly one address.
    #[error("outpoint {hash}:{index} has {count} addresses, expected exactly one")]
    AmbiguousOutpoint { hash: Hash, index: u32, count: usize },

    /// The wallet does not recognise an address as valid.
    #[error("invalid address {0}")]
    InvalidAddress(String),

    /// An input spends an address the wallet does not own.
    #[error("input address {address} is not owned by the wallet")]
    InputNotInWallet { address: String },

    /// An output the wallet reported as its own is not.
    #[error("output {index} address {address} is not owned by the wallet")]
    OutputNotInWallet { index: u32, address: String },

    /// An output cannot be expressed as a signer output.
    #[error("unsupported shape for output {index}: {reason}")]
    UnsupportedOutputShape { index: u32, reason: String },

    /// The ticket's on-chain commitment differs from the one we would build.
    #[error("ticket commitment to {address} does not match its expected payload")]
    CommitmentMismatch { address: String },

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Stake(#[from] StakeError),
}

/// Translates a regular transaction into a complete sign request.
///
/// `change` holds the output indices the wallet reported as change when it
/// built `tx`.
pub async fn build_sign_request<O>(
    tx: &DecodedTransaction,
    input_txs: &InputTransactions,
    change: &BTreeSet<u32>,
    oracle: &O,
    params: &NetworkParams,
) -> Result<SignRequest, TranslateError>
where
    O: AddressOracle + ?Sized,
{
    let mut inputs = to_signer_inputs(tx, input_txs, oracle, params).await?;
    let outputs = to_signer_outputs(tx, change, oracle, params).await?;
    let ref_txs = reference_transactions(tx, input_txs);
    classify_special_inputs(&mut inputs, &ref_txs);

    debug!(
        tx_hash = %tx.hash,
        inputs = inputs.len(),
        outputs = outputs.len(),
        ref_txs = ref_txs.len(),
        "sign request built"
    );
    Ok(SignRequest {
        coin_name: params.coin_name.clone(),
        version: tx.version,
        lock_time: tx.lock_time,
        expiry: tx.expiry,
        inputs,
        outputs,
        ref_txs,
    })
}

/// Translates a ticket into a sign request. `input_txs` must contain the
/// split transaction that funds it.
pub async fn build_ticket_sign_request<O>(
    ticket: &DecodedTransaction,
    input_txs: &InputTransactions,
    oracle: &O,
    params: &NetworkParams,
) -> Result<SignRequest, TranslateError>
where
    O: AddressOracle + ?Sized,
{
    let inputs = to_signer_inputs(ticket, input_txs, oracle, params).await?;
    let outputs = to_ticket_outputs(ticket, oracle, params).await?;
    let ref_txs = reference_transactions(ticket, input_txs);

    debug!(ticket = %ticket.hash, inputs = inputs.len(), "ticket sign request built");
    Ok(SignRequest {
        coin_name: params.coin_name.clone(),
        version: ticket.version,
        lock_time: ticket.lock_time,
        expiry: ticket.expiry,
        inputs,
        outputs,
        ref_txs,
    })
}

/// Reference transactions for the sources of `tx`, in first-spent order.
fn reference_transactions(
    tx: &DecodedTransaction,
    input_txs: &InputTransactions,
) -> Vec<crate::signer::ReferenceTransaction> {
    let mut seen = BTreeSet::new();
    tx.inputs
        .iter()
        .filter(|input| seen.insert(input.prev_hash))
        .filter_map(|input| input_txs.get(&input.prev_hash))
        .map(to_reference_transaction)
        .collect()
}
