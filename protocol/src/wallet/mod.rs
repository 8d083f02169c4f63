//! # Wallet Service
//!
//! Contract of the wallet daemon this crate drives. The wallet owns keys,
//! coin selection and the network connection; we only ever ask it to build,
//! decode, look up and publish transactions, and to vouch for addresses.
//!
//! The transport (gRPC, JSON-RPC, in-process) is the implementor's concern.

pub mod address_book;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

pub use address_book::AddressBook;

use crate::codec::{hex_bytes, CodecError, Hash};
use crate::config::{EXTERNAL_BRANCH, INTERNAL_BRANCH};
use crate::transaction::{DecodedTransaction, InputTransactions};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by a wallet implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The wallet could not be reached.
    #[error("wallet unavailable: {0}")]
    Unavailable(String),

    /// The wallet answered the call with an error.
    #[error("wallet rejected request: {0}")]
    Rejected(String),

    /// A looked-up object does not exist in the wallet.
    #[error("not found in wallet: {0}")]
    NotFound(String),

    /// The wallet answered with data we could not interpret.
    #[error("invalid wallet response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// What the wallet knows about an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddressValidation {
    pub is_valid: bool,
    pub is_mine: bool,
    /// `true` for change (internal branch) addresses.
    pub is_internal: bool,
    /// Account the address belongs to. Meaningless unless `is_mine`.
    pub account: u32,
    /// Child index within the branch. Meaningless unless `is_mine`.
    pub index: u32,
    pub is_script: bool,
}

impl AddressValidation {
    /// BIP44 branch of the address: 1 for change, 0 otherwise.
    pub fn branch(&self) -> u32 {
        if self.is_internal {
            INTERNAL_BRANCH
        } else {
            EXTERNAL_BRANCH
        }
    }
}

/// A payment the caller wants in a constructed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutput {
    pub destination: String,
    pub amount: u64,
}

/// An unsigned transaction built by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructedTransaction {
    #[serde(with = "hex_bytes")]
    pub unsigned_tx: Vec<u8>,
    /// Index of the change output, if the wallet added one.
    pub change_index: Option<u32>,
}

impl ConstructedTransaction {
    /// The change set the translator expects.
    pub fn change_indices(&self) -> BTreeSet<u32> {
        self.change_index.into_iter().collect()
    }
}

/// Parameters for a ticket purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    pub account: u32,
    pub num_tickets: u32,
    pub min_conf: u32,
    /// Block height after which unmined tickets expire. Zero for none.
    pub expiry: u32,
}

/// The unsigned transactions of a ticket purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTicketPurchase {
    /// Splits funds into outputs of exactly the ticket price plus fees.
    #[serde(with = "hex_bytes")]
    pub split_tx: Vec<u8>,
    /// One unsigned ticket per split output.
    pub tickets: Vec<UnsignedTicket>,
    /// Key the VSP votes with, in the wallet's export format.
    pub voting_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTicket(#[serde(with = "hex_bytes")] pub Vec<u8>);

/// Account balance in atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountBalance {
    pub total: u64,
    pub spendable: u64,
    pub immature: u64,
    pub locked_by_tickets: u64,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The one wallet call the translator needs: who owns an address.
#[async_trait]
pub trait AddressOracle: Send + Sync {
    async fn validate_address(&self, address: &str) -> Result<AddressValidation, WalletError>;
}

/// Everything the orchestrator asks of the wallet.
#[async_trait]
pub trait WalletService: AddressOracle {
    /// Builds and funds an unsigned transaction paying `outputs`.
    async fn construct_transaction(
        &self,
        account: u32,
        min_conf: u32,
        outputs: &[PaymentOutput],
    ) -> Result<ConstructedTransaction, WalletError>;

    async fn decode_transaction(&self, raw: &[u8]) -> Result<DecodedTransaction, WalletError>;

    /// Broadcasts a signed transaction and returns its hash.
    async fn publish_transaction(&self, raw: &[u8]) -> Result<Hash, WalletError>;

    /// Serialized bytes of a transaction the wallet knows about.
    async fn get_transaction(&self, hash: &Hash) -> Result<Vec<u8>, WalletError>;

    async fn balance(&self, account: u32, min_conf: u32) -> Result<AccountBalance, WalletError>;

    async fn best_block_height(&self) -> Result<u32, WalletError>;

    /// Current stake difficulty in atoms.
    async fn ticket_price(&self) -> Result<u64, WalletError>;

    async fn construct_tickets(
        &self,
        request: &TicketRequest,
    ) -> Result<UnsignedTicketPurchase, WalletError>;

    /// Checks a base64 compact signature over `message`.
    async fn verify_message(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<bool, WalletError>;
}

/// Fetches and decodes every transaction `tx` spends from.
///
/// Each source transaction is fetched once, however many of its outputs
/// `tx` spends.
pub async fn get_input_transactions<W>(
    wallet: &W,
    tx: &DecodedTransaction,
) -> Result<InputTransactions, WalletError>
where
    W: WalletService + ?Sized,
{
    let mut txs = InputTransactions::new();
    for input in &tx.inputs {
        if txs.contains_key(&input.prev_hash) {
            continue;
        }
        let raw = wallet.get_transaction(&input.prev_hash).await?;
        let decoded = wallet.decode_transaction(&raw).await?;
        if decoded.hash != input.prev_hash {
            return Err(WalletError::InvalidResponse(format!(
                "asked for {} but wallet returned {}",
                input.prev_hash, decoded.hash
            )));
        }
        debug!(source = %decoded.hash, outputs = decoded.outputs.len(), "input transaction resolved");
        txs.insert(decoded.hash, decoded);
    }
    Ok(txs)
}
