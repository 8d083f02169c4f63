//! Offline translation input.
//!
//! A bundle carries everything the translator would otherwise ask the
//! wallet for, so a signer request can be produced without a connection:
//!
//! ```json
//! {
//!   "tx":        { decoded transaction },
//!   "input_txs": [ { decoded source transaction }, ... ],
//!   "addresses": { "<address>": { "is_valid": true, "is_mine": true, ... } },
//!   "change":    [ 1 ],
//!   "ticket":    false
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use ticketsign_protocol::config::NetworkParams;
use ticketsign_protocol::signer::SignRequest;
use ticketsign_protocol::transaction::{index_by_hash, DecodedTransaction};
use ticketsign_protocol::translate::{build_sign_request, build_ticket_sign_request};
use ticketsign_protocol::wallet::AddressBook;

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationBundle {
    pub tx: DecodedTransaction,
    #[serde(default)]
    pub input_txs: Vec<DecodedTransaction>,
    pub addresses: AddressBook,
    /// Output indices the wallet marked as change.
    #[serde(default)]
    pub change: BTreeSet<u32>,
    /// Translate `tx` as a ticket purchase.
    #[serde(default)]
    pub ticket: bool,
}

impl TranslationBundle {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read bundle {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse bundle {}", path.display()))
    }

    pub async fn translate(&self, params: &NetworkParams) -> Result<SignRequest> {
        let input_txs = index_by_hash(self.input_txs.iter().cloned());
        let request = if self.ticket {
            build_ticket_sign_request(&self.tx, &input_txs, &self.addresses, params).await?
        } else {
            build_sign_request(&self.tx, &input_txs, &self.change, &self.addresses, params)
                .await?
        };
        tracing::debug!(
            tx_hash = %self.tx.hash,
            inputs = request.inputs.len(),
            outputs = request.outputs.len(),
            "bundle translated"
        );
        Ok(request)
    }
}
