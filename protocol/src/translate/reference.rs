//! Reference transaction mapping.

use crate::signer::{RefInput, RefOutput, ReferenceTransaction};
use crate::transaction::DecodedTransaction;

/// Structural copy of a decoded transaction into the form the signer uses
/// to check input amounts and scripts.
pub fn to_reference_transaction(tx: &DecodedTransaction) -> ReferenceTransaction {
    ReferenceTransaction {
        hash: tx.hash,
        version: tx.version,
        lock_time: tx.lock_time,
        expiry: tx.expiry,
        inputs: tx
            .inputs
            .iter()
            .map(|i| RefInput {
                prev_hash: i.prev_hash,
                prev_index: i.prev_index,
                sequence: i.sequence,
                script_sig: i.signature_script.clone(),
                decred_tree: i.tree.unwrap_or_default(),
            })
            .collect(),
        bin_outputs: tx
            .outputs
            .iter()
            .map(|o| RefOutput {
                amount: o.value,
                script_pubkey: o.script.clone(),
                decred_script_version: o.script_version,
            })
            .collect(),
    }
}
