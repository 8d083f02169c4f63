//! Input translation and special-input classification.

use tracing::debug;

use super::TranslateError;
use crate::config::{NetworkParams, OP_SSGEN, OP_SSRTX};
use crate::signer::{DerivationPath, InputScriptType, ReferenceTransaction, SignerInput};
use crate::transaction::{DecodedTransaction, InputTransactions, Tree};
use crate::wallet::AddressOracle;

/// Maps every input of `tx` to the wallet key that can spend it.
///
/// Each input must spend an output of a transaction in `input_txs` that
/// pays to exactly one address the wallet owns; the path is rebuilt from
/// the account, branch and index the wallet reports for that address.
pub async fn to_signer_inputs<O>(
    tx: &DecodedTransaction,
    input_txs: &InputTransactions,
    oracle: &O,
    params: &NetworkParams,
) -> Result<Vec<SignerInput>, TranslateError>
where
    O: AddressOracle + ?Sized,
{
    let mut inputs = Vec::with_capacity(tx.inputs.len());

    for input in &tx.inputs {
        let hash = input.prev_hash;
        let index = input.prev_index;

        let source = input_txs
            .get(&hash)
            .ok_or(TranslateError::UnknownSourceTransaction { hash })?;
        let spent = source
            .outputs
            .get(index as usize)
            .ok_or(TranslateError::UnknownOutpoint { hash, index })?;
        let address = spent
            .single_address()
            .ok_or(TranslateError::AmbiguousOutpoint {
                hash,
                index,
                count: spent.addresses.len(),
            })?;

        let validation = oracle.validate_address(address).await?;
        if !validation.is_valid {
            return Err(TranslateError::InvalidAddress(address.to_string()));
        }
        if !validation.is_mine {
            return Err(TranslateError::InputNotInWallet {
                address: address.to_string(),
            });
        }

        let address_n = DerivationPath::address(
            params.coin_type,
            validation.account,
            validation.branch(),
            validation.index,
        );
        debug!(outpoint = %format_args!("{hash}:{index}"), path = %address_n, "input resolved");

        inputs.push(SignerInput {
            prev_hash: hash,
            prev_index: index,
            amount: input.amount_in,
            sequence: input.sequence,
            address_n,
            decred_tree: input.tree.unwrap_or_default(),
            script_type: InputScriptType::SpendAddress,
        });
    }

    Ok(inputs)
}

/// Relabels inputs that spend vote or revocation outputs.
///
/// The spent script is looked up in `ref_txs`; inputs whose source is not
/// among them keep their current script type.
pub fn classify_special_inputs(inputs: &mut [SignerInput], ref_txs: &[ReferenceTransaction]) {
    for input in inputs.iter_mut() {
        let script = ref_txs
            .iter()
            .find(|r| r.hash == input.prev_hash)
            .and_then(|r| r.bin_outputs.get(input.prev_index as usize))
            .map(|o| o.script_pubkey.as_slice());

        let relabel = match script.and_then(|s| s.first()) {
            Some(&OP_SSGEN) => InputScriptType::SpendSsGen,
            Some(&OP_SSRTX) => InputScriptType::SpendSsRtx,
            _ => continue,
        };
        debug!(
            outpoint = %format_args!("{}:{}", input.prev_hash, input.prev_index),
            script_type = %relabel,
            "special input"
        );
        input.script_type = relabel;
        // Vote and revocation outputs live in the stake tree.
        input.decred_tree = Tree::Stake;
    }
}
