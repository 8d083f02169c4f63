//! Output translation for regular transactions and tickets.

use std::collections::BTreeSet;
use tracing::debug;

use super::TranslateError;
use crate::codec::decode_address;
use crate::config::{NetworkParams, COMMITMENT_PAYLOAD_LEN, TICKET_OUTPUT_COUNT};
use crate::signer::{DerivationPath, OutputScriptType, SignerOutput};
use crate::stake::{commitment_script, parse_commitment};
use crate::transaction::{DecodedTransaction, TxOutput};
use crate::wallet::{AddressOracle, AddressValidation};

/// Maps the outputs of a regular transaction.
///
/// Outputs listed in `change` go back to the wallet and are named by
/// derivation path; every other output is named by address. Outputs without
/// exactly one address, `OP_RETURN` carriers included, are refused.
pub async fn to_signer_outputs<O>(
    tx: &DecodedTransaction,
    change: &BTreeSet<u32>,
    oracle: &O,
    params: &NetworkParams,
) -> Result<Vec<SignerOutput>, TranslateError>
where
    O: AddressOracle + ?Sized,
{
    let mut outputs = Vec::with_capacity(tx.outputs.len());

    for output in &tx.outputs {
        let address = single_address(output)?;
        let validation = validate(oracle, address).await?;

        if change.contains(&output.index) {
            let path = owned_path(output, address, &validation, params)?;
            debug!(index = output.index, path = %path, "change output");
            outputs.push(SignerOutput::to_path(
                output.value,
                OutputScriptType::PayToAddress,
                path,
            ));
        } else {
            outputs.push(SignerOutput::to_address(
                output.value,
                OutputScriptType::PayToAddress,
                address,
            ));
        }
    }

    Ok(outputs)
}

/// Maps the three outputs of a ticket.
///
/// ```text
///   0  submission   SSTXSUBMISSIONPKH / SH   address (voting rights)
///   1  commitment   SSTXCOMMITMENTOWNED      path of the reward address
///   2  change       SSTXCHANGE               address, normally zero value
/// ```
///
/// The commitment payload found on-chain is rebuilt from the wallet's view
/// of the reward address and must match byte for byte.
pub async fn to_ticket_outputs<O>(
    ticket: &DecodedTransaction,
    oracle: &O,
    params: &NetworkParams,
) -> Result<Vec<SignerOutput>, TranslateError>
where
    O: AddressOracle + ?Sized,
{
    if ticket.outputs.len() != TICKET_OUTPUT_COUNT {
        return Err(TranslateError::UnsupportedOutputShape {
            index: 0,
            reason: format!(
                "ticket has {} outputs, expected {TICKET_OUTPUT_COUNT}",
                ticket.outputs.len()
            ),
        });
    }
    let (submission, commitment, change) =
        (&ticket.outputs[0], &ticket.outputs[1], &ticket.outputs[2]);

    // Submission: the voting address. Script type follows the address kind.
    let submission_addr = single_address(submission)?;
    let decoded = decode_address(submission_addr, params).map_err(|e| {
        TranslateError::UnsupportedOutputShape {
            index: submission.index,
            reason: e.to_string(),
        }
    })?;
    let submission_type = if decoded.is_script_hash() {
        OutputScriptType::SstxSubmissionSh
    } else {
        OutputScriptType::SstxSubmissionPkh
    };

    // Commitment: must pay back to the wallet.
    let commitment_addr = single_address(commitment)?;
    let parsed = parse_commitment(&commitment.script)?;
    let validation = validate(oracle, commitment_addr).await?;
    let reward_path = owned_path(commitment, commitment_addr, &validation, params)?;
    let expected = commitment_script(commitment_addr, parsed.amount, validation.is_script, params)?;
    if commitment.script[2..] != expected[..COMMITMENT_PAYLOAD_LEN] {
        return Err(TranslateError::CommitmentMismatch {
            address: commitment_addr.to_string(),
        });
    }

    let change_addr = single_address(change)?;

    debug!(
        ticket = %ticket.hash,
        submission = submission_addr,
        reward_path = %reward_path,
        commitment_amount = parsed.amount,
        "ticket outputs mapped"
    );
    Ok(vec![
        SignerOutput::to_address(submission.value, submission_type, submission_addr),
        SignerOutput::to_path(parsed.amount, OutputScriptType::SstxCommitmentOwned, reward_path),
        SignerOutput::to_address(change.value, OutputScriptType::SstxChange, change_addr),
    ])
}

fn single_address(output: &TxOutput) -> Result<&str, TranslateError> {
    output
        .single_address()
        .ok_or_else(|| TranslateError::UnsupportedOutputShape {
            index: output.index,
            reason: format!("{} addresses, expected exactly one", output.addresses.len()),
        })
}

async fn validate<O>(oracle: &O, address: &str) -> Result<AddressValidation, TranslateError>
where
    O: AddressOracle + ?Sized,
{
    let validation = oracle.validate_address(address).await?;
    if !validation.is_valid {
        return Err(TranslateError::InvalidAddress(address.to_string()));
    }
    Ok(validation)
}

fn owned_path(
    output: &TxOutput,
    address: &str,
    validation: &AddressValidation,
    params: &NetworkParams,
) -> Result<DerivationPath, TranslateError> {
    if !validation.is_mine {
        return Err(TranslateError::OutputNotInWallet {
            index: output.index,
            address: address.to_string(),
        });
    }
    Ok(DerivationPath::address(
        params.coin_type,
        validation.account,
        validation.branch(),
        validation.index,
    ))
}
