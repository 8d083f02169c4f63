//! Ticket reward commitments.
//!
//! The second output of a ticket is `OP_RETURN OP_DATA_30 <payload>` where
//! the 30-byte payload says who gets the stake back and how much went in:
//!
//! ```text
//!  0            20                 28   29   30
//!  | hash160    | amount (LE u64)  | 00 | 58 |
//!                                ^ bit 7 of byte 27 set for P2SH
//! ```

use serde::{Deserialize, Serialize};

use super::StakeError;
use crate::codec::decode_address;
use crate::config::{
    NetworkParams, COMMITMENT_FEE_LIMIT_MARKER, COMMITMENT_P2SH_FLAG, COMMITMENT_PAYLOAD_LEN,
    OP_DATA_30, OP_RETURN,
};

const AMOUNT_OFFSET: usize = 20;
const AMOUNT_MSB: usize = 27;

/// A decoded commitment payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCommitment {
    pub hash160: [u8; 20],
    pub amount: u64,
    pub is_script_hash: bool,
}

/// Builds the 30-byte commitment payload for `address` and `amount`.
pub fn commitment_script(
    address: &str,
    amount: u64,
    is_script_hash: bool,
    params: &NetworkParams,
) -> Result<[u8; COMMITMENT_PAYLOAD_LEN], StakeError> {
    if amount & (1u64 << 63) != 0 {
        return Err(StakeError::AmountOutOfRange(amount));
    }
    let decoded = decode_address(address, params)?;

    let mut payload = [0u8; COMMITMENT_PAYLOAD_LEN];
    payload[..AMOUNT_OFFSET].copy_from_slice(&decoded.hash160);
    payload[AMOUNT_OFFSET..AMOUNT_OFFSET + 8].copy_from_slice(&amount.to_le_bytes());
    if is_script_hash {
        payload[AMOUNT_MSB] |= COMMITMENT_P2SH_FLAG;
    }
    payload[COMMITMENT_PAYLOAD_LEN - 1] = COMMITMENT_FEE_LIMIT_MARKER;
    Ok(payload)
}

/// Wraps a payload in the `OP_RETURN OP_DATA_30` output script.
pub fn commitment_output_script(payload: &[u8; COMMITMENT_PAYLOAD_LEN]) -> Vec<u8> {
    let mut script = Vec::with_capacity(COMMITMENT_PAYLOAD_LEN + 2);
    script.push(OP_RETURN);
    script.push(OP_DATA_30);
    script.extend_from_slice(payload);
    script
}

/// Reads a commitment back out of a ticket's output script.
pub fn parse_commitment(script: &[u8]) -> Result<TicketCommitment, StakeError> {
    if script.len() != COMMITMENT_PAYLOAD_LEN + 2 {
        return Err(StakeError::MalformedCommitment(format!(
            "script is {} bytes, expected {}",
            script.len(),
            COMMITMENT_PAYLOAD_LEN + 2
        )));
    }
    if script[0] != OP_RETURN || script[1] != OP_DATA_30 {
        return Err(StakeError::MalformedCommitment(format!(
            "unexpected script prefix {:02x}{:02x}",
            script[0], script[1]
        )));
    }

    let payload = &script[2..];
    let mut hash160 = [0u8; 20];
    hash160.copy_from_slice(&payload[..AMOUNT_OFFSET]);

    let mut amount_bytes = [0u8; 8];
    amount_bytes.copy_from_slice(&payload[AMOUNT_OFFSET..AMOUNT_OFFSET + 8]);
    let is_script_hash = amount_bytes[7] & COMMITMENT_P2SH_FLAG != 0;
    amount_bytes[7] &= !COMMITMENT_P2SH_FLAG;

    Ok(TicketCommitment {
        hash160,
        amount: u64::from_le_bytes(amount_bytes),
        is_script_hash,
    })
}
