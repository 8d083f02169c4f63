//! Base58 address decoding.
//!
//! Addresses are `base58(net_id[2] || hash160[20] || checksum[4])`. We only
//! need the hash160 (for ticket commitments) and whether the address is a
//! script hash (which picks the submission script type). Checksum validation
//! is the wallet's job: every address we see has already passed through its
//! `validate_address`.

use serde::{Deserialize, Serialize};

use super::error::CodecError;
use crate::config::NetworkParams;

const NET_ID_LEN: usize = 2;
const HASH160_LEN: usize = 20;
const CHECKSUM_LEN: usize = 4;
const DECODED_LEN: usize = NET_ID_LEN + HASH160_LEN + CHECKSUM_LEN;

/// Payment kind encoded in an address's network prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressKind {
    PubKeyHash,
    ScriptHash,
}

/// The parts of an address the translator cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub kind: AddressKind,
    pub hash160: [u8; 20],
}

impl DecodedAddress {
    pub fn is_script_hash(&self) -> bool {
        self.kind == AddressKind::ScriptHash
    }
}

/// Decodes `address` for the given network.
///
/// Fails with [`CodecError::MalformedEncoding`] when the string is not
/// base58, does not carry exactly a 20-byte hash, or its prefix belongs to
/// neither address kind of `params`.
pub fn decode_address(address: &str, params: &NetworkParams) -> Result<DecodedAddress, CodecError> {
    let raw = bs58::decode(address).into_vec()?;
    if raw.len() != DECODED_LEN {
        return Err(CodecError::MalformedEncoding(format!(
            "address {address} decodes to {} bytes, expected a {HASH160_LEN}-byte hash",
            raw.len()
        )));
    }

    let net_id = [raw[0], raw[1]];
    let kind = if net_id == params.pubkey_hash_addr_id {
        AddressKind::PubKeyHash
    } else if net_id == params.script_hash_addr_id {
        AddressKind::ScriptHash
    } else {
        return Err(CodecError::MalformedEncoding(format!(
            "address {address} has prefix {:02x}{:02x}, not a {} address",
            net_id[0], net_id[1], params.name
        )));
    };

    let mut hash160 = [0u8; HASH160_LEN];
    hash160.copy_from_slice(&raw[NET_ID_LEN..NET_ID_LEN + HASH160_LEN]);
    Ok(DecodedAddress { kind, hash160 })
}

/// Builds an address string from its parts with a zeroed checksum.
///
/// Only meant for fixtures: real addresses come from the wallet.
#[doc(hidden)]
pub fn encode_unchecked(net_id: [u8; 2], hash160: &[u8; 20]) -> String {
    let mut raw = Vec::with_capacity(DECODED_LEN);
    raw.extend_from_slice(&net_id);
    raw.extend_from_slice(hash160);
    raw.extend_from_slice(&[0u8; CHECKSUM_LEN]);
    bs58::encode(raw).into_string()
}
