//! Signer request types.
//!
//! These are the shapes a hardware signer's `SignTx` flow consumes. Field
//! names follow the signer's wire vocabulary (`address_n`, `prev_hash`,
//! `bin_outputs`) so a request serializes straight into what the transport
//! layer forwards to the device.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::path::DerivationPath;
use crate::codec::{decimal_string, hex_bytes, Hash};
use crate::transaction::Tree;

// ---------------------------------------------------------------------------
// Script types
// ---------------------------------------------------------------------------

/// How the signer should build the signature script of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputScriptType {
    /// Standard pay-to-pubkey-hash spend.
    #[default]
    #[serde(rename = "SPENDADDRESS")]
    SpendAddress,
    /// Spend of a vote (stake generation) output.
    #[serde(rename = "SPENDSSGEN")]
    SpendSsGen,
    /// Spend of a revocation output.
    #[serde(rename = "SPENDSSRTX")]
    SpendSsRtx,
}

impl fmt::Display for InputScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpendAddress => write!(f, "SPENDADDRESS"),
            Self::SpendSsGen => write!(f, "SPENDSSGEN"),
            Self::SpendSsRtx => write!(f, "SPENDSSRTX"),
        }
    }
}

/// What kind of script the signer should produce for an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputScriptType {
    #[serde(rename = "PAYTOADDRESS")]
    PayToAddress,
    #[serde(rename = "PAYTOOPRETURN")]
    PayToOpReturn,
    #[serde(rename = "SSTXSUBMISSIONPKH")]
    SstxSubmissionPkh,
    #[serde(rename = "SSTXSUBMISSIONSH")]
    SstxSubmissionSh,
    #[serde(rename = "SSTXCOMMITMENTOWNED")]
    SstxCommitmentOwned,
    #[serde(rename = "SSTXCHANGE")]
    SstxChange,
}

impl fmt::Display for OutputScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PayToAddress => "PAYTOADDRESS",
            Self::PayToOpReturn => "PAYTOOPRETURN",
            Self::SstxSubmissionPkh => "SSTXSUBMISSIONPKH",
            Self::SstxSubmissionSh => "SSTXSUBMISSIONSH",
            Self::SstxCommitmentOwned => "SSTXCOMMITMENTOWNED",
            Self::SstxChange => "SSTXCHANGE",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// SignerInput / SignerOutput
// ---------------------------------------------------------------------------

/// An input the signer is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInput {
    pub prev_hash: Hash,
    pub prev_index: u32,
    #[serde(with = "decimal_string")]
    pub amount: u64,
    pub sequence: u32,
    pub address_n: DerivationPath,
    pub decred_tree: Tree,
    pub script_type: InputScriptType,
}

/// Where an output's value goes.
///
/// An enum rather than a pair of optionals: an output can never carry both
/// an address and a derivation path, nor neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputDestination {
    /// A foreign address, shown to the user for confirmation.
    Address(String),
    /// One of the wallet's own addresses; the signer derives it itself.
    AddressN(DerivationPath),
    /// Raw data for an OP_RETURN output.
    OpReturnData(#[serde(with = "hex_bytes")] Vec<u8>),
}

/// An output of the transaction being signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerOutput {
    #[serde(with = "decimal_string")]
    pub amount: u64,
    pub script_type: OutputScriptType,
    #[serde(flatten)]
    pub destination: OutputDestination,
}

impl SignerOutput {
    pub fn to_address(amount: u64, script_type: OutputScriptType, address: impl Into<String>) -> Self {
        Self {
            amount,
            script_type,
            destination: OutputDestination::Address(address.into()),
        }
    }

    pub fn to_path(amount: u64, script_type: OutputScriptType, path: DerivationPath) -> Self {
        Self {
            amount,
            script_type,
            destination: OutputDestination::AddressN(path),
        }
    }

    pub fn address(&self) -> Option<&str> {
        match &self.destination {
            OutputDestination::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn address_n(&self) -> Option<&DerivationPath> {
        match &self.destination {
            OutputDestination::AddressN(p) => Some(p),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reference transactions
// ---------------------------------------------------------------------------

/// An input of a reference transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefInput {
    pub prev_hash: Hash,
    pub prev_index: u32,
    pub sequence: u32,
    #[serde(with = "hex_bytes")]
    pub script_sig: Vec<u8>,
    pub decred_tree: Tree,
}

/// An output of a reference transaction: value and locking script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefOutput {
    #[serde(with = "decimal_string")]
    pub amount: u64,
    #[serde(with = "hex_bytes")]
    pub script_pubkey: Vec<u8>,
    pub decred_script_version: u16,
}

/// A previous transaction presented to the signer so it can verify input
/// amounts and scripts without trusting the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTransaction {
    pub hash: Hash,
    pub version: u32,
    pub lock_time: u32,
    pub expiry: u32,
    pub inputs: Vec<RefInput>,
    pub bin_outputs: Vec<RefOutput>,
}

// ---------------------------------------------------------------------------
// SignRequest
// ---------------------------------------------------------------------------

/// Everything the signer needs to sign one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub coin_name: String,
    pub version: u32,
    pub lock_time: u32,
    pub expiry: u32,
    pub inputs: Vec<SignerInput>,
    pub outputs: Vec<SignerOutput>,
    pub ref_txs: Vec<ReferenceTransaction>,
}
