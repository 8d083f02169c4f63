//! Wallet-decoded transaction types.
//!
//! These mirror what the wallet's decode call returns. They are produced by
//! the wallet, consumed by the translator, and never mutated in between.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::codec::{hex_bytes, Hash};

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Which transaction tree an outpoint lives in.
///
/// Regular transfers spend from the regular tree; outputs created by
/// tickets, votes and revocations live in the stake tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tree {
    #[default]
    Regular,
    Stake,
}

impl Tree {
    pub fn as_u8(self) -> u8 {
        match self {
            Tree::Regular => 0,
            Tree::Stake => 1,
        }
    }
}

impl TryFrom<u8> for Tree {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Tree::Regular),
            1 => Ok(Tree::Stake),
            other => Err(format!("unknown transaction tree {other}")),
        }
    }
}

impl From<Tree> for u8 {
    fn from(tree: Tree) -> Self {
        tree.as_u8()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Regular => write!(f, "regular"),
            Tree::Stake => write!(f, "stake"),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// One input of a decoded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Hash of the transaction that created the spent output.
    pub prev_hash: Hash,
    /// Index of the spent output within `prev_hash`.
    pub prev_index: u32,
    /// Value of the spent output, in atoms.
    pub amount_in: u64,
    pub sequence: u32,
    /// Tree of the spent output, when the wallet reports it.
    #[serde(default)]
    pub tree: Option<Tree>,
    /// Signature script. Empty on transactions that still need signing.
    #[serde(default, with = "hex_bytes")]
    pub signature_script: Vec<u8>,
}

/// One output of a decoded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Value in atoms.
    pub value: u64,
    /// Addresses the script pays to. Empty for non-standard scripts and
    /// most data carriers; more than one for bare multisig.
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub script_version: u16,
    /// Position of this output in the transaction.
    pub index: u32,
    /// The output script (public key script).
    #[serde(with = "hex_bytes")]
    pub script: Vec<u8>,
}

impl TxOutput {
    /// The single address this output pays to, if it has exactly one.
    pub fn single_address(&self) -> Option<&str> {
        match self.addresses.as_slice() {
            [addr] => Some(addr.as_str()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DecodedTransaction
// ---------------------------------------------------------------------------

/// A transaction as decoded by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedTransaction {
    pub hash: Hash,
    pub version: u32,
    pub lock_time: u32,
    pub expiry: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl DecodedTransaction {
    /// Sum of all output values.
    pub fn total_out(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    /// Indices of every output. Used when all outputs go back to the wallet,
    /// as in a ticket split transaction.
    pub fn all_output_indices(&self) -> std::collections::BTreeSet<u32> {
        self.outputs.iter().map(|o| o.index).collect()
    }
}

/// Previously-confirmed transactions keyed by hash, as the translator needs
/// them to resolve inputs.
pub type InputTransactions = HashMap<Hash, DecodedTransaction>;

/// Indexes decoded transactions by hash.
pub fn index_by_hash<I>(txs: I) -> InputTransactions
where
    I: IntoIterator<Item = DecodedTransaction>,
{
    txs.into_iter().map(|tx| (tx.hash, tx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(index: u32, addresses: &[&str]) -> TxOutput {
        TxOutput {
            value: 1_000,
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
            script_version: 0,
            index,
            script: vec![0x76],
        }
    }

    #[test]
    fn tree_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Tree::Stake).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Tree>("0").unwrap(), Tree::Regular);
        assert!(serde_json::from_str::<Tree>("2").is_err());
    }

    #[test]
    fn single_address_requires_exactly_one() {
        assert_eq!(output(0, &["a"]).single_address(), Some("a"));
        assert_eq!(output(0, &[]).single_address(), None);
        assert_eq!(output(0, &["a", "b"]).single_address(), None);
    }

    #[test]
    fn decoded_transaction_from_json() {
        let hash = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
        let json = format!(
            r#"{{
                "hash": "{hash}",
                "version": 1, "lock_time": 0, "expiry": 0,
                "inputs": [{{"prev_hash": "{hash}", "prev_index": 2,
                             "amount_in": 500, "sequence": 4294967295}}],
                "outputs": [{{"value": 400, "addresses": ["TsAddr"], "index": 0,
                              "script": "76a914"}}]
            }}"#
        );
        let tx: DecodedTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx.inputs[0].tree, None);
        assert!(tx.inputs[0].signature_script.is_empty());
        assert_eq!(tx.outputs[0].script, vec![0x76, 0xa9, 0x14]);
        assert_eq!(tx.total_out(), 400);

        let map = index_by_hash(vec![tx.clone()]);
        assert_eq!(map.get(&tx.hash), Some(&tx));
    }

    #[test]
    fn all_output_indices_covers_every_output() {
        let tx = DecodedTransaction {
            hash: Hash::default(),
            version: 1,
            lock_time: 0,
            expiry: 0,
            inputs: vec![],
            outputs: vec![output(0, &["a"]), output(1, &["b"]), output(2, &["c"])],
        };
        assert_eq!(tx.all_output_indices().into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
