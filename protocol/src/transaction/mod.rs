//! # Transactions
//!
//! Transactions as the wallet decodes them. Nothing here serializes or
//! hashes a transaction: the wallet does both, and these types only carry
//! its answers to the translator.
//!
//! Hashes arrive in wire order and are kept as [`Hash`](crate::codec::Hash),
//! which displays them byte-reversed. Scripts are plain bytes.

pub mod types;

pub use types::{
    index_by_hash, DecodedTransaction, InputTransactions, Tree, TxInput, TxOutput,
};
