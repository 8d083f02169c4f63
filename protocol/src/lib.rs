// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ticketsign Core Library
//!
//! Drives a hardware signer on behalf of a wallet daemon: plain payments,
//! and the multi-step ticket purchase with its voting service provider
//! (VSP) fee.
//!
//! The library holds no keys and no balances. The wallet builds and
//! publishes transactions, the signer signs them, and this crate translates
//! between the two and sequences the calls.
//!
//! ## Architecture
//!
//! - **codec**: hex and hash conversions (the byte-reversal convention),
//!   base58 address decoding.
//! - **stake**: subsidy, pool fee and ticket commitment arithmetic,
//!   integer-exact against consensus.
//! - **transaction**: transactions as the wallet decodes them.
//! - **signer**: the hardware signer contract and its request types.
//! - **wallet**: the wallet daemon contract.
//! - **translate**: decoded transaction → signer request.
//! - **vsp**: VSP API v3 client.
//! - **settlement**: the session, the ticket purchase state machine and
//!   its journal.
//! - **config**: protocol constants and network parameters.
//!
//! ## Data flow
//!
//! ```text
//!   wallet ─▶ codec ─▶ translate ─▶ signer ─▶ wallet publish
//!                                          └─▶ VSP fee negotiation
//! ```

pub mod codec;
pub mod config;
pub mod settlement;
pub mod signer;
pub mod stake;
pub mod transaction;
pub mod translate;
pub mod vsp;
pub mod wallet;

pub use codec::Hash;
pub use config::{Network, NetworkParams};
pub use settlement::{PurchaseJournal, PurchaseRecord, Session, SessionOptions};
