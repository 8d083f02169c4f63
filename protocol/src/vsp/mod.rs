//! # Voting Service Provider
//!
//! A VSP votes tickets on the owner's behalf in exchange for a fee. Fee
//! negotiation is two authenticated calls:
//!
//! ```text
//!   feeaddress  (ticket, parent)        ──▶  { fee address, amount, expiry }
//!   payfee      (fee tx, voting key)    ──▶  accepted
//! ```
//!
//! Both request bodies are signed with the ticket's commitment key so the
//! VSP can check the caller owns the ticket. The VSP broadcasts the fee
//! transaction itself.

pub mod client;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::VspHttpClient;
pub use types::{
    FeeAddressRequest, FeeAddressResponse, PayFeeRequest, PayFeeResponse, SignedBody,
    VspErrorBody,
};

/// Errors from talking to a VSP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VspError {
    /// The VSP already holds a fee for this ticket.
    #[error("fee already received for this ticket")]
    AlreadyPaid,

    /// The VSP answered with an error body.
    #[error("vsp error {code} (http {status}): {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },

    /// The request never got an answer.
    #[error("vsp transport error: {0}")]
    Transport(String),

    /// The VSP answered with something we could not interpret.
    #[error("invalid vsp response: {0}")]
    InvalidResponse(String),
}

/// The two fee negotiation calls.
#[async_trait]
pub trait VspService: Send + Sync {
    async fn fee_address(&self, body: &SignedBody) -> Result<FeeAddressResponse, VspError>;

    async fn pay_fee(&self, body: &SignedBody) -> Result<PayFeeResponse, VspError>;
}
