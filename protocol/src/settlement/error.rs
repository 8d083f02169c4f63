//! Settlement error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::codec::Hash;
use crate::signer::SignerError;
use crate::translate::TranslateError;
use crate::vsp::VspError;
use crate::wallet::WalletError;

/// The step of a settlement flow an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Construct,
    Decode,
    ResolveInputs,
    Translate,
    Sign,
    Publish,
    SignSplit,
    PublishSplit,
    SignTicket,
    PublishTicket,
    RequestFeeAddress,
    ConstructFee,
    SignFee,
    PayFee,
    SignMessage,
    VerifyMessage,
    Query,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Construct => "construct",
            Phase::Decode => "decode",
            Phase::ResolveInputs => "resolve_inputs",
            Phase::Translate => "translate",
            Phase::Sign => "sign",
            Phase::Publish => "publish",
            Phase::SignSplit => "sign_split",
            Phase::PublishSplit => "publish_split",
            Phase::SignTicket => "sign_ticket",
            Phase::PublishTicket => "publish_ticket",
            Phase::RequestFeeAddress => "request_fee_address",
            Phase::ConstructFee => "construct_fee",
            Phase::SignFee => "sign_fee",
            Phase::PayFee => "pay_fee",
            Phase::SignMessage => "sign_message",
            Phase::VerifyMessage => "verify_message",
            Phase::Query => "query",
        };
        f.write_str(s)
    }
}

/// Errors from the purchase journal.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("purchase not found: {0}")]
    NotFound(Uuid),
}

/// Errors surfaced by the settlement orchestrator.
///
/// Every external failure names the phase it happened in and, where one is
/// involved, the ticket.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("wallet request failed during {phase}{}: {source}", ticket_suffix(.ticket))]
    Wallet {
        phase: Phase,
        ticket: Option<Hash>,
        #[source]
        source: WalletError,
    },

    #[error("signer request failed during {phase}{}: {source}", ticket_suffix(.ticket))]
    Signer {
        phase: Phase,
        ticket: Option<Hash>,
        #[source]
        source: SignerError,
    },

    #[error("vsp request failed during {phase} for ticket {ticket}: {source}")]
    Vsp {
        phase: Phase,
        ticket: Hash,
        #[source]
        source: VspError,
    },

    #[error("translation failed during {phase}{}: {source}", ticket_suffix(.ticket))]
    Translate {
        phase: Phase,
        ticket: Option<Hash>,
        #[source]
        source: TranslateError,
    },

    /// The VSP's fee quote lapsed before it could be paid.
    #[error("fee quote for ticket {ticket} expired at {expiration}")]
    FeeQuoteExpired { ticket: Hash, expiration: i64 },

    /// A purchase asked for, or the wallet built, zero tickets.
    #[error("ticket purchase has no tickets")]
    NoTickets,

    /// A transaction returned by the wallet is not shaped as expected.
    #[error("unexpected transaction {tx}: {reason}")]
    UnexpectedTransaction { tx: Hash, reason: String },

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

fn ticket_suffix(ticket: &Option<Hash>) -> String {
    match ticket {
        Some(t) => format!(" for ticket {t}"),
        None => String::new(),
    }
}

impl SettlementError {
    /// The phase the failure happened in, when it came from a collaborator.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SettlementError::Wallet { phase, .. }
            | SettlementError::Signer { phase, .. }
            | SettlementError::Vsp { phase, .. }
            | SettlementError::Translate { phase, .. } => Some(*phase),
            SettlementError::FeeQuoteExpired { .. } => Some(Phase::PayFee),
            SettlementError::NoTickets => Some(Phase::Construct),
            _ => None,
        }
    }
}

/// Attaches a phase (and optionally a ticket) to a collaborator error.
pub(crate) trait PhaseContext<T>: Sized {
    fn phase_for(self, phase: Phase, ticket: Option<Hash>) -> Result<T, SettlementError>;

    fn phase(self, phase: Phase) -> Result<T, SettlementError> {
        self.phase_for(phase, None)
    }

    fn ticket_phase(self, phase: Phase, ticket: Hash) -> Result<T, SettlementError> {
        self.phase_for(phase, Some(ticket))
    }
}

macro_rules! impl_phase_context {
    ($err:ty, $variant:ident) => {
        impl<T> PhaseContext<T> for Result<T, $err> {
            fn phase_for(self, phase: Phase, ticket: Option<Hash>) -> Result<T, SettlementError> {
                self.map_err(|source| SettlementError::$variant {
                    phase,
                    ticket,
                    source,
                })
            }
        }
    };
}

impl_phase_context!(WalletError, Wallet);
impl_phase_context!(SignerError, Signer);
impl_phase_context!(TranslateError, Translate);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_phase_and_ticket() {
        let err: Result<(), _> = Err(WalletError::Unavailable("down".into()));
        let err = err.ticket_phase(Phase::PublishTicket, Hash::from([1u8; 32])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("publish_ticket"));
        assert!(msg.contains(&"01".repeat(32)));
        assert_eq!(err.phase(), Some(Phase::PublishTicket));

        let err: Result<(), _> = Err(SignerError::Rejected);
        let msg = err.phase(Phase::Sign).unwrap_err().to_string();
        assert_eq!(msg, "signer request failed during sign: request rejected on device");
    }
}
