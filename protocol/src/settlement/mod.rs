//! # Settlement
//!
//! The sequential protocol that turns an operator's intent into signed,
//! published transactions.
//!
//! ```text
//! orchestrator.rs  Session: transfers, ticket purchase, fee negotiation
//! state.rs         TicketPurchaseState and the persisted PurchaseRecord
//! journal.rs       sled-backed PurchaseJournal
//! error.rs         Phase, SettlementError, JournalError
//! ```

pub mod error;
pub mod journal;
pub mod orchestrator;
pub mod state;

pub use error::{JournalError, Phase, SettlementError};
pub use journal::PurchaseJournal;
pub use orchestrator::{
    FeeOutcome, Session, SessionOptions, SignedTransaction, VerifiedSignature, WalletStatus,
};
pub use state::{Failure, PurchaseRecord, TicketProgress, TicketPurchaseState, TicketStage};
