//! Ticket purchase state machine.
//!
//! A purchase only ever moves forward:
//!
//! ```text
//!   Constructed ─▶ SplitSigned ─▶ SplitPublished ─▶ TicketSigned ─▶ TicketPublished
//!                                                                        │
//!                              FeePaid ◀─┬─ FeeRequested ◀───────────────┤
//!                       FeeAlreadyPaid ◀─┴───────────────────────────────┘
//!
//!   any non-terminal state ─▶ Failed
//! ```
//!
//! `FeePaid`, `FeeAlreadyPaid` and `Failed` are terminal. With several
//! tickets the purchase-level state reports the furthest phase every ticket
//! has reached; per-ticket detail lives in [`TicketProgress`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::error::Phase;
use crate::codec::Hash;

// ---------------------------------------------------------------------------
// TicketPurchaseState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketPurchaseState {
    Constructed,
    SplitSigned,
    SplitPublished,
    TicketSigned,
    TicketPublished,
    FeeRequested,
    FeePaid,
    FeeAlreadyPaid,
    Failed,
}

impl TicketPurchaseState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TicketPurchaseState::FeePaid
                | TicketPurchaseState::FeeAlreadyPaid
                | TicketPurchaseState::Failed
        )
    }

    fn rank(self) -> u8 {
        match self {
            TicketPurchaseState::Constructed => 0,
            TicketPurchaseState::SplitSigned => 1,
            TicketPurchaseState::SplitPublished => 2,
            TicketPurchaseState::TicketSigned => 3,
            TicketPurchaseState::TicketPublished => 4,
            TicketPurchaseState::FeeRequested => 5,
            TicketPurchaseState::FeePaid
            | TicketPurchaseState::FeeAlreadyPaid
            | TicketPurchaseState::Failed => 6,
        }
    }

    /// Whether `next` is a legal successor. Staying put is legal for
    /// non-terminal states.
    pub fn can_advance_to(self, next: TicketPurchaseState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == TicketPurchaseState::Failed || next.rank() >= self.rank()
    }
}

impl fmt::Display for TicketPurchaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketPurchaseState::Constructed => "constructed",
            TicketPurchaseState::SplitSigned => "split_signed",
            TicketPurchaseState::SplitPublished => "split_published",
            TicketPurchaseState::TicketSigned => "ticket_signed",
            TicketPurchaseState::TicketPublished => "ticket_published",
            TicketPurchaseState::FeeRequested => "fee_requested",
            TicketPurchaseState::FeePaid => "fee_paid",
            TicketPurchaseState::FeeAlreadyPaid => "fee_already_paid",
            TicketPurchaseState::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Per-ticket progress
// ---------------------------------------------------------------------------

/// How far one ticket of a purchase has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStage {
    Pending,
    Signed,
    Published,
    FeeRequested,
    FeePaid,
    FeeAlreadyPaid,
}

impl TicketStage {
    pub fn is_settled(self) -> bool {
        matches!(self, TicketStage::FeePaid | TicketStage::FeeAlreadyPaid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketProgress {
    /// Known once the ticket has been decoded.
    pub hash: Option<Hash>,
    pub stage: TicketStage,
    pub fee_address: Option<String>,
    pub fee_amount: Option<u64>,
}

impl TicketProgress {
    pub fn pending() -> Self {
        Self {
            hash: None,
            stage: TicketStage::Pending,
            fee_address: None,
            fee_amount: None,
        }
    }
}

/// Where and why a purchase stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// `None` for failures not tied to a collaborator call.
    pub phase: Option<Phase>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// PurchaseRecord
// ---------------------------------------------------------------------------

/// Everything known about one ticket purchase, persisted at each phase
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub network: String,
    pub account: u32,
    state: TicketPurchaseState,
    pub split_hash: Option<Hash>,
    pub tickets: Vec<TicketProgress>,
    pub failure: Option<Failure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseRecord {
    /// A fresh purchase of `num_tickets` tickets.
    pub fn new(network: impl Into<String>, account: u32, num_tickets: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            network: network.into(),
            account,
            state: TicketPurchaseState::Constructed,
            split_hash: None,
            tickets: vec![TicketProgress::pending(); num_tickets],
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A record for fee negotiation picked up from an already published
    /// ticket.
    pub fn resumed(network: impl Into<String>, account: u32, ticket: Hash) -> Self {
        let mut record = Self::new(network, account, 1);
        record.state = TicketPurchaseState::TicketPublished;
        record.tickets[0].hash = Some(ticket);
        record.tickets[0].stage = TicketStage::Published;
        record
    }

    pub fn state(&self) -> TicketPurchaseState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Moves to `next` if that is a legal step. Terminal states are
    /// immutable. Returns whether the state changed.
    pub fn advance(&mut self, next: TicketPurchaseState) -> bool {
        if !self.state.can_advance_to(next) {
            return false;
        }
        let changed = self.state != next;
        self.state = next;
        self.updated_at = Utc::now();
        changed
    }

    /// Marks the purchase failed. No effect once terminal.
    pub fn fail(&mut self, phase: Option<Phase>, message: impl Into<String>) {
        if self.advance(TicketPurchaseState::Failed) {
            self.failure = Some(Failure {
                phase,
                message: message.into(),
            });
        }
    }

    /// Settles the purchase once every ticket's fee is resolved: already
    /// paid only if every ticket was. A record without tickets never settles.
    pub fn settle(&mut self) -> bool {
        if self.tickets.is_empty() || !self.tickets.iter().all(|t| t.stage.is_settled()) {
            return false;
        }
        let all_already_paid = self
            .tickets
            .iter()
            .all(|t| t.stage == TicketStage::FeeAlreadyPaid);
        self.advance(if all_already_paid {
            TicketPurchaseState::FeeAlreadyPaid
        } else {
            TicketPurchaseState::FeePaid
        })
    }

    pub fn ticket_hashes(&self) -> Vec<Hash> {
        self.tickets.iter().filter_map(|t| t.hash).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
