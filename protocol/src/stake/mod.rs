//! # Stake Economics
//!
//! Pure integer arithmetic that predicts what the network will pay a voter
//! and what a stake pool charges for voting a ticket. The results must match
//! consensus to the atom, so nothing in here touches floating point:
//!
//! ```text
//! subsidy.rs     block subsidy and per-vote subsidy at a height
//! pool_fee.rs    stake pool operator's proportional ticket fee
//! commitment.rs  the 30-byte reward commitment a ticket carries
//! ```

pub mod commitment;
pub mod pool_fee;
pub mod subsidy;

use thiserror::Error;

pub use commitment::{
    commitment_output_script, commitment_script, parse_commitment, TicketCommitment,
};
pub use pool_fee::{pool_ticket_fee, PoolFeeRate};
pub use subsidy::{block_subsidy, vote_subsidy};

use crate::codec::CodecError;

/// Errors from the stake calculators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakeError {
    /// A fee rate string could not be parsed or is out of range.
    #[error("invalid pool fee rate: {0}")]
    InvalidFeeRate(String),

    /// The commitment address could not be decoded to a 20-byte hash.
    #[error("invalid commitment address: {0}")]
    InvalidAddress(#[from] CodecError),

    /// An output script is not a well-formed ticket commitment.
    #[error("malformed commitment script: {0}")]
    MalformedCommitment(String),

    /// Amounts that cannot be represented in a commitment.
    #[error("amount {0} does not fit in a commitment")]
    AmountOutOfRange(u64),
}
