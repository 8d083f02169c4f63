//! # Protocol Configuration & Constants
//!
//! Every magic number the signer bridge depends on lives here: script
//! opcodes, derivation constants, VSP wire details and the per-network
//! consensus parameters the stake calculator needs.
//!
//! Network parameters are plain data. The calculators in [`crate::stake`]
//! take a [`NetworkParams`] argument and never branch on the network name,
//! so an operator can override any value from a config file without touching
//! code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Bit set on a BIP32 path element to request hardened derivation.
pub const HARDENED: u32 = 0x8000_0000;

/// BIP44 purpose field.
pub const BIP44_PURPOSE: u32 = 44;

/// Branch index for receiving (external) addresses.
pub const EXTERNAL_BRANCH: u32 = 0;

/// Branch index for change (internal) addresses.
pub const INTERNAL_BRANCH: u32 = 1;

// ---------------------------------------------------------------------------
// Script Opcodes
// ---------------------------------------------------------------------------

/// `OP_RETURN`: marks a provably unspendable data-carrier output.
pub const OP_RETURN: u8 = 0x6a;

/// `OP_DATA_30`: pushes the next 30 bytes (ticket commitment payload).
pub const OP_DATA_30: u8 = 0x1e;

/// `OP_SSTX`: ticket submission output tag.
pub const OP_SSTX: u8 = 0xba;

/// `OP_SSGEN`: stake generation (vote) output tag.
pub const OP_SSGEN: u8 = 0xbb;

/// `OP_SSRTX`: stake revocation output tag.
pub const OP_SSRTX: u8 = 0xbc;

/// `OP_SSTXCHANGE`: ticket change output tag.
pub const OP_SSTXCHANGE: u8 = 0xbd;

// ---------------------------------------------------------------------------
// Ticket Commitments
// ---------------------------------------------------------------------------

/// Length of the commitment payload pushed by a ticket's OP_RETURN output.
pub const COMMITMENT_PAYLOAD_LEN: usize = 30;

/// Fee-limit marker stored in the last byte of every commitment payload.
pub const COMMITMENT_FEE_LIMIT_MARKER: u8 = 0x58;

/// Bit of the amount's most significant byte flagging a P2SH commitment.
pub const COMMITMENT_P2SH_FLAG: u8 = 0x80;

/// Number of outputs a ticket purchase transaction carries: submission,
/// commitment, change.
pub const TICKET_OUTPUT_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// Stake Pool Fee Arithmetic
// ---------------------------------------------------------------------------

/// Pool fees are expressed in hundredths of a percent: `10_000` is 100%.
pub const POOL_FEE_SCALE: u64 = 10_000;

/// Upper bound for a pool fee rate (100.00%).
pub const MAX_POOL_FEE_RATE: u32 = 10_000;

/// Fixed-point shift applied before the pool fee division.
pub const POOL_FEE_SHIFT: usize = 64;

/// Numerator of the per-adjustment subsidy decay used by the pool fee.
pub const POOL_FEE_DECAY_MUL: u64 = 100;

/// Denominator of the per-adjustment subsidy decay used by the pool fee.
pub const POOL_FEE_DECAY_DIV: u64 = 101;

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Time the VSP's backing node is given to see a freshly broadcast ticket
/// before the fee address is requested.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Default number of confirmations for inputs picked by the wallet.
pub const DEFAULT_MIN_CONFIRMATIONS: u32 = 1;

/// Network relay fee in atoms per kB, used when projecting pool fees.
pub const DEFAULT_RELAY_FEE: u64 = 10_000;

/// HTTP timeout applied to every VSP call.
pub const VSP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the client's signature over the JSON request body.
pub const VSP_CLIENT_SIGNATURE_HEADER: &str = "VSP-Client-Signature";

/// Path of the fee address endpoint, relative to the VSP base URL.
pub const VSP_FEE_ADDRESS_PATH: &str = "/api/v3/feeaddress";

/// Path of the fee payment endpoint, relative to the VSP base URL.
pub const VSP_PAY_FEE_PATH: &str = "/api/v3/payfee";

/// VSP error code reported when the ticket's fee was already received.
pub const VSP_FEE_ALREADY_RECEIVED: i64 = 3;

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// Networks with a built-in parameter preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Simnet,
}

impl Network {
    /// Returns the parameter preset for this network.
    pub fn params(self) -> NetworkParams {
        match self {
            Network::Mainnet => NetworkParams::mainnet(),
            Network::Testnet => NetworkParams::testnet(),
            Network::Simnet => NetworkParams::simnet(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Simnet => write!(f, "simnet"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "testnet3" | "test" => Ok(Network::Testnet),
            "simnet" | "sim" => Ok(Network::Simnet),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

/// Consensus and addressing parameters for one network.
///
/// Only the values needed to predict fees and to map addresses onto signer
/// requests are carried; this is not a full chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Short network name, used in logs.
    pub name: String,
    /// Coin name the hardware signer knows this network by.
    pub coin_name: String,
    /// SLIP-44 coin type used in the second path element.
    pub coin_type: u32,
    /// Block subsidy before any reduction, in atoms.
    pub base_subsidy: u64,
    /// Multiplier applied at each subsidy reduction.
    pub mul_subsidy: u64,
    /// Divisor applied at each subsidy reduction.
    pub div_subsidy: u64,
    /// Number of blocks between subsidy reductions.
    pub subsidy_reduction_interval: u64,
    /// Share of the subsidy paid to proof-of-work miners.
    pub work_reward_proportion: u64,
    /// Share of the subsidy paid to voters.
    pub stake_reward_proportion: u64,
    /// Share of the subsidy paid to the treasury.
    pub block_tax_proportion: u64,
    /// Votes included per block.
    pub tickets_per_block: u64,
    /// Target size of the live ticket pool.
    pub ticket_pool_size: u64,
    /// Two-byte prefix of pay-to-pubkey-hash addresses.
    pub pubkey_hash_addr_id: [u8; 2],
    /// Two-byte prefix of pay-to-script-hash addresses.
    pub script_hash_addr_id: [u8; 2],
}

impl NetworkParams {
    pub fn mainnet() -> Self {
        Self {
            name: "mainnet".to_string(),
            coin_name: "Decred".to_string(),
            coin_type: 42,
            base_subsidy: 3_119_582_664,
            mul_subsidy: 100,
            div_subsidy: 101,
            subsidy_reduction_interval: 6_144,
            work_reward_proportion: 6,
            stake_reward_proportion: 3,
            block_tax_proportion: 1,
            tickets_per_block: 5,
            ticket_pool_size: 8_192,
            pubkey_hash_addr_id: [0x07, 0x3f],
            script_hash_addr_id: [0x07, 0x1a],
        }
    }

    pub fn testnet() -> Self {
        Self {
            name: "testnet".to_string(),
            coin_name: "Decred Testnet".to_string(),
            coin_type: 1,
            base_subsidy: 2_500_000_000,
            mul_subsidy: 100,
            div_subsidy: 101,
            subsidy_reduction_interval: 2_048,
            work_reward_proportion: 6,
            stake_reward_proportion: 3,
            block_tax_proportion: 1,
            tickets_per_block: 5,
            ticket_pool_size: 1_024,
            pubkey_hash_addr_id: [0x0f, 0x21],
            script_hash_addr_id: [0x0e, 0xfc],
        }
    }

    pub fn simnet() -> Self {
        Self {
            name: "simnet".to_string(),
            coin_name: "Decred Simnet".to_string(),
            coin_type: 115,
            base_subsidy: 50_000_000_000,
            mul_subsidy: 100,
            div_subsidy: 101,
            subsidy_reduction_interval: 128,
            work_reward_proportion: 6,
            stake_reward_proportion: 3,
            block_tax_proportion: 1,
            tickets_per_block: 5,
            ticket_pool_size: 64,
            pubkey_hash_addr_id: [0x0e, 0x91],
            script_hash_addr_id: [0x0e, 0x6c],
        }
    }

    /// Sum of the work, stake and treasury proportions.
    pub fn total_subsidy_proportions(&self) -> u64 {
        self.work_reward_proportion + self.stake_reward_proportion + self.block_tax_proportion
    }
}
