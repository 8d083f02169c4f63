//! Stake pool ticket fee.
//!
//! A pool charges a percentage of the *expected* vote reward, but the fee is
//! paid up front in the ticket. The calculation therefore projects the vote
//! subsidy forward over the ticket's expected lifetime and weighs it against
//! the ticket price:
//!
//! ```text
//!            fee% * s * (v + z)
//!   fee  =  --------------------        s = projected vote subsidy
//!             10000 * (s + v)           v = ticket price, z = relay fee
//! ```
//!
//! Everything is integer math in 256-bit width. The numerator is shifted left
//! by 64 bits before the division and the quotient shifted back afterwards,
//! with truncation at every step.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::subsidy::vote_subsidy;
use super::StakeError;
use crate::config::{
    NetworkParams, MAX_POOL_FEE_RATE, POOL_FEE_DECAY_DIV, POOL_FEE_DECAY_MUL, POOL_FEE_SCALE,
    POOL_FEE_SHIFT,
};

// ---------------------------------------------------------------------------
// PoolFeeRate
// ---------------------------------------------------------------------------

/// A pool fee percentage with two implied decimals: `259` is 2.59%.
///
/// Parsing truncates extra digits (`"2.599"` is 2.59%), which matches how
/// pools advertise and how consensus-side tooling floors the rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PoolFeeRate(u32);

impl PoolFeeRate {
    /// Builds a rate from hundredths of a percent.
    pub fn from_hundredths(hundredths: u32) -> Result<Self, StakeError> {
        if hundredths > MAX_POOL_FEE_RATE {
            return Err(StakeError::InvalidFeeRate(format!(
                "{} exceeds 100.00%",
                Self(hundredths)
            )));
        }
        Ok(Self(hundredths))
    }

    /// The rate in hundredths of a percent (`floor(percent * 100)`).
    pub fn hundredths(self) -> u32 {
        self.0
    }
}

impl FromStr for PoolFeeRate {
    type Err = StakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        let digits_ok = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !digits_ok(whole) || !digits_ok(frac) {
            return Err(StakeError::InvalidFeeRate(s.to_string()));
        }

        let whole: u32 = whole
            .parse()
            .map_err(|_| StakeError::InvalidFeeRate(s.to_string()))?;
        let mut cents = 0u32;
        for (i, c) in frac.chars().take(2).enumerate() {
            let d = c.to_digit(10).unwrap_or(0);
            cents += if i == 0 { d * 10 } else { d };
        }

        let hundredths = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .ok_or_else(|| StakeError::InvalidFeeRate(s.to_string()))?;
        Self::from_hundredths(hundredths)
    }
}

impl TryFrom<String> for PoolFeeRate {
    type Error = StakeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PoolFeeRate> for String {
    fn from(rate: PoolFeeRate) -> Self {
        rate.to_string()
    }
}

impl fmt::Display for PoolFeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ---------------------------------------------------------------------------
// Fee calculation
// ---------------------------------------------------------------------------

/// Number of subsidy decay steps applied to the vote subsidy.
///
/// A ticket takes on average about `ticket_pool_size` blocks to vote, so the
/// subsidy is pushed forward by that many blocks' worth of reductions,
/// rounded up.
fn subsidy_adjustments(params: &NetworkParams) -> u64 {
    if params.subsidy_reduction_interval == 0 {
        return 0;
    }
    params.ticket_pool_size.div_ceil(params.subsidy_reduction_interval)
}

/// Fee a stake pool charges for a ticket bought at `height`.
///
/// `stake_diff` and `relay_fee` are in atoms. Returns atoms, truncated.
pub fn pool_ticket_fee(
    stake_diff: u64,
    relay_fee: u64,
    height: u64,
    rate: PoolFeeRate,
    params: &NetworkParams,
) -> u64 {
    let fee_scaled = U256::from(rate.hundredths());

    let mut subsidy = U256::from(vote_subsidy(height, params));
    for _ in 0..subsidy_adjustments(params) {
        subsidy = subsidy * U256::from(POOL_FEE_DECAY_MUL) / U256::from(POOL_FEE_DECAY_DIV);
    }

    let stake_diff = U256::from(stake_diff);
    let relay_fee = U256::from(relay_fee);

    let numerator = (fee_scaled * subsidy * (stake_diff + relay_fee)) << POOL_FEE_SHIFT;
    let denominator = (subsidy + stake_diff) * U256::from(POOL_FEE_SCALE);
    if denominator.is_zero() {
        return 0;
    }

    let fee = (numerator / denominator) >> POOL_FEE_SHIFT;
    fee.low_u64()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COIN: u64 = 100_000_000;

    #[test]
    fn golden_vectors_mainnet() {
        let p = NetworkParams::mainnet();
        let cases = [
            (10 * COIN, COIN / 100, 25_000, "1.00", 1_500_463),
            (20 * COIN, COIN / 100, 25_000, "1.00", 1_621_221),
            (5 * COIN, 5 * COIN / 100, 50_000, "2.59", 3_310_616),
            (15 * COIN, 5 * COIN / 100, 50_000, "2.59", 3_956_376),
        ];
        for (diff, relay, height, rate, expected) in cases {
            let rate: PoolFeeRate = rate.parse().unwrap();
            assert_eq!(
                pool_ticket_fee(diff, relay, height, rate, &p),
                expected,
                "diff={diff} relay={relay} height={height} rate={rate}"
            );
        }
    }

    #[test]
    fn adjustments_round_up() {
        assert_eq!(subsidy_adjustments(&NetworkParams::mainnet()), 2);
        assert_eq!(subsidy_adjustments(&NetworkParams::testnet()), 1);
        assert_eq!(subsidy_adjustments(&NetworkParams::simnet()), 1);
    }

    #[test]
    fn zero_rate_means_zero_fee() {
        let p = NetworkParams::mainnet();
        let rate = PoolFeeRate::from_hundredths(0).unwrap();
        assert_eq!(pool_ticket_fee(10 * COIN, COIN / 100, 25_000, rate, &p), 0);
    }

    #[test]
    fn fee_grows_with_rate() {
        let p = NetworkParams::testnet();
        let low = pool_ticket_fee(50 * COIN, 10_000, 1_000, "1.00".parse().unwrap(), &p);
        let high = pool_ticket_fee(50 * COIN, 10_000, 1_000, "5.00".parse().unwrap(), &p);
        assert!(high > low);
    }

    #[test]
    fn huge_inputs_do_not_overflow() {
        let p = NetworkParams::simnet();
        let rate = PoolFeeRate::from_hundredths(MAX_POOL_FEE_RATE).unwrap();
        let fee = pool_ticket_fee(u64::MAX / 2, u64::MAX / 2, 0, rate, &p);
        assert!(fee > 0);
    }

    #[test]
    fn rate_parsing_truncates() {
        assert_eq!("2.59".parse::<PoolFeeRate>().unwrap().hundredths(), 259);
        assert_eq!("2.599".parse::<PoolFeeRate>().unwrap().hundredths(), 259);
        assert_eq!("7".parse::<PoolFeeRate>().unwrap().hundredths(), 700);
        assert_eq!("0.5".parse::<PoolFeeRate>().unwrap().hundredths(), 50);
        assert_eq!("3%".parse::<PoolFeeRate>().unwrap().hundredths(), 300);
        assert_eq!("100.00".parse::<PoolFeeRate>().unwrap().hundredths(), 10_000);
    }

    #[test]
    fn rate_parsing_rejects_bad_input() {
        for bad in ["", "-1", "abc", "1.2.3", "100.01", ".5", "1e2"] {
            assert!(bad.parse::<PoolFeeRate>().is_err(), "{bad:?} parsed");
        }
    }

    #[test]
    fn rate_display_and_serde() {
        let rate: PoolFeeRate = "2.5".parse().unwrap();
        assert_eq!(rate.to_string(), "2.50");
        let json = serde_json::to_string(&rate).unwrap();
        assert_eq!(json, "\"2.50\"");
        assert_eq!(serde_json::from_str::<PoolFeeRate>(&json).unwrap(), rate);
    }
}
