//! Block and vote subsidy schedule.

use crate::config::NetworkParams;

/// Total block subsidy at `height`, in atoms.
///
/// Starts from `base_subsidy` and applies `s = s * mul / div` once per
/// completed reduction interval. The loop stops as soon as the subsidy hits
/// zero, so absurd heights are cheap.
pub fn block_subsidy(height: u64, params: &NetworkParams) -> u64 {
    if params.subsidy_reduction_interval == 0 {
        return params.base_subsidy;
    }

    let reductions = height / params.subsidy_reduction_interval;
    let mut subsidy = params.base_subsidy as u128;
    for _ in 0..reductions {
        if subsidy == 0 {
            break;
        }
        subsidy = subsidy * params.mul_subsidy as u128 / params.div_subsidy as u128;
    }
    subsidy as u64
}

/// Subsidy paid to a single vote at `height`, in atoms.
pub fn vote_subsidy(height: u64, params: &NetworkParams) -> u64 {
    let denominator = params.total_subsidy_proportions() as u128 * params.tickets_per_block as u128;
    if denominator == 0 {
        return 0;
    }
    let stake_share = block_subsidy(height, params) as u128 * params.stake_reward_proportion as u128;
    (stake_share / denominator) as u64
}
