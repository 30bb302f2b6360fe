//! Reward Engine
//!
//! Pure functions computing veZKL voting weight and the fixed reward of a
//! stake. Both use simple interest with a single truncating division:
//!
//! ```text
//! vote_weight = amount * lock_months / (12 * 100)
//! reward      = amount * apr * lock_months / (12 * 100)
//! ```

use crate::constants::reward::REWARD_DENOMINATOR;
use crate::errors::{StakingError, StakingResult};
use crate::types::StakeConfig;

/// Voting weight and reward fixed at stake creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeTerms {
    pub vote_weight: u128,
    pub reward: u128,
}

/// Compute `floor(value * factor / denominator)` without truncating the
/// numerator early and without a wider integer type.
///
/// With `value = q * denominator + r`, the exact result is
/// `q * factor + floor(r * factor / denominator)`. Only the remainder term
/// is divided, so the result is bit-exact and overflows only when the true
/// quotient does not fit in `u128`.
pub fn mul_div_floor(value: u128, factor: u128, denominator: u128) -> StakingResult<u128> {
    if denominator == 0 {
        return Err(StakingError::Overflow);
    }

    let quotient = value / denominator;
    let remainder = value % denominator;

    let whole = quotient
        .checked_mul(factor)
        .ok_or(StakingError::Overflow)?;
    let fractional = remainder
        .checked_mul(factor)
        .ok_or(StakingError::Overflow)?
        / denominator;

    whole.checked_add(fractional).ok_or(StakingError::Overflow)
}

/// Calculate veZKL voting weight for a stake
pub fn calculate_vote_weight(amount: u128, config: &StakeConfig) -> StakingResult<u128> {
    mul_div_floor(amount, config.lock_duration_months as u128, REWARD_DENOMINATOR)
}

/// Calculate the reward paid on unstake
pub fn calculate_reward(amount: u128, config: &StakeConfig) -> StakingResult<u128> {
    // apr * months fits easily: both are u32
    let factor = (config.annual_percentage_rate as u128)
        .checked_mul(config.lock_duration_months as u128)
        .ok_or(StakingError::Overflow)?;
    mul_div_floor(amount, factor, REWARD_DENOMINATOR)
}

/// Compute both terms of a new stake
pub fn compute_stake_terms(amount: u128, config: &StakeConfig) -> StakingResult<StakeTerms> {
    Ok(StakeTerms {
        vote_weight: calculate_vote_weight(amount, config)?,
        reward: calculate_reward(amount, config)?,
    })
}
