//! Validation Helpers for the ZKL Staking Ledger
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zkl_staking_common::check;
//!
//! check!(amount > 0, StakingError::ZeroAmount);
//! ```

use crate::{
    constants::staking::{MAX_APR_PERCENT, MAX_LOCK_MONTHS},
    errors::{StakingError, StakingResult},
    types::{Address, StakeConfig, ZERO_ADDRESS},
};

// ============ Validation Macro ============

/// Check a condition and return an error if it fails.
///
/// ```rust,ignore
/// check!(
///     available >= required,
///     StakingError::InsufficientPool { available, required }
/// );
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

// ============ Amount Validation ============

/// Reject zero amounts
#[inline]
pub fn require_positive(amount: u128) -> StakingResult<()> {
    check!(amount > 0, StakingError::ZeroAmount);
    Ok(())
}

// ============ Address Validation ============

/// Reject the all-zero address
#[inline]
pub fn require_non_zero_address(address: &Address, reason: &'static str) -> StakingResult<()> {
    check!(*address != ZERO_ADDRESS, StakingError::InvalidAddress { reason });
    Ok(())
}

// ============ Config Validation ============

/// Validate an administrator-supplied stake configuration
pub fn validate_stake_config(config: &StakeConfig) -> StakingResult<()> {
    check!(
        config.lock_duration_months > 0,
        StakingError::InvalidStakeConfig { reason: "lock duration must be at least one month" }
    );
    check!(
        config.lock_duration_months <= MAX_LOCK_MONTHS,
        StakingError::InvalidStakeConfig { reason: "lock duration exceeds maximum" }
    );
    check!(
        config.annual_percentage_rate <= MAX_APR_PERCENT,
        StakingError::InvalidStakeConfig { reason: "APR exceeds maximum" }
    );
    Ok(())
}
