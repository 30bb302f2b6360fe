//! Error Types for the ZKL Staking Ledger
//!
//! Every failure is reported as a specific kind so that callers (tests, UIs)
//! can tell "too early" from "already claimed" from "not authorized".

use crate::types::Address;
use thiserror::Error;

/// Result type alias for staking operations
pub type StakingResult<T> = Result<T, StakingError>;

/// Main error enum for all staking ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    // ============ Configuration Errors ============
    /// Stake configuration selector is out of range
    #[error("invalid stake config index {index} (table has {len} entries)")]
    InvalidConfigIndex { index: u32, len: u32 },

    /// Administrator supplied an unusable stake configuration
    #[error("invalid stake config: {reason}")]
    InvalidStakeConfig { reason: &'static str },

    // ============ Stake Lifecycle Errors ============
    /// No stake at this index for the user
    #[error("stake {index} not found for user")]
    StakeNotFound { user: Address, index: u64 },

    /// Stake was already unstaked and paid out
    #[error("stake {index} already claimed")]
    AlreadyClaimed { user: Address, index: u64 },

    /// Lock period has not elapsed yet
    #[error("staking period not yet expired: unlocks at {unlock_time}, now {now}")]
    PeriodNotExpired { unlock_time: u64, now: u64 },

    // ============ Amount Errors ============
    /// Zero amount not allowed
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Reward pool cannot cover the requested obligation or payout
    #[error("insufficient reward pool: available {available}, required {required}")]
    InsufficientPool { available: u128, required: u128 },

    // ============ Token Errors ============
    /// Asset gateway refused a pull or push
    #[error("token transfer of {amount} failed")]
    TransferFailed { from: Address, to: Address, amount: u128 },

    // ============ Authorization Errors ============
    /// Caller is not the administrator
    #[error("caller is not the administrator")]
    NotAuthorized { expected: Address, actual: Address },

    /// Invalid address (e.g., zero address)
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    // ============ State Errors ============
    /// Aggregates no longer reconcile with the stake history
    #[error("ledger invariant violated: {invariant}")]
    InvariantViolated { invariant: &'static str },

    /// Persisted snapshot could not be decoded or restored
    #[error("invalid ledger snapshot")]
    InvalidSnapshot,
}

impl StakingError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfigIndex { .. } => "E001_INVALID_CONFIG_INDEX",
            Self::InvalidStakeConfig { .. } => "E002_INVALID_STAKE_CONFIG",
            Self::StakeNotFound { .. } => "E010_STAKE_NOT_FOUND",
            Self::AlreadyClaimed { .. } => "E011_ALREADY_CLAIMED",
            Self::PeriodNotExpired { .. } => "E012_PERIOD_NOT_EXPIRED",
            Self::ZeroAmount => "E020_ZERO_AMOUNT",
            Self::InsufficientPool { .. } => "E021_INSUFFICIENT_POOL",
            Self::TransferFailed { .. } => "E030_TRANSFER_FAILED",
            Self::NotAuthorized { .. } => "E040_NOT_AUTHORIZED",
            Self::InvalidAddress { .. } => "E041_INVALID_ADDRESS",
            Self::Overflow => "E050_OVERFLOW",
            Self::Underflow => "E051_UNDERFLOW",
            Self::InvariantViolated { .. } => "E060_INVARIANT_VIOLATED",
            Self::InvalidSnapshot => "E061_INVALID_SNAPSHOT",
        }
    }

    /// Returns true if the same call can succeed later without any
    /// change by the caller (only waiting out the lock)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PeriodNotExpired { .. })
    }
}
