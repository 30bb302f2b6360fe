//! Core Types for the ZKL Staking Ledger
//!
//! Stake configuration, individual stakes, and their lifecycle status.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::time::SECONDS_PER_MONTH;

/// Type alias for account addresses (32-byte identifier)
pub type Address = [u8; 32];

/// The all-zero address, never a valid principal
pub const ZERO_ADDRESS: Address = [0u8; 32];

// ============ Stake Config ============

/// Lock period and APR offered under one stake table selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StakeConfig {
    /// Lock duration in months (30-day months)
    pub lock_duration_months: u32,
    /// Annual percentage rate as an integer percent (12 = 12%)
    pub annual_percentage_rate: u32,
}

impl StakeConfig {
    pub const fn new(lock_duration_months: u32, annual_percentage_rate: u32) -> Self {
        Self {
            lock_duration_months,
            annual_percentage_rate,
        }
    }

    /// Lock duration in seconds
    pub fn lock_duration_seconds(&self) -> u64 {
        (self.lock_duration_months as u64).saturating_mul(SECONDS_PER_MONTH)
    }
}

// ============ Stake ============

/// Lifecycle of a single stake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StakeStatus {
    /// Locked, lock period still running
    Active,
    /// Lock period elapsed, ready to unstake
    Unlockable,
    /// Principal and reward paid out (terminal)
    Claimed,
}

/// One deposit. Everything but `claimed` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Stake {
    /// Tokens locked
    pub amount: u128,
    /// Unix timestamp at creation
    pub start_time: u64,
    /// veZKL voting weight granted by this stake
    pub vote_weight: u128,
    /// Reward owed on unstake
    pub reward: u128,
    /// Snapshot of the config in force when the stake was created
    pub config: StakeConfig,
    /// Table selector the snapshot came from
    pub config_index: u32,
    /// Set once by unstake, never reset
    pub claimed: bool,
}

impl Stake {
    /// Earliest timestamp at which the stake may be unstaked
    pub fn unlock_time(&self) -> u64 {
        self.start_time.saturating_add(self.config.lock_duration_seconds())
    }

    /// Lock has elapsed at `now` (boundary inclusive)
    pub fn is_unlocked(&self, now: u64) -> bool {
        now.saturating_sub(self.start_time) >= self.config.lock_duration_seconds()
    }

    pub fn status(&self, now: u64) -> StakeStatus {
        if self.claimed {
            StakeStatus::Claimed
        } else if self.is_unlocked(now) {
            StakeStatus::Unlockable
        } else {
            StakeStatus::Active
        }
    }

    /// Principal plus reward paid out on unstake
    pub fn payout(&self) -> Option<u128> {
        self.amount.checked_add(self.reward)
    }
}

/// Flattened view of a stake returned by detail queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StakeDetails {
    pub amount: u128,
    pub start_time: u64,
    pub unlock_time: u64,
    /// veZKL weight
    pub ve_zkl: u128,
    pub rewards: u128,
    /// Lock period in months
    pub stake_period: u32,
    pub apr: u32,
    pub claimed: bool,
}

impl From<&Stake> for StakeDetails {
    fn from(stake: &Stake) -> Self {
        Self {
            amount: stake.amount,
            start_time: stake.start_time,
            unlock_time: stake.unlock_time(),
            ve_zkl: stake.vote_weight,
            rewards: stake.reward,
            stake_period: stake.config.lock_duration_months,
            apr: stake.config.annual_percentage_rate,
            claimed: stake.claimed,
        }
    }
}

/// Amounts transferred by a successful unstake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePayout {
    pub principal: u128,
    pub reward: u128,
}
