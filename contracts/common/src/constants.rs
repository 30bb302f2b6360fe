//! Protocol Constants
//!
//! All fixed values for the ZKL staking ledger. Deploy-time values
//! (administrator, custody account, stake table) live in the ledger's
//! `StakingConfig` instead.

/// Token Metadata
pub mod token {
    /// Decimal places (ERC-20 style)
    pub const DECIMALS: u8 = 18;
    /// One unit with decimals (1 ZKL = 10^18 base units)
    pub const ONE: u128 = 1_000_000_000_000_000_000;
}

/// Time Configuration
///
/// Lock periods are expressed in months; a month is a fixed 30 days so
/// that a 3-month stake unlocks after exactly 90 days.
pub mod time {
    /// Seconds per day
    pub const SECONDS_PER_DAY: u64 = 86_400;

    /// Days per lock month
    pub const DAYS_PER_MONTH: u64 = 30;

    /// Seconds per lock month (30 days)
    pub const SECONDS_PER_MONTH: u64 = DAYS_PER_MONTH * SECONDS_PER_DAY;
}

/// Reward Configuration
pub mod reward {
    /// Months per year (annualization divisor)
    pub const MONTHS_PER_YEAR: u128 = 12;

    /// Percentage divisor (APR is an integer percentage)
    pub const PERCENT: u128 = 100;

    /// Combined single truncating divisor: 12 * 100
    pub const REWARD_DENOMINATOR: u128 = MONTHS_PER_YEAR * PERCENT;
}

/// Stake Table Limits
pub mod staking {
    /// Longest lock period an administrator may configure (4 years)
    pub const MAX_LOCK_MONTHS: u32 = 48;

    /// Highest APR an administrator may configure (1000%)
    pub const MAX_APR_PERCENT: u32 = 1_000;

    /// Default stake table: (lock months, APR percent)
    pub const DEFAULT_STAKE_CONFIGS: [(u32, u32); 3] = [
        (3, 12),
        (6, 15),
        (12, 20),
    ];
}
