//! Ledger persistence
//!
//! A [`LedgerSnapshot`] captures everything the ledger owns apart from the
//! gateway, the clock and the event log. It is borsh-encoded for storage;
//! the SHA-256 of that encoding is the ledger's state digest.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use zkl_staking_common::{
    accountant::LedgerState,
    errors::{StakingError, StakingResult},
    types::{Address, Stake, StakeConfig},
};

/// Point-in-time copy of the ledger state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LedgerSnapshot {
    pub admin: Address,
    pub stake_configs: Vec<StakeConfig>,
    pub state: LedgerState,
    /// Every user's stakes, claimed ones included, ordered by address
    pub stakes: Vec<(Address, Vec<Stake>)>,
}

impl LedgerSnapshot {
    pub fn to_bytes(&self) -> StakingResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|_| StakingError::InvalidSnapshot)
    }

    pub fn from_bytes(bytes: &[u8]) -> StakingResult<Self> {
        borsh::from_slice(bytes).map_err(|_| StakingError::InvalidSnapshot)
    }

    /// SHA-256 over the borsh encoding
    pub fn digest(&self) -> StakingResult<[u8; 32]> {
        let bytes = self.to_bytes()?;
        Ok(Sha256::digest(&bytes).into())
    }

    /// Number of stakes across all users
    pub fn stake_count(&self) -> usize {
        self.stakes.iter().map(|(_, stakes)| stakes.len()).sum()
    }
}
