//! Stake Configuration Table
//!
//! Maps a period selector to `(lock_duration_months, annual_percentage_rate)`.
//! Stakes copy the entry they were created under, so edits here never
//! reach existing stakes.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::staking::DEFAULT_STAKE_CONFIGS;
use crate::errors::{StakingError, StakingResult};
use crate::types::StakeConfig;
use crate::validation::validate_stake_config;
use crate::Vec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StakeConfigTable {
    configs: Vec<StakeConfig>,
}

impl Default for StakeConfigTable {
    fn default() -> Self {
        Self {
            configs: DEFAULT_STAKE_CONFIGS
                .iter()
                .map(|&(months, apr)| StakeConfig::new(months, apr))
                .collect(),
        }
    }
}

impl StakeConfigTable {
    /// Build a table from explicit entries, validating each one
    pub fn new(configs: Vec<StakeConfig>) -> StakingResult<Self> {
        for config in &configs {
            validate_stake_config(config)?;
        }
        Ok(Self { configs })
    }

    /// Resolve a selector
    pub fn lookup(&self, index: u32) -> StakingResult<StakeConfig> {
        self.configs
            .get(index as usize)
            .copied()
            .ok_or(StakingError::InvalidConfigIndex {
                index,
                len: self.len(),
            })
    }

    /// Replace the entry at `index`, or append when `index == len`.
    /// Returns the previous entry when one was replaced.
    pub fn set(&mut self, index: u32, config: StakeConfig) -> StakingResult<Option<StakeConfig>> {
        validate_stake_config(&config)?;

        let len = self.len();
        if index < len {
            let slot = &mut self.configs[index as usize];
            let previous = *slot;
            *slot = config;
            Ok(Some(previous))
        } else if index == len {
            self.configs.push(config);
            Ok(None)
        } else {
            Err(StakingError::InvalidConfigIndex { index, len })
        }
    }

    pub fn len(&self) -> u32 {
        self.configs.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn entries(&self) -> &[StakeConfig] {
        &self.configs
    }
}
