//! Deploy-time ledger configuration
//!
//! ```json
//! {
//!   "admin": "0x0101...01",
//!   "custody": "0x0909...09",
//!   "stake_configs": [
//!     { "lock_duration_months": 3, "annual_percentage_rate": 12 }
//!   ]
//! }
//! ```
//!
//! `stake_configs` is optional and defaults to the built-in table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use zkl_staking_common::{
    check,
    config_table::StakeConfigTable,
    errors::StakingError,
    types::{Address, StakeConfig},
    validation::{require_non_zero_address, validate_stake_config},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed staking config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid staking config: {0}")]
    Invalid(#[from] StakingError),
}

/// Administrator and stake table the ledger starts with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    #[serde(with = "hex_address")]
    pub admin: Address,
    /// Gateway account holding principal and the reward pool
    #[serde(with = "hex_address")]
    pub custody: Address,
    #[serde(default = "default_stake_configs")]
    pub stake_configs: Vec<StakeConfig>,
}

fn default_stake_configs() -> Vec<StakeConfig> {
    StakeConfigTable::default().entries().to_vec()
}

impl StakingConfig {
    /// Default stake table with the given administrator and custody account
    pub fn new(admin: Address, custody: Address) -> Self {
        Self {
            admin,
            custody,
            stake_configs: default_stake_configs(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), StakingError> {
        require_non_zero_address(&self.admin, "administrator cannot be the zero address")?;
        require_non_zero_address(&self.custody, "custody cannot be the zero address")?;
        check!(
            self.admin != self.custody,
            StakingError::InvalidAddress { reason: "administrator cannot be the custody account" }
        );
        for config in &self.stake_configs {
            validate_stake_config(config)?;
        }
        Ok(())
    }
}

/// Addresses as 64 hex characters, `0x` prefix optional
mod hex_address {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use zkl_staking_common::types::Address;

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(address)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits = text.strip_prefix("0x").unwrap_or(&text);
        let mut address = [0u8; 32];
        hex::decode_to_slice(digits, &mut address).map_err(D::Error::custom)?;
        Ok(address)
    }
}
