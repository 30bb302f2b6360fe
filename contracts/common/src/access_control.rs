//! Access Control Module
//!
//! Single-administrator authorization. The administrator funds the reward
//! pool, edits the stake table and may hand the role to another address.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{StakingError, StakingResult};
use crate::types::Address;
use crate::validation::require_non_zero_address;

/// Holder of the administrator role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AdminControl {
    admin: Address,
}

impl AdminControl {
    pub fn new(admin: Address) -> StakingResult<Self> {
        require_non_zero_address(&admin, "administrator cannot be the zero address")?;
        Ok(Self { admin })
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn is_admin(&self, caller: &Address) -> bool {
        *caller == self.admin
    }

    /// Fail with `NotAuthorized` unless `caller` is the administrator
    pub fn require_admin(&self, caller: &Address) -> StakingResult<()> {
        crate::check!(
            self.is_admin(caller),
            StakingError::NotAuthorized {
                expected: self.admin,
                actual: *caller,
            }
        );
        Ok(())
    }

    /// Move the role to `new_admin`; returns the previous administrator
    pub fn transfer(&mut self, caller: &Address, new_admin: Address) -> StakingResult<Address> {
        self.require_admin(caller)?;
        require_non_zero_address(&new_admin, "new administrator cannot be the zero address")?;
        let previous = self.admin;
        self.admin = new_admin;
        Ok(previous)
    }
}
