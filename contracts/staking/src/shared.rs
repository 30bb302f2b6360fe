//! Thread-safe ledger handle
//!
//! Mutations hold the write lock for their whole duration, gateway call
//! included, so no other caller observes a half-applied operation. Queries
//! take the read lock and return owned values.

use std::sync::Arc;

use parking_lot::RwLock;

use zkl_staking_common::{
    errors::StakingResult,
    token_ops::AssetGateway,
    types::{Address, Stake, StakeConfig, StakeDetails, StakePayout, StakeStatus},
};

use crate::{Clock, LedgerSnapshot, StakingLedger};

/// Cloneable handle to one ledger
pub struct SharedLedger<G: AssetGateway, C: Clock> {
    inner: Arc<RwLock<StakingLedger<G, C>>>,
}

impl<G: AssetGateway, C: Clock> Clone for SharedLedger<G, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: AssetGateway, C: Clock> SharedLedger<G, C> {
    pub fn new(ledger: StakingLedger<G, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn stake(&self, user: &Address, amount: u128, config_index: u32) -> StakingResult<u64> {
        self.inner.write().stake(user, amount, config_index)
    }

    pub fn unstake(&self, user: &Address, index: u64) -> StakingResult<StakePayout> {
        self.inner.write().unstake(user, index)
    }

    pub fn fund_reward_pool(&self, caller: &Address, amount: u128) -> StakingResult<()> {
        self.inner.write().fund_reward_pool(caller, amount)
    }

    pub fn set_stake_config(
        &self,
        caller: &Address,
        index: u32,
        config: StakeConfig,
    ) -> StakingResult<()> {
        self.inner.write().set_stake_config(caller, index, config)
    }

    pub fn transfer_admin(&self, caller: &Address, new_admin: Address) -> StakingResult<()> {
        self.inner.write().transfer_admin(caller, new_admin)
    }

    pub fn get_user_stakes(&self, user: &Address) -> Vec<Stake> {
        self.inner.read().get_user_stakes(user).to_vec()
    }

    pub fn get_user_stake_details(&self, user: &Address, index: u64) -> StakingResult<StakeDetails> {
        self.inner.read().get_user_stake_details(user, index)
    }

    pub fn stake_status(&self, user: &Address, index: u64) -> StakingResult<StakeStatus> {
        self.inner.read().stake_status(user, index)
    }

    pub fn get_user_total_ve_zkl(&self, user: &Address) -> u128 {
        self.inner.read().get_user_total_ve_zkl(user)
    }

    pub fn get_total_locked_rewards(&self) -> u128 {
        self.inner.read().get_total_locked_rewards()
    }

    pub fn get_total_staked_tokens(&self) -> u128 {
        self.inner.read().get_total_staked_tokens()
    }

    pub fn get_reward_pool(&self) -> u128 {
        self.inner.read().get_reward_pool()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.read().snapshot()
    }

    pub fn check_invariants(&self) -> StakingResult<()> {
        self.inner.read().check_invariants()
    }

    /// Several reads under one lock
    pub fn read<R>(&self, f: impl FnOnce(&StakingLedger<G, C>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Exclusive access for setup outside the ledger operations
    pub fn write<R>(&self, f: impl FnOnce(&mut StakingLedger<G, C>) -> R) -> R {
        f(&mut self.inner.write())
    }
}
