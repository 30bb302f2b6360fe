//! ZKL Staking Ledger
//!
//! Users lock ZKL for a fixed period chosen from the stake table and are
//! granted veZKL voting weight plus a reward fixed at stake time. After the
//! lock elapses they unstake and receive principal plus reward in one
//! payout. Rewards come out of a pool the administrator funds; the ledger
//! never promises more than the pool holds.
//!
//! ## Operation ordering
//!
//! - `stake`: validate, plan, pull tokens, commit.
//! - `unstake`: validate, commit (claim flag and aggregates), push tokens.
//!   A failed push rolls both back.
//! - `fund_reward_pool`: authorize, plan, pull tokens, commit.
//!
//! Every mutation takes `&mut self`; [`SharedLedger`] adds a lock for
//! multi-threaded hosts.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use zkl_staking_common::{
    access_control::AdminControl,
    accountant::{LedgerDelta, LedgerState},
    check,
    config_table::StakeConfigTable,
    errors::{StakingError, StakingResult},
    events::{EventLog, StakingEvent},
    math::compute_stake_terms,
    token_ops::{AssetGateway, GatewayError},
    types::{Address, Stake, StakeConfig, StakeDetails, StakePayout, StakeStatus},
    validation::{require_non_zero_address, require_positive},
};

pub mod clock;
pub mod config;
pub mod shared;
pub mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, StakingConfig};
pub use shared::SharedLedger;
pub use snapshot::LedgerSnapshot;

/// Short hex form of an address for log fields
fn short(address: &Address) -> String {
    hex::encode(&address[..8])
}

fn rejected(operation: &'static str, caller: &Address, err: StakingError) -> StakingError {
    warn!(
        operation,
        caller = %short(caller),
        code = err.code(),
        error = %err,
        "operation rejected"
    );
    err
}

fn transfer_failed(from: Address, to: Address, amount: u128, cause: GatewayError) -> StakingError {
    warn!(
        from = %short(&from),
        to = %short(&to),
        amount,
        cause = %cause,
        "token transfer failed"
    );
    StakingError::TransferFailed { from, to, amount }
}

// ============ Ledger ============

/// The staking ledger: stake table, stakes, aggregates and the token
/// gateway they are backed by
pub struct StakingLedger<G: AssetGateway, C: Clock> {
    control: AdminControl,
    table: StakeConfigTable,
    state: LedgerState,
    stakes: BTreeMap<Address, Vec<Stake>>,
    gateway: G,
    clock: C,
    events: EventLog,
}

impl<G: AssetGateway, C: Clock> StakingLedger<G, C> {
    /// Empty ledger with an unfunded reward pool
    pub fn new(config: StakingConfig, gateway: G, clock: C) -> StakingResult<Self> {
        config.validate()?;
        check!(
            gateway.custody() == config.custody,
            StakingError::InvalidAddress { reason: "gateway custody does not match config" }
        );

        info!(
            admin = %short(&config.admin),
            custody = %short(&config.custody),
            configs = config.stake_configs.len(),
            "staking ledger created"
        );

        Ok(Self {
            control: AdminControl::new(config.admin)?,
            table: StakeConfigTable::new(config.stake_configs)?,
            state: LedgerState::new(),
            stakes: BTreeMap::new(),
            gateway,
            clock,
            events: EventLog::new(),
        })
    }

    /// Empty ledger with the default stake table
    pub fn with_defaults(admin: Address, gateway: G, clock: C) -> StakingResult<Self> {
        let custody = gateway.custody();
        Self::new(StakingConfig::new(admin, custody), gateway, clock)
    }

    /// Rebuild a ledger from a snapshot. The stake history must reconcile
    /// with the persisted aggregates.
    pub fn restore(snapshot: LedgerSnapshot, gateway: G, clock: C) -> StakingResult<Self> {
        let ledger = Self {
            control: AdminControl::new(snapshot.admin)?,
            table: StakeConfigTable::new(snapshot.stake_configs)?,
            state: snapshot.state,
            stakes: snapshot.stakes.into_iter().collect(),
            gateway,
            clock,
            events: EventLog::new(),
        };
        ledger.require_not_custody(&ledger.control.admin())?;
        ledger.check_invariants()?;

        info!(
            stakers = ledger.stakes.len(),
            total_staked = ledger.state.total_staked(),
            reward_pool = ledger.state.reward_pool(),
            "staking ledger restored"
        );
        Ok(ledger)
    }

    // ============ Mutations ============

    /// Lock `amount` under stake table entry `config_index`.
    ///
    /// Returns the index of the new stake in the user's list.
    pub fn stake(&mut self, user: &Address, amount: u128, config_index: u32) -> StakingResult<u64> {
        self.try_stake(user, amount, config_index)
            .map_err(|err| rejected("stake", user, err))
    }

    fn try_stake(&mut self, user: &Address, amount: u128, config_index: u32) -> StakingResult<u64> {
        self.require_not_custody(user)?;
        require_positive(amount)?;
        let config = self.table.lookup(config_index)?;
        let terms = compute_stake_terms(amount, &config)?;
        let plan = self.state.plan(&LedgerDelta::stake(*user, amount, &terms))?;
        debug!(
            user = %short(user),
            amount,
            config_index,
            vote_weight = terms.vote_weight,
            reward = terms.reward,
            "stake planned"
        );

        let custody = self.gateway.custody();
        self.gateway
            .pull(user, amount)
            .map_err(|cause| transfer_failed(*user, custody, amount, cause))?;

        let now = self.clock.now();
        self.state.commit(&plan);
        let stakes = self.stakes.entry(*user).or_default();
        let index = stakes.len() as u64;
        stakes.push(Stake {
            amount,
            start_time: now,
            vote_weight: terms.vote_weight,
            reward: terms.reward,
            config,
            config_index,
            claimed: false,
        });

        self.events.emit(StakingEvent::StakeCreated {
            user: *user,
            index,
            amount,
            config_index,
            timestamp: now,
        });
        info!(
            user = %short(user),
            index,
            amount,
            unlock_time = now.saturating_add(config.lock_duration_seconds()),
            "stake created"
        );
        self.debug_check_invariants();
        Ok(index)
    }

    /// Claim principal plus reward of an unlocked stake
    pub fn unstake(&mut self, user: &Address, index: u64) -> StakingResult<StakePayout> {
        self.try_unstake(user, index)
            .map_err(|err| rejected("unstake", user, err))
    }

    fn try_unstake(&mut self, user: &Address, index: u64) -> StakingResult<StakePayout> {
        let now = self.clock.now();
        let stake = self.stake_ref(user, index)?;
        check!(!stake.claimed, StakingError::AlreadyClaimed { user: *user, index });
        check!(
            stake.is_unlocked(now),
            StakingError::PeriodNotExpired { unlock_time: stake.unlock_time(), now }
        );

        let payout = StakePayout {
            principal: stake.amount,
            reward: stake.reward,
        };
        let total = stake.payout().ok_or(StakingError::Overflow)?;
        let plan = self.state.plan(&LedgerDelta::unstake(*user, stake))?;
        debug!(user = %short(user), index, total, "unstake planned");

        // Effects first: the payout is the last step
        self.state.commit(&plan);
        self.stake_mut(user, index)?.claimed = true;

        if let Err(cause) = self.gateway.push(user, total) {
            self.state.revert(&plan);
            self.stake_mut(user, index)?.claimed = false;
            let custody = self.gateway.custody();
            return Err(transfer_failed(custody, *user, total, cause));
        }

        self.events.emit(StakingEvent::StakeClaimed {
            user: *user,
            index,
            amount: payout.principal,
            reward: payout.reward,
            timestamp: now,
        });
        info!(
            user = %short(user),
            index,
            principal = payout.principal,
            reward = payout.reward,
            "stake claimed"
        );
        self.debug_check_invariants();
        Ok(payout)
    }

    /// Administrator top-up of the reward pool
    pub fn fund_reward_pool(&mut self, caller: &Address, amount: u128) -> StakingResult<()> {
        self.try_fund_reward_pool(caller, amount)
            .map_err(|err| rejected("fund_reward_pool", caller, err))
    }

    fn try_fund_reward_pool(&mut self, caller: &Address, amount: u128) -> StakingResult<()> {
        self.control.require_admin(caller)?;
        self.require_not_custody(caller)?;
        require_positive(amount)?;
        let plan = self.state.plan(&LedgerDelta::fund(amount))?;

        let custody = self.gateway.custody();
        self.gateway
            .pull(caller, amount)
            .map_err(|cause| transfer_failed(*caller, custody, amount, cause))?;
        self.state.commit(&plan);

        let now = self.clock.now();
        self.events.emit(StakingEvent::RewardPoolFunded {
            funder: *caller,
            amount,
            timestamp: now,
        });
        info!(
            amount,
            reward_pool = self.state.reward_pool(),
            surplus = self.state.surplus_rewards(),
            "reward pool funded"
        );
        self.debug_check_invariants();
        Ok(())
    }

    /// Replace table entry `index`, or append when `index` equals the table
    /// length. Existing stakes keep the config they were created with.
    pub fn set_stake_config(
        &mut self,
        caller: &Address,
        index: u32,
        config: StakeConfig,
    ) -> StakingResult<()> {
        self.try_set_stake_config(caller, index, config)
            .map_err(|err| rejected("set_stake_config", caller, err))
    }

    fn try_set_stake_config(
        &mut self,
        caller: &Address,
        index: u32,
        config: StakeConfig,
    ) -> StakingResult<()> {
        self.control.require_admin(caller)?;
        let previous = self.table.set(index, config)?;

        self.events.emit(StakingEvent::StakeConfigUpdated {
            index,
            previous,
            config,
            timestamp: self.clock.now(),
        });
        info!(
            index,
            lock_months = config.lock_duration_months,
            apr = config.annual_percentage_rate,
            "stake config updated"
        );
        Ok(())
    }

    /// Hand the administrator role to `new_admin`
    pub fn transfer_admin(&mut self, caller: &Address, new_admin: Address) -> StakingResult<()> {
        self.try_transfer_admin(caller, new_admin)
            .map_err(|err| rejected("transfer_admin", caller, err))
    }

    fn try_transfer_admin(&mut self, caller: &Address, new_admin: Address) -> StakingResult<()> {
        require_non_zero_address(&new_admin, "administrator cannot be the zero address")?;
        self.require_not_custody(&new_admin)?;
        let old_admin = self.control.transfer(caller, new_admin)?;

        self.events.emit(StakingEvent::AdminTransferred {
            old_admin,
            new_admin,
            timestamp: self.clock.now(),
        });
        info!(old = %short(&old_admin), new = %short(&new_admin), "administrator transferred");
        Ok(())
    }

    // ============ Queries ============

    /// All stakes of `user` in creation order, claimed ones included
    pub fn get_user_stakes(&self, user: &Address) -> &[Stake] {
        self.stakes.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_user_stake_details(&self, user: &Address, index: u64) -> StakingResult<StakeDetails> {
        self.stake_ref(user, index).map(StakeDetails::from)
    }

    pub fn stake_status(&self, user: &Address, index: u64) -> StakingResult<StakeStatus> {
        let now = self.clock.now();
        self.stake_ref(user, index).map(|stake| stake.status(now))
    }

    /// veZKL held by `user` across unclaimed stakes
    pub fn get_user_total_ve_zkl(&self, user: &Address) -> u128 {
        self.state.user_vote_weight(user)
    }

    pub fn get_total_locked_rewards(&self) -> u128 {
        self.state.total_locked_rewards()
    }

    pub fn get_total_staked_tokens(&self) -> u128 {
        self.state.total_staked()
    }

    pub fn get_reward_pool(&self) -> u128 {
        self.state.reward_pool()
    }

    pub fn stake_config(&self, index: u32) -> StakingResult<StakeConfig> {
        self.table.lookup(index)
    }

    pub fn stake_configs(&self) -> &[StakeConfig] {
        self.table.entries()
    }

    pub fn admin(&self) -> Address {
        self.control.admin()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Remove and return the events emitted so far
    pub fn take_events(&mut self) -> Vec<StakingEvent> {
        self.events.drain()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Direct access to the token service (minting and approvals in tests)
    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ============ Persistence ============

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            admin: self.control.admin(),
            stake_configs: self.table.entries().to_vec(),
            state: self.state.clone(),
            stakes: self
                .stakes
                .iter()
                .map(|(user, stakes)| (*user, stakes.clone()))
                .collect(),
        }
    }

    /// SHA-256 commitment over the encoded snapshot
    pub fn state_digest(&self) -> StakingResult<[u8; 32]> {
        self.snapshot().digest()
    }

    // ============ Invariants ============

    /// Recompute the aggregates from the stake history and compare
    pub fn check_invariants(&self) -> StakingResult<()> {
        self.state.verify_solvency()?;

        let mut total_staked: u128 = 0;
        let mut total_locked: u128 = 0;
        for (user, stakes) in &self.stakes {
            let mut weight: u128 = 0;
            for stake in stakes.iter().filter(|s| !s.claimed) {
                total_staked = total_staked
                    .checked_add(stake.amount)
                    .ok_or(StakingError::Overflow)?;
                total_locked = total_locked
                    .checked_add(stake.reward)
                    .ok_or(StakingError::Overflow)?;
                weight = weight
                    .checked_add(stake.vote_weight)
                    .ok_or(StakingError::Overflow)?;
            }
            check!(
                weight == self.state.user_vote_weight(user),
                StakingError::InvariantViolated { invariant: "user vote weight matches open stakes" }
            );
        }

        check!(
            total_staked == self.state.total_staked(),
            StakingError::InvariantViolated { invariant: "total staked matches open stakes" }
        );
        check!(
            total_locked == self.state.total_locked_rewards(),
            StakingError::InvariantViolated { invariant: "locked rewards match open stakes" }
        );
        check!(
            self.state.voters().all(|(user, _)| self.stakes.contains_key(user)),
            StakingError::InvariantViolated { invariant: "every voter has stakes" }
        );
        Ok(())
    }

    fn debug_check_invariants(&self) {
        debug_assert_eq!(self.check_invariants(), Ok(()));
    }

    // ============ Helpers ============

    /// A pull from custody into custody moves nothing
    fn require_not_custody(&self, account: &Address) -> StakingResult<()> {
        check!(
            *account != self.gateway.custody(),
            StakingError::InvalidAddress { reason: "custody account cannot stake or fund" }
        );
        Ok(())
    }

    fn stake_ref(&self, user: &Address, index: u64) -> StakingResult<&Stake> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.stakes.get(user)?.get(i))
            .ok_or(StakingError::StakeNotFound { user: *user, index })
    }

    fn stake_mut(&mut self, user: &Address, index: u64) -> StakingResult<&mut Stake> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.stakes.get_mut(user)?.get_mut(i))
            .ok_or(StakingError::StakeNotFound { user: *user, index })
    }
}

#[cfg(test)]
mod tests;
