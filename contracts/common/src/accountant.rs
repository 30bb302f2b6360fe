//! Pool Accountant
//!
//! Owns the ledger aggregates and is the only code that mutates them.
//! Every change goes through a two-phase contract:
//!
//! 1. `plan` computes all new values with checked arithmetic and checks
//!    solvency, touching nothing.
//! 2. `commit` writes the planned values; `revert` restores the values the
//!    plan started from (used when the token transfer behind an already
//!    committed plan fails).
//!
//! Invariant kept by every plan: `reward_pool >= total_locked_rewards`.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{StakingError, StakingResult};
use crate::math::StakeTerms;
use crate::types::{Address, Stake};
use crate::BTreeMap;

// ============ Deltas ============

/// Signed change to one aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Adjustment {
    #[default]
    Unchanged,
    Add(u128),
    Sub(u128),
}

impl Adjustment {
    fn apply(self, value: u128) -> StakingResult<u128> {
        match self {
            Adjustment::Unchanged => Ok(value),
            Adjustment::Add(amount) => value.checked_add(amount).ok_or(StakingError::Overflow),
            Adjustment::Sub(amount) => value.checked_sub(amount).ok_or(StakingError::Underflow),
        }
    }
}

/// One caller request: changes to apply together or not at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerDelta {
    pub total_staked: Adjustment,
    pub total_locked_rewards: Adjustment,
    pub reward_pool: Adjustment,
    /// Vote weight change and the user it applies to
    pub vote_weight: Option<(Address, Adjustment)>,
}

impl LedgerDelta {
    /// New stake: lock principal, promise reward, grant weight
    pub fn stake(user: Address, amount: u128, terms: &StakeTerms) -> Self {
        Self {
            total_staked: Adjustment::Add(amount),
            total_locked_rewards: Adjustment::Add(terms.reward),
            reward_pool: Adjustment::Unchanged,
            vote_weight: Some((user, Adjustment::Add(terms.vote_weight))),
        }
    }

    /// Claim: release principal, settle the reward out of the pool
    pub fn unstake(user: Address, stake: &Stake) -> Self {
        Self {
            total_staked: Adjustment::Sub(stake.amount),
            total_locked_rewards: Adjustment::Sub(stake.reward),
            reward_pool: Adjustment::Sub(stake.reward),
            vote_weight: Some((user, Adjustment::Sub(stake.vote_weight))),
        }
    }

    /// Administrator top-up of the reward pool
    pub fn fund(amount: u128) -> Self {
        Self {
            reward_pool: Adjustment::Add(amount),
            ..Self::default()
        }
    }
}

// ============ State ============

/// Scalar aggregates, before or after a planned update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Aggregates {
    pub total_staked: u128,
    pub total_locked_rewards: u128,
    pub reward_pool: u128,
}

/// Validated, not yet applied update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub before: Aggregates,
    pub after: Aggregates,
    /// (user, weight before, weight after)
    pub vote_weight: Option<(Address, u128, u128)>,
}

/// Process-wide ledger aggregates
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LedgerState {
    aggregates: Aggregates,
    user_vote_weight: BTreeMap<Address, u128>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_staked(&self) -> u128 {
        self.aggregates.total_staked
    }

    pub fn total_locked_rewards(&self) -> u128 {
        self.aggregates.total_locked_rewards
    }

    pub fn reward_pool(&self) -> u128 {
        self.aggregates.reward_pool
    }

    /// Sum of vote weight over the user's unclaimed stakes
    pub fn user_vote_weight(&self, user: &Address) -> u128 {
        self.user_vote_weight.get(user).copied().unwrap_or(0)
    }

    /// Users currently holding weight
    pub fn voters(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.user_vote_weight.iter()
    }

    /// Reward pool balance not yet promised to any stake
    pub fn surplus_rewards(&self) -> u128 {
        self.aggregates
            .reward_pool
            .saturating_sub(self.aggregates.total_locked_rewards)
    }

    /// Compute the result of `delta` without mutating
    pub fn plan(&self, delta: &LedgerDelta) -> StakingResult<PlannedUpdate> {
        let before = self.aggregates;

        let reward_pool = match delta.reward_pool {
            Adjustment::Sub(amount) if amount > before.reward_pool => {
                return Err(StakingError::InsufficientPool {
                    available: before.reward_pool,
                    required: amount,
                });
            }
            adjustment => adjustment.apply(before.reward_pool)?,
        };

        let after = Aggregates {
            total_staked: delta.total_staked.apply(before.total_staked)?,
            total_locked_rewards: delta
                .total_locked_rewards
                .apply(before.total_locked_rewards)?,
            reward_pool,
        };

        if after.reward_pool < after.total_locked_rewards {
            return Err(StakingError::InsufficientPool {
                available: after.reward_pool,
                required: after.total_locked_rewards,
            });
        }

        let vote_weight = match delta.vote_weight {
            Some((user, adjustment)) => {
                let current = self.user_vote_weight(&user);
                Some((user, current, adjustment.apply(current)?))
            }
            None => None,
        };

        Ok(PlannedUpdate {
            before,
            after,
            vote_weight,
        })
    }

    /// Write a planned update. The plan must have been made against the
    /// current state.
    pub fn commit(&mut self, plan: &PlannedUpdate) {
        debug_assert_eq!(self.aggregates, plan.before, "stale plan committed");
        self.aggregates = plan.after;
        if let Some((user, _, after)) = plan.vote_weight {
            self.set_vote_weight(user, after);
        }
    }

    /// Undo a committed plan
    pub fn revert(&mut self, plan: &PlannedUpdate) {
        debug_assert_eq!(self.aggregates, plan.after, "revert of uncommitted plan");
        self.aggregates = plan.before;
        if let Some((user, before, _)) = plan.vote_weight {
            self.set_vote_weight(user, before);
        }
    }

    /// Plan and commit in one step
    pub fn apply(&mut self, delta: &LedgerDelta) -> StakingResult<PlannedUpdate> {
        let plan = self.plan(delta)?;
        self.commit(&plan);
        Ok(plan)
    }

    pub fn verify_solvency(&self) -> StakingResult<()> {
        crate::check!(
            self.aggregates.reward_pool >= self.aggregates.total_locked_rewards,
            StakingError::InvariantViolated { invariant: "reward pool covers locked rewards" }
        );
        Ok(())
    }

    fn set_vote_weight(&mut self, user: Address, weight: u128) {
        if weight == 0 {
            self.user_vote_weight.remove(&user);
        } else {
            self.user_vote_weight.insert(user, weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StakeConfig;

    const ALICE: Address = [2u8; 32];

    fn terms(vote_weight: u128, reward: u128) -> StakeTerms {
        StakeTerms { vote_weight, reward }
    }

    fn stake(amount: u128, vote_weight: u128, reward: u128) -> Stake {
        Stake {
            amount,
            start_time: 0,
            vote_weight,
            reward,
            config: StakeConfig::new(3, 12),
            config_index: 0,
            claimed: false,
        }
    }

    #[test]
    fn test_fund_then_stake_then_unstake() {
        let mut state = LedgerState::new();
        state.apply(&LedgerDelta::fund(1_000_000)).unwrap();
        assert_eq!(state.reward_pool(), 1_000_000);

        state.apply(&LedgerDelta::stake(ALICE, 1_000, &terms(2, 30))).unwrap();
        assert_eq!(state.total_staked(), 1_000);
        assert_eq!(state.total_locked_rewards(), 30);
        assert_eq!(state.user_vote_weight(&ALICE), 2);
        assert_eq!(state.surplus_rewards(), 999_970);

        state.apply(&LedgerDelta::unstake(ALICE, &stake(1_000, 2, 30))).unwrap();
        assert_eq!(state.total_staked(), 0);
        assert_eq!(state.total_locked_rewards(), 0);
        assert_eq!(state.reward_pool(), 999_970);
        assert_eq!(state.user_vote_weight(&ALICE), 0);
        assert_eq!(state.voters().count(), 0);
    }

    #[test]
    fn test_stake_beyond_pool_is_insolvent() {
        let mut state = LedgerState::new();
        state.apply(&LedgerDelta::fund(29)).unwrap();

        let result = state.plan(&LedgerDelta::stake(ALICE, 1_000, &terms(2, 30)));
        assert_eq!(
            result,
            Err(StakingError::InsufficientPool { available: 29, required: 30 })
        );
        assert_eq!(state.total_staked(), 0);
    }

    #[test]
    fn test_pool_decrement_beyond_balance() {
        let state = LedgerState::new();
        let result = state.plan(&LedgerDelta::unstake(ALICE, &stake(1_000, 2, 30)));
        assert_eq!(
            result,
            Err(StakingError::InsufficientPool { available: 0, required: 30 })
        );
    }

    #[test]
    fn test_plan_does_not_mutate() {
        let mut state = LedgerState::new();
        state.apply(&LedgerDelta::fund(100)).unwrap();
        let snapshot = state.clone();

        let plan = state.plan(&LedgerDelta::stake(ALICE, 500, &terms(1, 10))).unwrap();
        assert_eq!(state, snapshot);
        assert_eq!(plan.after.total_staked, 500);
        assert_eq!(plan.vote_weight, Some((ALICE, 0, 1)));
    }

    #[test]
    fn test_revert_restores_previous_values() {
        let mut state = LedgerState::new();
        state.apply(&LedgerDelta::fund(100)).unwrap();
        state.apply(&LedgerDelta::stake(ALICE, 500, &terms(1, 10))).unwrap();
        let before = state.clone();

        let plan = state.apply(&LedgerDelta::unstake(ALICE, &stake(500, 1, 10))).unwrap();
        assert_eq!(state.user_vote_weight(&ALICE), 0);

        state.revert(&plan);
        assert_eq!(state, before);
    }

    #[test]
    fn test_underflow_on_missing_stake() {
        let mut state = LedgerState::new();
        state.apply(&LedgerDelta::fund(100)).unwrap();
        let result = state.plan(&LedgerDelta::unstake(ALICE, &stake(500, 1, 10)));
        assert_eq!(result, Err(StakingError::Underflow));
    }

    #[test]
    fn test_verify_solvency() {
        let mut state = LedgerState::new();
        assert!(state.verify_solvency().is_ok());
        state.apply(&LedgerDelta::fund(10)).unwrap();
        state.apply(&LedgerDelta::stake(ALICE, 100, &terms(0, 10))).unwrap();
        assert!(state.verify_solvency().is_ok());
        assert_eq!(state.surplus_rewards(), 0);
    }
}
