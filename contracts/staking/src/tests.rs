//! Ledger tests
//!
//! Full stake lifecycle against the in-memory token, failure atomicity with
//! a gateway that can be told to refuse transfers, administrator actions and
//! snapshot restore.

use super::*;
use zkl_staking_common::constants::time::SECONDS_PER_DAY;
use zkl_staking_common::constants::token::ONE;
use zkl_staking_common::events::EventType;
use zkl_staking_common::token_ops::InMemoryToken;

const ADMIN: Address = [1u8; 32];
const ALICE: Address = [2u8; 32];
const BOB: Address = [3u8; 32];
const CUSTODY: Address = [9u8; 32];
const START: u64 = 1_700_000_000;
const NINETY_DAYS: u64 = 90 * SECONDS_PER_DAY;

/// In-memory token that can be switched to refuse pulls or pushes
#[derive(Debug, Clone)]
struct SwitchableGateway {
    token: InMemoryToken,
    fail_pulls: bool,
    fail_pushes: bool,
}

impl SwitchableGateway {
    fn new() -> Self {
        Self {
            token: InMemoryToken::new(CUSTODY),
            fail_pulls: false,
            fail_pushes: false,
        }
    }
}

impl AssetGateway for SwitchableGateway {
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), GatewayError> {
        if self.fail_pulls {
            return Err(GatewayError::Rejected { reason: "pulls disabled" });
        }
        self.token.pull(from, amount)
    }

    fn push(&mut self, to: &Address, amount: u128) -> Result<(), GatewayError> {
        if self.fail_pushes {
            return Err(GatewayError::Rejected { reason: "pushes disabled" });
        }
        self.token.push(to, amount)
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.token.balance_of(account)
    }

    fn custody(&self) -> Address {
        self.token.custody()
    }
}

type TestLedger = StakingLedger<SwitchableGateway, ManualClock>;

fn create_ledger() -> (TestLedger, ManualClock) {
    let clock = ManualClock::new(START);
    let ledger = StakingLedger::with_defaults(ADMIN, SwitchableGateway::new(), clock.clone()).unwrap();
    (ledger, clock)
}

/// Mint `amount` to `who` and approve the ledger to pull it
fn give(ledger: &mut TestLedger, who: &Address, amount: u128) {
    let token = &mut ledger.gateway_mut().token;
    token.mint(who, amount).unwrap();
    let allowance = token.allowance(who, &CUSTODY);
    token.approve(who, &CUSTODY, allowance + amount);
}

fn funded_ledger(pool: u128) -> (TestLedger, ManualClock) {
    let (mut ledger, clock) = create_ledger();
    give(&mut ledger, &ADMIN, pool);
    ledger.fund_reward_pool(&ADMIN, pool).unwrap();
    (ledger, clock)
}

fn custody_reconciles(ledger: &TestLedger) -> bool {
    ledger.gateway().balance_of(&CUSTODY)
        == ledger.get_total_staked_tokens() + ledger.get_reward_pool()
}

// ============ Reference scenario ============

#[test]
fn test_stake_and_unstake_scenario() {
    let (mut ledger, clock) = funded_ledger(1_000_000);
    give(&mut ledger, &ALICE, 1_000);

    let index = ledger.stake(&ALICE, 1_000, 0).unwrap();
    assert_eq!(index, 0);
    assert_eq!(ledger.get_user_total_ve_zkl(&ALICE), 2);
    assert_eq!(ledger.get_total_locked_rewards(), 30);
    assert_eq!(ledger.get_total_staked_tokens(), 1_000);
    assert_eq!(ledger.gateway().balance_of(&ALICE), 0);

    // Too early
    assert_eq!(
        ledger.unstake(&ALICE, 0),
        Err(StakingError::PeriodNotExpired { unlock_time: START + NINETY_DAYS, now: START })
    );

    clock.advance(NINETY_DAYS);
    let payout = ledger.unstake(&ALICE, 0).unwrap();
    assert_eq!(payout, StakePayout { principal: 1_000, reward: 30 });

    assert_eq!(ledger.gateway().balance_of(&ALICE), 1_030);
    assert_eq!(ledger.get_reward_pool(), 999_970);
    assert_eq!(ledger.get_total_locked_rewards(), 0);
    assert_eq!(ledger.get_total_staked_tokens(), 0);
    assert_eq!(ledger.get_user_total_ve_zkl(&ALICE), 0);
    assert!(ledger.get_user_stakes(&ALICE)[0].claimed);

    // Claim is idempotent
    assert_eq!(
        ledger.unstake(&ALICE, 0),
        Err(StakingError::AlreadyClaimed { user: ALICE, index: 0 })
    );
    assert_eq!(ledger.gateway().balance_of(&ALICE), 1_030);
    assert_eq!(ledger.get_reward_pool(), 999_970);
    assert_eq!(ledger.get_total_staked_tokens(), 0);
    assert_eq!(ledger.get_total_locked_rewards(), 0);
    assert!(custody_reconciles(&ledger));
}

#[test]
fn test_scaled_amounts() {
    let (mut ledger, clock) = funded_ledger(1_000_000 * ONE);
    give(&mut ledger, &ALICE, 1_000 * ONE);

    ledger.stake(&ALICE, 1_000 * ONE, 0).unwrap();
    assert_eq!(ledger.get_user_total_ve_zkl(&ALICE), 2_500_000_000_000_000_000);
    assert_eq!(ledger.get_total_locked_rewards(), 30 * ONE);

    clock.advance(NINETY_DAYS);
    ledger.unstake(&ALICE, 0).unwrap();
    assert_eq!(ledger.gateway().balance_of(&ALICE), 1_030 * ONE);
    assert_eq!(ledger.get_reward_pool(), 999_970 * ONE);
}

#[test]
fn test_unlock_boundary_is_inclusive() {
    let (mut ledger, clock) = funded_ledger(1_000);
    give(&mut ledger, &ALICE, 1_000);
    ledger.stake(&ALICE, 1_000, 0).unwrap();

    clock.advance(NINETY_DAYS - 1);
    assert_eq!(ledger.stake_status(&ALICE, 0), Ok(StakeStatus::Active));
    assert!(matches!(
        ledger.unstake(&ALICE, 0),
        Err(StakingError::PeriodNotExpired { .. })
    ));

    clock.advance(1);
    assert_eq!(ledger.stake_status(&ALICE, 0), Ok(StakeStatus::Unlockable));
    assert!(ledger.unstake(&ALICE, 0).is_ok());
    assert_eq!(ledger.stake_status(&ALICE, 0), Ok(StakeStatus::Claimed));
}

// ============ Stake validation ============

#[test]
fn test_stake_rejections_change_nothing() {
    let (mut ledger, _) = funded_ledger(1_000);
    give(&mut ledger, &ALICE, 1_000);
    let digest = ledger.state_digest().unwrap();

    assert_eq!(ledger.stake(&ALICE, 0, 0), Err(StakingError::ZeroAmount));
    assert_eq!(
        ledger.stake(&ALICE, 1_000, 3),
        Err(StakingError::InvalidConfigIndex { index: 3, len: 3 })
    );

    assert_eq!(ledger.state_digest().unwrap(), digest);
    assert_eq!(ledger.gateway().balance_of(&ALICE), 1_000);
    assert!(ledger.get_user_stakes(&ALICE).is_empty());
}

#[test]
fn test_stake_requires_pool_coverage() {
    let (mut ledger, _) = funded_ledger(29);
    give(&mut ledger, &ALICE, 1_000);

    assert_eq!(
        ledger.stake(&ALICE, 1_000, 0),
        Err(StakingError::InsufficientPool { available: 29, required: 30 })
    );
    assert_eq!(ledger.gateway().balance_of(&ALICE), 1_000);

    // Topping up makes the same stake acceptable
    give(&mut ledger, &ADMIN, 1);
    ledger.fund_reward_pool(&ADMIN, 1).unwrap();
    assert!(ledger.stake(&ALICE, 1_000, 0).is_ok());
}

#[test]
fn test_failed_pull_commits_nothing() {
    let (mut ledger, _) = funded_ledger(1_000);
    ledger.gateway_mut().token.mint(&ALICE, 1_000).unwrap();
    let digest = ledger.state_digest().unwrap();
    let events = ledger.events().len();

    // No allowance granted
    assert_eq!(
        ledger.stake(&ALICE, 1_000, 0),
        Err(StakingError::TransferFailed { from: ALICE, to: CUSTODY, amount: 1_000 })
    );
    assert_eq!(ledger.state_digest().unwrap(), digest);
    assert_eq!(ledger.events().len(), events);

    ledger.gateway_mut().fail_pulls = true;
    ledger.gateway_mut().token.approve(&ALICE, &CUSTODY, 1_000);
    assert!(matches!(
        ledger.stake(&ALICE, 1_000, 0),
        Err(StakingError::TransferFailed { .. })
    ));
    assert_eq!(ledger.state_digest().unwrap(), digest);
}

#[test]
fn test_multiple_stakes_accumulate_weight() {
    let (mut ledger, clock) = funded_ledger(1_000_000);
    give(&mut ledger, &ALICE, 3_600);

    assert_eq!(ledger.stake(&ALICE, 1_200, 0).unwrap(), 0);
    assert_eq!(ledger.stake(&ALICE, 2_400, 2).unwrap(), 1);

    // 1200*3/1200 + 2400*12/1200
    assert_eq!(ledger.get_user_total_ve_zkl(&ALICE), 3 + 24);
    // 1200*12*3/1200 + 2400*20*12/1200
    assert_eq!(ledger.get_total_locked_rewards(), 36 + 480);

    clock.advance(NINETY_DAYS);
    ledger.unstake(&ALICE, 0).unwrap();
    assert_eq!(ledger.get_user_total_ve_zkl(&ALICE), 24);
    assert_eq!(ledger.stake_status(&ALICE, 1), Ok(StakeStatus::Active));
    assert_eq!(ledger.check_invariants(), Ok(()));
}

// ============ Unstake ============

#[test]
fn test_unstake_unknown_stake() {
    let (mut ledger, _) = funded_ledger(1_000);
    assert_eq!(
        ledger.unstake(&ALICE, 0),
        Err(StakingError::StakeNotFound { user: ALICE, index: 0 })
    );

    give(&mut ledger, &ALICE, 1_000);
    ledger.stake(&ALICE, 1_000, 0).unwrap();
    assert_eq!(
        ledger.unstake(&ALICE, 1),
        Err(StakingError::StakeNotFound { user: ALICE, index: 1 })
    );
    assert_eq!(
        ledger.unstake(&BOB, 0),
        Err(StakingError::StakeNotFound { user: BOB, index: 0 })
    );
}

#[test]
fn test_failed_payout_rolls_back_claim() {
    let (mut ledger, clock) = funded_ledger(1_000);
    give(&mut ledger, &ALICE, 1_000);
    ledger.stake(&ALICE, 1_000, 0).unwrap();
    clock.advance(NINETY_DAYS);

    let digest = ledger.state_digest().unwrap();
    ledger.gateway_mut().fail_pushes = true;

    assert_eq!(
        ledger.unstake(&ALICE, 0),
        Err(StakingError::TransferFailed { from: CUSTODY, to: ALICE, amount: 1_030 })
    );
    assert_eq!(ledger.state_digest().unwrap(), digest);
    assert!(!ledger.get_user_stakes(&ALICE)[0].claimed);
    assert_eq!(ledger.get_user_total_ve_zkl(&ALICE), 2);
    assert!(ledger.events().filter_by_type(EventType::StakeClaimed).is_empty());

    // The stake stays claimable once the token recovers
    ledger.gateway_mut().fail_pushes = false;
    assert_eq!(
        ledger.unstake(&ALICE, 0),
        Ok(StakePayout { principal: 1_000, reward: 30 })
    );
    assert!(custody_reconciles(&ledger));
}

// ============ Reward pool ============

#[test]
fn test_fund_reward_pool_rules() {
    let (mut ledger, _) = create_ledger();
    give(&mut ledger, &ALICE, 500);
    give(&mut ledger, &ADMIN, 500);

    assert_eq!(
        ledger.fund_reward_pool(&ALICE, 500),
        Err(StakingError::NotAuthorized { expected: ADMIN, actual: ALICE })
    );
    assert_eq!(ledger.fund_reward_pool(&ADMIN, 0), Err(StakingError::ZeroAmount));

    ledger.gateway_mut().fail_pulls = true;
    assert!(matches!(
        ledger.fund_reward_pool(&ADMIN, 500),
        Err(StakingError::TransferFailed { .. })
    ));
    assert_eq!(ledger.get_reward_pool(), 0);

    ledger.gateway_mut().fail_pulls = false;
    ledger.fund_reward_pool(&ADMIN, 500).unwrap();
    assert_eq!(ledger.get_reward_pool(), 500);
    assert_eq!(ledger.gateway().balance_of(&CUSTODY), 500);
    assert!(matches!(
        ledger.events().last(),
        Some(StakingEvent::RewardPoolFunded { funder: ADMIN, amount: 500, timestamp: START })
    ));
}

// ============ Administration ============

#[test]
fn test_config_edit_keeps_existing_stakes() {
    let (mut ledger, clock) = funded_ledger(1_000_000);
    give(&mut ledger, &ALICE, 2_000);
    ledger.stake(&ALICE, 1_000, 0).unwrap();

    ledger
        .set_stake_config(&ADMIN, 0, StakeConfig::new(3, 1))
        .unwrap();
    assert_eq!(ledger.get_user_stakes(&ALICE)[0].config, StakeConfig::new(3, 12));

    ledger.stake(&ALICE, 1_000, 0).unwrap();
    let details = ledger.get_user_stake_details(&ALICE, 1).unwrap();
    assert_eq!(details.apr, 1);
    assert_eq!(details.rewards, 2);

    clock.advance(NINETY_DAYS);
    assert_eq!(ledger.unstake(&ALICE, 0).unwrap().reward, 30);
    assert_eq!(ledger.unstake(&ALICE, 1).unwrap().reward, 2);
}

#[test]
fn test_set_stake_config_rules() {
    let (mut ledger, _) = create_ledger();

    assert!(matches!(
        ledger.set_stake_config(&ALICE, 0, StakeConfig::new(3, 1)),
        Err(StakingError::NotAuthorized { .. })
    ));
    assert!(matches!(
        ledger.set_stake_config(&ADMIN, 0, StakeConfig::new(0, 1)),
        Err(StakingError::InvalidStakeConfig { .. })
    ));

    ledger.set_stake_config(&ADMIN, 3, StakeConfig::new(24, 30)).unwrap();
    assert_eq!(ledger.stake_config(3), Ok(StakeConfig::new(24, 30)));
    assert_eq!(ledger.stake_configs().len(), 4);

    assert_eq!(
        ledger.set_stake_config(&ADMIN, 5, StakeConfig::new(24, 30)),
        Err(StakingError::InvalidConfigIndex { index: 5, len: 4 })
    );
    assert!(matches!(
        ledger.events().last(),
        Some(StakingEvent::StakeConfigUpdated { index: 3, previous: None, .. })
    ));
}

#[test]
fn test_transfer_admin() {
    let (mut ledger, _) = create_ledger();

    assert!(matches!(
        ledger.transfer_admin(&ALICE, BOB),
        Err(StakingError::NotAuthorized { .. })
    ));
    assert!(matches!(
        ledger.transfer_admin(&ADMIN, [0u8; 32]),
        Err(StakingError::InvalidAddress { .. })
    ));

    ledger.transfer_admin(&ADMIN, BOB).unwrap();
    assert_eq!(ledger.admin(), BOB);

    give(&mut ledger, &ADMIN, 10);
    assert!(matches!(
        ledger.fund_reward_pool(&ADMIN, 10),
        Err(StakingError::NotAuthorized { .. })
    ));
    assert_eq!(ledger.events().filter_by_type(EventType::AdminTransferred).len(), 1);
}

#[test]
fn test_custody_cannot_be_admin() {
    let config = StakingConfig::new(CUSTODY, CUSTODY);
    let result = StakingLedger::new(config, SwitchableGateway::new(), ManualClock::new(START));
    assert!(matches!(result, Err(StakingError::InvalidAddress { .. })));

    let (mut ledger, _) = create_ledger();
    assert!(matches!(
        ledger.transfer_admin(&ADMIN, CUSTODY),
        Err(StakingError::InvalidAddress { .. })
    ));
    assert_eq!(ledger.admin(), ADMIN);
}

#[test]
fn test_custody_cannot_stake_or_fund() {
    let (mut ledger, _) = funded_ledger(1_000);
    ledger.gateway_mut().token.mint(&CUSTODY, 1_000).unwrap();
    let digest = ledger.state_digest().unwrap();

    assert!(matches!(
        ledger.stake(&CUSTODY, 1_000, 0),
        Err(StakingError::InvalidAddress { .. })
    ));
    assert_eq!(ledger.state_digest().unwrap(), digest);
    assert!(ledger.get_user_stakes(&CUSTODY).is_empty());

    // A snapshot naming custody as administrator is refused too
    let mut snapshot = ledger.snapshot();
    snapshot.admin = CUSTODY;
    let restored = StakingLedger::restore(snapshot, ledger.gateway().clone(), ManualClock::new(START));
    assert!(matches!(restored, Err(StakingError::InvalidAddress { .. })));

    assert!(ledger.fund_reward_pool(&CUSTODY, 1_000).is_err());
    assert_eq!(ledger.get_reward_pool(), 1_000);
    assert_eq!(ledger.gateway().balance_of(&CUSTODY), 2_000);
}

#[test]
fn test_custody_mismatch_rejected() {
    let config = StakingConfig::new(ADMIN, [8u8; 32]);
    let result = StakingLedger::new(config, SwitchableGateway::new(), ManualClock::new(START));
    assert!(matches!(result, Err(StakingError::InvalidAddress { .. })));
}

// ============ Queries and events ============

#[test]
fn test_stake_details() {
    let (mut ledger, _) = funded_ledger(1_000);
    give(&mut ledger, &ALICE, 1_000);
    ledger.stake(&ALICE, 1_000, 0).unwrap();

    let details = ledger.get_user_stake_details(&ALICE, 0).unwrap();
    assert_eq!(
        details,
        StakeDetails {
            amount: 1_000,
            start_time: START,
            unlock_time: START + NINETY_DAYS,
            ve_zkl: 2,
            rewards: 30,
            stake_period: 3,
            apr: 12,
            claimed: false,
        }
    );
    assert_eq!(
        ledger.get_user_stake_details(&ALICE, 7),
        Err(StakingError::StakeNotFound { user: ALICE, index: 7 })
    );
    assert!(ledger.get_user_stakes(&BOB).is_empty());
}

#[test]
fn test_events_follow_committed_mutations() {
    let (mut ledger, clock) = funded_ledger(1_000);
    give(&mut ledger, &ALICE, 1_000);
    ledger.stake(&ALICE, 1_000, 0).unwrap();
    clock.advance(NINETY_DAYS);
    ledger.unstake(&ALICE, 0).unwrap();
    let _ = ledger.unstake(&ALICE, 0);

    let events = ledger.take_events();
    assert_eq!(
        events.iter().map(StakingEvent::event_type).collect::<Vec<_>>(),
        vec![EventType::RewardPoolFunded, EventType::StakeCreated, EventType::StakeClaimed]
    );
    assert_eq!(
        events[2],
        StakingEvent::StakeClaimed {
            user: ALICE,
            index: 0,
            amount: 1_000,
            reward: 30,
            timestamp: START + NINETY_DAYS,
        }
    );
    assert!(ledger.events().is_empty());
}

// ============ Persistence ============

#[test]
fn test_snapshot_restore() {
    let (mut ledger, clock) = funded_ledger(1_000_000);
    give(&mut ledger, &ALICE, 5_000);
    give(&mut ledger, &BOB, 5_000);
    ledger.stake(&ALICE, 5_000, 1).unwrap();
    ledger.stake(&BOB, 2_000, 0).unwrap();
    clock.advance(NINETY_DAYS);
    ledger.unstake(&BOB, 0).unwrap();

    let bytes = ledger.snapshot().to_bytes().unwrap();
    let snapshot = LedgerSnapshot::from_bytes(&bytes).unwrap();
    let restored =
        StakingLedger::restore(snapshot, ledger.gateway().clone(), clock.clone()).unwrap();

    assert_eq!(restored.state_digest(), ledger.state_digest());
    assert_eq!(restored.get_user_total_ve_zkl(&ALICE), ledger.get_user_total_ve_zkl(&ALICE));
    assert_eq!(restored.get_reward_pool(), ledger.get_reward_pool());
    assert_eq!(restored.get_user_stakes(&BOB), ledger.get_user_stakes(&BOB));
    assert_eq!(restored.admin(), ADMIN);
}

#[test]
fn test_restore_rejects_inconsistent_snapshot() {
    let (mut ledger, clock) = funded_ledger(1_000);
    give(&mut ledger, &ALICE, 1_000);
    ledger.stake(&ALICE, 1_000, 0).unwrap();

    let mut snapshot = ledger.snapshot();
    snapshot.stakes[0].1[0].claimed = true;

    let result = StakingLedger::restore(snapshot, ledger.gateway().clone(), clock);
    assert!(matches!(result, Err(StakingError::InvariantViolated { .. })));
}

// ============ Invariants ============

#[test]
fn test_invariants_hold_across_mixed_activity() {
    let (mut ledger, clock) = funded_ledger(50_000);
    let users: Vec<Address> = (10u8..16).map(|b| [b; 32]).collect();

    for (i, user) in users.iter().enumerate() {
        let amount = 1_000 * (i as u128 + 1);
        give(&mut ledger, user, amount * 2);
        ledger.stake(user, amount, (i % 3) as u32).unwrap();
        ledger.stake(user, amount, ((i + 1) % 3) as u32).unwrap();
        clock.advance(17 * SECONDS_PER_DAY);
    }

    clock.advance(NINETY_DAYS);
    for user in &users {
        for index in 0..2u64 {
            let _ = ledger.unstake(user, index);
        }
    }

    assert_eq!(ledger.check_invariants(), Ok(()));
    assert!(custody_reconciles(&ledger));
    assert!(ledger.get_reward_pool() >= ledger.get_total_locked_rewards());
}
