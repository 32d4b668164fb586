//! Property-based tests (proptest) for reward math and the ledger engine.
//! Complements the Kani proofs.
//!
//! These test with u64 production types across wide ranges, and drive the
//! engine through random operation sequences against an in-memory token ledger.

mod common;

use common::Harness;
use proptest::prelude::*;
use reward_distributor::math::{calc_reward_release, calc_share, claimable, distribution_remainder};
use solana_program::pubkey::Pubkey;

// ═══════════════════════════════════════════════════════════════
// Property Tests: pure math
// ═══════════════════════════════════════════════════════════════

proptest! {
    // ── Proportionality ──

    #[test]
    fn prop_share_is_floor_proportional(
        amount in 0u64..u64::MAX,
        stake in 1u64..1_000_000_000_000,
        extra in 0u64..1_000_000_000_000,
    ) {
        let total = stake + extra;
        let share = calc_share(amount, stake, total).unwrap();
        let exact = amount as u128 * stake as u128;
        prop_assert!(share as u128 * total as u128 <= exact);
        prop_assert!((share as u128 + 1) * total as u128 > exact);
        prop_assert!(share <= amount);
    }

    #[test]
    fn prop_shares_sum_at_most_amount(
        amount in 0u64..1_000_000_000_000,
        stakes in prop::collection::vec(1u64..1_000_000_000, 1..20),
    ) {
        let total: u64 = stakes.iter().sum();
        let credited: u64 = stakes
            .iter()
            .map(|&s| calc_share(amount, s, total).unwrap())
            .sum();
        prop_assert!(credited <= amount);
        // Each floor loses < 1, so the remainder is below the recipient count
        let remainder = distribution_remainder(amount, credited).unwrap();
        prop_assert!(remainder < stakes.len() as u64);
    }

    #[test]
    fn prop_larger_stake_larger_share(
        amount in 0u64..1_000_000_000_000,
        s1 in 1u64..1_000_000_000,
        s2 in 1u64..1_000_000_000,
    ) {
        let total = s1 + s2;
        let (lo, hi) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
        prop_assert!(
            calc_share(amount, lo, total).unwrap() <= calc_share(amount, hi, total).unwrap()
        );
    }

    // ── Withdrawal release ──

    #[test]
    fn prop_release_bounded_by_accrued(
        accrued in 0u64..u64::MAX,
        stake in 1u64..u64::MAX,
        fraction in 0u64..=1_000,
    ) {
        let amount = ((stake as u128 * fraction as u128) / 1_000) as u64;
        let released = calc_reward_release(accrued, amount, stake).unwrap();
        prop_assert!(released <= accrued);
    }

    #[test]
    fn prop_full_withdrawal_releases_everything(
        accrued in 0u64..u64::MAX,
        stake in 1u64..u64::MAX,
    ) {
        prop_assert_eq!(calc_reward_release(accrued, stake, stake), Some(accrued));
    }

    #[test]
    fn prop_partial_sequence_never_exceeds_entitlement(
        accrued in 0u64..1_000_000_000,
        chunks in prop::collection::vec(1u64..1_000_000, 1..10),
    ) {
        let mut stake: u64 = chunks.iter().sum();
        let mut remaining = accrued;
        let entitlement = claimable(stake, accrued).unwrap();
        let mut paid: u64 = 0;
        for &chunk in &chunks {
            let released = calc_reward_release(remaining, chunk, stake).unwrap();
            paid += chunk + released;
            remaining -= released;
            stake -= chunk;
        }
        prop_assert_eq!(stake, 0);
        prop_assert_eq!(remaining, 0, "stranded reward after full exit");
        prop_assert_eq!(paid, entitlement);
    }

    #[test]
    fn prop_release_over_stake_rejected(
        accrued in 0u64..u64::MAX,
        stake in 0u64..u64::MAX - 1,
        over in 1u64..1_000,
    ) {
        let amount = stake.saturating_add(over);
        prop_assert_eq!(calc_reward_release(accrued, amount, stake), None);
    }
}

// ═══════════════════════════════════════════════════════════════
// Property Tests: random operation sequences through the engine
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Op {
    Stake { who: usize, amount: u64 },
    Unstake { who: usize, amount: u64 },
    UnstakeAll { who: usize },
    Distribute { amount: u64 },
    Fund { amount: u64 },
}

const PARTICIPANTS: usize = 4;
const STARTING_BALANCE: u64 = 1_000_000;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PARTICIPANTS, 0u64..50_000).prop_map(|(who, amount)| Op::Stake { who, amount }),
        (0..PARTICIPANTS, 0u64..50_000).prop_map(|(who, amount)| Op::Unstake { who, amount }),
        (0..PARTICIPANTS).prop_map(|who| Op::UnstakeAll { who }),
        (0u64..10_000).prop_map(|amount| Op::Distribute { amount }),
        (0u64..10_000).prop_map(|amount| Op::Fund { amount }),
    ]
}

proptest! {
    #[test]
    fn prop_random_sequences_conserve_value(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut h = Harness::new(PARTICIPANTS);
        let users: Vec<Pubkey> = (0..PARTICIPANTS).map(|_| h.user(STARTING_BALANCE)).collect();
        let supply = h.assets.total_supply();
        let mut funded: u64 = 0;

        for op in ops {
            let before_header = h.header;
            let result = match op.clone() {
                Op::Stake { who, amount } => h.stake(&users[who], amount),
                Op::Unstake { who, amount } => h.unstake(&users[who], amount),
                Op::UnstakeAll { who } => h.unstake_all(&users[who]),
                Op::Distribute { amount } => h.distribute(amount),
                Op::Fund { amount } => {
                    if amount > 0 {
                        h.fund(amount);
                        funded += amount;
                    }
                    Ok(())
                }
            };
            if result.is_err() {
                prop_assert_eq!(
                    bytemuck::bytes_of(&h.header),
                    bytemuck::bytes_of(&before_header),
                    "rejected {:?} mutated the header", op
                );
            }

            h.check_invariants();

            // Vault always backs every claim
            let owed = h.header.total_staked as u128 + h.header.total_accrued as u128;
            prop_assert!(h.assets.vault_balance() as u128 >= owed);

            // No value created: tokens only move, fund mints are the only inflow
            prop_assert_eq!(h.assets.total_supply(), supply + funded as u128);
        }

        // Everyone can leave with exactly what the ledger says they own
        for user in &users {
            let owed = h.can_withdraw(user);
            let before = h.assets.balance(user);
            if h.current_stake(user) > 0 {
                h.unstake_all(user).unwrap();
            }
            prop_assert_eq!(h.assets.balance(user), before + owed);
        }
        prop_assert_eq!(h.header.total_accrued, 0);
        prop_assert_eq!(h.header.participant_count, 0);
    }

    #[test]
    fn prop_late_joiner_unaffected_by_prior_distribution(
        early in 1u64..100_000,
        late in 1u64..100_000,
        amount in 1u64..100_000,
    ) {
        let mut h = Harness::new(2);
        let a = h.user(STARTING_BALANCE);
        let c = h.user(STARTING_BALANCE);
        h.fund(amount);
        h.stake(&a, early).unwrap();
        h.distribute(amount).unwrap();
        h.stake(&c, late).unwrap();
        prop_assert_eq!(h.can_withdraw(&c), late);
        prop_assert_eq!(h.can_withdraw(&a), early + amount);
    }
}

// ═══════════════════════════════════════════════════════════════
// Targeted Edge Cases (not random)
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_production_scale_share() {
    // 1B tokens (9 decimals) staked, 10M reward distributed
    let total = 1_000_000_000_000_000_000u64;
    let stake = 250_000_000_000_000_000u64;
    let amount = 10_000_000_000_000_000u64;
    assert_eq!(calc_share(amount, stake, total), Some(2_500_000_000_000_000));
}

#[test]
fn test_dust_distribution_gets_zero_share() {
    assert_eq!(calc_share(1, 1, 1_000_000), Some(0));
}

#[test]
fn test_max_values_no_overflow() {
    assert_eq!(calc_share(u64::MAX, u64::MAX, u64::MAX), Some(u64::MAX));
    assert_eq!(calc_reward_release(u64::MAX, u64::MAX - 1, u64::MAX), Some(u64::MAX - 1));
}

#[test]
fn test_three_staker_split() {
    // A=10, B=20, C=30 over 6
    let shares: Vec<u64> = [10, 20, 30]
        .iter()
        .map(|&s| calc_share(6, s, 60).unwrap())
        .collect();
    assert_eq!(shares, vec![1, 2, 3]);
    assert_eq!(distribution_remainder(6, 6), Some(0));
}
