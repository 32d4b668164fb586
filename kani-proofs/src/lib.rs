//! Kani formal verification for reward-distributor split/release math.
//!
//! ZERO dependencies. Pure Rust. CBMC-friendly.
//!
//! KEY DESIGN DECISION: Functions use u32 inputs / u64 intermediates.
//! The production code uses u64/u128, but the arithmetic properties
//! (floor proportionality, conservation, release bounds) are scale-invariant.
//! u32 keeps SAT formulas tractable for CBMC (<60s per proof).
//!
//! Run all:   cargo kani --lib
//! Run one:   cargo kani --harness proof_three_way_split_conservation

// ═══════════════════════════════════════════════════════════════
// Reward Math (u32/u64 mirror of reward-distributor/src/math.rs)
// Arithmetic is IDENTICAL, just narrower types for CBMC tractability.
// ═══════════════════════════════════════════════════════════════

/// floor(amount * stake / total). None when nothing is staked or stake > total.
pub fn calc_share(amount: u32, stake: u32, total_staked: u32) -> Option<u32> {
    if total_staked == 0 || stake > total_staked {
        return None;
    }
    let share = (amount as u64)
        .checked_mul(stake as u64)?
        .checked_div(total_staked as u64)?;
    Some(share as u32)
}

/// floor(accrued * amount / stake); full exit releases everything.
pub fn calc_reward_release(accrued: u32, amount: u32, stake: u32) -> Option<u32> {
    if stake == 0 || amount > stake {
        return None;
    }
    if amount == stake {
        return Some(accrued);
    }
    let released = (accrued as u64)
        .checked_mul(amount as u64)?
        .checked_div(stake as u64)?;
    Some(released as u32)
}

// ═══════════════════════════════════════════════════════════════
// Three-slot ledger model
// ═══════════════════════════════════════════════════════════════

/// Minimal engine model: three participants, no token movement.
#[derive(Clone, Copy)]
pub struct Ledger3 {
    pub stake: [u32; 3],
    pub accrued: [u32; 3],
}

impl Ledger3 {
    /// None on u32 overflow.
    pub fn total_staked(&self) -> Option<u32> {
        self.stake[0].checked_add(self.stake[1])?.checked_add(self.stake[2])
    }

    /// Returns the amount credited.
    pub fn distribute(&mut self, amount: u32) -> Option<u32> {
        let total = self.total_staked()?;
        if total == 0 {
            return None;
        }
        let mut credited = 0u32;
        for i in 0..3 {
            if self.stake[i] > 0 {
                let share = calc_share(amount, self.stake[i], total)?;
                self.accrued[i] = self.accrued[i].checked_add(share)?;
                credited = credited.checked_add(share)?;
            }
        }
        Some(credited)
    }

    /// Returns the payout (principal + released reward).
    pub fn unstake(&mut self, who: usize, amount: u32) -> Option<u32> {
        if amount == 0 || amount > self.stake[who] {
            return None;
        }
        let released = calc_reward_release(self.accrued[who], amount, self.stake[who])?;
        self.stake[who] -= amount;
        self.accrued[who] -= released;
        amount.checked_add(released)
    }
}

// ═══════════════════════════════════════════════════════════════
// KANI PROOFS
// ═══════════════════════════════════════════════════════════════

#[cfg(kani)]
mod proofs {
    use super::*;

    // ── 1. Proportionality ──

    /// Share is the floor of the exact pro-rata amount.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_share_is_floor() {
        let amount: u32 = kani::any();
        let stake: u32 = kani::any();
        let total: u32 = kani::any();
        kani::assume(total > 0 && total < 1_000);
        kani::assume(stake <= total);
        kani::assume(amount < 1_000);

        let share = calc_share(amount, stake, total).unwrap();
        let exact = amount as u64 * stake as u64;
        assert!(share as u64 * total as u64 <= exact);
        assert!((share as u64 + 1) * total as u64 > exact);
    }

    /// Bigger stake never gets a smaller share of the same distribution.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_share_monotone_in_stake() {
        let amount: u32 = kani::any();
        let s1: u32 = kani::any();
        let s2: u32 = kani::any();
        let total: u32 = kani::any();
        kani::assume(total > 0 && total < 1_000);
        kani::assume(amount < 1_000);
        kani::assume(s1 <= s2 && s2 <= total);

        let a = calc_share(amount, s1, total).unwrap();
        let b = calc_share(amount, s2, total).unwrap();
        assert!(a <= b);
    }

    // ── 2. Split conservation ──

    /// Shares of one split never exceed the amount; remainder < recipient count.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_three_way_split_conservation() {
        let mut l = Ledger3 { stake: [kani::any(), kani::any(), kani::any()], accrued: [0; 3] };
        let amount: u32 = kani::any();
        kani::assume(l.stake.iter().all(|&s| s < 100));
        kani::assume(l.total_staked() > Some(0));
        kani::assume(amount < 100);

        let credited = l.distribute(amount).unwrap();
        assert!(credited <= amount);
        assert!(amount - credited < 3);
        assert_eq!(l.accrued[0] + l.accrued[1] + l.accrued[2], credited);
    }

    /// Zero-stake participants are never credited.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_unstaked_participant_not_credited() {
        let mut l = Ledger3 { stake: [kani::any(), kani::any(), 0], accrued: [0; 3] };
        let amount: u32 = kani::any();
        kani::assume(l.stake[0] < 100 && l.stake[1] < 100);
        kani::assume(l.total_staked() > Some(0));
        kani::assume(amount < 100);

        l.distribute(amount).unwrap();
        assert_eq!(l.accrued[2], 0);
    }

    /// Nothing staked: distribution rejected.
    #[kani::proof]
    fn proof_distribute_no_stakers_rejected() {
        let mut l = Ledger3 { stake: [0; 3], accrued: [0; 3] };
        let amount: u32 = kani::any();
        assert!(l.distribute(amount).is_none());
    }

    /// Stakes summing past u32::MAX are rejected, not wrapped.
    #[kani::proof]
    fn proof_total_overflow_rejected() {
        let mut l = Ledger3 { stake: [kani::any(), kani::any(), kani::any()], accrued: [0; 3] };
        let amount: u32 = kani::any();
        let wide = l.stake[0] as u64 + l.stake[1] as u64 + l.stake[2] as u64;
        kani::assume(wide > u32::MAX as u64);
        assert!(l.total_staked().is_none());
        assert!(l.distribute(amount).is_none());
    }

    // ── 3. Withdrawal bounds ──

    /// Partial exit never releases more than accrued.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_release_bounded() {
        let accrued: u32 = kani::any();
        let amount: u32 = kani::any();
        let stake: u32 = kani::any();
        kani::assume(stake > 0 && stake < 1_000);
        kani::assume(amount <= stake);
        kani::assume(accrued < 1_000);

        let released = calc_reward_release(accrued, amount, stake).unwrap();
        assert!(released <= accrued);
    }

    /// Full exit releases everything (no stranded reward).
    #[kani::proof]
    fn proof_full_exit_releases_all() {
        let accrued: u32 = kani::any();
        let stake: u32 = kani::any();
        kani::assume(stake > 0);
        assert_eq!(calc_reward_release(accrued, stake, stake), Some(accrued));
    }

    // ── 4. Entitlement conservation across exits ──

    /// Partial exit then full exit pays exactly stake + accrued.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_partial_then_full_exit_pays_entitlement() {
        let stake: u32 = kani::any();
        let accrued: u32 = kani::any();
        let first: u32 = kani::any();
        kani::assume(stake > 1 && stake < 100);
        kani::assume(accrued < 100);
        kani::assume(first > 0 && first < stake);

        let mut l = Ledger3 { stake: [stake, 0, 0], accrued: [accrued, 0, 0] };
        let p1 = l.unstake(0, first).unwrap();
        let rest = l.stake[0];
        let p2 = l.unstake(0, rest).unwrap();
        assert_eq!(p1 + p2, stake + accrued);
        assert_eq!(l.stake[0], 0);
        assert_eq!(l.accrued[0], 0);
    }

    /// Distribute then everyone exits: total paid = principal + credited.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_distribute_then_exit_conservation() {
        let mut l = Ledger3 { stake: [kani::any(), kani::any(), kani::any()], accrued: [0; 3] };
        let amount: u32 = kani::any();
        kani::assume(l.stake.iter().all(|&s| s > 0 && s < 50));
        kani::assume(amount < 50);

        let principal = l.total_staked().unwrap();
        let credited = l.distribute(amount).unwrap();
        let mut paid = 0u32;
        for i in 0..3 {
            let s = l.stake[i];
            paid += l.unstake(i, s).unwrap();
        }
        assert_eq!(paid, principal + credited);
        assert!(paid <= principal + amount);
    }

    /// Withdrawing more than staked or zero is rejected.
    #[kani::proof]
    fn proof_unstake_bounds_rejected() {
        let stake: u32 = kani::any();
        let amount: u32 = kani::any();
        kani::assume(amount == 0 || amount > stake);
        let mut l = Ledger3 { stake: [stake, 0, 0], accrued: [0; 3] };
        assert!(l.unstake(0, amount).is_none());
    }

    // ── 5. Late join ──

    /// A participant who joins after a distribution holds none of it.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_late_join_gets_nothing() {
        let mut l = Ledger3 { stake: [kani::any(), 0, 0], accrued: [0; 3] };
        let amount: u32 = kani::any();
        let late: u32 = kani::any();
        kani::assume(l.stake[0] > 0 && l.stake[0] < 100);
        kani::assume(amount < 100);
        kani::assume(late > 0 && late < 100);

        l.distribute(amount).unwrap();
        l.stake[2] = late;
        assert_eq!(l.accrued[2], 0);
        assert_eq!(l.accrued[0], amount);
    }
}
