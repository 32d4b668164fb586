//! Pure reward math, extracted for Kani formal verification.
//!
//! No Solana/Pubkey dependencies. Just arithmetic.
//! Kani can verify these functions exhaustively.

/// Calculate one participant's share of a distribution.
///
/// # Arguments
/// * `amount` - Reward amount being distributed
/// * `stake` - Participant's stake at the instant of distribution
/// * `total_staked` - Sum of all stakes at the same instant
///
/// # Returns
/// * `Some(share)` - `floor(amount * stake / total_staked)`
/// * `None` - Nothing staked, stake larger than total, or overflow
///
/// # Invariant
/// `share <= amount`, and the shares of every staked participant sum to
/// at most `amount`. The difference is the rounding remainder.
pub fn calc_share(amount: u64, stake: u64, total_staked: u64) -> Option<u64> {
    if total_staked == 0 || stake > total_staked {
        return None;
    }
    // u128 intermediate: amount * stake fits for any u64 pair
    let share = (amount as u128)
        .checked_mul(stake as u128)?
        .checked_div(total_staked as u128)?;
    if share > u64::MAX as u128 {
        None
    } else {
        Some(share as u64)
    }
}

/// Calculate the accrued reward released when `amount` of principal is unstaked.
///
/// # Arguments
/// * `accrued_reward` - Participant's accrued, unwithdrawn reward
/// * `amount` - Principal being withdrawn
/// * `stake` - Participant's stake before the withdrawal
///
/// # Returns
/// * `Some(released)` - `floor(accrued_reward * amount / stake)` (rounds DOWN)
/// * `None` - Zero stake, amount above stake, or overflow
///
/// # Invariant
/// Full exit (`amount == stake`) releases exactly `accrued_reward`.
/// The remaining reward is `accrued_reward - released`, never re-rounded,
/// so any sequence of partial exits releases at most `accrued_reward` in total.
pub fn calc_reward_release(accrued_reward: u64, amount: u64, stake: u64) -> Option<u64> {
    if stake == 0 || amount > stake {
        return None;
    }
    if amount == stake {
        return Some(accrued_reward);
    }
    let released = (accrued_reward as u128)
        .checked_mul(amount as u128)?
        .checked_div(stake as u128)?;
    if released > u64::MAX as u128 {
        None
    } else {
        Some(released as u64)
    }
}

/// Total a participant could withdraw right now: principal + accrued reward.
pub fn claimable(stake: u64, accrued_reward: u64) -> Option<u64> {
    stake.checked_add(accrued_reward)
}

/// Rounding remainder left undistributed after crediting `credited` out of `amount`.
///
/// # Returns
/// * `Some(remainder)` if `credited <= amount`
/// * `None` if shares were over-credited (accounting is broken)
pub fn distribution_remainder(amount: u64, credited: u64) -> Option<u64> {
    amount.checked_sub(credited)
}

/// Vault balance needed to back every stake, every accrued reward, and a
/// distribution of `amount` on top.
pub fn required_custody(total_staked: u64, total_accrued: u64, amount: u64) -> Option<u64> {
    total_staked.checked_add(total_accrued)?.checked_add(amount)
}

/// Unallocated reward balance in the vault (funded but not yet credited).
///
/// `available = vault_balance - total_staked - total_accrued`
/// Uses saturating arithmetic (can't go negative).
pub fn unallocated_rewards(vault_balance: u64, total_staked: u64, total_accrued: u64) -> u64 {
    vault_balance
        .saturating_sub(total_staked)
        .saturating_sub(total_accrued)
}


// ═══════════════════════════════════════════════════════════════
// Kani Formal Verification
// ═══════════════════════════════════════════════════════════════
//
// Production-type (u64/u128) proofs live in tests/kani.rs; narrow-width
// mirrors with tighter bounds live in kani-proofs/src/lib.rs.
