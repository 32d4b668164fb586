//! Reward Distributor Program
//!
//! Pull-based proportional reward ledger. Participants stake a token into a
//! program-owned vault; a single distribution authority periodically splits a
//! reward amount across everyone staked at that instant, in proportion to
//! stake. Nothing is pushed: rewards accrue in the ledger and are paid out
//! together with principal when a participant unstakes.
//!
//! Architecture:
//! - One ledger account per reward pool: fixed header + slab of participant slots
//! - Vault token account owned by the `vault_auth` PDA, holds principal and rewards
//! - Distribution is O(n) over the slab with floor rounding; the rounding
//!   remainder stays in the vault unallocated
//! - Late joiners are never credited for earlier distributions
//! - Every instruction is all-or-nothing: a failed transfer reverts everything
//!
//! Instructions:
//!   0 - InitLedger:     Initialize ledger account + vault token account
//!   1 - Stake:          Participant token account → vault, stake += amount
//!   2 - Unstake:        Withdraw part of the stake + proportional reward
//!   3 - UnstakeAll:     Withdraw all stake + all accrued reward
//!   4 - Distribute:     Credit `amount` pro rata to current stakers (authority only)
//!   5 - FundRewards:    Top up the vault with reward tokens (permissionless)
//!   6 - UpdateConfig:   Admin rotates keys / stake cap
//!   7 - QueryPosition:  Return stake, accrued reward and claimable amount

pub mod error;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod math;
pub mod processor;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;
