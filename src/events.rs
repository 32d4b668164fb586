//! State-change events.
//!
//! Every committed mutation produces one `LedgerEvent`. The processor logs it
//! with `msg!` so indexers can audit amounts and resulting balances from the
//! transaction log alone.

use solana_program::{msg, pubkey::Pubkey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEvent {
    Initialized {
        ledger: Pubkey,
        admin: Pubkey,
        distribution_authority: Pubkey,
        capacity: u32,
        stake_cap: u64,
    },
    Staked {
        participant: Pubkey,
        amount: u64,
        stake: u64,
        total_staked: u64,
    },
    Unstaked {
        participant: Pubkey,
        principal: u64,
        reward: u64,
        stake: u64,
        accrued_reward: u64,
        total_staked: u64,
    },
    Distributed {
        amount: u64,
        credited: u64,
        remainder: u64,
        recipients: u32,
        total_staked: u64,
    },
    RewardsFunded {
        funder: Pubkey,
        amount: u64,
    },
    ConfigUpdated {
        admin: Pubkey,
        distribution_authority: Pubkey,
        stake_cap: u64,
    },
}

impl LedgerEvent {
    pub fn log(&self) {
        match self {
            Self::Initialized { ledger, admin, distribution_authority, capacity, stake_cap } => {
                msg!(
                    "Ledger {} initialized: admin={} distributor={} capacity={} stake_cap={}",
                    ledger,
                    admin,
                    distribution_authority,
                    capacity,
                    stake_cap,
                );
            }
            Self::Staked { participant, amount, stake, total_staked } => {
                msg!(
                    "Staked {} by {}: stake={} total_staked={}",
                    amount,
                    participant,
                    stake,
                    total_staked,
                );
            }
            Self::Unstaked { participant, principal, reward, stake, accrued_reward, total_staked } => {
                msg!(
                    "Unstaked {} principal + {} reward by {}: stake={} accrued={} total_staked={}",
                    principal,
                    reward,
                    participant,
                    stake,
                    accrued_reward,
                    total_staked,
                );
            }
            Self::Distributed { amount, credited, remainder, recipients, total_staked } => {
                msg!(
                    "Distributed {}: credited={} remainder={} recipients={} total_staked={}",
                    amount,
                    credited,
                    remainder,
                    recipients,
                    total_staked,
                );
            }
            Self::RewardsFunded { funder, amount } => {
                msg!("Reward vault funded with {} by {}", amount, funder);
            }
            Self::ConfigUpdated { admin, distribution_authority, stake_cap } => {
                msg!(
                    "Ledger config updated: admin={} distributor={} stake_cap={}",
                    admin,
                    distribution_authority,
                    stake_cap,
                );
            }
        }
    }
}
