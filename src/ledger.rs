//! Reward ledger engine.
//!
//! `RewardLedger` borrows the ledger header and slot slab (normally straight
//! out of the ledger account data) and implements the three core pieces:
//!
//! - Stake ledger: `stake`, `current_stake`
//! - Reward accrual: `distribute`, a direct floor-proportional split over the
//!   participants staked at call time. No reward-per-share accumulator, so a
//!   later staker is simply not in the iterated set.
//! - Withdrawal settlement: `unstake`, `unstake_all`, `can_withdraw`
//!
//! Token movement goes through [`AssetLedger`], distribution rights through
//! [`AccessControl`]. Every mutator validates and computes first, moves
//! tokens second, and writes state last, so a rejected call changes nothing.

use bytemuck::Zeroable;
use solana_program::pubkey::Pubkey;

use crate::error::DistributorError;
use crate::events::LedgerEvent;
use crate::math;
use crate::state::{self, LedgerHeader, ParticipantSlot};

/// External custody of the staked / reward token.
pub trait AssetLedger {
    /// Pull `amount` from `from` into the vault. All-or-nothing.
    fn debit(&mut self, from: &Pubkey, amount: u64) -> Result<(), DistributorError>;

    /// Pay `amount` out of the vault to `to`. All-or-nothing.
    fn credit(&mut self, to: &Pubkey, amount: u64) -> Result<(), DistributorError>;

    /// Token balance held by `account`.
    fn balance_of(&self, account: &Pubkey) -> Result<u64, DistributorError>;
}

/// Gate on who may trigger a distribution.
pub trait AccessControl {
    fn may_distribute(&self, caller: &Pubkey) -> bool;
}

/// Exactly one key may distribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleAuthority(pub Pubkey);

impl AccessControl for SingleAuthority {
    fn may_distribute(&self, caller: &Pubkey) -> bool {
        *caller == self.0
    }
}

/// Read-only snapshot of one participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub stake: u64,
    pub accrued_reward: u64,
}

impl Position {
    pub fn claimable(&self) -> Option<u64> {
        math::claimable(self.stake, self.accrued_reward)
    }
}

/// Position of `participant`; all zero when it holds no slot.
pub fn position(slots: &[ParticipantSlot], participant: &Pubkey) -> Position {
    match state::find_slot(slots, participant) {
        Some(i) => Position {
            stake: slots[i].stake,
            accrued_reward: slots[i].accrued_reward,
        },
        None => Position::default(),
    }
}

pub struct RewardLedger<'a> {
    header: &'a mut LedgerHeader,
    slots: &'a mut [ParticipantSlot],
}

impl<'a> RewardLedger<'a> {
    /// Wrap header + slots without checking initialization (InitLedger path).
    pub fn new(header: &'a mut LedgerHeader, slots: &'a mut [ParticipantSlot]) -> Self {
        Self { header, slots }
    }

    /// Wrap an initialized ledger.
    pub fn load(
        header: &'a mut LedgerHeader,
        slots: &'a mut [ParticipantSlot],
    ) -> Result<Self, DistributorError> {
        if header.is_initialized != 1 {
            return Err(DistributorError::NotInitialized);
        }
        if header.capacity as usize != slots.len() {
            return Err(DistributorError::InvalidLedgerAccount);
        }
        Ok(Self { header, slots })
    }

    pub fn header(&self) -> &LedgerHeader {
        &*self.header
    }

    pub fn slots(&self) -> &[ParticipantSlot] {
        &*self.slots
    }

    // ═══════════════════════════════════════════════════════════
    // Setup / config
    // ═══════════════════════════════════════════════════════════

    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        ledger: &Pubkey,
        admin: &Pubkey,
        distribution_authority: &Pubkey,
        mint: &Pubkey,
        vault: &Pubkey,
        vault_authority_bump: u8,
        stake_cap: u64,
    ) -> Result<LedgerEvent, DistributorError> {
        if self.header.is_initialized != 0 {
            return Err(DistributorError::AlreadyInitialized);
        }
        if self.slots.is_empty() {
            return Err(DistributorError::InvalidLedgerAccount);
        }
        let capacity =
            u32::try_from(self.slots.len()).map_err(|_| DistributorError::InvalidLedgerAccount)?;

        *self.header = LedgerHeader::zeroed();
        self.slots.fill(ParticipantSlot::zeroed());

        self.header.is_initialized = 1;
        self.header.vault_authority_bump = vault_authority_bump;
        self.header.capacity = capacity;
        self.header.admin = admin.to_bytes();
        self.header.distribution_authority = distribution_authority.to_bytes();
        self.header.mint = mint.to_bytes();
        self.header.vault = vault.to_bytes();
        self.header.stake_cap = stake_cap;

        Ok(LedgerEvent::Initialized {
            ledger: *ledger,
            admin: *admin,
            distribution_authority: *distribution_authority,
            capacity,
            stake_cap,
        })
    }

    /// Admin-only. `None` leaves a field unchanged.
    pub fn update_config(
        &mut self,
        caller: &Pubkey,
        new_admin: Option<Pubkey>,
        new_distribution_authority: Option<Pubkey>,
        new_stake_cap: Option<u64>,
    ) -> Result<LedgerEvent, DistributorError> {
        if self.header.admin != caller.to_bytes() {
            return Err(DistributorError::Unauthorized);
        }

        if let Some(admin) = new_admin {
            self.header.admin = admin.to_bytes();
        }
        if let Some(authority) = new_distribution_authority {
            self.header.distribution_authority = authority.to_bytes();
        }
        // A cap below total_staked only blocks new stakes; nobody is forced out.
        if let Some(cap) = new_stake_cap {
            self.header.stake_cap = cap;
        }

        Ok(LedgerEvent::ConfigUpdated {
            admin: self.header.admin_pubkey(),
            distribution_authority: self.header.distribution_authority_pubkey(),
            stake_cap: self.header.stake_cap,
        })
    }

    // ═══════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════

    pub fn current_stake(&self, participant: &Pubkey) -> u64 {
        position(self.slots, participant).stake
    }

    pub fn accrued_reward(&self, participant: &Pubkey) -> u64 {
        position(self.slots, participant).accrued_reward
    }

    /// stake + accrued_reward: everything `unstake_all` would pay out.
    pub fn can_withdraw(&self, participant: &Pubkey) -> Result<u64, DistributorError> {
        position(self.slots, participant)
            .claimable()
            .ok_or(DistributorError::Overflow)
    }

    pub fn total_staked(&self) -> u64 {
        self.header.total_staked
    }

    // ═══════════════════════════════════════════════════════════
    // Stake ledger
    // ═══════════════════════════════════════════════════════════

    pub fn stake<A: AssetLedger>(
        &mut self,
        assets: &mut A,
        participant: &Pubkey,
        amount: u64,
    ) -> Result<LedgerEvent, DistributorError> {
        if amount == 0 {
            return Err(DistributorError::ZeroAmount);
        }

        let new_total = self
            .header
            .total_staked
            .checked_add(amount)
            .ok_or(DistributorError::Overflow)?;
        if self.header.stake_cap > 0 && new_total > self.header.stake_cap {
            return Err(DistributorError::StakeCapExceeded);
        }

        let (index, fresh) = match state::find_slot(self.slots, participant) {
            Some(i) => (i, false),
            None => {
                let free = self
                    .slots
                    .iter()
                    .position(ParticipantSlot::is_free)
                    .ok_or(DistributorError::LedgerFull)?;
                (free, true)
            }
        };

        let new_stake = self.slots[index]
            .stake
            .checked_add(amount)
            .ok_or(DistributorError::Overflow)?;
        let new_count = if fresh {
            self.header
                .participant_count
                .checked_add(1)
                .ok_or(DistributorError::Overflow)?
        } else {
            self.header.participant_count
        };

        assets.debit(participant, amount)?;

        let slot = &mut self.slots[index];
        if fresh {
            slot.owner = participant.to_bytes();
            slot.in_use = 1;
        }
        slot.stake = new_stake;
        self.header.total_staked = new_total;
        self.header.participant_count = new_count;

        Ok(LedgerEvent::Staked {
            participant: *participant,
            amount,
            stake: new_stake,
            total_staked: new_total,
        })
    }

    // ═══════════════════════════════════════════════════════════
    // Reward accrual
    // ═══════════════════════════════════════════════════════════

    /// Split `amount` across every participant staked right now.
    ///
    /// Each gets `floor(amount * stake / total_staked)`. The remainder is not
    /// credited to anyone: it stays in the vault as unallocated reward and is
    /// counted in `total_forfeited`.
    pub fn distribute<A: AssetLedger, C: AccessControl>(
        &mut self,
        access: &C,
        assets: &A,
        caller: &Pubkey,
        amount: u64,
    ) -> Result<LedgerEvent, DistributorError> {
        if !access.may_distribute(caller) {
            return Err(DistributorError::Unauthorized);
        }
        if amount == 0 {
            return Err(DistributorError::ZeroAmount);
        }
        let total_staked = self.header.total_staked;
        if total_staked == 0 {
            return Err(DistributorError::NoStakers);
        }

        // Vault must back all principal, all accrued reward, and this distribution
        let required = math::required_custody(total_staked, self.header.total_accrued, amount)
            .ok_or(DistributorError::Overflow)?;
        let vault_balance = assets.balance_of(&self.header.vault_pubkey())?;
        if vault_balance < required {
            return Err(DistributorError::InsufficientRewardFunds);
        }

        // Pass 1: compute and check everything
        let mut credited: u64 = 0;
        let mut recipients: u32 = 0;
        for slot in self.slots.iter().filter(|s| s.in_use == 1 && s.stake > 0) {
            let share = math::calc_share(amount, slot.stake, total_staked)
                .ok_or(DistributorError::Overflow)?;
            slot.accrued_reward
                .checked_add(share)
                .ok_or(DistributorError::Overflow)?;
            credited = credited.checked_add(share).ok_or(DistributorError::Overflow)?;
            recipients = recipients.checked_add(1).ok_or(DistributorError::Overflow)?;
        }
        let remainder =
            math::distribution_remainder(amount, credited).ok_or(DistributorError::Overflow)?;
        let new_total_accrued = self
            .header
            .total_accrued
            .checked_add(credited)
            .ok_or(DistributorError::Overflow)?;
        let new_total_distributed = self
            .header
            .total_distributed
            .checked_add(credited)
            .ok_or(DistributorError::Overflow)?;
        let new_total_forfeited = self
            .header
            .total_forfeited
            .checked_add(remainder)
            .ok_or(DistributorError::Overflow)?;
        let new_distribution_count = self
            .header
            .distribution_count
            .checked_add(1)
            .ok_or(DistributorError::Overflow)?;

        // Pass 2: commit (same inputs as pass 1, cannot fail)
        for slot in self.slots.iter_mut().filter(|s| s.in_use == 1 && s.stake > 0) {
            let share = math::calc_share(amount, slot.stake, total_staked)
                .ok_or(DistributorError::Overflow)?;
            slot.accrued_reward = slot
                .accrued_reward
                .checked_add(share)
                .ok_or(DistributorError::Overflow)?;
        }
        self.header.total_accrued = new_total_accrued;
        self.header.total_distributed = new_total_distributed;
        self.header.total_forfeited = new_total_forfeited;
        self.header.distribution_count = new_distribution_count;

        Ok(LedgerEvent::Distributed {
            amount,
            credited,
            remainder,
            recipients,
            total_staked,
        })
    }

    /// Move reward tokens into the vault ahead of a distribution.
    /// Nothing is credited until `distribute` runs.
    pub fn fund_rewards<A: AssetLedger>(
        &mut self,
        assets: &mut A,
        funder: &Pubkey,
        amount: u64,
    ) -> Result<LedgerEvent, DistributorError> {
        if amount == 0 {
            return Err(DistributorError::ZeroAmount);
        }
        assets.debit(funder, amount)?;
        Ok(LedgerEvent::RewardsFunded {
            funder: *funder,
            amount,
        })
    }

    // ═══════════════════════════════════════════════════════════
    // Withdrawal settlement
    // ═══════════════════════════════════════════════════════════

    /// Withdraw `amount` of principal plus the matching slice of accrued reward.
    ///
    /// Released reward = `floor(accrued_reward * amount / stake)`; the rest
    /// stays accrued. Withdrawing the whole stake releases all accrued reward
    /// and frees the slot.
    pub fn unstake<A: AssetLedger>(
        &mut self,
        assets: &mut A,
        participant: &Pubkey,
        amount: u64,
    ) -> Result<LedgerEvent, DistributorError> {
        let index =
            state::find_slot(self.slots, participant).ok_or(DistributorError::InsufficientStake)?;
        let slot = self.slots[index];
        if amount == 0 || amount > slot.stake {
            return Err(DistributorError::InsufficientStake);
        }

        let reward = math::calc_reward_release(slot.accrued_reward, amount, slot.stake)
            .ok_or(DistributorError::Overflow)?;
        let payout = amount.checked_add(reward).ok_or(DistributorError::Overflow)?;

        let new_stake = slot.stake - amount;
        let new_accrued = slot
            .accrued_reward
            .checked_sub(reward)
            .ok_or(DistributorError::Overflow)?;
        let new_total_staked = self
            .header
            .total_staked
            .checked_sub(amount)
            .ok_or(DistributorError::Overflow)?;
        let new_total_accrued = self
            .header
            .total_accrued
            .checked_sub(reward)
            .ok_or(DistributorError::Overflow)?;
        let exiting = new_stake == 0;
        let new_count = if exiting {
            self.header
                .participant_count
                .checked_sub(1)
                .ok_or(DistributorError::Overflow)?
        } else {
            self.header.participant_count
        };

        assets.credit(participant, payout)?;

        if exiting {
            // Full exit released all reward (math::calc_reward_release), so the slot is empty
            self.slots[index] = ParticipantSlot::zeroed();
        } else {
            self.slots[index].stake = new_stake;
            self.slots[index].accrued_reward = new_accrued;
        }
        self.header.total_staked = new_total_staked;
        self.header.total_accrued = new_total_accrued;
        self.header.participant_count = new_count;

        Ok(LedgerEvent::Unstaked {
            participant: *participant,
            principal: amount,
            reward,
            stake: new_stake,
            accrued_reward: new_accrued,
            total_staked: new_total_staked,
        })
    }

    /// Withdraw everything. Fails with `InsufficientStake` when nothing is staked.
    pub fn unstake_all<A: AssetLedger>(
        &mut self,
        assets: &mut A,
        participant: &Pubkey,
    ) -> Result<LedgerEvent, DistributorError> {
        let stake = self.current_stake(participant);
        self.unstake(assets, participant, stake)
    }

    // ═══════════════════════════════════════════════════════════
    // Invariants
    // ═══════════════════════════════════════════════════════════

    /// Check the slab against the header totals. Returns the name of the
    /// first violated invariant.
    pub fn check_invariants(&self) -> Result<(), &'static str> {
        let mut stake_sum: u128 = 0;
        let mut accrued_sum: u128 = 0;
        let mut in_use: u64 = 0;
        for slot in self.slots.iter() {
            if slot.in_use == 1 {
                if slot.stake == 0 {
                    return Err("InUseSlotHasStake");
                }
                in_use += 1;
            } else if slot.stake != 0 || slot.accrued_reward != 0 || slot.owner != [0u8; 32] {
                return Err("FreeSlotIsZeroed");
            }
            stake_sum += slot.stake as u128;
            accrued_sum += slot.accrued_reward as u128;
        }
        if stake_sum != self.header.total_staked as u128 {
            return Err("StakeSumMatchesTotal");
        }
        if accrued_sum != self.header.total_accrued as u128 {
            return Err("AccruedSumMatchesTotal");
        }
        if in_use != self.header.participant_count as u64 {
            return Err("ParticipantCountMatches");
        }
        Ok(())
    }
}
