//! Shared test harness: an in-memory token ledger and a boxed ledger account.

#![allow(dead_code)]

use std::collections::HashMap;

use bytemuck::Zeroable;
use reward_distributor::error::DistributorError;
use reward_distributor::ledger::{AssetLedger, RewardLedger, SingleAuthority};
use reward_distributor::state::{LedgerHeader, ParticipantSlot};
use solana_program::pubkey::Pubkey;

/// Balances per key, the vault included. Transfers fail on insufficient
/// balance or when `fail_next` is armed.
pub struct MockAssets {
    pub vault: Pubkey,
    pub balances: HashMap<Pubkey, u64>,
    pub fail_next: bool,
}

impl MockAssets {
    pub fn new(vault: Pubkey) -> Self {
        Self { vault, balances: HashMap::new(), fail_next: false }
    }

    pub fn balance(&self, key: &Pubkey) -> u64 {
        self.balances.get(key).copied().unwrap_or(0)
    }

    pub fn vault_balance(&self) -> u64 {
        self.balance(&self.vault)
    }

    pub fn mint(&mut self, key: &Pubkey, amount: u64) {
        *self.balances.entry(*key).or_insert(0) += amount;
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|&b| b as u128).sum()
    }

    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<(), DistributorError> {
        if std::mem::take(&mut self.fail_next) || self.balance(from) < amount {
            return Err(DistributorError::TransferFailed);
        }
        *self.balances.entry(*from).or_insert(0) -= amount;
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

impl AssetLedger for MockAssets {
    fn debit(&mut self, from: &Pubkey, amount: u64) -> Result<(), DistributorError> {
        let vault = self.vault;
        self.transfer(from, &vault, amount)
    }

    fn credit(&mut self, to: &Pubkey, amount: u64) -> Result<(), DistributorError> {
        let vault = self.vault;
        self.transfer(&vault, to, amount)
    }

    fn balance_of(&self, account: &Pubkey) -> Result<u64, DistributorError> {
        Ok(self.balance(account))
    }
}

/// An initialized ledger plus its token world. `owner` is both admin and
/// distribution authority unless rotated.
pub struct Harness {
    pub header: LedgerHeader,
    pub slots: Vec<ParticipantSlot>,
    pub assets: MockAssets,
    pub owner: Pubkey,
}

impl Harness {
    pub fn new(capacity: usize) -> Self {
        let vault = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let mut header = LedgerHeader::zeroed();
        let mut slots = vec![ParticipantSlot::zeroed(); capacity];
        RewardLedger::new(&mut header, &mut slots)
            .initialize(
                &Pubkey::new_unique(),
                &owner,
                &owner,
                &Pubkey::new_unique(),
                &vault,
                255,
                0,
            )
            .unwrap();
        Self { header, slots, assets: MockAssets::new(vault), owner }
    }

    pub fn split(&mut self) -> (RewardLedger<'_>, &mut MockAssets, SingleAuthority) {
        let access = SingleAuthority(self.header.distribution_authority_pubkey());
        (
            RewardLedger::load(&mut self.header, &mut self.slots).unwrap(),
            &mut self.assets,
            access,
        )
    }

    pub fn user(&mut self, balance: u64) -> Pubkey {
        let user = Pubkey::new_unique();
        self.assets.mint(&user, balance);
        user
    }

    /// Owner sends `amount` reward tokens into the vault.
    pub fn fund(&mut self, amount: u64) {
        let owner = self.owner;
        self.assets.mint(&owner, amount);
        let (mut ledger, assets, _) = self.split();
        ledger.fund_rewards(assets, &owner, amount).unwrap();
    }

    pub fn stake(&mut self, who: &Pubkey, amount: u64) -> Result<(), DistributorError> {
        let (mut ledger, assets, _) = self.split();
        ledger.stake(assets, who, amount).map(|_| ())
    }

    pub fn distribute(&mut self, amount: u64) -> Result<(), DistributorError> {
        let owner = self.owner;
        self.distribute_as(&owner, amount)
    }

    pub fn distribute_as(&mut self, caller: &Pubkey, amount: u64) -> Result<(), DistributorError> {
        let (mut ledger, assets, access) = self.split();
        ledger.distribute(&access, &*assets, caller, amount).map(|_| ())
    }

    pub fn unstake(&mut self, who: &Pubkey, amount: u64) -> Result<(), DistributorError> {
        let (mut ledger, assets, _) = self.split();
        ledger.unstake(assets, who, amount).map(|_| ())
    }

    pub fn unstake_all(&mut self, who: &Pubkey) -> Result<(), DistributorError> {
        let (mut ledger, assets, _) = self.split();
        ledger.unstake_all(assets, who).map(|_| ())
    }

    pub fn can_withdraw(&mut self, who: &Pubkey) -> u64 {
        let (ledger, _, _) = self.split();
        ledger.can_withdraw(who).unwrap()
    }

    pub fn current_stake(&mut self, who: &Pubkey) -> u64 {
        let (ledger, _, _) = self.split();
        ledger.current_stake(who)
    }

    pub fn check_invariants(&mut self) {
        let (ledger, _, _) = self.split();
        ledger.check_invariants().unwrap();
    }
}
