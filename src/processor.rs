use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    sysvar::Sysvar,
};

/// Verify the token program is the real SPL Token program.
/// CRITICAL: Without this check, an attacker can pass a fake token program,
/// receive PDA signer authority via invoke_signed, and drain the vault.
fn verify_token_program(token_program: &AccountInfo) -> ProgramResult {
    if *token_program.key != spl_token::id() {
        msg!("Error: invalid token program {}", token_program.key);
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

use crate::error::DistributorError;
use crate::instruction::DistributorInstruction;
use crate::ledger::{self, AssetLedger, RewardLedger, SingleAuthority};
use crate::math;
use crate::state::{self, LedgerHeader};

pub fn process(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = DistributorInstruction::unpack(instruction_data)?;

    match instruction {
        DistributorInstruction::InitLedger { distribution_authority, stake_cap } => {
            process_init_ledger(program_id, accounts, &distribution_authority, stake_cap)
        }
        DistributorInstruction::Stake { amount } => {
            process_stake(program_id, accounts, amount)
        }
        DistributorInstruction::Unstake { amount } => {
            process_unstake(program_id, accounts, Some(amount))
        }
        DistributorInstruction::UnstakeAll => {
            process_unstake(program_id, accounts, None)
        }
        DistributorInstruction::Distribute { amount } => {
            process_distribute(program_id, accounts, amount)
        }
        DistributorInstruction::FundRewards { amount } => {
            process_fund_rewards(program_id, accounts, amount)
        }
        DistributorInstruction::UpdateConfig {
            new_admin, new_distribution_authority, new_stake_cap
        } => {
            process_update_config(
                program_id, accounts, new_admin, new_distribution_authority, new_stake_cap,
            )
        }
        DistributorInstruction::QueryPosition { participant } => {
            process_query_position(program_id, accounts, &participant)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// Helpers: account validation
// ═══════════════════════════════════════════════════════════════

/// Ledger accounts are client-allocated, not PDAs: ownership is the only proof
/// the data was written by this program.
fn verify_ledger_account(program_id: &Pubkey, ledger: &AccountInfo) -> ProgramResult {
    if ledger.owner != program_id {
        msg!("Error: ledger {} not owned by this program", ledger.key);
        return Err(DistributorError::InvalidLedgerAccount.into());
    }
    Ok(())
}

fn verify_vault(header: &LedgerHeader, vault: &AccountInfo) -> ProgramResult {
    if header.vault != vault.key.to_bytes() {
        msg!("Error: vault {} does not belong to this ledger", vault.key);
        return Err(DistributorError::InvalidVault.into());
    }
    Ok(())
}

/// Verify the vault authority PDA and return its bump.
fn verify_vault_authority(
    program_id: &Pubkey,
    ledger: &Pubkey,
    vault_auth: &AccountInfo,
) -> Result<u8, ProgramError> {
    let (expected, bump) = state::derive_vault_authority(program_id, ledger);
    if *vault_auth.key != expected {
        return Err(DistributorError::InvalidPda.into());
    }
    Ok(bump)
}

// ═══════════════════════════════════════════════════════════════
// SPL Token adapter for the ledger's AssetLedger seam
// ═══════════════════════════════════════════════════════════════

/// Moves tokens between one participant's token account and the vault.
///
/// Debits are signed by the participant (outer transaction signer);
/// credits are signed by the vault authority PDA.
struct SplTokenVault<'a, 'b> {
    ledger: &'b Pubkey,
    vault: &'b AccountInfo<'a>,
    token_program: Option<&'b AccountInfo<'a>>,
    owner: Option<&'b AccountInfo<'a>>,
    owner_token_account: Option<&'b AccountInfo<'a>>,
    vault_auth: Option<(&'b AccountInfo<'a>, u8)>,
}

impl<'a, 'b> SplTokenVault<'a, 'b> {
    /// Balance checks only (Distribute).
    fn read_only(ledger: &'b Pubkey, vault: &'b AccountInfo<'a>) -> Self {
        Self {
            ledger,
            vault,
            token_program: None,
            owner: None,
            owner_token_account: None,
            vault_auth: None,
        }
    }

    fn token_balance(account: &AccountInfo) -> Result<u64, DistributorError> {
        let data = account
            .try_borrow_data()
            .map_err(|_| DistributorError::InvalidVault)?;
        let token_account = spl_token::state::Account::unpack(&data)
            .map_err(|_| DistributorError::InvalidVault)?;
        Ok(token_account.amount)
    }

    fn token_account(info: &AccountInfo) -> Result<spl_token::state::Account, DistributorError> {
        let data = info
            .try_borrow_data()
            .map_err(|_| DistributorError::TransferFailed)?;
        spl_token::state::Account::unpack(&data).map_err(|_| DistributorError::TransferFailed)
    }

    /// Token program failures abort the whole transaction, so anything
    /// that would make the transfer fail is rejected here first.
    fn check_transfer(
        source: &AccountInfo,
        destination: &AccountInfo,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), DistributorError> {
        let from = Self::token_account(source)?;
        let to = Self::token_account(destination)?;

        if from.owner != *authority {
            msg!("Error: {} is not owned by {}", source.key, authority);
            return Err(DistributorError::TransferFailed);
        }
        if from.is_frozen() || to.is_frozen() {
            msg!("Error: token account frozen");
            return Err(DistributorError::TransferFailed);
        }
        if from.mint != to.mint {
            msg!("Error: mint mismatch between {} and {}", source.key, destination.key);
            return Err(DistributorError::TransferFailed);
        }
        if amount > from.amount {
            msg!("Error: {} holds {}, transfer needs {}", source.key, from.amount, amount);
            return Err(DistributorError::TransferFailed);
        }
        Ok(())
    }

    fn transfer_accounts(
        &self,
        counterparty: &Pubkey,
    ) -> Result<(&'b AccountInfo<'a>, &'b AccountInfo<'a>, &'b AccountInfo<'a>), DistributorError> {
        let token_program = self.token_program.ok_or(DistributorError::TransferFailed)?;
        let owner = self.owner.ok_or(DistributorError::TransferFailed)?;
        let owner_token_account = self
            .owner_token_account
            .ok_or(DistributorError::TransferFailed)?;
        if owner.key != counterparty {
            return Err(DistributorError::Unauthorized);
        }
        Ok((token_program, owner, owner_token_account))
    }
}

impl<'a, 'b> AssetLedger for SplTokenVault<'a, 'b> {
    fn debit(&mut self, from: &Pubkey, amount: u64) -> Result<(), DistributorError> {
        let (token_program, owner, source) = self.transfer_accounts(from)?;
        Self::check_transfer(source, self.vault, owner.key, amount)?;

        let ix = spl_token::instruction::transfer(
            token_program.key,
            source.key,
            self.vault.key,
            owner.key,
            &[],
            amount,
        )
        .map_err(|_| DistributorError::TransferFailed)?;

        // Only reached for failures the runtime reports before the call
        // (missing account, privilege escalation).
        invoke(
            &ix,
            &[source.clone(), self.vault.clone(), owner.clone(), token_program.clone()],
        )
        .map_err(|e| {
            msg!("Error: debit of {} from {} failed: {}", amount, from, e);
            DistributorError::TransferFailed
        })
    }

    fn credit(&mut self, to: &Pubkey, amount: u64) -> Result<(), DistributorError> {
        let (token_program, _, destination) = self.transfer_accounts(to)?;
        let (vault_auth, bump) = self.vault_auth.ok_or(DistributorError::TransferFailed)?;
        Self::check_transfer(self.vault, destination, vault_auth.key, amount)?;

        let ix = spl_token::instruction::transfer(
            token_program.key,
            self.vault.key,
            destination.key,
            vault_auth.key,
            &[],
            amount,
        )
        .map_err(|_| DistributorError::TransferFailed)?;

        let vault_auth_seeds: &[&[u8]] = &[b"vault_auth", self.ledger.as_ref(), &[bump]];
        invoke_signed(
            &ix,
            &[self.vault.clone(), destination.clone(), vault_auth.clone(), token_program.clone()],
            &[vault_auth_seeds],
        )
        .map_err(|e| {
            msg!("Error: credit of {} to {} failed: {}", amount, to, e);
            DistributorError::TransferFailed
        })
    }

    fn balance_of(&self, account: &Pubkey) -> Result<u64, DistributorError> {
        if account == self.vault.key {
            return Self::token_balance(self.vault);
        }
        match self.owner_token_account {
            Some(info) if info.key == account => Self::token_balance(info),
            _ => Err(DistributorError::InvalidVault),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// 0: InitLedger
// ═══════════════════════════════════════════════════════════════

fn process_init_ledger(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    distribution_authority: &Pubkey,
    stake_cap: u64,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let admin = next_account_info(accounts_iter)?;
    let ledger_info = next_account_info(accounts_iter)?;
    let vault = next_account_info(accounts_iter)?;
    let vault_auth = next_account_info(accounts_iter)?;
    let mint = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let rent_sysvar = next_account_info(accounts_iter)?;

    if !admin.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    verify_ledger_account(program_id, ledger_info)?;
    verify_token_program(token_program)?;
    if mint.owner != token_program.key {
        msg!("Error: mint {} not owned by the token program", mint.key);
        return Err(DistributorError::InvalidMint.into());
    }
    let vault_auth_bump = verify_vault_authority(program_id, ledger_info.key, vault_auth)?;

    let rent = Rent::from_account_info(rent_sysvar)?;
    if !rent.is_exempt(ledger_info.lamports(), ledger_info.data_len()) {
        return Err(ProgramError::AccountNotRentExempt);
    }

    // Write ledger state (rejects re-initialization before any CPI)
    let event = {
        let mut ledger_data = ledger_info.try_borrow_mut_data()?;
        let (header, slots) = state::split_ledger_mut(&mut ledger_data)?;
        let mut ledger = RewardLedger::new(header, slots);
        ledger.initialize(
            ledger_info.key,
            admin.key,
            distribution_authority,
            mint.key,
            vault.key,
            vault_auth_bump,
            stake_cap,
        )?
    };

    // Initialize vault token account (authority = vault_auth PDA)
    invoke(
        &spl_token::instruction::initialize_account(
            token_program.key,
            vault.key,
            mint.key,
            vault_auth.key,
        )?,
        &[vault.clone(), mint.clone(), vault_auth.clone(), rent_sysvar.clone(), token_program.clone()],
    )?;

    event.log();
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 1: Stake
// ═══════════════════════════════════════════════════════════════

fn process_stake(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: u64,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let participant = next_account_info(accounts_iter)?;
    let ledger_info = next_account_info(accounts_iter)?;
    let participant_ata = next_account_info(accounts_iter)?;
    let vault = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;

    if !participant.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    verify_ledger_account(program_id, ledger_info)?;
    verify_token_program(token_program)?;

    let mut ledger_data = ledger_info.try_borrow_mut_data()?;
    let (header, slots) = state::split_ledger_mut(&mut ledger_data)?;
    let mut ledger = RewardLedger::load(header, slots)?;
    verify_vault(ledger.header(), vault)?;

    let mut assets = SplTokenVault {
        ledger: ledger_info.key,
        vault,
        token_program: Some(token_program),
        owner: Some(participant),
        owner_token_account: Some(participant_ata),
        vault_auth: None,
    };

    let event = ledger.stake(&mut assets, participant.key, amount)?;
    event.log();
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 2/3: Unstake / UnstakeAll
// ═══════════════════════════════════════════════════════════════

/// `amount == None` withdraws everything.
fn process_unstake(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: Option<u64>,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let participant = next_account_info(accounts_iter)?;
    let ledger_info = next_account_info(accounts_iter)?;
    let vault = next_account_info(accounts_iter)?;
    let participant_ata = next_account_info(accounts_iter)?;
    let vault_auth = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;

    if !participant.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    verify_ledger_account(program_id, ledger_info)?;
    // Validate token program BEFORE any invoke_signed that grants PDA signer authority.
    verify_token_program(token_program)?;
    let vault_auth_bump = verify_vault_authority(program_id, ledger_info.key, vault_auth)?;

    let mut ledger_data = ledger_info.try_borrow_mut_data()?;
    let (header, slots) = state::split_ledger_mut(&mut ledger_data)?;
    let mut ledger = RewardLedger::load(header, slots)?;
    verify_vault(ledger.header(), vault)?;

    let mut assets = SplTokenVault {
        ledger: ledger_info.key,
        vault,
        token_program: Some(token_program),
        owner: Some(participant),
        owner_token_account: Some(participant_ata),
        vault_auth: Some((vault_auth, vault_auth_bump)),
    };

    let event = match amount {
        Some(amount) => ledger.unstake(&mut assets, participant.key, amount)?,
        None => ledger.unstake_all(&mut assets, participant.key)?,
    };
    event.log();
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 4: Distribute
// ═══════════════════════════════════════════════════════════════

fn process_distribute(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: u64,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let authority = next_account_info(accounts_iter)?;
    let ledger_info = next_account_info(accounts_iter)?;
    let vault = next_account_info(accounts_iter)?;

    if !authority.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    verify_ledger_account(program_id, ledger_info)?;

    let mut ledger_data = ledger_info.try_borrow_mut_data()?;
    let (header, slots) = state::split_ledger_mut(&mut ledger_data)?;
    let mut ledger = RewardLedger::load(header, slots)?;
    verify_vault(ledger.header(), vault)?;

    let access = SingleAuthority(ledger.header().distribution_authority_pubkey());
    let assets = SplTokenVault::read_only(ledger_info.key, vault);

    let event = ledger.distribute(&access, &assets, authority.key, amount)?;
    event.log();

    let vault_balance = assets.balance_of(vault.key)?;
    let header = ledger.header();
    msg!(
        "Unallocated reward in vault: {}",
        math::unallocated_rewards(vault_balance, header.total_staked, header.total_accrued),
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 5: FundRewards
// ═══════════════════════════════════════════════════════════════

fn process_fund_rewards(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: u64,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let funder = next_account_info(accounts_iter)?;
    let ledger_info = next_account_info(accounts_iter)?;
    let funder_ata = next_account_info(accounts_iter)?;
    let vault = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;

    if !funder.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    verify_ledger_account(program_id, ledger_info)?;
    verify_token_program(token_program)?;

    let mut ledger_data = ledger_info.try_borrow_mut_data()?;
    let (header, slots) = state::split_ledger_mut(&mut ledger_data)?;
    let mut ledger = RewardLedger::load(header, slots)?;
    verify_vault(ledger.header(), vault)?;

    let mut assets = SplTokenVault {
        ledger: ledger_info.key,
        vault,
        token_program: Some(token_program),
        owner: Some(funder),
        owner_token_account: Some(funder_ata),
        vault_auth: None,
    };

    let event = ledger.fund_rewards(&mut assets, funder.key, amount)?;
    event.log();
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 6: UpdateConfig
// ═══════════════════════════════════════════════════════════════

fn process_update_config(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    new_admin: Option<Pubkey>,
    new_distribution_authority: Option<Pubkey>,
    new_stake_cap: Option<u64>,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let admin = next_account_info(accounts_iter)?;
    let ledger_info = next_account_info(accounts_iter)?;

    if !admin.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    verify_ledger_account(program_id, ledger_info)?;

    let mut ledger_data = ledger_info.try_borrow_mut_data()?;
    let (header, slots) = state::split_ledger_mut(&mut ledger_data)?;
    let mut ledger = RewardLedger::load(header, slots)?;

    let event = ledger.update_config(
        admin.key,
        new_admin,
        new_distribution_authority,
        new_stake_cap,
    )?;
    event.log();
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 7: QueryPosition (read-only, callable by anyone)
// ═══════════════════════════════════════════════════════════════

fn process_query_position(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    participant: &Pubkey,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let ledger_info = next_account_info(accounts_iter)?;
    verify_ledger_account(program_id, ledger_info)?;

    let ledger_data = ledger_info.try_borrow_data()?;
    let (header, slots) = state::split_ledger(&ledger_data)?;
    if header.is_initialized != 1 {
        return Err(DistributorError::NotInitialized.into());
    }

    let position = ledger::position(slots, participant);
    let claimable = position.claimable().ok_or(DistributorError::Overflow)?;

    let mut data = [0u8; 24];
    data[0..8].copy_from_slice(&position.stake.to_le_bytes());
    data[8..16].copy_from_slice(&position.accrued_reward.to_le_bytes());
    data[16..24].copy_from_slice(&claimable.to_le_bytes());
    set_return_data(&data);

    msg!(
        "Position {}: stake={} accrued={} claimable={}",
        participant,
        position.stake,
        position.accrued_reward,
        claimable,
    );
    Ok(())
}
