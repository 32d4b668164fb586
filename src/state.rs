use bytemuck::{Pod, Zeroable};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::error::DistributorError;

/// Ledger header: first bytes of the ledger account.
///
/// The ledger account is allocated by the client (owner = this program) and
/// laid out as `LedgerHeader` followed by `capacity` `ParticipantSlot`s.
/// Capacity is fixed at InitLedger from the account size.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct LedgerHeader {
    /// Whether the ledger is initialized (1 = yes, 0 = no)
    pub is_initialized: u8,

    /// Bump seed for the vault authority PDA
    pub vault_authority_bump: u8,

    /// Padding for alignment
    pub _padding: [u8; 2],

    /// Number of participant slots following the header
    pub capacity: u32,

    /// Ledger admin (can update config)
    pub admin: [u8; 32],

    /// The only key allowed to trigger Distribute
    pub distribution_authority: [u8; 32],

    /// Staked / reward token mint
    pub mint: [u8; 32],

    /// Vault token account holding principal and rewards (owned by vault_authority PDA)
    pub vault: [u8; 32],

    /// Sum of every participant's stake
    pub total_staked: u64,

    /// Sum of every participant's accrued, unwithdrawn reward
    pub total_accrued: u64,

    /// Slots currently in use
    pub participant_count: u32,

    /// Padding
    pub _padding2: [u8; 4],

    /// Maximum total stake (0 = uncapped)
    pub stake_cap: u64,

    /// Total reward credited to participants (lifetime)
    pub total_distributed: u64,

    /// Total rounding remainder left undistributed (lifetime)
    pub total_forfeited: u64,

    /// Number of successful distributions (lifetime)
    pub distribution_count: u64,

    /// Reserved for future use
    pub _reserved: [u8; 64],
}

/// Size of LedgerHeader in bytes
pub const LEDGER_HEADER_SIZE: usize = core::mem::size_of::<LedgerHeader>();

/// One participant's position.
/// A slot with `in_use == 0` is free and fully zeroed.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct ParticipantSlot {
    /// Participant identity
    pub owner: [u8; 32],

    /// Principal staked
    pub stake: u64,

    /// Reward credited by past distributions, not yet withdrawn
    pub accrued_reward: u64,

    /// Whether this slot is claimed (1 = yes, 0 = free)
    pub in_use: u8,

    /// Padding
    pub _padding: [u8; 7],

    /// Reserved for future use
    pub _reserved: [u8; 8],
}

/// Size of ParticipantSlot in bytes
pub const PARTICIPANT_SLOT_SIZE: usize = core::mem::size_of::<ParticipantSlot>();

impl LedgerHeader {
    pub fn admin_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.admin)
    }

    pub fn distribution_authority_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.distribution_authority)
    }

    pub fn mint_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.mint)
    }

    pub fn vault_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.vault)
    }
}

impl ParticipantSlot {
    pub fn owner_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.owner)
    }

    pub fn is_free(&self) -> bool {
        self.in_use == 0
    }
}

/// Ledger account size for a given slot capacity.
pub fn ledger_account_size(capacity: usize) -> usize {
    LEDGER_HEADER_SIZE + capacity * PARTICIPANT_SLOT_SIZE
}

/// Slot capacity implied by a ledger account's data length.
/// Rejects accounts too small for one slot or with a ragged tail.
pub fn capacity_for_len(len: usize) -> Result<usize, DistributorError> {
    let body = len
        .checked_sub(LEDGER_HEADER_SIZE)
        .ok_or(DistributorError::InvalidLedgerAccount)?;
    if body == 0 || body % PARTICIPANT_SLOT_SIZE != 0 {
        return Err(DistributorError::InvalidLedgerAccount);
    }
    Ok(body / PARTICIPANT_SLOT_SIZE)
}

/// Split ledger account data into header and slot slab.
pub fn split_ledger(data: &[u8]) -> Result<(&LedgerHeader, &[ParticipantSlot]), ProgramError> {
    let capacity = capacity_for_len(data.len())?;
    let (head, body) = data.split_at(LEDGER_HEADER_SIZE);
    let header: &LedgerHeader = bytemuck::try_from_bytes(head)
        .map_err(|_| DistributorError::InvalidLedgerAccount)?;
    let slots: &[ParticipantSlot] =
        bytemuck::try_cast_slice(&body[..capacity * PARTICIPANT_SLOT_SIZE])
            .map_err(|_| DistributorError::InvalidLedgerAccount)?;
    Ok((header, slots))
}

/// Mutable variant of [`split_ledger`].
pub fn split_ledger_mut(
    data: &mut [u8],
) -> Result<(&mut LedgerHeader, &mut [ParticipantSlot]), ProgramError> {
    let capacity = capacity_for_len(data.len())?;
    let (head, body) = data.split_at_mut(LEDGER_HEADER_SIZE);
    let header: &mut LedgerHeader = bytemuck::try_from_bytes_mut(head)
        .map_err(|_| DistributorError::InvalidLedgerAccount)?;
    let slots: &mut [ParticipantSlot] =
        bytemuck::try_cast_slice_mut(&mut body[..capacity * PARTICIPANT_SLOT_SIZE])
            .map_err(|_| DistributorError::InvalidLedgerAccount)?;
    Ok((header, slots))
}

/// Index of the slot held by `participant`, if any.
pub fn find_slot(slots: &[ParticipantSlot], participant: &Pubkey) -> Option<usize> {
    let key = participant.to_bytes();
    slots.iter().position(|s| s.in_use == 1 && s.owner == key)
}

/// Derive the vault authority PDA for a given ledger.
/// Owns the vault token account; signs every payout.
pub fn derive_vault_authority(program_id: &Pubkey, ledger: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"vault_auth", ledger.as_ref()], program_id)
}
