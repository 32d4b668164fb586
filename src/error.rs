use solana_program::program_error::ProgramError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DistributorError {
    /// Ledger account already initialized
    AlreadyInitialized = 0,
    /// Ledger not initialized
    NotInitialized = 1,
    /// Caller is neither admin nor distribution authority
    Unauthorized = 2,
    /// Zero amount
    ZeroAmount = 3,
    /// Arithmetic overflow
    Overflow = 4,
    /// Token movement through the asset ledger did not complete
    TransferFailed = 5,
    /// Distribution attempted while nothing is staked
    NoStakers = 6,
    /// Unstake amount is zero or exceeds the participant's stake
    InsufficientStake = 7,
    /// Vault cannot back the requested distribution
    InsufficientRewardFunds = 8,
    /// Stake cap exceeded
    StakeCapExceeded = 9,
    /// No free participant slot left in the ledger
    LedgerFull = 10,
    /// Ledger account has the wrong owner or size
    InvalidLedgerAccount = 11,
    /// Vault account does not match the ledger
    InvalidVault = 12,
    /// Invalid PDA derivation
    InvalidPda = 13,
    /// Mint account is not owned by the token program
    InvalidMint = 14,
}

impl From<DistributorError> for ProgramError {
    fn from(e: DistributorError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
