use solana_program::{program_error::ProgramError, pubkey::Pubkey};

/// Instructions for the reward distributor program.
#[derive(Debug)]
pub enum DistributorInstruction {
    /// Initialize a ledger. The ledger account must already be allocated
    /// (owner = this program, size = header + k slots) and the vault token
    /// account allocated (owner = token program) but not yet initialized.
    ///
    /// Accounts:
    ///   0. `[signer]` Admin (becomes ledger admin)
    ///   1. `[writable]` Ledger account
    ///   2. `[writable]` Vault token account (initialized here, authority = vault_auth PDA)
    ///   3. `[]` Vault authority PDA
    ///   4. `[]` Token mint (staked and reward token)
    ///   5. `[]` Token program
    ///   6. `[]` Rent sysvar
    InitLedger {
        distribution_authority: Pubkey,
        stake_cap: u64,
    },

    /// Stake tokens. Participant's slot is created on first stake.
    ///
    /// Accounts:
    ///   0. `[signer]` Participant
    ///   1. `[writable]` Ledger account
    ///   2. `[writable]` Participant's token account (source)
    ///   3. `[writable]` Vault token account (destination)
    ///   4. `[]` Token program
    Stake { amount: u64 },

    /// Withdraw `amount` of principal plus the matching slice of accrued reward.
    ///
    /// Accounts:
    ///   0. `[signer]` Participant
    ///   1. `[writable]` Ledger account
    ///   2. `[writable]` Vault token account (source)
    ///   3. `[writable]` Participant's token account (destination)
    ///   4. `[]` Vault authority PDA (transfer authority)
    ///   5. `[]` Token program
    Unstake { amount: u64 },

    /// Withdraw all principal and all accrued reward. Same accounts as Unstake.
    UnstakeAll,

    /// Split `amount` across everyone staked right now. Distribution authority only.
    ///
    /// Accounts:
    ///   0. `[signer]` Distribution authority
    ///   1. `[writable]` Ledger account
    ///   2. `[]` Vault token account (custody check)
    Distribute { amount: u64 },

    /// Transfer reward tokens into the vault. Permissionless.
    ///
    /// Accounts:
    ///   0. `[signer]` Funder
    ///   1. `[writable]` Ledger account
    ///   2. `[writable]` Funder's token account (source)
    ///   3. `[writable]` Vault token account (destination)
    ///   4. `[]` Token program
    FundRewards { amount: u64 },

    /// Admin updates ledger configuration.
    ///
    /// Accounts:
    ///   0. `[signer]` Admin
    ///   1. `[writable]` Ledger account
    UpdateConfig {
        new_admin: Option<Pubkey>,
        new_distribution_authority: Option<Pubkey>,
        new_stake_cap: Option<u64>,
    },

    /// Return `stake | accrued_reward | claimable` (3 × u64 LE) as return data.
    ///
    /// Accounts:
    ///   0. `[]` Ledger account
    QueryPosition { participant: Pubkey },
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64, ProgramError> {
    let bytes: [u8; 8] = data
        .get(offset..offset + 8)
        .and_then(|s| s.try_into().ok())
        .ok_or(ProgramError::InvalidInstructionData)?;
    Ok(u64::from_le_bytes(bytes))
}

fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey, ProgramError> {
    let bytes = data
        .get(offset..offset + 32)
        .ok_or(ProgramError::InvalidInstructionData)?;
    Pubkey::try_from(bytes).map_err(|_| ProgramError::InvalidInstructionData)
}

fn read_flag(data: &[u8], offset: usize) -> Result<bool, ProgramError> {
    data.get(offset)
        .map(|&b| b != 0)
        .ok_or(ProgramError::InvalidInstructionData)
}

impl DistributorInstruction {
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let (&tag, rest) = data.split_first().ok_or(ProgramError::InvalidInstructionData)?;

        match tag {
            0 => {
                // InitLedger: distribution_authority(32) + stake_cap(8)
                let distribution_authority = read_pubkey(rest, 0)?;
                let stake_cap = read_u64(rest, 32)?;
                Ok(Self::InitLedger { distribution_authority, stake_cap })
            }
            1 => Ok(Self::Stake { amount: read_u64(rest, 0)? }),
            2 => Ok(Self::Unstake { amount: read_u64(rest, 0)? }),
            3 => Ok(Self::UnstakeAll),
            4 => Ok(Self::Distribute { amount: read_u64(rest, 0)? }),
            5 => Ok(Self::FundRewards { amount: read_u64(rest, 0)? }),
            6 => {
                // UpdateConfig: [flag(1) + admin(32)] [flag(1) + authority(32)] [flag(1) + cap(8)]
                if rest.len() < 75 {
                    return Err(ProgramError::InvalidInstructionData);
                }
                let new_admin = read_flag(rest, 0)?.then(|| read_pubkey(rest, 1)).transpose()?;
                let new_distribution_authority =
                    read_flag(rest, 33)?.then(|| read_pubkey(rest, 34)).transpose()?;
                let new_stake_cap = read_flag(rest, 66)?.then(|| read_u64(rest, 67)).transpose()?;
                Ok(Self::UpdateConfig { new_admin, new_distribution_authority, new_stake_cap })
            }
            7 => Ok(Self::QueryPosition { participant: read_pubkey(rest, 0)? }),
            _ => Err(ProgramError::InvalidInstructionData),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Tag 0: InitLedger ──

    #[test]
    fn test_unpack_init_ledger() {
        let authority = Pubkey::new_unique();
        let mut data = vec![0u8];
        data.extend_from_slice(authority.as_ref());
        data.extend_from_slice(&5000u64.to_le_bytes());
        match DistributorInstruction::unpack(&data).unwrap() {
            DistributorInstruction::InitLedger { distribution_authority, stake_cap } => {
                assert_eq!(distribution_authority, authority);
                assert_eq!(stake_cap, 5000);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_unpack_init_ledger_too_short() {
        let mut data = vec![0u8];
        data.extend_from_slice(&[7u8; 32]); // authority only, no cap
        assert!(DistributorInstruction::unpack(&data).is_err());
    }

    // ── Tags 1/2/4/5: single amount ──

    #[test]
    fn test_unpack_stake() {
        let mut data = vec![1u8];
        data.extend_from_slice(&42u64.to_le_bytes());
        match DistributorInstruction::unpack(&data).unwrap() {
            DistributorInstruction::Stake { amount } => assert_eq!(amount, 42),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_unpack_unstake() {
        let mut data = vec![2u8];
        data.extend_from_slice(&10u64.to_le_bytes());
        match DistributorInstruction::unpack(&data).unwrap() {
            DistributorInstruction::Unstake { amount } => assert_eq!(amount, 10),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_unpack_distribute() {
        let mut data = vec![4u8];
        data.extend_from_slice(&3u64.to_le_bytes());
        match DistributorInstruction::unpack(&data).unwrap() {
            DistributorInstruction::Distribute { amount } => assert_eq!(amount, 3),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_unpack_fund_rewards() {
        let mut data = vec![5u8];
        data.extend_from_slice(&100u64.to_le_bytes());
        match DistributorInstruction::unpack(&data).unwrap() {
            DistributorInstruction::FundRewards { amount } => assert_eq!(amount, 100),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_unpack_amount_too_short() {
        assert!(DistributorInstruction::unpack(&[1u8, 1, 2, 3]).is_err());
        assert!(DistributorInstruction::unpack(&[4u8]).is_err());
    }

    // ── Tag 3: UnstakeAll ──

    #[test]
    fn test_unpack_unstake_all() {
        match DistributorInstruction::unpack(&[3u8]).unwrap() {
            DistributorInstruction::UnstakeAll => {}
            _ => panic!("wrong variant"),
        }
    }

    // ── Tag 6: UpdateConfig ──

    #[test]
    fn test_unpack_update_config_partial() {
        let authority = Pubkey::new_unique();
        let mut data = vec![6u8];
        data.push(0); // no admin
        data.extend_from_slice(&[0u8; 32]);
        data.push(1); // new authority
        data.extend_from_slice(authority.as_ref());
        data.push(1); // new cap
        data.extend_from_slice(&1000u64.to_le_bytes());
        match DistributorInstruction::unpack(&data).unwrap() {
            DistributorInstruction::UpdateConfig {
                new_admin,
                new_distribution_authority,
                new_stake_cap,
            } => {
                assert_eq!(new_admin, None);
                assert_eq!(new_distribution_authority, Some(authority));
                assert_eq!(new_stake_cap, Some(1000));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_unpack_update_config_too_short() {
        let mut data = vec![6u8];
        data.extend_from_slice(&[0u8; 74]);
        assert!(DistributorInstruction::unpack(&data).is_err());
    }

    // ── Tag 7: QueryPosition ──

    #[test]
    fn test_unpack_query_position() {
        let who = Pubkey::new_unique();
        let mut data = vec![7u8];
        data.extend_from_slice(who.as_ref());
        match DistributorInstruction::unpack(&data).unwrap() {
            DistributorInstruction::QueryPosition { participant } => assert_eq!(participant, who),
            _ => panic!("wrong variant"),
        }
    }

    // ── Invalid tag ──

    #[test]
    fn test_unpack_invalid_tag() {
        assert!(DistributorInstruction::unpack(&[255u8]).is_err());
    }

    #[test]
    fn test_unpack_empty() {
        let data: Vec<u8> = vec![];
        assert!(DistributorInstruction::unpack(&data).is_err());
    }

    #[test]
    fn test_unpack_max_values() {
        let mut data = vec![1u8];
        data.extend_from_slice(&u64::MAX.to_le_bytes());
        match DistributorInstruction::unpack(&data).unwrap() {
            DistributorInstruction::Stake { amount } => assert_eq!(amount, u64::MAX),
            _ => panic!("wrong variant"),
        }
    }
}
