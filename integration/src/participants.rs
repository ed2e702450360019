//! The roles the scenario's accounts play

use alloy::primitives::Address;
use eyre::{eyre, Result};
use serde::Serialize;

use crate::constants::NUM_PARTICIPANTS;

/// The accounts taking part in the presale, assigned in account order
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Participants {
    /// Deploys the contracts and administers the token's roles
    pub(crate) deployer: Address,
    /// Owns the presale
    pub(crate) owner: Address,
    /// Mints tokens
    pub(crate) minter: Address,
    /// Sets the investors' individual caps
    pub(crate) capper: Address,
    /// Receives the contributions
    pub(crate) wallet: Address,
    /// Receives the team's share on issuance
    pub(crate) team_wallet: Address,
    /// Receives the bounty share on issuance
    pub(crate) bounty_wallet: Address,
    /// Receives the rewards share on issuance
    pub(crate) rewards_wallet: Address,
    /// Contributes ether onchain
    pub(crate) investor: Address,
    /// Pays on behalf of the investor and buys offchain
    pub(crate) fiat_investor: Address,
}

impl Participants {
    /// Assign the roles to the first accounts
    pub(crate) fn from_accounts(accounts: &[Address]) -> Result<Self> {
        let roles: [Address; NUM_PARTICIPANTS] = accounts
            .get(..NUM_PARTICIPANTS)
            .and_then(|first| first.try_into().ok())
            .ok_or_else(|| {
                eyre!(
                    "the scenario needs {NUM_PARTICIPANTS} accounts, {} available",
                    accounts.len()
                )
            })?;

        let [
            deployer,
            owner,
            minter,
            capper,
            wallet,
            team_wallet,
            bounty_wallet,
            rewards_wallet,
            investor,
            fiat_investor,
        ] = roles;
        Ok(Participants {
            deployer,
            owner,
            minter,
            capper,
            wallet,
            team_wallet,
            bounty_wallet,
            rewards_wallet,
            investor,
            fiat_investor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts(n: u8) -> Vec<Address> {
        (1..=n).map(Address::repeat_byte).collect()
    }

    #[test]
    fn test_roles_in_account_order() {
        let participants = Participants::from_accounts(&accounts(12)).unwrap();

        assert_eq!(participants.deployer, Address::repeat_byte(1));
        assert_eq!(participants.capper, Address::repeat_byte(4));
        assert_eq!(participants.rewards_wallet, Address::repeat_byte(8));
        assert_eq!(participants.fiat_investor, Address::repeat_byte(10));
    }

    #[test]
    fn test_too_few_accounts() {
        assert!(Participants::from_accounts(&accounts(9)).is_err());
        assert!(Participants::from_accounts(&[]).is_err());
    }
}
