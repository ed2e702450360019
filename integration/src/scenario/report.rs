//! The final report of the scenario, and the accounting checks run on it

use std::collections::BTreeMap;

use alloy::primitives::U256;
use deploy_scripts::contract::ContractEvent;
use eyre::{ensure, Result};
use serde::{Serialize, Serializer};

/// The state of the presale at the end of the scenario
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FinalReport {
    /// The presale's events over the scenario's block range
    pub(crate) events: Vec<ContractEvent>,
    /// The presale's token balance before the burn
    #[serde(serialize_with = "decimal")]
    pub(crate) unsold_tokens: U256,
    /// The token supply before the burn
    #[serde(serialize_with = "decimal")]
    pub(crate) pre_burn_supply: U256,
    /// The token supply after the burn
    #[serde(serialize_with = "decimal")]
    pub(crate) post_burn_supply: U256,
    /// Token balances at the end of the scenario
    pub(crate) end_token_balances: EndTokenBalances,
    /// The recorded contributions of the investors, by role
    pub(crate) contributions: BTreeMap<String, Contribution>,
}

/// Token balances of the presale and the participants holding tokens
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EndTokenBalances {
    #[serde(serialize_with = "decimal")]
    pub(crate) presale: U256,
    #[serde(serialize_with = "decimal")]
    pub(crate) investor: U256,
    #[serde(serialize_with = "decimal")]
    pub(crate) fiat_investor: U256,
    #[serde(serialize_with = "decimal")]
    pub(crate) team_wallet: U256,
    #[serde(serialize_with = "decimal")]
    pub(crate) bounty_wallet: U256,
    #[serde(serialize_with = "decimal")]
    pub(crate) rewards_wallet: U256,
}

/// An investor's contribution, in wei, and its individual cap
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Contribution {
    /// The amount contributed
    #[serde(serialize_with = "decimal")]
    pub(crate) contribution: U256,
    /// The investor's cap
    #[serde(serialize_with = "decimal")]
    pub(crate) cap: U256,
}

impl FinalReport {
    /// Check the report's accounting: the burn removed exactly the unsold tokens from
    /// the supply, and no investor contributed above its cap
    pub(crate) fn check(&self) -> Result<()> {
        let expected_supply = self.pre_burn_supply.checked_sub(self.unsold_tokens);
        ensure!(
            expected_supply == Some(self.post_burn_supply),
            "supply after burn is {}, expected {} - {}",
            self.post_burn_supply,
            self.pre_burn_supply,
            self.unsold_tokens
        );

        for (investor, Contribution { contribution, cap }) in &self.contributions {
            ensure!(
                contribution <= cap,
                "{investor} contributed {contribution} above its cap of {cap}"
            );
        }

        Ok(())
    }
}

/// Serialize an amount as a decimal string
fn decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    use deploy_scripts::utils::{e18, ether};
    use serde_json::json;

    fn report() -> FinalReport {
        let contributions = BTreeMap::from([
            (
                "investor".to_string(),
                Contribution { contribution: ether("15").unwrap(), cap: ether("50").unwrap() },
            ),
            (
                "fiatInvestor".to_string(),
                Contribution { contribution: ether("13").unwrap(), cap: ether("20").unwrap() },
            ),
        ]);

        FinalReport {
            events: Vec::new(),
            unsold_tokens: e18("60000000").unwrap(),
            pre_burn_supply: e18("100000000").unwrap(),
            post_burn_supply: e18("40000000").unwrap(),
            end_token_balances: EndTokenBalances::default(),
            contributions,
        }
    }

    #[test]
    fn test_balanced_report() {
        report().check().unwrap();
    }

    #[test]
    fn test_supply_mismatch() {
        let mut report = report();
        report.post_burn_supply += U256::from(1);
        assert!(report.check().is_err());

        report.unsold_tokens = report.pre_burn_supply + U256::from(1);
        assert!(report.check().is_err());
    }

    #[test]
    fn test_contribution_above_cap() {
        let mut report = report();
        report.contributions.get_mut("investor").unwrap().contribution = ether("51").unwrap();
        assert!(report.check().is_err());
    }

    #[test]
    fn test_amounts_serialized_as_decimals() {
        let json = serde_json::to_value(report()).unwrap();

        assert_eq!(json["unsoldTokens"], json!("60000000000000000000000000"));
        assert_eq!(json["endTokenBalances"]["fiatInvestor"], json!("0"));
        assert_eq!(
            json["contributions"]["investor"],
            json!({ "contribution": "15000000000000000000", "cap": "50000000000000000000" })
        );
    }
}
