//! Utilities for the deploy scripts.

use std::process::{Command, Stdio};

use alloy::{
    network::EthereumWallet,
    primitives::{
        utils::{parse_ether, parse_units},
        Address, Bytes, U256,
    },
    providers::{DynProvider, Provider, ProviderBuilder},
    transports::http::reqwest::Url,
};
use itertools::Itertools;
use tracing::info;

use crate::{
    config::{NetworkConfig, NetworkKind, NetworkProfile},
    constants::TOKEN_DECIMALS,
    errors::ScriptError,
};

/// An RPC client bound to a network, along with the accounts it can send from
#[derive(Clone, Debug)]
pub struct Client {
    /// The provider, with a wallet attached when local signers are used
    pub provider: DynProvider,
    /// The accounts available for sending transactions, in order
    pub accounts: Vec<Address>,
    /// The classification of the connected chain
    pub kind: NetworkKind,
    /// Gas settings applied to transactions that don't specify their own
    pub tx_defaults: TxOptions,
}

impl Client {
    /// The account that funds deployments, i.e. the first account
    pub fn deployer(&self) -> Result<Address, ScriptError> {
        self.accounts.first().copied().ok_or_else(|| {
            ScriptError::ClientInitialization("no accounts available".to_string())
        })
    }
}

/// Per-transaction overrides
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// The sender of the transaction
    pub from: Option<Address>,
    /// The ether value attached to the transaction
    pub value: Option<U256>,
    /// The gas limit of the transaction
    pub gas: Option<u64>,
    /// The legacy gas price of the transaction
    pub gas_price: Option<u128>,
}

impl TxOptions {
    /// Options sending from the given account
    pub fn from(from: Address) -> Self {
        TxOptions {
            from: Some(from),
            ..Default::default()
        }
    }

    /// Set the gas limit
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Set the attached value
    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// The options a network profile applies to transactions that don't set their own
    pub fn profile_defaults(profile: &NetworkProfile, from: Option<Address>) -> Self {
        TxOptions {
            from,
            gas: profile.gas_limit,
            gas_price: profile.gas_price,
            ..Default::default()
        }
    }

    /// Fill the unset fields from the given defaults
    pub fn or(self, defaults: TxOptions) -> Self {
        TxOptions {
            from: self.from.or(defaults.from),
            value: self.value.or(defaults.value),
            gas: self.gas.or(defaults.gas),
            gas_price: self.gas_price.or(defaults.gas_price),
        }
    }
}

/// Sets up the client for the given network, attaching local signers when the
/// credentials provide them and otherwise relying on the node's unlocked accounts.
pub async fn setup_client(config: &NetworkConfig) -> Result<Client, ScriptError> {
    let url =
        Url::parse(&config.rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let signers = config.credentials.signers()?;

    let (provider, accounts) = match signers.split_first() {
        Some((first, rest)) => {
            let mut wallet = EthereumWallet::new(first.clone());
            for signer in rest {
                wallet.register_signer(signer.clone());
            }
            let accounts = signers.iter().map(|s| s.address()).collect_vec();
            let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);
            (DynProvider::new(provider), accounts)
        }
        None => {
            let provider = DynProvider::new(ProviderBuilder::new().connect_http(url));
            let accounts = provider
                .get_accounts()
                .await
                .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
            (provider, accounts)
        }
    };

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    config.check_chain_id(chain_id)?;
    let kind = NetworkKind::from_chain_id(chain_id);

    info!(
        "connected to {} (chain id {chain_id}, {kind} network) with {} accounts",
        config.profile.name,
        accounts.len()
    );

    let tx_defaults = TxOptions::profile_defaults(&config.profile, accounts.first().copied());

    Ok(Client {
        provider,
        accounts,
        kind,
        tx_defaults,
    })
}

/// Run the given compile command, e.g. `truffle compile`, streaming its output
pub fn run_compile_command(compile_cmd: &str) -> Result<(), ScriptError> {
    let mut parts = compile_cmd.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| ScriptError::ContractCompilation("empty compile command".to_string()))?;

    info!("compiling contracts with `{compile_cmd}`");
    let mut cmd = Command::new(program);
    cmd.args(parts).stdout(Stdio::inherit()).stderr(Stdio::inherit());

    let status = cmd
        .status()
        .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?;
    if !status.success() {
        return Err(ScriptError::ContractCompilation(format!(
            "`{compile_cmd}` exited with {status}"
        )));
    }

    Ok(())
}

// ---------
// | Units |
// ---------

/// Convert a decimal amount of ether into wei
pub fn ether(amount: &str) -> Result<U256, ScriptError> {
    parse_ether(amount).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Convert a decimal amount of tokens into base units (18 decimals)
pub fn e18(amount: &str) -> Result<U256, ScriptError> {
    parse_units(amount, TOKEN_DECIMALS)
        .map(|units| units.get_absolute())
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// The UTF-8 bytes of a string, for `bytes` arguments
pub fn str_to_bytes(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ether_scaling() {
        assert_eq!(ether("5").unwrap(), U256::from(5_000_000_000_000_000_000_u128));
        assert_eq!(ether("0.08").unwrap(), U256::from(80_000_000_000_000_000_u128));
        assert!(ether("five").is_err());
    }

    #[test]
    fn test_token_scaling() {
        let expected = U256::from(10).pow(U256::from(26));
        assert_eq!(e18("100000000").unwrap(), expected);
        assert_eq!(e18("401000000").unwrap(), U256::from(401) * U256::from(10).pow(U256::from(24)));
    }

    #[test]
    fn test_str_to_bytes() {
        assert_eq!(str_to_bytes("ab").as_ref(), &[0x61, 0x62]);
        assert!(str_to_bytes("").is_empty());
    }

    #[test]
    fn test_tx_options_defaults() {
        let defaults = TxOptions {
            gas: Some(4_000_000),
            gas_price: Some(1),
            ..Default::default()
        };
        let opts = TxOptions::from(Address::ZERO).gas(300_000).or(defaults);
        assert_eq!(opts.from, Some(Address::ZERO));
        assert_eq!(opts.gas, Some(300_000));
        assert_eq!(opts.gas_price, Some(1));
        assert_eq!(opts.value, None);
    }
}
