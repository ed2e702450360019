//! Network profiles and the signing credentials used against them

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use clap::ValueEnum;
use tracing::warn;

use crate::{
    constants::{
        INFURA_KEY_ENV_VAR, INFURA_KEY_PLACEHOLDER, LIVE_GAS_PRICE, NUM_MNEMONIC_ACCOUNTS,
        REMOTE_GAS_LIMIT,
    },
    errors::ScriptError,
};

/// The networks a deployment can target
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum NetworkName {
    /// A local node on the default port, e.g. `ganache-cli --deterministic`
    Truffle,
    /// The local development node, e.g. `truffle develop`
    Develop,
    /// The ropsten public test network
    Ropsten,
    /// The rinkeby public test network
    Rinkeby,
    /// Ethereum mainnet
    Live,
}

impl Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkName::Truffle => write!(f, "truffle"),
            NetworkName::Develop => write!(f, "develop"),
            NetworkName::Ropsten => write!(f, "ropsten"),
            NetworkName::Rinkeby => write!(f, "rinkeby"),
            NetworkName::Live => write!(f, "live"),
        }
    }
}

/// Where a profile expects its signing accounts to come from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    /// Accounts unlocked on the node, unless a secret is supplied anyway
    Node,
    /// A mnemonic or a list of private keys supplied through the environment
    Secret,
}

/// A static description of a network
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkProfile {
    /// The name of the network
    pub name: NetworkName,
    /// The RPC endpoint, possibly containing the Infura key placeholder
    pub endpoint: &'static str,
    /// The chain id the node must report, `None` accepts any chain
    pub chain_id: Option<u64>,
    /// The expected credential source
    pub credentials: CredentialSource,
    /// The gas limit applied to transactions that do not set one
    pub gas_limit: Option<u64>,
    /// The gas price applied to transactions that do not set one
    pub gas_price: Option<u128>,
}

impl NetworkName {
    /// The static profile of the network
    pub fn profile(self) -> NetworkProfile {
        let (endpoint, chain_id, credentials, gas_limit, gas_price) = match self {
            NetworkName::Truffle => ("http://127.0.0.1:8545", None, CredentialSource::Node, None, None),
            NetworkName::Develop => ("http://127.0.0.1:9545", None, CredentialSource::Node, None, None),
            NetworkName::Ropsten => (
                "https://ropsten.infura.io/v3/{INFURA_KEY}",
                Some(3),
                CredentialSource::Secret,
                None,
                None,
            ),
            NetworkName::Rinkeby => (
                "https://rinkeby.infura.io/v3/{INFURA_KEY}",
                Some(4),
                CredentialSource::Secret,
                Some(REMOTE_GAS_LIMIT),
                None,
            ),
            NetworkName::Live => (
                "https://mainnet.infura.io/v3/{INFURA_KEY}",
                Some(1),
                CredentialSource::Secret,
                Some(REMOTE_GAS_LIMIT),
                Some(LIVE_GAS_PRICE),
            ),
        };

        NetworkProfile {
            name: self,
            endpoint,
            chain_id,
            credentials,
            gas_limit,
            gas_price,
        }
    }
}

/// The classification of a chain, derived from its chain id
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NetworkKind {
    /// Ethereum mainnet
    Main,
    /// The ropsten test network
    Ropsten,
    /// The rinkeby test network
    Rinkeby,
    /// The goerli test network
    Goerli,
    /// The kovan test network
    Kovan,
    /// Any other chain, e.g. a local development node
    Private,
}

impl NetworkKind {
    /// Classify a chain by its id
    pub fn from_chain_id(chain_id: u64) -> Self {
        match chain_id {
            1 => NetworkKind::Main,
            3 => NetworkKind::Ropsten,
            4 => NetworkKind::Rinkeby,
            5 => NetworkKind::Goerli,
            42 => NetworkKind::Kovan,
            _ => NetworkKind::Private,
        }
    }

    /// Whether the chain is a private/development chain
    pub fn is_private(self) -> bool {
        self == NetworkKind::Private
    }
}

impl Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkKind::Main => write!(f, "main"),
            NetworkKind::Ropsten => write!(f, "ropsten"),
            NetworkKind::Rinkeby => write!(f, "rinkeby"),
            NetworkKind::Goerli => write!(f, "goerli"),
            NetworkKind::Kovan => write!(f, "kovan"),
            NetworkKind::Private => write!(f, "private"),
        }
    }
}

/// The signing material used to send transactions
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Use the accounts unlocked on the node
    Node,
    /// Derive accounts from a BIP39 mnemonic
    Mnemonic(String),
    /// Use an explicit list of private keys
    PrivateKeys(Vec<String>),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Node => write!(f, "Node"),
            Credentials::Mnemonic(_) => write!(f, "Mnemonic(..)"),
            Credentials::PrivateKeys(keys) => write!(f, "PrivateKeys({} keys)", keys.len()),
        }
    }
}

impl Credentials {
    /// Resolve the credentials from the raw secrets.
    ///
    /// The mnemonic takes precedence, the private keys are ignored when both are given.
    /// The keys are expected as a single key or a comma-delimited list.
    pub fn resolve(mnemonic: Option<String>, priv_keys: Option<String>) -> Self {
        let mnemonic = mnemonic.filter(|m| !m.trim().is_empty());
        let keys: Option<Vec<String>> = priv_keys
            .map(|keys| {
                keys.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|keys| !keys.is_empty());

        match (mnemonic, keys) {
            (Some(mnemonic), keys) => {
                if keys.is_some() {
                    warn!("both a mnemonic and private keys were given, ignoring the private keys");
                }
                Credentials::Mnemonic(mnemonic)
            }
            (None, Some(keys)) => Credentials::PrivateKeys(keys),
            (None, None) => Credentials::Node,
        }
    }

    /// Build the local signers described by the credentials, in account order.
    ///
    /// Returns an empty list for node-managed accounts.
    pub fn signers(&self) -> Result<Vec<PrivateKeySigner>, ScriptError> {
        match self {
            Credentials::Node => Ok(vec![]),
            Credentials::Mnemonic(phrase) => (0..NUM_MNEMONIC_ACCOUNTS)
                .map(|index| {
                    MnemonicBuilder::<English>::default()
                        .phrase(phrase.as_str())
                        .index(index)
                        .and_then(|builder| builder.build())
                        .map_err(|e| ScriptError::Config(e.to_string()))
                })
                .collect(),
            Credentials::PrivateKeys(keys) => keys
                .iter()
                .map(|key| {
                    PrivateKeySigner::from_str(key).map_err(|e| ScriptError::Config(e.to_string()))
                })
                .collect(),
        }
    }
}

/// The resolved configuration of the selected network
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// The static profile of the network
    pub profile: NetworkProfile,
    /// The RPC url, with the Infura key substituted
    pub rpc_url: String,
    /// The signing credentials
    pub credentials: Credentials,
}

impl NetworkConfig {
    /// Resolve the configuration of a network.
    ///
    /// An explicit RPC url replaces the profile's endpoint template.
    pub fn load(
        name: NetworkName,
        rpc_url: Option<String>,
        infura_key: Option<String>,
        credentials: Credentials,
    ) -> Result<Self, ScriptError> {
        let profile = name.profile();

        let rpc_url = match rpc_url {
            Some(url) => url,
            None => render_endpoint(profile.endpoint, infura_key.as_deref())?,
        };

        if profile.credentials == CredentialSource::Secret && credentials == Credentials::Node {
            return Err(ScriptError::Config(format!(
                "network {name} requires a mnemonic or private keys"
            )));
        }

        Ok(NetworkConfig {
            profile,
            rpc_url,
            credentials,
        })
    }

    /// Check the chain id reported by the node against the profile
    pub fn check_chain_id(&self, chain_id: u64) -> Result<(), ScriptError> {
        match self.profile.chain_id {
            Some(expected) if expected != chain_id => Err(ScriptError::Config(format!(
                "network {} expects chain id {expected}, node reports {chain_id}",
                self.profile.name
            ))),
            _ => Ok(()),
        }
    }
}

/// Substitute the Infura key into an endpoint template
fn render_endpoint(template: &str, infura_key: Option<&str>) -> Result<String, ScriptError> {
    if !template.contains(INFURA_KEY_PLACEHOLDER) {
        return Ok(template.to_string());
    }

    let key = infura_key.filter(|k| !k.is_empty()).ok_or_else(|| {
        ScriptError::Config(format!("{INFURA_KEY_ENV_VAR} is required for {template}"))
    })?;
    Ok(template.replace(INFURA_KEY_PLACEHOLDER, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The mnemonic `ganache-cli --deterministic` seeds its accounts with
    const DETERMINISTIC_MNEMONIC: &str =
        "myth like bonus scare over problem client lizard pioneer submit female collect";

    #[test]
    fn test_classify_chain_ids() {
        assert_eq!(NetworkKind::from_chain_id(1), NetworkKind::Main);
        assert_eq!(NetworkKind::from_chain_id(3), NetworkKind::Ropsten);
        assert_eq!(NetworkKind::from_chain_id(4), NetworkKind::Rinkeby);
        assert_eq!(NetworkKind::from_chain_id(5777), NetworkKind::Private);
        assert!(NetworkKind::from_chain_id(1337).is_private());
        assert!(!NetworkKind::from_chain_id(42).is_private());
    }

    #[test]
    fn test_remote_endpoint_requires_infura_key() {
        let creds = Credentials::Mnemonic(DETERMINISTIC_MNEMONIC.to_string());
        let res = NetworkConfig::load(NetworkName::Ropsten, None, None, creds.clone());
        assert!(matches!(res, Err(ScriptError::Config(_))));

        let config =
            NetworkConfig::load(NetworkName::Ropsten, None, Some("abc".to_string()), creds)
                .unwrap();
        assert_eq!(config.rpc_url, "https://ropsten.infura.io/v3/abc");
        assert_eq!(config.profile.chain_id, Some(3));
    }

    #[test]
    fn test_remote_profile_requires_secret() {
        let res = NetworkConfig::load(
            NetworkName::Live,
            None,
            Some("abc".to_string()),
            Credentials::Node,
        );
        assert!(matches!(res, Err(ScriptError::Config(_))));
    }

    #[test]
    fn test_rpc_url_override() {
        let config = NetworkConfig::load(
            NetworkName::Develop,
            Some("http://10.0.0.2:9545".to_string()),
            None,
            Credentials::Node,
        )
        .unwrap();
        assert_eq!(config.rpc_url, "http://10.0.0.2:9545");
    }

    #[test]
    fn test_live_gas_defaults() {
        let profile = NetworkName::Live.profile();
        assert_eq!(profile.gas_limit, Some(4_000_000));
        assert_eq!(profile.gas_price, Some(50_000_000_000));
        assert_eq!(NetworkName::Develop.profile().gas_limit, None);
    }

    #[test]
    fn test_chain_id_check() {
        let config = NetworkConfig::load(
            NetworkName::Rinkeby,
            None,
            Some("abc".to_string()),
            Credentials::PrivateKeys(vec!["0x01".to_string()]),
        )
        .unwrap();
        assert!(config.check_chain_id(4).is_ok());
        assert!(config.check_chain_id(1).is_err());

        let local = NetworkConfig::load(NetworkName::Truffle, None, None, Credentials::Node).unwrap();
        assert!(local.check_chain_id(1337).is_ok());
    }

    #[test]
    fn test_mnemonic_takes_precedence() {
        let creds = Credentials::resolve(
            Some(DETERMINISTIC_MNEMONIC.to_string()),
            Some("0x01,0x02".to_string()),
        );
        assert_eq!(creds, Credentials::Mnemonic(DETERMINISTIC_MNEMONIC.to_string()));
    }

    #[test]
    fn test_private_keys_are_split() {
        let creds = Credentials::resolve(None, Some(" 0x01 , 0x02,".to_string()));
        assert_eq!(
            creds,
            Credentials::PrivateKeys(vec!["0x01".to_string(), "0x02".to_string()])
        );
        assert_eq!(Credentials::resolve(Some("  ".to_string()), None), Credentials::Node);
    }

    #[test]
    fn test_mnemonic_derives_accounts() {
        let signers = Credentials::Mnemonic(DETERMINISTIC_MNEMONIC.to_string())
            .signers()
            .unwrap();
        assert_eq!(signers.len(), NUM_MNEMONIC_ACCOUNTS as usize);
        // First account of `ganache-cli --deterministic`
        assert_eq!(
            signers[0].address().to_string(),
            "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1"
        );
    }
}
