//! Per-network record of the deployed implementations and proxies
//!
//! The file lives at `<project-dir>/<network>.json` and is rewritten after every
//! deployment so that re-running a script reuses what is already on chain.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::{config::NetworkName, errors::ScriptError};

/// A deployed implementation (logic) contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationRecord {
    /// The name of the compiled contract
    pub contract: String,
    /// The address of the implementation
    pub address: Address,
    /// The hash of the bytecode the implementation was deployed from
    pub bytecode_hash: B256,
}

/// A deployed upgradeable proxy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRecord {
    /// The address of the proxy, i.e. of the upgradeable instance
    pub address: Address,
    /// The implementation the proxy currently delegates to
    pub implementation: Address,
    /// The admin of the proxy
    pub admin: Address,
}

/// The deployments of a single network
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDeployments {
    /// The chain id the deployments were made on
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// The proxy admin shared by all proxies on the network
    #[serde(default)]
    pub proxy_admin: Option<Address>,
    /// The current implementation per alias
    #[serde(default)]
    pub implementations: BTreeMap<String, ImplementationRecord>,
    /// The proxies created per alias, oldest first
    #[serde(default)]
    pub proxies: BTreeMap<String, Vec<ProxyRecord>>,
}

impl NetworkDeployments {
    /// The path of the deployments file of a network
    pub fn path(project_dir: &Path, network: NetworkName) -> PathBuf {
        project_dir.join(format!("{network}.json"))
    }

    /// Read the deployments file, starting empty when it doesn't exist yet
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ReadDeployments(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
    }

    /// Write the deployments file, creating its directory if needed
    pub fn save(&self, path: &Path) -> Result<(), ScriptError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
    }

    /// The most recently created proxy of an alias
    pub fn latest_proxy(&self, alias: &str) -> Option<&ProxyRecord> {
        self.proxies.get(alias).and_then(|proxies| proxies.last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;

    #[test]
    fn test_save_and_load() {
        let dir = env::temp_dir()
            .join(format!("deploy-scripts-deployments-test-{}", std::process::id()));
        let path = NetworkDeployments::path(&dir, NetworkName::Develop);

        assert_eq!(NetworkDeployments::load(&path).unwrap(), NetworkDeployments::default());

        let mut deployments = NetworkDeployments {
            chain_id: Some(5777),
            proxy_admin: Some(Address::repeat_byte(1)),
            ..Default::default()
        };
        deployments.implementations.insert(
            "InnouToken".to_string(),
            ImplementationRecord {
                contract: "InnouToken".to_string(),
                address: Address::repeat_byte(2),
                bytecode_hash: B256::repeat_byte(3),
            },
        );
        for i in 4..6 {
            deployments
                .proxies
                .entry("InnouToken".to_string())
                .or_default()
                .push(ProxyRecord {
                    address: Address::repeat_byte(i),
                    implementation: Address::repeat_byte(2),
                    admin: Address::repeat_byte(1),
                });
        }
        deployments.save(&path).unwrap();

        let loaded = NetworkDeployments::load(&path).unwrap();
        assert_eq!(loaded, deployments);
        assert_eq!(
            loaded.latest_proxy("InnouToken").map(|p| p.address),
            Some(Address::repeat_byte(5))
        );
        assert!(loaded.latest_proxy("InnouTokensPreSale").is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_path_is_per_network() {
        let path = NetworkDeployments::path(Path::new(".deployments"), NetworkName::Rinkeby);
        assert_eq!(path, PathBuf::from(".deployments/rinkeby.json"));
    }
}
