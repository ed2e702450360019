//! Deployment of the ERC1820 registry, which ERC777 tokens look up their
//! interface implementers in.
//!
//! The registry is deployed with the keyless method of EIP1820: a pre-signed transaction
//! whose sender is funded just before broadcasting it, so that the registry lands at
//! the same address on every chain.

use std::{fs, path::Path};

use alloy::{
    primitives::{hex, Address},
    providers::Provider,
};
use tracing::{info, warn};

use crate::{
    config::NetworkKind,
    constants::{
        ERC1820_DEPLOYER_ADDRESS, ERC1820_DEPLOYMENT_COST_ETHER, ERC1820_RAW_TX_FILE,
        ERC1820_REGISTRY_ADDRESS,
    },
    errors::ScriptError,
    transactions::send_value,
    utils::{ether, Client, TxOptions},
};

/// What the registry deployer did
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegistryDeployment {
    /// The registry was deployed in this run
    Deployed,
    /// The registry already had code on chain
    AlreadyDeployed,
    /// The network is not private, the registry is expected to exist
    Skipped,
}

/// The address of the ERC1820 registry
pub const fn registry_address() -> Address {
    ERC1820_REGISTRY_ADDRESS
}

/// Ensure the ERC1820 registry exists on a private network, funding its deployment
/// from the given account.
///
/// Public networks are skipped, the registry has been deployed there long ago.
pub async fn deploy_erc1820_registry(
    client: &Client,
    kind: NetworkKind,
    funder: Address,
    artifacts_dir: &Path,
) -> Result<RegistryDeployment, ScriptError> {
    if !kind.is_private() {
        warn!("skipping ERC1820 registry deployment on {kind} network");
        return Ok(RegistryDeployment::Skipped);
    }

    let registry = registry_address();
    let code = client
        .provider
        .get_code_at(registry)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    if !code.is_empty() {
        info!("ERC1820 registry already deployed at {registry}");
        return Ok(RegistryDeployment::AlreadyDeployed);
    }

    info!("deploying an ERC1820 registry on the {kind} network");
    let raw_tx = read_raw_deployment_tx(artifacts_dir)?;

    let cost = ether(ERC1820_DEPLOYMENT_COST_ETHER)?;
    send_value(client, ERC1820_DEPLOYER_ADDRESS, TxOptions::from(funder).value(cost)).await?;

    client
        .provider
        .send_raw_transaction(&raw_tx)
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

    info!("ERC1820 registry deployed at {registry}");
    Ok(RegistryDeployment::Deployed)
}

/// Read the hex-encoded pre-signed deployment transaction
fn read_raw_deployment_tx(artifacts_dir: &Path) -> Result<Vec<u8>, ScriptError> {
    let path = artifacts_dir.join(ERC1820_RAW_TX_FILE);
    let contents = fs::read_to_string(&path)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;
    parse_raw_tx(&contents)
}

/// Decode a hex raw transaction, tolerating surrounding whitespace and a `0x` prefix
fn parse_raw_tx(contents: &str) -> Result<Vec<u8>, ScriptError> {
    let raw = hex::decode(contents.trim()).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
    if raw.is_empty() {
        return Err(ScriptError::ArtifactParsing("empty raw transaction".to_string()));
    }

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_address() {
        assert_eq!(
            registry_address().to_string(),
            "0x1820a4B7618BdE71Dce8cdc73aAB6C95905faD24"
        );
        assert_eq!(
            ERC1820_DEPLOYER_ADDRESS.to_string(),
            "0xa990077c3205cbDf861e17Fa532eeB069cE9fF96"
        );
    }

    #[test]
    fn test_parse_raw_tx() {
        assert_eq!(parse_raw_tx("0xf8a5\n").unwrap(), vec![0xf8, 0xa5]);
        assert_eq!(parse_raw_tx("  f8a5  ").unwrap(), vec![0xf8, 0xa5]);
        assert!(parse_raw_tx("").is_err());
        assert!(parse_raw_tx("0xzz").is_err());
    }
}
