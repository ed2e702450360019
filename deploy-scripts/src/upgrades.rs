//! Deployment of contracts as upgradeable instances
//!
//! Each logical contract is registered under an alias. Pushing deploys the alias'
//! implementation, and creating an instance deploys an `AdminUpgradeabilityProxy`
//! delegating to it, administered by a `ProxyAdmin` shared across the network. The
//! proxy's constructor calls the initializer, which stands in for a constructor.

use std::{collections::BTreeMap, path::PathBuf};

use alloy::{
    primitives::{Address, Bytes},
    providers::Provider,
    rpc::types::TransactionReceipt,
    sol_types::{SolCall, SolConstructor},
};
use serde::Serialize;
use tracing::info;

use crate::{
    artifacts::ContractArtifact,
    config::NetworkName,
    constants::{PROXY_ADMIN_CONTRACT_NAME, PROXY_CONTRACT_NAME},
    contract::{encode_function_call, DeployedContract},
    deployments::{ImplementationRecord, NetworkDeployments, ProxyRecord},
    errors::ScriptError,
    solidity::{AdminUpgradeabilityProxy, ProxyAdmin},
    transactions::{deploy_code, send_call},
    utils::{run_compile_command, Client, TxOptions},
};

/// A method call made on an implementation through its proxy
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodCall {
    /// The name of the method
    pub method: String,
    /// The positional arguments of the method
    pub args: Vec<String>,
}

impl MethodCall {
    /// A call to the given method
    pub fn new(method: &str, args: Vec<String>) -> Self {
        MethodCall {
            method: method.to_string(),
            args,
        }
    }
}

/// The on-chain view of a proxy, as reported by its admin
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyInfo {
    /// The alias of the contract
    pub alias: String,
    /// The address of the proxy
    pub proxy: Address,
    /// The implementation the proxy delegates to
    pub implementation: Address,
    /// The admin of the proxy
    pub admin: Address,
    /// The owner of the admin
    pub admin_owner: Address,
}

/// Where the project's files live
#[derive(Clone, Debug)]
pub struct ProjectPaths {
    /// The directory containing compiled contract artifacts
    pub artifacts_dir: PathBuf,
    /// The directory containing the per-network deployments files
    pub project_dir: PathBuf,
    /// The command compiling the contracts, if they should be compiled on push
    pub compile_cmd: Option<String>,
}

/// The upgradeable contracts of a project on one network
pub struct UpgradesProject {
    /// The client used for all deployments
    client: Client,
    /// The account funding the deployments and owning the proxy admin
    from: Address,
    /// The project's files
    paths: ProjectPaths,
    /// The path of the network's deployments file
    deployments_path: PathBuf,
    /// The network's deployments
    deployments: NetworkDeployments,
    /// The registered contracts, by alias
    contracts: BTreeMap<String, ContractArtifact>,
}

impl UpgradesProject {
    /// Initialize the project on a network, loading what was already deployed there
    pub async fn init_network(
        client: &Client,
        network: NetworkName,
        from: Address,
        paths: ProjectPaths,
    ) -> Result<Self, ScriptError> {
        info!("initializing upgradeable deployments on {network}");
        let deployments_path = NetworkDeployments::path(&paths.project_dir, network);
        let mut deployments = NetworkDeployments::load(&deployments_path)?;

        let chain_id = client
            .provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        deployments.chain_id = Some(chain_id);

        Ok(UpgradesProject {
            client: client.clone(),
            from,
            paths,
            deployments_path,
            deployments,
            contracts: BTreeMap::new(),
        })
    }

    /// The network's deployments
    pub fn deployments(&self) -> &NetworkDeployments {
        &self.deployments
    }

    /// Register a compiled contract under an alias
    pub fn add(&mut self, contract_name: &str, alias: &str) -> Result<(), ScriptError> {
        let artifact = ContractArtifact::load(&self.paths.artifacts_dir, contract_name)?;
        info!("registered {contract_name} as {alias}");
        self.contracts.insert(alias.to_string(), artifact);
        Ok(())
    }

    /// Compile the contracts if configured to, then deploy the implementation of every
    /// registered alias whose bytecode changed since it was last pushed
    pub async fn push(&mut self) -> Result<(), ScriptError> {
        if let Some(cmd) = &self.paths.compile_cmd {
            run_compile_command(cmd)?;
            self.reload_artifacts()?;
        }

        let aliases: Vec<String> = self.contracts.keys().cloned().collect();
        for alias in aliases {
            self.push_alias(&alias).await?;
        }

        Ok(())
    }

    /// Deploy an upgradeable instance of an alias, calling the initializer through the proxy
    pub async fn create(
        &mut self,
        alias: &str,
        initializer: Option<MethodCall>,
    ) -> Result<DeployedContract, ScriptError> {
        info!("deploying contract {alias}");
        let abi = self.artifact(alias)?.abi.clone();
        let init_data = match &initializer {
            Some(call) => encode_function_call(&abi, &call.method, &call.args)?,
            None => Bytes::new(),
        };

        let implementation = self.push_alias(alias).await?;
        let admin = self.ensure_proxy_admin().await?;

        let proxy_artifact = ContractArtifact::load(&self.paths.artifacts_dir, PROXY_CONTRACT_NAME)?;
        let constructor_args = AdminUpgradeabilityProxy::constructorCall {
            _logic: implementation,
            _admin: admin,
            _data: init_data,
        }
        .abi_encode();
        let creation_code = [proxy_artifact.bytecode.to_vec(), constructor_args].concat();
        let proxy = deploy_code(&self.client, creation_code.into(), self.tx_options()).await?;

        self.deployments
            .proxies
            .entry(alias.to_string())
            .or_default()
            .push(ProxyRecord {
                address: proxy,
                implementation,
                admin,
            });
        self.save()?;

        info!("contract {alias} deployed at {proxy}");
        Ok(DeployedContract::new(alias, proxy, abi, &self.client))
    }

    /// A handle on the latest instance of an alias
    pub fn contract(&self, alias: &str) -> Result<DeployedContract, ScriptError> {
        let proxy = self.latest_proxy(alias)?;
        let abi = self.artifact(alias)?.abi.clone();
        Ok(DeployedContract::new(alias, proxy.address, abi, &self.client))
    }

    /// Point the latest instance of an alias at its current implementation, optionally
    /// calling a migration method in the same transaction.
    ///
    /// Returns the updated proxy record, unchanged if the implementation is up to date.
    pub async fn upgrade(
        &mut self,
        alias: &str,
        migration: Option<MethodCall>,
    ) -> Result<ProxyRecord, ScriptError> {
        let record = self.latest_proxy(alias)?;
        let implementation = self.push_alias(alias).await?;
        if implementation == record.implementation {
            info!("{alias} at {} is up to date", record.address);
            return Ok(record);
        }

        let migration_data = match migration {
            Some(call) => {
                let abi = &self.artifact(alias)?.abi;
                Some(encode_function_call(abi, &call.method, &call.args)?)
            }
            None => None,
        };
        let calldata = upgrade_calldata(record.address, implementation, migration_data);
        let receipt = send_call(&self.client, record.admin, calldata, self.tx_options()).await?;
        check_upgraded(&receipt, implementation)?;

        let updated = ProxyRecord {
            implementation,
            ..record
        };
        if let Some(last) = self
            .deployments
            .proxies
            .get_mut(alias)
            .and_then(|proxies| proxies.last_mut())
        {
            *last = updated.clone();
        }
        self.save()?;

        info!("{alias} at {} upgraded to {implementation}", updated.address);
        Ok(updated)
    }

    /// Read the on-chain state of the latest instance of an alias from its admin
    pub async fn proxy_info(&self, alias: &str) -> Result<ProxyInfo, ScriptError> {
        let record = self.latest_proxy(alias)?;
        let admin = ProxyAdmin::new(record.admin, self.client.provider.clone());

        let implementation = admin
            .getProxyImplementation(record.address)
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        let proxy_admin = admin
            .getProxyAdmin(record.address)
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        let admin_owner = admin
            .owner()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(ProxyInfo {
            alias: alias.to_string(),
            proxy: record.address,
            implementation,
            admin: proxy_admin,
            admin_owner,
        })
    }

    // -----------
    // | Helpers |
    // -----------

    /// Deploy the implementation of an alias unless the same bytecode is already live,
    /// returning the implementation's address
    async fn push_alias(&mut self, alias: &str) -> Result<Address, ScriptError> {
        let artifact = self.artifact(alias)?.clone();
        let bytecode_hash = artifact.bytecode_hash();

        if let Some(record) = self.deployments.implementations.get(alias) {
            if record.bytecode_hash == bytecode_hash && self.has_code(record.address).await? {
                return Ok(record.address);
            }
        }

        info!("pushing implementation of {alias} ({})", artifact.name);
        let address = deploy_code(&self.client, artifact.bytecode.clone(), self.tx_options()).await?;
        self.deployments.implementations.insert(
            alias.to_string(),
            ImplementationRecord {
                contract: artifact.name,
                address,
                bytecode_hash,
            },
        );
        self.save()?;

        Ok(address)
    }

    /// Deploy the network's proxy admin unless it is already live
    async fn ensure_proxy_admin(&mut self) -> Result<Address, ScriptError> {
        if let Some(admin) = self.deployments.proxy_admin {
            if self.has_code(admin).await? {
                return Ok(admin);
            }
        }

        let artifact = ContractArtifact::load(&self.paths.artifacts_dir, PROXY_ADMIN_CONTRACT_NAME)?;
        let admin = deploy_code(&self.client, artifact.bytecode, self.tx_options()).await?;
        self.deployments.proxy_admin = Some(admin);
        self.save()?;

        info!("proxy admin deployed at {admin}");
        Ok(admin)
    }

    /// Re-read the artifacts of the registered contracts, e.g. after compiling
    fn reload_artifacts(&mut self) -> Result<(), ScriptError> {
        for artifact in self.contracts.values_mut() {
            *artifact = ContractArtifact::load(&self.paths.artifacts_dir, &artifact.name)?;
        }
        Ok(())
    }

    /// The artifact registered under an alias
    fn artifact(&self, alias: &str) -> Result<&ContractArtifact, ScriptError> {
        self.contracts
            .get(alias)
            .ok_or_else(|| ScriptError::UnknownAlias(alias.to_string()))
    }

    /// The latest proxy created for an alias
    fn latest_proxy(&self, alias: &str) -> Result<ProxyRecord, ScriptError> {
        self.deployments
            .latest_proxy(alias)
            .cloned()
            .ok_or_else(|| ScriptError::UnknownAlias(format!("no instance of {alias}")))
    }

    /// Whether an address holds contract code, records from a restarted
    /// development chain point at empty accounts
    async fn has_code(&self, address: Address) -> Result<bool, ScriptError> {
        let code = self
            .client
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        Ok(!code.is_empty())
    }

    /// The options deployment transactions are sent with
    fn tx_options(&self) -> TxOptions {
        TxOptions::from(self.from)
    }

    /// Persist the network's deployments
    fn save(&self) -> Result<(), ScriptError> {
        self.deployments.save(&self.deployments_path)
    }
}

/// Encode the proxy admin call pointing a proxy at a new implementation, calling the
/// migration through the proxy when there is one
fn upgrade_calldata(proxy: Address, implementation: Address, migration: Option<Bytes>) -> Bytes {
    match migration {
        Some(data) => ProxyAdmin::upgradeAndCallCall { proxy, implementation, data }.abi_encode(),
        None => ProxyAdmin::upgradeCall { proxy, implementation }.abi_encode(),
    }
    .into()
}

/// Check that an upgrade receipt carries the proxy's `Upgraded` event for the new
/// implementation
fn check_upgraded(receipt: &TransactionReceipt, implementation: Address) -> Result<(), ScriptError> {
    if !receipt.status() {
        return Err(ScriptError::TransactionReverted(format!(
            "{:#x}",
            receipt.transaction_hash
        )));
    }

    let upgraded = receipt.inner.logs().iter().any(|log| {
        log.log_decode::<AdminUpgradeabilityProxy::Upgraded>()
            .map(|decoded| decoded.inner.data.implementation == implementation)
            .unwrap_or(false)
    });
    if !upgraded {
        return Err(ScriptError::ContractInteraction(format!(
            "no Upgraded event for {implementation}"
        )));
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    use alloy::primitives::keccak256;

    #[test]
    fn test_upgrade_calldata() {
        let proxy = Address::repeat_byte(0x01);
        let implementation = Address::repeat_byte(0x02);

        let calldata = upgrade_calldata(proxy, implementation, None);
        assert_eq!(&calldata[..4], &keccak256("upgrade(address,address)")[..4]);
        assert_eq!(calldata.len(), 4 + 32 * 2);
        assert_eq!(&calldata[4 + 12..4 + 32], proxy.as_slice());
        assert_eq!(&calldata[4 + 32 + 12..], implementation.as_slice());

        let migration = Bytes::from(vec![0xaa, 0xbb, 0xcc, 0xdd]);
        let calldata = upgrade_calldata(proxy, implementation, Some(migration));
        assert_eq!(
            &calldata[..4],
            &keccak256("upgradeAndCall(address,address,bytes)")[..4]
        );
        // selector + 3 head words + length word + one data word
        assert_eq!(calldata.len(), 4 + 32 * 5);
        assert_eq!(&calldata[4 + 32 * 4..4 + 32 * 4 + 4], &[0xaa, 0xbb, 0xcc, 0xdd]);
    }
}
