//! Implementations of the various deploy scripts

use tracing::info;

use crate::{
    cli::{DeployUpgradeableArgs, NetworkArgs, ProxyInfoArgs, UpgradeArgs},
    errors::ScriptError,
    registry::{deploy_erc1820_registry, RegistryDeployment},
    upgrades::{MethodCall, UpgradesProject},
    utils::Client,
};

pub async fn deploy_registry(client: &Client, network: &NetworkArgs) -> Result<(), ScriptError> {
    let funder = client.deployer()?;
    let outcome =
        deploy_erc1820_registry(client, client.kind, funder, &network.artifacts_dir).await?;

    if outcome == RegistryDeployment::Skipped {
        info!("the {} network is expected to have a registry", network.network);
    }

    Ok(())
}

pub async fn deploy_upgradeable(
    args: DeployUpgradeableArgs,
    client: &Client,
    network: &NetworkArgs,
) -> Result<(), ScriptError> {
    let alias = args.alias.unwrap_or_else(|| args.contract.clone());
    let initializer = (!args.no_init).then(|| MethodCall::new(&args.init_method, args.init_args));

    let mut project = init_project(client, network).await?;
    project.add(&args.contract, &alias)?;
    project.push().await?;
    let contract = project.create(&alias, initializer).await?;

    println!("{alias} deployed at {:#x}", contract.address);
    if let Some(admin) = project.deployments().proxy_admin {
        println!("Proxy admin deployed at {admin:#x}");
    }

    Ok(())
}

pub async fn upgrade(
    args: UpgradeArgs,
    client: &Client,
    network: &NetworkArgs,
) -> Result<(), ScriptError> {
    let contract = args.contract.unwrap_or_else(|| args.alias.clone());
    let migration = args
        .call_method
        .map(|method| MethodCall::new(&method, args.call_args));

    let mut project = init_project(client, network).await?;
    project.add(&contract, &args.alias)?;
    project.push().await?;
    let record = project.upgrade(&args.alias, migration).await?;

    println!(
        "{} at {:#x} delegates to {:#x}",
        args.alias, record.address, record.implementation
    );
    Ok(())
}

pub async fn proxy_info(
    args: ProxyInfoArgs,
    client: &Client,
    network: &NetworkArgs,
) -> Result<(), ScriptError> {
    let project = init_project(client, network).await?;
    let info = project.proxy_info(&args.alias).await?;

    let json = serde_json::to_string_pretty(&info)
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    println!("{json}");
    Ok(())
}

// -----------
// | Helpers |
// -----------

/// Open the project on the selected network, deploying from the first account
async fn init_project(
    client: &Client,
    network: &NetworkArgs,
) -> Result<UpgradesProject, ScriptError> {
    let from = client.deployer()?;
    UpgradesProject::init_network(client, network.network, from, network.project_paths()).await
}
