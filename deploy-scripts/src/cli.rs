//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{deploy_registry, deploy_upgradeable, proxy_info, upgrade},
    config::{Credentials, NetworkConfig, NetworkName},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_PROJECT_DIR, INFURA_KEY_ENV_VAR, MNEMONIC_ENV_VAR,
        PRIV_KEYS_ENV_VAR,
    },
    errors::ScriptError,
    upgrades::ProjectPaths,
    utils::Client,
};

#[derive(Parser)]
pub struct Cli {
    /// The network and project to deploy to
    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Network selection, credentials and project paths, shared by every script
#[derive(Args, Clone, Debug)]
pub struct NetworkArgs {
    /// The network profile to use
    #[arg(short, long, value_enum, default_value = "develop")]
    pub network: NetworkName,

    /// Network RPC URL, overriding the profile's endpoint
    #[arg(short, long)]
    pub rpc_url: Option<String>,

    /// Mnemonic from which the signing accounts are derived
    #[arg(long, env = MNEMONIC_ENV_VAR, hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Comma-delimited private keys of the signing accounts, ignored if a mnemonic is given
    #[arg(long, env = PRIV_KEYS_ENV_VAR, hide_env_values = true)]
    pub priv_keys: Option<String>,

    /// API key of the Infura RPC gateway
    #[arg(long, env = INFURA_KEY_ENV_VAR, hide_env_values = true)]
    pub infura_key: Option<String>,

    /// Directory containing the compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Directory containing the per-network deployments files
    #[arg(long, default_value = DEFAULT_PROJECT_DIR)]
    pub project_dir: PathBuf,

    /// Command compiling the contracts before implementations are pushed
    #[arg(long)]
    pub compile_cmd: Option<String>,
}

impl NetworkArgs {
    /// Resolve the network configuration, reading the secrets once
    pub fn network_config(&self) -> Result<NetworkConfig, ScriptError> {
        let credentials = Credentials::resolve(self.mnemonic.clone(), self.priv_keys.clone());
        NetworkConfig::load(
            self.network,
            self.rpc_url.clone(),
            self.infura_key.clone(),
            credentials,
        )
    }

    /// The project's paths
    pub fn project_paths(&self) -> ProjectPaths {
        ProjectPaths {
            artifacts_dir: self.artifacts_dir.clone(),
            project_dir: self.project_dir.clone(),
            compile_cmd: self.compile_cmd.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    DeployRegistry,
    DeployUpgradeable(DeployUpgradeableArgs),
    Upgrade(UpgradeArgs),
    ProxyInfo(ProxyInfoArgs),
}

impl Command {
    pub async fn run(self, client: Client, network: &NetworkArgs) -> Result<(), ScriptError> {
        match self {
            Command::DeployRegistry => deploy_registry(&client, network).await,
            Command::DeployUpgradeable(args) => deploy_upgradeable(args, &client, network).await,
            Command::Upgrade(args) => upgrade(args, &client, network).await,
            Command::ProxyInfo(args) => proxy_info(args, &client, network).await,
        }
    }
}

/// Deploy an upgradeable instance of a contract.
///
/// Concretely, this pushes the contract's implementation, deploys a `ProxyAdmin` if the
/// network has none yet, and deploys an `AdminUpgradeabilityProxy` whose constructor
/// calls the initializer.
#[derive(Args)]
pub struct DeployUpgradeableArgs {
    /// Name of the compiled contract
    #[arg(short, long)]
    pub contract: String,

    /// Alias to register the contract under, defaults to the contract name
    #[arg(short, long)]
    pub alias: Option<String>,

    /// Initializer method called through the proxy
    #[arg(short, long, default_value = "initialize")]
    pub init_method: String,

    /// Positional initializer arguments, coerced to the ABI's types
    #[arg(long, num_args = 0.., allow_hyphen_values = true)]
    pub init_args: Vec<String>,

    /// Deploy without calling an initializer
    #[arg(long)]
    pub no_init: bool,
}

/// Upgrade the latest instance of an alias to the contract's current implementation
#[derive(Args)]
pub struct UpgradeArgs {
    /// Alias of the instance to upgrade
    #[arg(short, long)]
    pub alias: String,

    /// Name of the compiled contract, defaults to the alias
    #[arg(short, long)]
    pub contract: Option<String>,

    /// Optional method called on the new implementation while upgrading
    #[arg(long)]
    pub call_method: Option<String>,

    /// Positional arguments of the upgrade call
    #[arg(long, num_args = 0.., allow_hyphen_values = true)]
    pub call_args: Vec<String>,
}

/// Print the on-chain state of the latest instance of an alias
#[derive(Args)]
pub struct ProxyInfoArgs {
    /// Alias of the instance
    #[arg(short, long)]
    pub alias: String,
}
