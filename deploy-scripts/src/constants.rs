//! Constants used in the deploy scripts

use alloy::primitives::{address, Address};

/// The address at which the ERC1820 registry lives on every chain
///
/// Specified in EIP1820: https://eips.ethereum.org/EIPS/eip-1820#deployment-method
pub const ERC1820_REGISTRY_ADDRESS: Address =
    address!("0x1820a4B7618BdE71Dce8cdc73aAB6C95905faD24");

/// The single-use account which sends the pre-signed ERC1820 deployment transaction
pub const ERC1820_DEPLOYER_ADDRESS: Address =
    address!("0xa990077c3205cbDf861e17Fa532eeB069cE9fF96");

/// The ether that must be sent to the ERC1820 deployer to pay for the deployment
pub const ERC1820_DEPLOYMENT_COST_ETHER: &str = "0.08";

/// The file, inside the artifacts directory, holding the hex-encoded
/// pre-signed ERC1820 deployment transaction
pub const ERC1820_RAW_TX_FILE: &str = "ERC1820Registry.tx";

/// The name of the proxy admin contract artifact
pub const PROXY_ADMIN_CONTRACT_NAME: &str = "ProxyAdmin";

/// The name of the admin upgradeability proxy contract artifact
pub const PROXY_CONTRACT_NAME: &str = "AdminUpgradeabilityProxy";

/// The extension of compiled contract artifacts
pub const ARTIFACT_EXTENSION: &str = "json";

/// The default directory containing compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "build/contracts";

/// The default directory in which per-network deployments files are kept
pub const DEFAULT_PROJECT_DIR: &str = ".deployments";

/// The number of accounts derived from a mnemonic
pub const NUM_MNEMONIC_ACCOUNTS: u32 = 10;

/// The placeholder for the Infura API key in endpoint templates
pub const INFURA_KEY_PLACEHOLDER: &str = "{INFURA_KEY}";

/// The name of the environment variable holding the mnemonic
pub const MNEMONIC_ENV_VAR: &str = "MNEMONIC";

/// The name of the environment variable holding comma-delimited private keys
pub const PRIV_KEYS_ENV_VAR: &str = "PRIV_KEYS";

/// The name of the environment variable holding the Infura API key
pub const INFURA_KEY_ENV_VAR: &str = "INFURA_KEY";

/// Gas limit applied to transactions on the rinkeby and live profiles
pub const REMOTE_GAS_LIMIT: u64 = 4_000_000;

/// Gas price applied to transactions on the live profile, 50 gwei
pub const LIVE_GAS_PRICE: u128 = 50_000_000_000;

/// The number of decimals of ether and of the token
pub const TOKEN_DECIMALS: u8 = 18;
