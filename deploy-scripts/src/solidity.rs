//! Bindings for the OpenZeppelin upgrades infrastructure contracts
//!
//! The ABIs are extracted as-is from `@openzeppelin/upgrades` 2.7.1 and are used to
//! interact with a proxy admin and its proxies once they are deployed.

use alloy::sol;

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    ProxyAdmin,
    "abis/ProxyAdmin.json"
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    AdminUpgradeabilityProxy,
    "abis/AdminUpgradeabilityProxy.json"
);
