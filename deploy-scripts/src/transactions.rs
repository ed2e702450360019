//! Utilities for sending and waiting on transactions

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes},
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
};

use crate::{
    errors::ScriptError,
    utils::{Client, TxOptions},
};

/// Apply the transaction options to a request
fn with_options(mut tx: TransactionRequest, opts: TxOptions) -> TransactionRequest {
    if let Some(from) = opts.from {
        tx = tx.with_from(from);
    }
    if let Some(value) = opts.value {
        tx = tx.with_value(value);
    }
    if let Some(gas) = opts.gas {
        tx = tx.with_gas_limit(gas);
    }
    if let Some(gas_price) = opts.gas_price {
        tx = tx.with_gas_price(gas_price);
    }
    tx
}

/// Send a transaction and wait for it to be mined successfully.
///
/// A mined transaction with a failed status is reported as an error.
pub async fn send_tx(
    client: &Client,
    tx: TransactionRequest,
    opts: TxOptions,
) -> Result<TransactionReceipt, ScriptError> {
    let tx = with_options(tx, opts.or(client.tx_defaults));
    let receipt = client
        .provider
        .send_transaction(tx)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::TransactionReverted(format!(
            "{:#x}",
            receipt.transaction_hash
        )));
    }

    Ok(receipt)
}

/// Call a contract method with the given calldata
pub async fn send_call(
    client: &Client,
    to: Address,
    calldata: Bytes,
    opts: TxOptions,
) -> Result<TransactionReceipt, ScriptError> {
    let tx = TransactionRequest::default().with_to(to).with_input(calldata);
    send_tx(client, tx, opts).await
}

/// Transfer ether to an address, e.g. to buy from a payable fallback
pub async fn send_value(
    client: &Client,
    to: Address,
    opts: TxOptions,
) -> Result<TransactionReceipt, ScriptError> {
    let tx = TransactionRequest::default().with_to(to);
    send_tx(client, tx, opts).await
}

/// Deploy a contract from its creation code, returning its address
pub async fn deploy_code(
    client: &Client,
    creation_code: Bytes,
    opts: TxOptions,
) -> Result<Address, ScriptError> {
    let tx = TransactionRequest::default().with_deploy_code(creation_code);
    let receipt = send_tx(client, tx, opts)
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

    receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment("receipt carries no contract address".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy::primitives::U256;

    use crate::{
        config::NetworkName,
        constants::{LIVE_GAS_PRICE, REMOTE_GAS_LIMIT},
    };

    #[test]
    fn test_live_defaults_reach_request() {
        let deployer = Address::repeat_byte(0x01);
        let defaults = TxOptions::profile_defaults(&NetworkName::Live.profile(), Some(deployer));

        let sender = Address::repeat_byte(0x02);
        let tx = with_options(TransactionRequest::default(), TxOptions::from(sender).or(defaults));

        assert_eq!(tx.from, Some(sender));
        assert_eq!(tx.gas, Some(REMOTE_GAS_LIMIT));
        assert_eq!(tx.gas_price, Some(LIVE_GAS_PRICE));
        assert_eq!(tx.value, None);
    }

    #[test]
    fn test_explicit_options_win() {
        let defaults = TxOptions::profile_defaults(&NetworkName::Live.profile(), None);
        let opts = TxOptions::from(Address::repeat_byte(0x02))
            .gas(400_000)
            .value(U256::from(5));

        let tx = with_options(TransactionRequest::default(), opts.or(defaults));

        assert_eq!(tx.gas, Some(400_000));
        assert_eq!(tx.gas_price, Some(LIVE_GAS_PRICE));
        assert_eq!(tx.value, Some(U256::from(5)));
    }

    #[test]
    fn test_local_profile_leaves_gas_to_node() {
        let defaults = TxOptions::profile_defaults(&NetworkName::Develop.profile(), None);
        let tx = with_options(TransactionRequest::default(), defaults);

        assert_eq!(tx.gas, None);
        assert_eq!(tx.gas_price, None);
        assert_eq!(tx.from, None);
    }
}
