//! A handle on a deployed contract, driven by the contract's ABI
//!
//! Method arguments are given positionally as strings and coerced to the types the
//! ABI declares, so any mismatch surfaces as a calldata construction error.

use std::collections::BTreeMap;

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, EventExt, FunctionExt, JsonAbiExt, Specifier},
    json_abi::{Function, JsonAbi},
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, U256},
    providers::Provider,
    rpc::types::{Filter, Log, TransactionReceipt, TransactionRequest},
};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    errors::ScriptError,
    transactions::send_call,
    utils::{Client, TxOptions},
};

/// An upgradeable contract instance deployed under an alias
#[derive(Clone, Debug)]
pub struct DeployedContract {
    /// The alias the contract was registered under
    pub alias: String,
    /// The address of the instance
    pub address: Address,
    /// The ABI of the contract's implementation
    pub abi: JsonAbi,
    /// The client used to reach the contract
    client: Client,
}

/// A decoded event emitted by a contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractEvent {
    /// The name of the event
    pub event: String,
    /// The block the event was emitted in
    pub block_number: Option<u64>,
    /// The transaction that emitted the event
    pub transaction_hash: Option<TxHash>,
    /// The event's arguments by name
    pub args: BTreeMap<String, String>,
}

impl DeployedContract {
    /// Create a handle on a contract at the given address
    pub fn new(alias: &str, address: Address, abi: JsonAbi, client: &Client) -> Self {
        DeployedContract {
            alias: alias.to_string(),
            address,
            abi,
            client: client.clone(),
        }
    }

    /// Encode a call to one of the contract's methods
    pub fn encode_call(&self, method: &str, args: &[String]) -> Result<Bytes, ScriptError> {
        encode_function_call(&self.abi, method, args)
    }

    /// Send a transaction calling one of the contract's methods
    pub async fn send(
        &self,
        method: &str,
        args: &[String],
        opts: TxOptions,
    ) -> Result<TransactionReceipt, ScriptError> {
        let calldata = self.encode_call(method, args)?;
        send_call(&self.client, self.address, calldata, opts).await
    }

    /// Make a read-only call to one of the contract's methods
    pub async fn call(&self, method: &str, args: &[String]) -> Result<Vec<DynSolValue>, ScriptError> {
        let (function, calldata) = resolve_call(&self.abi, method, args)?;

        let tx = TransactionRequest::default()
            .with_to(self.address)
            .with_input(calldata);
        let output = self
            .client
            .provider
            .call(tx)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        function
            .abi_decode_output(&output)
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    /// Make a read-only call returning a single unsigned integer
    pub async fn call_u256(&self, method: &str, args: &[String]) -> Result<U256, ScriptError> {
        match self.call(method, args).await?.as_slice() {
            [DynSolValue::Uint(value, _)] => Ok(*value),
            other => Err(unexpected_output(method, other)),
        }
    }

    /// Make a read-only call returning a single boolean
    pub async fn call_bool(&self, method: &str, args: &[String]) -> Result<bool, ScriptError> {
        match self.call(method, args).await?.as_slice() {
            [DynSolValue::Bool(value)] => Ok(*value),
            other => Err(unexpected_output(method, other)),
        }
    }

    /// Fetch and decode the contract's events in the given block range.
    ///
    /// Logs that match no event in the ABI are kept under the name `unknown`.
    pub async fn events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ContractEvent>, ScriptError> {
        let filter = Filter::new()
            .address(self.address)
            .from_block(from_block)
            .to_block(to_block);
        let logs = self
            .client
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(logs.iter().map(|log| decode_event(&self.abi, log)).collect())
    }
}

/// Encode a call to the named method with string arguments coerced to its input types.
///
/// The method is either a name or a full signature such as `initialize(address)`.
/// Overloads of a name are disambiguated by the number of arguments, then by which
/// overload the arguments coerce to. Arguments coercing to several overloads are
/// rejected as ambiguous.
pub fn encode_function_call(
    abi: &JsonAbi,
    method: &str,
    args: &[String],
) -> Result<Bytes, ScriptError> {
    resolve_call(abi, method, args).map(|(_, calldata)| calldata)
}

/// Find the function a call targets and encode the call
fn resolve_call<'a>(
    abi: &'a JsonAbi,
    method: &str,
    args: &[String],
) -> Result<(&'a Function, Bytes), ScriptError> {
    let signature: String = method.chars().filter(|c| !c.is_whitespace()).collect();
    let name = signature.split('(').next().unwrap_or_default();
    let overloads = abi.function(name).ok_or_else(|| {
        ScriptError::CalldataConstruction(format!("no method `{name}` in the ABI"))
    })?;

    if signature.contains('(') {
        let function = overloads
            .iter()
            .find(|f| f.signature() == signature)
            .ok_or_else(|| {
                ScriptError::CalldataConstruction(format!("no method `{signature}` in the ABI"))
            })?;
        if function.inputs.len() != args.len() {
            return Err(ScriptError::CalldataConstruction(format!(
                "`{signature}` takes {} arguments, {} given",
                function.inputs.len(),
                args.len()
            )));
        }
        return Ok((function, encode_with(function, args)?));
    }

    let candidates = overloads.iter().filter(|f| f.inputs.len() == args.len());
    let mut matches = Vec::new();
    let mut last_err = None;
    for function in candidates {
        match encode_with(function, args) {
            Ok(calldata) => matches.push((function, calldata)),
            Err(e) => last_err = Some(e),
        }
    }

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(last_err.unwrap_or_else(|| {
            ScriptError::CalldataConstruction(format!(
                "no overload of `{name}` takes {} arguments",
                args.len()
            ))
        })),
        _ => Err(ScriptError::CalldataConstruction(format!(
            "ambiguous overload of `{name}`, the arguments fit {}; call it by signature",
            matches.iter().map(|(f, _)| f.signature()).join(", ")
        ))),
    }
}

/// Coerce the arguments to the function's input types and encode the call
fn encode_with(function: &Function, args: &[String]) -> Result<Bytes, ScriptError> {
    let values: Vec<DynSolValue> = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
            ty.coerce_str(arg).map_err(|e| {
                ScriptError::CalldataConstruction(format!(
                    "argument `{arg}` of `{}` as {ty}: {e}",
                    function.name
                ))
            })
        })
        .try_collect()?;

    function
        .abi_encode_input(&values)
        .map(Bytes::from)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// The error for a call whose output doesn't have the expected shape
fn unexpected_output(method: &str, output: &[DynSolValue]) -> ScriptError {
    ScriptError::ContractInteraction(format!("unexpected output of `{method}`: {output:?}"))
}

/// Decode a log against the events of an ABI
fn decode_event(abi: &JsonAbi, log: &Log) -> ContractEvent {
    let mut decoded = ContractEvent {
        event: "unknown".to_string(),
        block_number: log.block_number,
        transaction_hash: log.transaction_hash,
        args: BTreeMap::new(),
    };

    let Some(topic0) = log.topic0() else {
        return decoded;
    };
    let Some(event) = abi
        .events()
        .find(|e| !e.anonymous && e.selector() == *topic0)
    else {
        return decoded;
    };

    decoded.event = event.name.clone();
    if let Ok(values) = event.decode_log(log.data()) {
        let mut indexed = values.indexed.iter();
        let mut body = values.body.iter();
        for (i, input) in event.inputs.iter().enumerate() {
            let value = if input.indexed { indexed.next() } else { body.next() };
            let name = if input.name.is_empty() {
                format!("arg{i}")
            } else {
                input.name.clone()
            };
            if let Some(value) = value {
                decoded.args.insert(name, format_value(value));
            }
        }
    }

    decoded
}

/// Render an ABI value for human inspection
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(a) => a.to_string(),
        DynSolValue::Uint(v, _) => v.to_string(),
        DynSolValue::Int(v, _) => v.to_string(),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Bytes(b) => Bytes::copy_from_slice(b).to_string(),
        DynSolValue::FixedBytes(b, size) => Bytes::copy_from_slice(&b[..*size]).to_string(),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            format!("[{}]", values.iter().map(format_value).join(", "))
        }
        DynSolValue::Tuple(values) => {
            format!("({})", values.iter().map(format_value).join(", "))
        }
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy::primitives::{hex, keccak256};

    /// An ABI with an overloaded initializer, mirroring a presale's
    const ABI: &str = r#"[
        {
            "inputs": [],
            "name": "initialize",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                { "name": "owner", "type": "address" },
                { "name": "rate", "type": "uint256" },
                { "name": "data", "type": "bytes" }
            ],
            "name": "initialize",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        }
    ]"#;

    fn abi() -> JsonAbi {
        serde_json::from_str(ABI).unwrap()
    }

    #[test]
    fn test_encode_no_args() {
        let calldata = encode_function_call(&abi(), "initialize", &[]).unwrap();
        assert_eq!(calldata.as_ref(), &keccak256("initialize()")[..4]);
    }

    #[test]
    fn test_encode_coerces_args() {
        let owner = Address::repeat_byte(0x11);
        let args = [owner.to_string(), "20000".to_string(), "0x0102".to_string()];
        let calldata = encode_function_call(&abi(), "initialize", &args).unwrap();

        assert_eq!(
            &calldata[..4],
            &keccak256("initialize(address,uint256,bytes)")[..4]
        );
        // selector + 3 head words + length word + one data word
        assert_eq!(calldata.len(), 4 + 32 * 5);
        assert_eq!(&calldata[4 + 12..4 + 32], owner.as_slice());
        assert_eq!(U256::from_be_slice(&calldata[36..68]), U256::from(20000));
        assert_eq!(&calldata[4 + 32 * 4..4 + 32 * 4 + 2], &hex!("0102"));
    }

    /// Single-argument overloads an address coerces to both of
    const OVERLOADED_ABI: &str = r#"[
        {
            "inputs": [{ "name": "amount", "type": "uint256" }],
            "name": "initialize",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [{ "name": "owner", "type": "address" }],
            "name": "initialize",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [{ "name": "flag", "type": "bool" }],
            "name": "pause",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [{ "name": "owner", "type": "address" }],
            "name": "pause",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        }
    ]"#;

    #[test]
    fn test_overload_picked_by_argument_types() {
        let abi: JsonAbi = serde_json::from_str(OVERLOADED_ABI).unwrap();
        let owner = Address::repeat_byte(0x11);

        // Only the address overload accepts an address
        let calldata = encode_function_call(&abi, "pause", &[owner.to_string()]).unwrap();
        assert_eq!(&calldata[..4], &keccak256("pause(address)")[..4]);
        let calldata = encode_function_call(&abi, "pause", &["true".to_string()]).unwrap();
        assert_eq!(&calldata[..4], &keccak256("pause(bool)")[..4]);

        // A decimal amount only fits the uint overload
        let args = ["20000".to_string()];
        let calldata = encode_function_call(&abi, "initialize", &args).unwrap();
        assert_eq!(&calldata[..4], &keccak256("initialize(uint256)")[..4]);
    }

    #[test]
    fn test_ambiguous_overload_needs_signature() {
        let abi: JsonAbi = serde_json::from_str(OVERLOADED_ABI).unwrap();
        let owner = Address::repeat_byte(0x11);
        let args = [owner.to_string()];

        let res = encode_function_call(&abi, "initialize", &args);
        assert!(matches!(
            res,
            Err(ScriptError::CalldataConstruction(msg)) if msg.contains("ambiguous")
        ));

        let calldata = encode_function_call(&abi, "initialize(address)", &args).unwrap();
        assert_eq!(&calldata[..4], &keccak256("initialize(address)")[..4]);
        assert_eq!(&calldata[4 + 12..], owner.as_slice());

        let calldata = encode_function_call(&abi, "initialize(uint256)", &args).unwrap();
        assert_eq!(&calldata[..4], &keccak256("initialize(uint256)")[..4]);

        let res = encode_function_call(&abi, "initialize(bool)", &args);
        assert!(matches!(res, Err(ScriptError::CalldataConstruction(_))));
        let res = encode_function_call(&abi, "initialize(address)", &[]);
        assert!(matches!(res, Err(ScriptError::CalldataConstruction(_))));
    }

    #[test]
    fn test_encode_rejects_mismatches() {
        let abi = abi();
        let res = encode_function_call(&abi, "initialize", &["0x01".to_string()]);
        assert!(matches!(res, Err(ScriptError::CalldataConstruction(_))));

        let args = ["not-an-address".to_string(), "1".to_string(), "0x".to_string()];
        let res = encode_function_call(&abi, "initialize", &args);
        assert!(matches!(res, Err(ScriptError::CalldataConstruction(_))));

        let res = encode_function_call(&abi, "finalize", &[]);
        assert!(matches!(res, Err(ScriptError::CalldataConstruction(_))));
    }

    #[test]
    fn test_format_values() {
        assert_eq!(format_value(&DynSolValue::Uint(U256::from(7), 256)), "7");
        assert_eq!(format_value(&DynSolValue::Bytes(vec![0xab])), "0xab");
        assert_eq!(
            format_value(&DynSolValue::Array(vec![
                DynSolValue::Bool(true),
                DynSolValue::String("x".to_string())
            ])),
            "[true, x]"
        );
    }
}
