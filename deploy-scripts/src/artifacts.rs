//! Loading of compiled contract artifacts

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    json_abi::JsonAbi,
    primitives::{keccak256, Bytes, B256},
};
use serde::Deserialize;

use crate::{constants::ARTIFACT_EXTENSION, errors::ScriptError};

/// A compiled contract, as emitted by the Solidity build into `<name>.json`
#[derive(Clone, Debug, Deserialize)]
pub struct ContractArtifact {
    /// The name of the contract
    #[serde(rename = "contractName")]
    pub name: String,
    /// The ABI of the contract
    pub abi: JsonAbi,
    /// The creation bytecode of the contract
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// The path of a contract's artifact inside the artifacts directory
    pub fn path(artifacts_dir: &Path, contract_name: &str) -> PathBuf {
        artifacts_dir.join(contract_name).with_extension(ARTIFACT_EXTENSION)
    }

    /// Load a contract's artifact from the artifacts directory
    pub fn load(artifacts_dir: &Path, contract_name: &str) -> Result<Self, ScriptError> {
        let path = Self::path(artifacts_dir, contract_name);
        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;
        Self::parse(&contents)
    }

    /// Parse an artifact from its JSON form
    pub fn parse(contents: &str) -> Result<Self, ScriptError> {
        let artifact: ContractArtifact = serde_json::from_str(contents)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        if artifact.bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} has no bytecode, is it abstract?",
                artifact.name
            )));
        }

        Ok(artifact)
    }

    /// The hash identifying this version of the contract's bytecode
    pub fn bytecode_hash(&self) -> B256 {
        keccak256(&self.bytecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIFACT: &str = r#"{
        "contractName": "Counter",
        "abi": [
            {
                "inputs": [{ "name": "start", "type": "uint256" }],
                "name": "initialize",
                "outputs": [],
                "stateMutability": "nonpayable",
                "type": "function"
            }
        ],
        "bytecode": "0x6080604052",
        "deployedBytecode": "0x6080"
    }"#;

    #[test]
    fn test_parse_artifact() {
        let artifact = ContractArtifact::parse(ARTIFACT).unwrap();
        assert_eq!(artifact.name, "Counter");
        assert_eq!(artifact.bytecode.len(), 5);
        assert!(artifact.abi.function("initialize").is_some());
        assert_eq!(artifact.bytecode_hash(), keccak256([0x60, 0x80, 0x60, 0x40, 0x52]));
    }

    #[test]
    fn test_empty_bytecode_rejected() {
        let abstract_artifact = ARTIFACT.replace("0x6080604052", "0x");
        assert!(ContractArtifact::parse(&abstract_artifact).is_err());
    }

    #[test]
    fn test_artifact_path() {
        let path = ContractArtifact::path(Path::new("build/contracts"), "InnouToken");
        assert_eq!(path, PathBuf::from("build/contracts/InnouToken.json"));
    }
}
