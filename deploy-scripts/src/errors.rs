//! Definitions of errors that can occur during deployment of the contracts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error resolving the network profile or its credentials
    Config(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error reading or parsing a compiled contract artifact
    ArtifactParsing(String),
    /// Error reading the network deployments file
    ReadDeployments(String),
    /// Error writing the network deployments file
    WriteDeployments(String),
    /// Error running the compile command
    ContractCompilation(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// A transaction was mined but reverted
    TransactionReverted(String),
    /// An alias was used before being registered or created
    UnknownAlias(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Config(s) => write!(f, "configuration error: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ContractCompilation(s) => write!(f, "error compiling contracts: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::TransactionReverted(s) => write!(f, "transaction reverted: {}", s),
            ScriptError::UnknownAlias(s) => write!(f, "unknown contract alias: {}", s),
        }
    }
}

impl Error for ScriptError {}
