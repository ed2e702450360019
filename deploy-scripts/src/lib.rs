//! Scripts for deploying and initializing the InnouToken presale contracts.

pub mod artifacts;
pub mod cli;
mod commands;
pub mod config;
pub mod constants;
pub mod contract;
pub mod deployments;
pub mod errors;
pub mod registry;
pub mod solidity;
pub mod transactions;
pub mod upgrades;
pub mod utils;
