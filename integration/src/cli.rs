//! Definition of the CLI arguments for the presale scenario

use clap::Parser;
use deploy_scripts::cli::NetworkArgs;

/// CLI tool deploying the presale contracts and running the base presale scenario
/// against them.
///
/// Prints the log of every attempted step as JSON on stdout, whether or not the
/// scenario completes.
#[derive(Parser)]
pub(crate) struct Cli {
    /// The network and project to run the scenario on
    #[command(flatten)]
    pub(crate) network: NetworkArgs,

    /// Allow running on a public network, where the sale window can't be fast-forwarded
    #[arg(long)]
    pub(crate) allow_public_network: bool,
}
