use clap::Parser;
use deploy_scripts::{cli::Cli, errors::ScriptError, utils::setup_client};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    tracing_subscriber::fmt().pretty().init();

    let Cli { network, command } = Cli::parse();

    let config = network.network_config()?;
    let client = setup_client(&config).await?;

    command.run(client, &network).await
}
