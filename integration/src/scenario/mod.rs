//! The base presale scenario
//!
//! Deploys the token and the presale as upgradeable instances, then walks the presale
//! through minting, capping, contributions, offchain purchases, issuance and the burn of
//! the unsold tokens. Every step is logged, and the first unexpected outcome aborts
//! the rest of the scenario.

use std::{
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
};
use deploy_scripts::{
    contract::DeployedContract,
    registry::deploy_erc1820_registry,
    transactions::send_value,
    upgrades::{MethodCall, UpgradesProject},
    utils::{e18, ether, setup_client, str_to_bytes, Client, TxOptions},
};
use eyre::{bail, Result};
use tracing::info;

use crate::{
    cli::Cli,
    constants::{
        BASE_RATE, BIG_RATE, BURN_DATA, CLOSING_DELAY_SECS, EXTENSION_SECS,
        FIAT_INVESTOR_CAP_ETHER, INITIALIZER, INITIAL_MINT_TOKENS, INVESTOR_CAP_ETHER,
        INVESTOR_PAYMENT_ETHER, INVESTOR_PURCHASE_ETHER, MID_RATE, MINT_GAS,
        MIN_CONTRIBUTION_ETHER, OFFCHAIN_PURCHASES, OPENING_DELAY_SECS, OVERMINT_TOKENS,
        PAYMENT_GAS, PRESALE_CAP_ETHER, PRESALE_CONTRACT, PRESALE_GAS, TOKEN_CONTRACT,
    },
    participants::Participants,
};

use self::{
    report::{Contribution, EndTokenBalances, FinalReport},
    sale_window::{await_sale_open, PresaleWindow},
};
pub(crate) use step_log::StepLog;

mod report;
mod sale_window;
mod step_log;

/// The contracts the scenario runs against
pub(crate) struct Contracts {
    /// The token
    pub(crate) token: DeployedContract,
    /// The presale selling the token
    pub(crate) presale: DeployedContract,
}

/// Set up the network and contracts, then run the base scenario, logging its steps
pub(crate) async fn run_base_scenario(cli: &Cli, log: &mut StepLog) -> Result<()> {
    let config = cli.network.network_config()?;
    let client = setup_client(&config).await?;

    if !client.kind.is_private() && !cli.allow_public_network {
        bail!(
            "the scenario is expected to run on a private network, not on {}",
            client.kind
        );
    }

    let participants = Participants::from_accounts(&client.accounts)?;
    info!("participants: {participants:#?}");

    let start_block = client.provider.get_block_number().await?;
    deploy_erc1820_registry(
        &client,
        client.kind,
        participants.deployer,
        &cli.network.artifacts_dir,
    )
    .await?;

    let contracts = deploy_contracts(&client, cli, &participants).await?;

    info!("running and testing the base scenario");
    base_scenario(&client, &participants, &contracts, start_block, log).await
}

/// Deploy the token and the presale as upgradeable instances
async fn deploy_contracts(
    client: &Client,
    cli: &Cli,
    participants: &Participants,
) -> Result<Contracts> {
    let mut project = UpgradesProject::init_network(
        client,
        cli.network.network,
        participants.deployer,
        cli.network.project_paths(),
    )
    .await?;

    project.add(TOKEN_CONTRACT, TOKEN_CONTRACT)?;
    project.add(PRESALE_CONTRACT, PRESALE_CONTRACT)?;
    project.push().await?;

    let token = project
        .create(TOKEN_CONTRACT, Some(MethodCall::new(INITIALIZER, vec![])))
        .await?;

    let now = unix_now()?;
    let presale_init_args = vec![
        participants.owner.to_string(),
        BASE_RATE.to_string(),
        participants.wallet.to_string(),
        token.address.to_string(),
        (now + OPENING_DELAY_SECS).to_string(),
        (now + CLOSING_DELAY_SECS).to_string(),
        ether(PRESALE_CAP_ETHER)?.to_string(),
        participants.capper.to_string(),
        BIG_RATE.to_string(),
        MID_RATE.to_string(),
        ether(MIN_CONTRIBUTION_ETHER)?.to_string(),
    ];
    let presale = project
        .create(PRESALE_CONTRACT, Some(MethodCall::new(INITIALIZER, presale_init_args)))
        .await?;

    Ok(Contracts { token, presale })
}

/// Run the base scenario's steps in order
async fn base_scenario(
    client: &Client,
    participants: &Participants,
    contracts: &Contracts,
    start_block: u64,
    log: &mut StepLog,
) -> Result<()> {
    let Participants {
        deployer,
        owner,
        minter,
        capper,
        team_wallet,
        bounty_wallet,
        rewards_wallet,
        investor,
        fiat_investor,
        ..
    } = *participants;
    let Contracts { token, presale } = contracts;
    let presale_address = presale.address.to_string();

    // Roles
    log.record(
        "setMinter",
        token.send("addMinter", &[minter.to_string()], TxOptions::from(deployer)).await,
    )?;
    log.record(
        "setPauser",
        token.send("addPauser", &[presale_address.clone()], TxOptions::from(deployer)).await,
    )?;

    // Minting, the second mint exceeds the token's cap
    let mint_opts = TxOptions::from(minter).gas(MINT_GAS);
    let initial_mint = mint_args(presale.address, e18(INITIAL_MINT_TOKENS)?);
    log.record("initialMint", token.send("mint", &initial_mint, mint_opts).await)?;
    let overmint = mint_args(presale.address, e18(OVERMINT_TOKENS)?);
    log.record_expected_revert("overMinting", token.send("mint", &overmint, mint_opts).await)?;

    log.record(
        "setInvestorCap",
        presale
            .send(
                "setCap",
                &[investor.to_string(), ether(INVESTOR_CAP_ETHER)?.to_string()],
                TxOptions::from(capper),
            )
            .await,
    )?;

    let window = PresaleWindow { presale, provider: &client.provider };
    await_sale_open(&window, client.kind.is_private()).await?;

    // Contributions
    let payment = TxOptions::from(investor)
        .value(ether(INVESTOR_PAYMENT_ETHER)?)
        .gas(PAYMENT_GAS);
    log.record("investorPays", send_value(client, presale.address, payment).await)?;

    let purchase = TxOptions::from(fiat_investor)
        .value(ether(INVESTOR_PURCHASE_ETHER)?)
        .gas(PRESALE_GAS);
    log.record(
        "investorBuys",
        presale.send("buyTokens", &[investor.to_string()], purchase).await,
    )?;

    let closing_time = unix_now()? + EXTENSION_SECS;
    log.record(
        "extendTime",
        presale
            .send("extendTime", &[closing_time.to_string()], TxOptions::from(owner))
            .await,
    )?;

    // Issuance is rejected while the sale is running
    let issue_opts = TxOptions::from(owner).gas(PRESALE_GAS);
    log.record_expected_revert(
        "issuerTokens1",
        presale.send("issueTokensToIssuer", &[], issue_opts).await,
    )?;

    // Offchain purchases
    log.record(
        "setFiatInvestorCap",
        presale
            .send(
                "setCap",
                &[fiat_investor.to_string(), ether(FIAT_INVESTOR_CAP_ETHER)?.to_string()],
                TxOptions::from(capper),
            )
            .await,
    )?;
    for (step, amount, bonus) in OFFCHAIN_PURCHASES {
        let args = [fiat_investor.to_string(), ether(amount)?.to_string(), bonus.to_string()];
        log.record(
            step,
            presale
                .send("boughtTokensOffchain", &args, TxOptions::from(owner).gas(PRESALE_GAS))
                .await,
        )?;
    }

    // Issuer wallets
    for (method, wallet) in [
        ("setTeamWallet", team_wallet),
        ("setBountyWallet", bounty_wallet),
        ("setRewardsWallet", rewards_wallet),
    ] {
        log.record(
            method,
            presale.send(method, &[wallet.to_string()], TxOptions::from(owner)).await,
        )?;
    }

    log.record(
        "issuerTokens2",
        presale.send("issueTokensToIssuer", &[], issue_opts).await,
    )?;

    // Burn of the unsold tokens
    let unsold_tokens = balance_of(token, presale.address).await?;
    let pre_burn_supply = token.call_u256("totalSupply", &[]).await?;
    let burn_args = [unsold_tokens.to_string(), str_to_bytes(BURN_DATA).to_string()];
    log.record(
        "burnTokens",
        presale.send("burn", &burn_args, TxOptions::from(owner).gas(PRESALE_GAS)).await,
    )?;

    let report = log.record(
        "finalLogs",
        final_report(client, participants, contracts, start_block, unsold_tokens, pre_burn_supply)
            .await,
    )?;
    report.check()
}

/// Gather the presale's events and the end state of the token
async fn final_report(
    client: &Client,
    participants: &Participants,
    contracts: &Contracts,
    start_block: u64,
    unsold_tokens: U256,
    pre_burn_supply: U256,
) -> Result<FinalReport> {
    let Contracts { token, presale } = contracts;

    let latest_block = client.provider.get_block_number().await?;
    let events = presale.events(start_block, latest_block).await?;
    let post_burn_supply = token.call_u256("totalSupply", &[]).await?;

    let end_token_balances = EndTokenBalances {
        presale: balance_of(token, presale.address).await?,
        investor: balance_of(token, participants.investor).await?,
        fiat_investor: balance_of(token, participants.fiat_investor).await?,
        team_wallet: balance_of(token, participants.team_wallet).await?,
        bounty_wallet: balance_of(token, participants.bounty_wallet).await?,
        rewards_wallet: balance_of(token, participants.rewards_wallet).await?,
    };

    let mut contributions = BTreeMap::new();
    for (role, investor) in [
        ("investor", participants.investor),
        ("fiatInvestor", participants.fiat_investor),
    ] {
        let args = [investor.to_string()];
        let contribution = Contribution {
            contribution: presale.call_u256("getContribution", &args).await?,
            cap: presale.call_u256("getCap", &args).await?,
        };
        contributions.insert(role.to_string(), contribution);
    }

    Ok(FinalReport {
        events,
        unsold_tokens,
        pre_burn_supply,
        post_burn_supply,
        end_token_balances,
        contributions,
    })
}

// -----------
// | Helpers |
// -----------

/// The arguments of a mint to the presale, without user or operator data
fn mint_args(presale: Address, amount: U256) -> Vec<String> {
    vec![
        presale.to_string(),
        presale.to_string(),
        amount.to_string(),
        "0x".to_string(),
        "0x".to_string(),
    ]
}

/// The token balance of an account
async fn balance_of(token: &DeployedContract, account: Address) -> Result<U256> {
    Ok(token.call_u256("balanceOf", &[account.to_string()]).await?)
}

/// The wall-clock time in seconds since the epoch
fn unix_now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_args() {
        let presale = Address::repeat_byte(0xaa);
        let args = mint_args(presale, e18("100000000").unwrap());

        assert_eq!(args.len(), 5);
        assert_eq!(args[0], presale.to_string());
        assert_eq!(args[2], "100000000000000000000000000");
        assert_eq!(args[4], "0x");
    }

    #[test]
    fn test_burn_data_is_utf8() {
        let data = str_to_bytes(BURN_DATA);
        assert_eq!(data.as_ref(), BURN_DATA.as_bytes());
    }
}
