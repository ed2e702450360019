//! Waiting for the presale to open

use alloy::{
    eips::BlockNumberOrTag,
    providers::{ext::AnvilApi, DynProvider, Provider},
};
use deploy_scripts::contract::DeployedContract;
use eyre::{bail, eyre, Result};
use tracing::info;

/// The sale window of a presale, along with the chain's clock
pub(crate) trait SaleWindow {
    /// The time the sale opens at
    async fn opening_time(&self) -> Result<u64>;

    /// The timestamp of the latest block
    async fn latest_timestamp(&self) -> Result<u64>;

    /// Move the chain's clock forward and mine a block at the new time
    async fn advance_time(&self, seconds: u64) -> Result<()>;

    /// Whether the sale accepts contributions
    async fn is_open(&self) -> Result<bool>;
}

/// The sale window of a deployed presale
pub(crate) struct PresaleWindow<'a> {
    /// The presale contract
    pub(crate) presale: &'a DeployedContract,
    /// The provider of the chain the presale lives on
    pub(crate) provider: &'a DynProvider,
}

impl SaleWindow for PresaleWindow<'_> {
    async fn opening_time(&self) -> Result<u64> {
        let opening = self.presale.call_u256("openingTime", &[]).await?;
        u64::try_from(opening).map_err(|e| eyre!("opening time {opening}: {e}"))
    }

    async fn latest_timestamp(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?
            .ok_or_else(|| eyre!("no latest block"))?;
        Ok(block.header.timestamp)
    }

    async fn advance_time(&self, seconds: u64) -> Result<()> {
        self.provider.anvil_increase_time(seconds).await?;
        self.provider.evm_mine(None).await?;
        Ok(())
    }

    async fn is_open(&self) -> Result<bool> {
        Ok(self.presale.call_bool("isOpen", &[]).await?)
    }
}

/// Wait for the sale to open.
///
/// When the clock can be advanced and the opening time is ahead of the latest block,
/// the clock is moved just past the opening time. The sale must then be open, there
/// is no retry.
pub(crate) async fn await_sale_open<W: SaleWindow>(window: &W, can_advance: bool) -> Result<()> {
    let opening = window.opening_time().await?;
    let latest = window.latest_timestamp().await?;

    if can_advance && opening > latest {
        let seconds = opening - latest + 1;
        info!("advancing time by {seconds}s to the presale opening");
        window.advance_time(seconds).await?;
    }

    if !window.is_open().await? {
        bail!("presale is not open (opens at {opening}, latest block at {latest})");
    }

    info!("presale is open");
    Ok(())
}
