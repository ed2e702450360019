//! Constants used in the presale scenario

/// The name and alias of the token contract
pub(crate) const TOKEN_CONTRACT: &str = "InnouToken";

/// The name and alias of the presale contract
pub(crate) const PRESALE_CONTRACT: &str = "InnouTokensPreSale";

/// The initializer of both contracts
pub(crate) const INITIALIZER: &str = "initialize";

/// The number of accounts the scenario assigns roles to
pub(crate) const NUM_PARTICIPANTS: usize = 10;

// ----------------------
// | Presale parameters |
// ----------------------

/// Tokens per wei for contributions below the mid tier
pub(crate) const BASE_RATE: u64 = 20_000;

/// Tokens per wei for the biggest contributions
pub(crate) const BIG_RATE: u64 = 100_000;

/// Tokens per wei for mid-sized contributions
pub(crate) const MID_RATE: u64 = 50_000;

/// Seconds from deployment until the sale opens
pub(crate) const OPENING_DELAY_SECS: u64 = 30;

/// Seconds from deployment until the sale closes
pub(crate) const CLOSING_DELAY_SECS: u64 = 180;

/// Seconds from the time of the step until the extended closing time
pub(crate) const EXTENSION_SECS: u64 = 10_800;

/// The presale's hard cap, in ether
pub(crate) const PRESALE_CAP_ETHER: &str = "100";

/// The minimal contribution, in ether
pub(crate) const MIN_CONTRIBUTION_ETHER: &str = "5";

// -----------
// | Amounts |
// -----------

/// Tokens minted to the presale
pub(crate) const INITIAL_MINT_TOKENS: &str = "100000000";

/// Tokens whose minting exceeds the token's cap
pub(crate) const OVERMINT_TOKENS: &str = "401000000";

/// The investor's individual cap, in ether
pub(crate) const INVESTOR_CAP_ETHER: &str = "50";

/// The ether the investor sends directly to the presale
pub(crate) const INVESTOR_PAYMENT_ETHER: &str = "5";

/// The ether the fiat investor pays for tokens bought on behalf of the investor
pub(crate) const INVESTOR_PURCHASE_ETHER: &str = "10";

/// The fiat investor's individual cap, in ether
pub(crate) const FIAT_INVESTOR_CAP_ETHER: &str = "20";

/// The ether-equivalent amounts bought offchain by the fiat investor, with their bonus ids
pub(crate) const OFFCHAIN_PURCHASES: [(&str, &str, u8); 2] =
    [("fiatBuy1", "6", 0), ("fiatBuy2", "7", 2)];

/// The data attached to the burn of the unsold tokens
pub(crate) const BURN_DATA: &str = "burning unsold tokens";

// -------
// | Gas |
// -------

/// Gas limit of the mint transactions
pub(crate) const MINT_GAS: u64 = 300_000;

/// Gas limit of the direct payment to the presale
pub(crate) const PAYMENT_GAS: u64 = 500_000;

/// Gas limit of the presale's purchase, issuance and burn transactions
pub(crate) const PRESALE_GAS: u64 = 400_000;
