//! User-facing text.

use crate::MintConfig;
use crate::session::SessionSnapshot;
use am_api_types::MintEvent;

pub const INSTALL_WALLET_MESSAGE: &str = "Get MetaMask!";
pub const CONNECT_LABEL: &str = "Connect to Wallet";
pub const COLLECTION_LINK_LABEL: &str = "View Collection on OpenSea";

pub fn wrong_network_message(config: &MintConfig) -> String {
    format!("You are not connected to the {}!", config.required_network_name)
}

pub fn confirmation_message(config: &MintConfig, event: &MintEvent) -> String {
    format!(
        "Hey there! We've minted your NFT and sent it to your wallet. It may be blank right now. \
         It can take a max of 10 min to show up on OpenSea. Here's the link: {}",
        config.asset_url(event.token_id)
    )
}

/// `"Mint NFT"` until the count is known, then `"Mint NFT (7 / 32 minted)"`.
pub fn mint_button_label(config: &MintConfig, snapshot: &SessionSnapshot) -> String {
    match snapshot.minted_count {
        Some(minted) => format!("Mint NFT ({minted} / {} minted)", config.total_supply),
        None => "Mint NFT".to_owned(),
    }
}

pub fn tagline(config: &MintConfig) -> String {
    format!("Mint one of only {} Apollo astronauts.", config.total_supply)
}

pub fn built_by_label(config: &MintConfig) -> String {
    format!("built by @{}", config.twitter_handle)
}
