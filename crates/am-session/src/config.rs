use am_api_types::{
    CONTRACT_ADDRESS, ChainId, ContractAddress, ETHERSCAN_TX_BASE, OPENSEA_ASSET_BASE,
    OPENSEA_COLLECTION_URL, REQUIRED_CHAIN_ID, REQUIRED_NETWORK_NAME, TOTAL_MINT_COUNT,
    TWITTER_HANDLE, TokenId, TxHash,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Collection settings. The shipped app uses `MintConfig::default()`, which
/// carries the compiled-in constants; any field may be overridden from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MintConfig {
    pub contract_address: ContractAddress,
    pub total_supply: u64,
    pub required_chain_id: ChainId,
    pub required_network_name: String,
    pub collection_url: String,
    pub asset_base_url: String,
    pub tx_explorer_base_url: String,
    pub twitter_handle: String,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            contract_address: ContractAddress(CONTRACT_ADDRESS.to_owned()),
            total_supply: TOTAL_MINT_COUNT,
            required_chain_id: REQUIRED_CHAIN_ID,
            required_network_name: REQUIRED_NETWORK_NAME.to_owned(),
            collection_url: OPENSEA_COLLECTION_URL.to_owned(),
            asset_base_url: OPENSEA_ASSET_BASE.to_owned(),
            tx_explorer_base_url: ETHERSCAN_TX_BASE.to_owned(),
            twitter_handle: TWITTER_HANDLE.to_owned(),
        }
    }
}

impl MintConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parse mint config")
    }

    /// Marketplace page for a single minted token.
    pub fn asset_url(&self, token_id: TokenId) -> String {
        format!(
            "{}/{}/{}",
            self.asset_base_url.trim_end_matches('/'),
            self.contract_address,
            token_id
        )
    }

    pub fn tx_explorer_url(&self, tx_hash: &TxHash) -> String {
        format!("{}/{}", self.tx_explorer_base_url.trim_end_matches('/'), tx_hash)
    }

    pub fn twitter_url(&self) -> String {
        format!("https://twitter.com/{}", self.twitter_handle)
    }
}
