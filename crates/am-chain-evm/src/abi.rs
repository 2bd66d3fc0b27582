//! Solidity ABI of the mint collection, declared with `sol!`, plus the hex
//! quantity helpers JSON-RPC needs around it.

use alloy_primitives::B256;
use alloy_sol_types::{SolCall, SolEvent, sol};
use am_api_types::{MintEvent, TokenId, WalletAddress};
use am_chain_client::ProviderError;
use anyhow::Result;
use serde_json::Value;

sol! {
    function mintNFT() external;
    function getTotalNFTsMintedSoFar() external view returns (uint256);
    event NewNFTMinted(address sender, uint256 tokenId);
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn mint_calldata() -> String {
    to_hex(&mintNFTCall {}.abi_encode())
}

pub fn total_minted_calldata() -> String {
    to_hex(&getTotalNFTsMintedSoFarCall {}.abi_encode())
}

/// Topic 0 of `NewNFTMinted`.
pub fn mint_topic() -> String {
    to_hex(NewNFTMinted::SIGNATURE_HASH.as_slice())
}

pub fn decode_hex(raw: &str) -> Result<Vec<u8>> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits)
        .map_err(|err| ProviderError::Malformed(format!("bad hex {raw:?}: {err}")).into())
}

pub fn decode_total_minted(data: &[u8]) -> Result<u64> {
    let returns = getTotalNFTsMintedSoFarCall::abi_decode_returns(data, true)
        .map_err(|err| ProviderError::Malformed(format!("getTotalNFTsMintedSoFar: {err}")))?;
    u64::try_from(returns._0)
        .map_err(|_| ProviderError::Malformed("uint256 does not fit in u64".to_owned()).into())
}

/// Decode one `NewNFTMinted` log from its raw topics and data.
pub fn decode_mint_event(topics: &[&str], data: &[u8]) -> Result<MintEvent> {
    let topics = topics
        .iter()
        .map(|topic| {
            topic
                .parse::<B256>()
                .map_err(|err| ProviderError::Malformed(format!("bad topic {topic:?}: {err}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let event = NewNFTMinted::decode_raw_log(topics, data, true)
        .map_err(|err| ProviderError::Malformed(format!("NewNFTMinted: {err}")))?;
    let token_id = u64::try_from(event.tokenId)
        .map_err(|_| ProviderError::Malformed("token id does not fit in u64".to_owned()))?;

    Ok(MintEvent {
        from: WalletAddress(to_hex(event.sender.as_slice())),
        token_id: TokenId(token_id),
    })
}

/// Decode a JSON-RPC quantity such as `"0x1b4"`.
pub fn parse_quantity(value: &Value) -> Result<u64> {
    let raw = value
        .as_str()
        .ok_or_else(|| ProviderError::Malformed(format!("expected hex quantity, got {value}")))?;
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16)
        .map_err(|_| ProviderError::Malformed(format!("bad quantity {raw:?}")).into())
}

pub fn quantity(value: u64) -> String {
    format!("{value:#x}")
}
