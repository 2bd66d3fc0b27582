use serde::{Deserialize, Serialize};
use std::fmt;

pub const CONTRACT_ADDRESS: &str = "0x53d2d392b187AEeeF474a974Cb604B2931b1482F";
pub const TOTAL_MINT_COUNT: u64 = 32;

/// Rinkeby. The provider reports chain ids as `0x`-prefixed hex.
pub const REQUIRED_CHAIN_ID: ChainId = ChainId(4);
pub const REQUIRED_NETWORK_NAME: &str = "Rinkeby Test Network";

pub const TWITTER_HANDLE: &str = "itsakeller";
pub const OPENSEA_COLLECTION_URL: &str =
    "https://testnets.opensea.io/collection/apolloastronautsnft-fvtrg35ed2";
pub const OPENSEA_ASSET_BASE: &str = "https://testnets.opensea.io/assets";
pub const ETHERSCAN_TX_BASE: &str = "https://rinkeby.etherscan.io/tx";

pub const MINT_FUNCTION: &str = "mintNFT()";
pub const TOTAL_MINTED_FUNCTION: &str = "getTotalNFTsMintedSoFar()";
pub const MINT_EVENT: &str = "NewNFTMinted(address,uint256)";

/// An externally owned account as reported by the wallet.
///
/// Wallets return lower-case hex while checksummed (EIP-55) constants are
/// mixed-case, so equality ignores ASCII case.
#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
pub struct WalletAddress(pub String);

impl PartialEq for WalletAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
pub struct ContractAddress(pub String);

impl ContractAddress {
    pub fn mint_collection() -> Self {
        Self(CONTRACT_ADDRESS.to_owned())
    }
}

impl PartialEq for ContractAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Parse the `eth_chainId` form, e.g. `"0x4"`. EIP-1193 always reports
    /// hex, so an unprefixed string is rejected rather than guessed at.
    pub fn parse_hex(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
        u64::from_str_radix(digits, 16).ok().map(ChainId)
    }

    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of the collection's `NewNFTMinted(address,uint256)` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintEvent {
    pub from: WalletAddress,
    pub token_id: TokenId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub succeeded: bool,
}
