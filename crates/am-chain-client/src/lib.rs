use am_api_types::{ChainId, ContractAddress, MintEvent, TxHash, TxReceipt, WalletAddress};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use std::time::Duration;
use thiserror::Error;

/// Where contract bindings push `NewNFTMinted` events.
pub type MintEventSink = tokio::sync::mpsc::UnboundedSender<MintEvent>;

/// EIP-1193 error code for a request the user declined in the wallet UI.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193 error code for a method the dapp is not yet authorized for.
pub const UNAUTHORIZED_CODE: i64 = 4100;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("user rejected the request")]
    UserRejected,
    #[error("no authorized account is available")]
    Unauthorized,
    #[error("provider rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        match code {
            USER_REJECTED_CODE => Self::UserRejected,
            UNAUTHORIZED_CODE => Self::Unauthorized,
            _ => Self::Rpc {
                code,
                message: message.into(),
            },
        }
    }

    /// Finds a classified provider failure anywhere in an error chain.
    pub fn find(err: &anyhow::Error) -> Option<&ProviderError> {
        err.chain().find_map(|cause| cause.downcast_ref::<ProviderError>())
    }

    pub fn is_user_rejection(err: &anyhow::Error) -> bool {
        matches!(Self::find(err), Some(ProviderError::UserRejected))
    }
}

/// The wallet bridge injected by the host (a browser extension in practice).
#[async_trait(?Send)]
pub trait WalletProvider {
    /// `eth_accounts`: already-authorized accounts, never prompts.
    async fn accounts(&self) -> Result<Vec<WalletAddress>>;
    /// `eth_requestAccounts`: may open the wallet's own permission prompt.
    async fn request_accounts(&self) -> Result<Vec<WalletAddress>>;
    /// `eth_chainId`.
    async fn chain_id(&self) -> Result<ChainId>;
}

/// Builds contract bindings scoped to the provider's current signer.
///
/// Bindings are cheap and are expected to be rebuilt for every call.
pub trait ContractConnector {
    type Contract: MintContract;

    fn connect(&self, address: &ContractAddress) -> Result<Self::Contract>;
}

#[async_trait(?Send)]
pub trait MintContract {
    type Pending: PendingTransaction;

    fn address(&self) -> &ContractAddress;
    /// Submits `mintNFT()`; resolves once the wallet has signed and broadcast.
    async fn mint(&self) -> Result<Self::Pending>;
    /// `getTotalNFTsMintedSoFar()`.
    async fn total_minted(&self) -> Result<u64>;
    /// Registers a standing `NewNFTMinted` listener. Events arrive on `sink`
    /// at arbitrary later times, unordered relative to any mint call.
    async fn on_mint(&self, sink: MintEventSink) -> Result<()>;
}

#[async_trait(?Send)]
pub trait PendingTransaction {
    fn hash(&self) -> &TxHash;
    /// Resolves when the transaction is mined. A reverted receipt is an error.
    async fn wait(&self) -> Result<TxReceipt>;
}

/// Probes the host environment for an injected provider.
///
/// `None` means no wallet is installed, which is an expected state.
pub trait ProviderHost {
    type Provider: WalletProvider + ContractConnector;

    fn detect(&self) -> Option<Self::Provider>;
}

/// Single-threaded task spawning and timers.
pub trait Executor {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}
