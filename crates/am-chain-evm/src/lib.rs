pub mod abi;
mod contract;

pub use contract::{RpcMintContract, RpcPendingTransaction};

use am_api_types::{ChainId, ContractAddress, WalletAddress};
use am_chain_client::{ContractConnector, Executor, ProviderError, WalletProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Raw EIP-1193 `request({ method, params })`.
#[async_trait(?Send)]
pub trait Eip1193Transport {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Interval between receipt and event-log polls.
    pub poll_interval: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
        }
    }
}

/// Wallet provider and contract connector speaking JSON-RPC through an
/// injected EIP-1193 transport.
pub struct RpcWalletProvider<T, X> {
    transport: Rc<T>,
    executor: Rc<X>,
    config: RpcConfig,
}

impl<T, X> Clone for RpcWalletProvider<T, X> {
    fn clone(&self) -> Self {
        Self {
            transport: Rc::clone(&self.transport),
            executor: Rc::clone(&self.executor),
            config: self.config.clone(),
        }
    }
}

impl<T, X> RpcWalletProvider<T, X>
where
    T: Eip1193Transport + 'static,
    X: Executor + 'static,
{
    pub fn new(transport: Rc<T>, executor: Rc<X>, config: RpcConfig) -> Self {
        Self {
            transport,
            executor,
            config,
        }
    }

    pub fn transport(&self) -> &Rc<T> {
        &self.transport
    }
}

#[async_trait(?Send)]
impl<T, X> WalletProvider for RpcWalletProvider<T, X>
where
    T: Eip1193Transport + 'static,
    X: Executor + 'static,
{
    async fn accounts(&self) -> Result<Vec<WalletAddress>> {
        fetch_accounts(&*self.transport, "eth_accounts").await
    }

    async fn request_accounts(&self) -> Result<Vec<WalletAddress>> {
        fetch_accounts(&*self.transport, "eth_requestAccounts").await
    }

    async fn chain_id(&self) -> Result<ChainId> {
        let raw = self
            .transport
            .request("eth_chainId", json!([]))
            .await
            .context("eth_chainId")?;
        let chain_id = raw
            .as_str()
            .and_then(ChainId::parse_hex)
            .ok_or_else(|| ProviderError::Malformed(format!("eth_chainId returned {raw}")))?;
        debug!(%chain_id, "provider chain");
        Ok(chain_id)
    }
}

impl<T, X> ContractConnector for RpcWalletProvider<T, X>
where
    T: Eip1193Transport + 'static,
    X: Executor + 'static,
{
    type Contract = RpcMintContract<T, X>;

    fn connect(&self, address: &ContractAddress) -> Result<Self::Contract> {
        Ok(RpcMintContract::new(
            address.clone(),
            Rc::clone(&self.transport),
            Rc::clone(&self.executor),
            self.config.clone(),
        ))
    }
}

pub(crate) async fn fetch_accounts<T>(transport: &T, method: &str) -> Result<Vec<WalletAddress>>
where
    T: Eip1193Transport + ?Sized,
{
    let raw = transport
        .request(method, json!([]))
        .await
        .with_context(|| method.to_owned())?;
    parse_accounts(&raw)
}

fn parse_accounts(raw: &Value) -> Result<Vec<WalletAddress>> {
    let entries = raw
        .as_array()
        .ok_or_else(|| ProviderError::Malformed(format!("accounts response {raw}")))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(|address| WalletAddress(address.to_owned()))
                .ok_or_else(|| {
                    anyhow::Error::from(ProviderError::Malformed(format!("account entry {entry}")))
                })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use futures::future::LocalBoxFuture;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    /// Replays canned responses per method and records every call.
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: RefCell<HashMap<String, VecDeque<Result<Value, ProviderError>>>>,
        pub calls: RefCell<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        pub fn respond(&self, method: &str, value: Value) -> &Self {
            self.push(method, Ok(value))
        }

        pub fn fail(&self, method: &str, err: ProviderError) -> &Self {
            self.push(method, Err(err))
        }

        fn push(&self, method: &str, response: Result<Value, ProviderError>) -> &Self {
            self.responses
                .borrow_mut()
                .entry(method.to_owned())
                .or_default()
                .push_back(response);
            self
        }

        pub fn methods(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|(method, _)| method.clone())
                .collect()
        }
    }

    #[async_trait(?Send)]
    impl Eip1193Transport for ScriptedTransport {
        async fn request(&self, method: &str, params: Value) -> Result<Value> {
            self.calls.borrow_mut().push((method.to_owned(), params));
            let next = self
                .responses
                .borrow_mut()
                .get_mut(method)
                .and_then(VecDeque::pop_front);
            match next {
                Some(Ok(value)) => Ok(value),
                Some(Err(err)) => Err(err.into()),
                None => Err(anyhow::anyhow!("no scripted response for {method}")),
            }
        }
    }

    /// Spawns onto the current `LocalSet`; sleeping only yields.
    pub struct LocalExecutor;

    impl Executor for LocalExecutor {
        fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
            tokio::task::spawn_local(task);
        }

        fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
            Box::pin(tokio::task::yield_now())
        }
    }

    pub fn provider(
        transport: &Rc<ScriptedTransport>,
    ) -> RpcWalletProvider<ScriptedTransport, LocalExecutor> {
        RpcWalletProvider::new(
            Rc::clone(transport),
            Rc::new(LocalExecutor),
            RpcConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn accounts_are_read_without_prompting() -> anyhow::Result<()> {
        let transport = Rc::new(ScriptedTransport::default());
        transport.respond("eth_accounts", json!(["0xabc", "0xdef"]));
        let provider = provider(&transport);

        let accounts = provider.accounts().await?;

        assert_eq!(
            accounts,
            vec![WalletAddress("0xabc".into()), WalletAddress("0xdef".into())]
        );
        assert_eq!(transport.methods(), vec!["eth_accounts"]);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_connection_keeps_classification() {
        let transport = Rc::new(ScriptedTransport::default());
        transport.fail("eth_requestAccounts", ProviderError::UserRejected);
        let provider = provider(&transport);

        let err = provider.request_accounts().await.unwrap_err();

        assert!(ProviderError::is_user_rejection(&err));
    }

    #[tokio::test]
    async fn chain_id_is_decoded_from_hex() -> anyhow::Result<()> {
        let transport = Rc::new(ScriptedTransport::default());
        transport.respond("eth_chainId", json!("0x4"));
        transport.respond("eth_chainId", json!(4));
        let provider = provider(&transport);

        assert_eq!(provider.chain_id().await?, ChainId(4));
        assert!(provider.chain_id().await.is_err());
        Ok(())
    }

    #[test]
    fn malformed_account_lists_are_rejected() {
        assert!(parse_accounts(&json!("0xabc")).is_err());
        assert!(parse_accounts(&json!([1, 2])).is_err());
        assert!(parse_accounts(&json!([])).unwrap().is_empty());
    }
}
