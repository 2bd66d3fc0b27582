use crate::abi;
use crate::{Eip1193Transport, RpcConfig, fetch_accounts};
use am_api_types::{ContractAddress, MintEvent, TxHash, TxReceipt};
use am_chain_client::{Executor, MintContract, MintEventSink, PendingTransaction, ProviderError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Value, json};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Binding for the mint collection contract, signing through the wallet's
/// first authorized account.
pub struct RpcMintContract<T, X> {
    address: ContractAddress,
    transport: Rc<T>,
    executor: Rc<X>,
    config: RpcConfig,
}

impl<T, X> RpcMintContract<T, X>
where
    T: Eip1193Transport + 'static,
    X: Executor + 'static,
{
    pub fn new(
        address: ContractAddress,
        transport: Rc<T>,
        executor: Rc<X>,
        config: RpcConfig,
    ) -> Self {
        Self {
            address,
            transport,
            executor,
            config,
        }
    }

    async fn signer(&self) -> Result<String> {
        let accounts = fetch_accounts(&*self.transport, "eth_accounts").await?;
        accounts
            .into_iter()
            .next()
            .map(|account| account.0)
            .ok_or_else(|| ProviderError::Unauthorized.into())
    }
}

#[async_trait(?Send)]
impl<T, X> MintContract for RpcMintContract<T, X>
where
    T: Eip1193Transport + 'static,
    X: Executor + 'static,
{
    type Pending = RpcPendingTransaction<T, X>;

    fn address(&self) -> &ContractAddress {
        &self.address
    }

    async fn mint(&self) -> Result<Self::Pending> {
        let from = self.signer().await?;
        let tx = json!([{
            "from": from,
            "to": self.address.0,
            "data": abi::mint_calldata()
        }]);

        let raw = self
            .transport
            .request("eth_sendTransaction", tx)
            .await
            .context("eth_sendTransaction mintNFT")?;
        let hash = raw
            .as_str()
            .map(|hash| TxHash(hash.to_owned()))
            .ok_or_else(|| ProviderError::Malformed(format!("transaction hash {raw}")))?;

        info!(tx_hash = %hash, "mint transaction submitted");
        Ok(RpcPendingTransaction {
            hash,
            transport: Rc::clone(&self.transport),
            executor: Rc::clone(&self.executor),
            poll_interval: self.config.poll_interval,
        })
    }

    async fn total_minted(&self) -> Result<u64> {
        let call = json!([
            { "to": self.address.0, "data": abi::total_minted_calldata() },
            "latest"
        ]);
        let raw = self
            .transport
            .request("eth_call", call)
            .await
            .context("eth_call getTotalNFTsMintedSoFar")?;
        let encoded = raw
            .as_str()
            .ok_or_else(|| ProviderError::Malformed(format!("eth_call returned {raw}")))?;
        abi::decode_total_minted(&abi::decode_hex(encoded)?)
    }

    async fn on_mint(&self, sink: MintEventSink) -> Result<()> {
        let head = block_number(&*self.transport)
            .await
            .context("eth_blockNumber for mint listener")?;

        let watcher = LogWatcher {
            address: self.address.clone(),
            topic: abi::mint_topic(),
            next_block: head + 1,
            transport: Rc::clone(&self.transport),
            executor: Rc::clone(&self.executor),
            poll_interval: self.config.poll_interval,
            sink,
        };
        self.executor.spawn(watcher.run().boxed_local());

        debug!(contract = %self.address, from_block = head + 1, "mint listener registered");
        Ok(())
    }
}

pub struct RpcPendingTransaction<T, X> {
    hash: TxHash,
    transport: Rc<T>,
    executor: Rc<X>,
    poll_interval: Duration,
}

#[async_trait(?Send)]
impl<T, X> PendingTransaction for RpcPendingTransaction<T, X>
where
    T: Eip1193Transport + 'static,
    X: Executor + 'static,
{
    fn hash(&self) -> &TxHash {
        &self.hash
    }

    async fn wait(&self) -> Result<TxReceipt> {
        loop {
            let raw = self
                .transport
                .request("eth_getTransactionReceipt", json!([self.hash.0]))
                .await
                .context("eth_getTransactionReceipt")?;

            if raw.is_null() {
                debug!(tx_hash = %self.hash, "transaction not mined yet");
                self.executor.sleep(self.poll_interval).await;
                continue;
            }

            let receipt = parse_receipt(&self.hash, &raw)?;
            if !receipt.succeeded {
                return Err(ProviderError::Reverted {
                    tx_hash: self.hash.clone(),
                }
                .into());
            }
            return Ok(receipt);
        }
    }
}

fn parse_receipt(hash: &TxHash, raw: &Value) -> Result<TxReceipt> {
    let block_number = abi::parse_quantity(&raw["blockNumber"])?;
    // Receipts from before Byzantium carry no status field.
    let succeeded = match raw.get("status") {
        Some(status) if !status.is_null() => abi::parse_quantity(status)? == 1,
        _ => true,
    };
    Ok(TxReceipt {
        tx_hash: hash.clone(),
        block_number,
        succeeded,
    })
}

async fn block_number<T>(transport: &T) -> Result<u64>
where
    T: Eip1193Transport + ?Sized,
{
    let raw = transport.request("eth_blockNumber", json!([])).await?;
    abi::parse_quantity(&raw)
}

/// Polls `eth_getLogs` for the mint event until the receiving side closes.
struct LogWatcher<T, X> {
    address: ContractAddress,
    topic: String,
    next_block: u64,
    transport: Rc<T>,
    executor: Rc<X>,
    poll_interval: Duration,
    sink: MintEventSink,
}

impl<T, X> LogWatcher<T, X>
where
    T: Eip1193Transport + 'static,
    X: Executor + 'static,
{
    async fn run(mut self) {
        loop {
            self.executor.sleep(self.poll_interval).await;
            if self.sink.is_closed() {
                debug!(contract = %self.address, "mint listener closed");
                return;
            }

            let head = match block_number(&*self.transport).await {
                Ok(head) => head,
                Err(err) => {
                    warn!(error = %err, "mint listener could not read block number");
                    continue;
                }
            };
            if head < self.next_block {
                continue;
            }

            let filter = json!([{
                "address": self.address.0,
                "topics": [self.topic],
                "fromBlock": abi::quantity(self.next_block),
                "toBlock": abi::quantity(head)
            }]);
            let logs = match self.transport.request("eth_getLogs", filter).await {
                Ok(logs) => logs,
                Err(err) => {
                    warn!(
                        error = %err,
                        from_block = self.next_block,
                        "mint listener log poll failed"
                    );
                    continue;
                }
            };

            for log in logs.as_array().map(Vec::as_slice).unwrap_or_default() {
                match decode_mint_log(log) {
                    Ok(Some(event)) => {
                        if self.sink.send(event).is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => warn!(error = %err, "skipping undecodable mint log"),
                }
            }
            self.next_block = head + 1;
        }
    }
}

fn decode_mint_log(log: &Value) -> Result<Option<MintEvent>> {
    if log.get("removed").and_then(Value::as_bool) == Some(true) {
        return Ok(None);
    }

    let topics: Vec<&str> = log["topics"]
        .as_array()
        .map(|topics| topics.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let data = abi::decode_hex(log["data"].as_str().unwrap_or("0x"))?;
    abi::decode_mint_event(&topics, &data).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use am_api_types::{TokenId, WalletAddress};
    use am_chain_client::ContractConnector;
    use tokio::sync::mpsc;
    use tokio::task::LocalSet;

    fn word_hex(tail: &str) -> String {
        format!("{tail:0>64}")
    }

    fn mint_log(from: &str, token_id: u64) -> Value {
        json!({
            "address": am_api_types::CONTRACT_ADDRESS,
            "topics": [abi::mint_topic()],
            "data": format!("0x{}{}", word_hex(from), word_hex(&format!("{token_id:x}"))),
            "removed": false
        })
    }

    fn contract(
        transport: &Rc<ScriptedTransport>,
    ) -> RpcMintContract<ScriptedTransport, LocalExecutor> {
        provider(transport)
            .connect(&ContractAddress::mint_collection())
            .unwrap()
    }

    fn log_filters(transport: &ScriptedTransport) -> Vec<(Value, Value)> {
        transport
            .calls
            .borrow()
            .iter()
            .filter(|(method, _)| method == "eth_getLogs")
            .map(|(_, params)| (params[0]["fromBlock"].clone(), params[0]["toBlock"].clone()))
            .collect()
    }

    #[tokio::test]
    async fn total_minted_decodes_first_word() -> anyhow::Result<()> {
        let transport = Rc::new(ScriptedTransport::default());
        transport.respond("eth_call", json!(format!("0x{}", word_hex("7"))));

        assert_eq!(contract(&transport).total_minted().await?, 7);

        let calls = transport.calls.borrow();
        let (method, params) = &calls[0];
        assert_eq!(method, "eth_call");
        assert_eq!(params[0]["data"], abi::total_minted_calldata());
        assert_eq!(params[1], "latest");
        Ok(())
    }

    #[tokio::test]
    async fn mint_sends_from_first_account_and_waits_for_receipt() -> anyhow::Result<()> {
        let transport = Rc::new(ScriptedTransport::default());
        transport
            .respond("eth_accounts", json!(["0xabc"]))
            .respond("eth_sendTransaction", json!("0xfeed"))
            .respond("eth_getTransactionReceipt", Value::Null)
            .respond(
                "eth_getTransactionReceipt",
                json!({ "blockNumber": "0x10", "status": "0x1" }),
            );

        let pending = contract(&transport).mint().await?;
        assert_eq!(pending.hash(), &TxHash("0xfeed".into()));

        let receipt = pending.wait().await?;
        assert_eq!(receipt.block_number, 16);
        assert!(receipt.succeeded);

        let calls = transport.calls.borrow();
        let sent = &calls[1].1[0];
        assert_eq!(sent["from"], "0xabc");
        assert_eq!(sent["data"], abi::mint_calldata());
        assert_eq!(
            transport
                .methods()
                .iter()
                .filter(|m| *m == "eth_getTransactionReceipt")
                .count(),
            2
        );
        Ok(())
    }

    #[tokio::test]
    async fn mint_without_account_is_unauthorized() {
        let transport = Rc::new(ScriptedTransport::default());
        transport.respond("eth_accounts", json!([]));

        let err = contract(&transport).mint().await.err().unwrap();

        assert_eq!(ProviderError::find(&err), Some(&ProviderError::Unauthorized));
        assert!(!transport.methods().contains(&"eth_sendTransaction".to_owned()));
    }

    #[tokio::test]
    async fn reverted_receipt_is_an_error() -> anyhow::Result<()> {
        let transport = Rc::new(ScriptedTransport::default());
        transport
            .respond("eth_accounts", json!(["0xabc"]))
            .respond("eth_sendTransaction", json!("0xdead"))
            .respond(
                "eth_getTransactionReceipt",
                json!({ "blockNumber": "0x11", "status": "0x0" }),
            );

        let pending = contract(&transport).mint().await?;
        let err = pending.wait().await.unwrap_err();

        assert_eq!(
            ProviderError::find(&err),
            Some(&ProviderError::Reverted {
                tx_hash: TxHash("0xdead".into())
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn mint_listener_delivers_logs_after_registration() {
        LocalSet::new()
            .run_until(async {
                let transport = Rc::new(ScriptedTransport::default());
                transport
                    .respond("eth_blockNumber", json!("0x10"))
                    .respond("eth_blockNumber", json!("0x12"))
                    .respond("eth_getLogs", json!([mint_log("abc", 5)]));

                let (tx, mut rx) = mpsc::unbounded_channel();
                contract(&transport).on_mint(tx).await.unwrap();

                let event = rx.recv().await.unwrap();
                assert_eq!(event.token_id, TokenId(5));
                assert_eq!(event.from, WalletAddress(format!("0x{:0>40}", "abc")));
                assert_eq!(log_filters(&transport), vec![(json!("0x11"), json!("0x12"))]);
            })
            .await;
    }

    #[tokio::test]
    async fn failed_log_poll_is_retried_from_same_block() {
        LocalSet::new()
            .run_until(async {
                let transport = Rc::new(ScriptedTransport::default());
                transport
                    .respond("eth_blockNumber", json!("0x10"))
                    .respond("eth_blockNumber", json!("0x12"))
                    .respond("eth_blockNumber", json!("0x13"))
                    .fail(
                        "eth_getLogs",
                        ProviderError::Rpc {
                            code: -32005,
                            message: "limit exceeded".into(),
                        },
                    )
                    .respond("eth_getLogs", json!([mint_log("abc", 6)]));

                let (tx, mut rx) = mpsc::unbounded_channel();
                contract(&transport).on_mint(tx).await.unwrap();

                let event = rx.recv().await.unwrap();
                assert_eq!(event.token_id, TokenId(6));
                assert_eq!(
                    log_filters(&transport),
                    vec![
                        (json!("0x11"), json!("0x12")),
                        (json!("0x11"), json!("0x13")),
                    ]
                );
            })
            .await;
    }

    #[tokio::test]
    async fn closed_receiver_stops_the_listener() {
        LocalSet::new()
            .run_until(async {
                let transport = Rc::new(ScriptedTransport::default());
                transport.respond("eth_blockNumber", json!("0x10"));

                let (tx, rx) = mpsc::unbounded_channel();
                contract(&transport).on_mint(tx).await.unwrap();
                drop(rx);

                for _ in 0..10 {
                    tokio::task::yield_now().await;
                }

                assert_eq!(transport.methods(), vec!["eth_blockNumber"]);
            })
            .await;
    }

    #[test]
    fn removed_and_malformed_logs_are_handled() {
        let mut removed = mint_log("abc", 1);
        removed["removed"] = json!(true);
        assert_eq!(decode_mint_log(&removed).unwrap(), None);

        let event = decode_mint_log(&mint_log("def", 9)).unwrap().unwrap();
        assert_eq!(event.token_id, TokenId(9));

        let short = json!({
            "topics": [abi::mint_topic()],
            "data": format!("0x{}", word_hex("1"))
        });
        assert!(decode_mint_log(&short).is_err());
    }
}
