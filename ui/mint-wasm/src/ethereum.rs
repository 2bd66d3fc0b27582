//! Bridge to the injected `window.ethereum` provider.

use am_chain_client::{Executor, ProviderError, ProviderHost};
use am_chain_evm::{Eip1193Transport, RpcConfig, RpcWalletProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

pub type BrowserProvider = RpcWalletProvider<EthereumTransport, BrowserExecutor>;

/// Looks up `window.ethereum` on every probe, so a wallet installed after
/// page load is found on the next user action.
#[derive(Default)]
pub struct BrowserHost {
    rpc: RpcConfig,
}

impl ProviderHost for BrowserHost {
    type Provider = BrowserProvider;

    fn detect(&self) -> Option<BrowserProvider> {
        let transport = EthereumTransport::detect()?;
        Some(RpcWalletProvider::new(
            Rc::new(transport),
            Rc::new(BrowserExecutor),
            self.rpc.clone(),
        ))
    }
}

pub struct EthereumTransport {
    ethereum: JsValue,
}

impl EthereumTransport {
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return None;
        }
        Some(Self { ethereum })
    }
}

#[derive(Serialize)]
struct RequestArguments<'a> {
    method: &'a str,
    params: &'a Value,
}

#[async_trait(?Send)]
impl Eip1193Transport for EthereumTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let request: Function = Reflect::get(&self.ethereum, &JsValue::from_str("request"))
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| {
                ProviderError::Malformed("ethereum.request is not a function".to_owned())
            })?;

        // Plain objects, not `Map`s: providers read `args.method`.
        let args = RequestArguments {
            method,
            params: &params,
        }
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| anyhow!("encode {method} arguments: {err}"))?;

        let returned = request.call1(&self.ethereum, &args).map_err(js_error)?;
        let result = JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(js_error)?;

        serde_wasm_bindgen::from_value(result)
            .map_err(|err| ProviderError::Malformed(format!("{method} result: {err}")).into())
    }
}

/// EIP-1193 rejects with `{ code, message }`; anything else is opaque.
fn js_error(value: JsValue) -> anyhow::Error {
    let code = Reflect::get(&value, &JsValue::from_str("code"))
        .ok()
        .and_then(|code| code.as_f64());
    let message = Reflect::get(&value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string());

    match (code, message) {
        (Some(code), message) => {
            ProviderError::from_rpc(code as i64, message.unwrap_or_default()).into()
        }
        (None, Some(message)) => anyhow!(message),
        (None, None) => anyhow!("provider error: {value:?}"),
    }
}

pub struct BrowserExecutor;

impl Executor for BrowserExecutor {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(gloo_timers::future::sleep(duration))
    }
}
