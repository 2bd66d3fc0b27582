//! Event binding.
//!
//! Click handlers run as `spawn_local` tasks; each one drives a single
//! controller operation.

use crate::AppController;
use crate::dom::Elements;
use am_session::MintOutcome;
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Helper: attach async click handler to a button.
macro_rules! on_click_async {
    ($el:expr, $els:expr, $controller:expr, $handler:expr) => {{
        let els = $els.clone();
        let controller = Rc::clone($controller);
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els2 = els.clone();
            let controller2 = Rc::clone(&controller);
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&els2, &controller2).await;
            });
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements, controller: &Rc<AppController>) -> Result<(), JsValue> {
    on_click_async!(els.connect_btn, els, controller, on_connect);
    on_click_async!(els.mint_btn, els, controller, on_mint);
    Ok(())
}

async fn on_connect(_els: &Elements, controller: &AppController) {
    let outcome = controller.request_wallet_connection().await;
    debug!(?outcome, "connect finished");
}

/// The button stays disabled until the transaction is mined or fails.
async fn on_mint(els: &Elements, controller: &AppController) {
    els.mint_btn.set_disabled(true);
    let outcome = controller.request_mint().await;
    els.mint_btn.set_disabled(false);

    if let MintOutcome::Mined { tx_hash, .. } = &outcome {
        debug!(url = %controller.config().tx_explorer_url(tx_hash), "mint confirmed");
    }
}
