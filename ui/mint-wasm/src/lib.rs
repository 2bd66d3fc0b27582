//! Apollo Astronauts mint page.
//!
//! Rust + WASM frontend: connects the injected browser wallet, shows the
//! minted count, and submits mints to the collection contract.

pub mod dom;
pub mod ethereum;
pub mod events;
pub mod logging;
pub mod render;

use am_session::{MintConfig, SessionController};
use ethereum::BrowserHost;
use render::AlertNotifier;
use std::rc::Rc;
use tracing::info;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

pub type AppController = SessionController<BrowserHost, AlertNotifier>;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();
    logging::init();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;
    let config = MintConfig::default();
    render::render_static(&els, &config);

    let (controller, confirmations) =
        SessionController::new(BrowserHost::default(), AlertNotifier, config.clone());
    let controller = Rc::new(controller);

    spawn_local(render::follow(els.clone(), config, controller.watch()));
    spawn_local(render::announce_confirmations(confirmations, AlertNotifier));

    events::bind_events(&els, &controller)?;

    let state = controller.detect_and_restore_session().await;
    info!(?state, "session probed");
    Ok(())
}
