//! DOM element bindings.
//!
//! All fields are resolved once at startup.

use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlAnchorElement, HtmlButtonElement};

pub fn by_id(id: &str) -> Option<Element> {
    gloo_utils::document().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn set_hidden(el: &Element, hidden: bool) {
    toggle_class(el, "hidden", hidden);
}

pub fn window() -> web_sys::Window {
    gloo_utils::window()
}

/// Every element the mint page touches.
#[derive(Clone)]
pub struct Elements {
    pub tagline: Element,
    pub connect_btn: HtmlButtonElement,
    pub mint_btn: HtmlButtonElement,
    pub collection_link: HtmlAnchorElement,
    pub twitter_link: HtmlAnchorElement,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_button {
    ($id:expr) => {
        by_id_typed::<HtmlButtonElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing button #{}", $id)))?
    };
}

macro_rules! get_link {
    ($id:expr) => {
        by_id_typed::<HtmlAnchorElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing link #{}", $id)))?
    };
}

impl Elements {
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            tagline: get_el!("tagline"),
            connect_btn: get_button!("connectWalletBtn"),
            mint_btn: get_button!("mintBtn"),
            collection_link: get_link!("collectionLink"),
            twitter_link: get_link!("twitterLink"),
        })
    }
}
