//! Rendering of the session snapshot and the alert surface.

use crate::dom::{self, Elements};
use am_session::{MintConfig, MintConfirmations, Notifier, SessionSnapshot, messages};
use tokio::sync::watch;
use tracing::info;

/// `window.alert`, the only user-visible notification channel.
#[derive(Clone, Copy, Default)]
pub struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn alert(&self, message: &str) {
        let _ = dom::window().alert_with_message(message);
    }
}

/// Text and links that never change after load.
pub fn render_static(els: &Elements, config: &MintConfig) {
    dom::set_text(&els.tagline, &messages::tagline(config));
    dom::set_text(&els.connect_btn, messages::CONNECT_LABEL);

    els.collection_link.set_href(&config.collection_url);
    dom::set_text(&els.collection_link, messages::COLLECTION_LINK_LABEL);

    els.twitter_link.set_href(&config.twitter_url());
    dom::set_text(&els.twitter_link, &messages::built_by_label(config));
}

/// What the page shows for one session snapshot.
#[derive(Debug, PartialEq, Eq)]
pub struct View {
    pub connect_hidden: bool,
    pub mint_hidden: bool,
    pub mint_label: String,
}

impl View {
    pub fn of(config: &MintConfig, snapshot: &SessionSnapshot) -> Self {
        let authorized = snapshot.is_authorized();
        Self {
            connect_hidden: authorized,
            mint_hidden: !authorized,
            mint_label: messages::mint_button_label(config, snapshot),
        }
    }
}

pub fn render(els: &Elements, config: &MintConfig, snapshot: &SessionSnapshot) {
    let view = View::of(config, snapshot);
    dom::set_hidden(&els.connect_btn, view.connect_hidden);
    dom::set_hidden(&els.mint_btn, view.mint_hidden);
    dom::set_text(&els.mint_btn, &view.mint_label);
}

/// Re-render on every session change for the page lifetime.
pub async fn follow(
    els: Elements,
    config: MintConfig,
    mut session: watch::Receiver<SessionSnapshot>,
) {
    let initial = session.borrow_and_update().clone();
    render(&els, &config, &initial);

    while session.changed().await.is_ok() {
        let snapshot = session.borrow_and_update().clone();
        render(&els, &config, &snapshot);
    }
}

pub async fn announce_confirmations(mut confirmations: MintConfirmations, notifier: AlertNotifier) {
    while let Some(confirmation) = confirmations.next().await {
        info!(
            from = %confirmation.event.from,
            token_id = %confirmation.event.token_id,
            "mint event received"
        );
        notifier.alert(&confirmation.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_api_types::WalletAddress;
    use am_session::SessionState;

    #[test]
    fn unauthenticated_page_offers_connect_only() {
        let config = MintConfig::default();
        for state in [SessionState::Unknown, SessionState::Disconnected, SessionState::Connected] {
            let snapshot = SessionSnapshot {
                state,
                minted_count: None,
            };
            let view = View::of(&config, &snapshot);
            assert!(!view.connect_hidden);
            assert!(view.mint_hidden);
        }
    }

    #[test]
    fn authorized_page_offers_mint_with_count() {
        let config = MintConfig::default();
        let snapshot = SessionSnapshot {
            state: SessionState::Authorized(WalletAddress("0xabc".into())),
            minted_count: Some(3),
        };

        let view = View::of(&config, &snapshot);

        assert!(view.connect_hidden);
        assert!(!view.mint_hidden);
        assert_eq!(view.mint_label, "Mint NFT (3 / 32 minted)");
    }
}
