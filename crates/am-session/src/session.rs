//! Observable session state and the mint confirmation feed.

use crate::MintConfig;
use crate::messages;
use am_api_types::{MintEvent, WalletAddress};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Startup, before the host has been probed.
    #[default]
    Unknown,
    /// No wallet provider installed.
    Disconnected,
    /// Provider present, no account authorized yet.
    Connected,
    /// Terminal for the page lifetime; there is no disconnect.
    Authorized(WalletAddress),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub minted_count: Option<u64>,
}

impl SessionSnapshot {
    pub fn account(&self) -> Option<&WalletAddress> {
        match &self.state {
            SessionState::Authorized(account) => Some(account),
            _ => None,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.account().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintConfirmation {
    pub event: MintEvent,
    pub asset_url: String,
    pub message: String,
}

/// Receiving end of the mint event subscription.
///
/// Delivery is decoupled from `request_mint`: an event may arrive before or
/// after the mint call that caused it returns.
pub struct MintConfirmations {
    events: mpsc::UnboundedReceiver<MintEvent>,
    config: MintConfig,
}

impl MintConfirmations {
    pub(crate) fn new(events: mpsc::UnboundedReceiver<MintEvent>, config: MintConfig) -> Self {
        Self { events, config }
    }

    pub async fn next(&mut self) -> Option<MintConfirmation> {
        let event = self.events.recv().await?;
        Some(MintConfirmation {
            asset_url: self.config.asset_url(event.token_id),
            message: messages::confirmation_message(&self.config, &event),
            event,
        })
    }
}
