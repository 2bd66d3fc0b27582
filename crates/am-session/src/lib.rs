//! Wallet session controller for the Apollo Astronauts mint page.
//!
//! Tracks the wallet connection lifecycle (`Unknown → Disconnected |
//! Connected → Authorized`), the collection's minted count, and forwards
//! `NewNFTMinted` events as user-facing confirmations.

mod config;
mod controller;
pub mod messages;
mod session;

pub use config::MintConfig;
pub use controller::{ConnectOutcome, MintOutcome, Notifier, SessionController, SubscribeOutcome};
pub use session::{MintConfirmation, MintConfirmations, SessionSnapshot, SessionState};
