use crate::MintConfig;
use crate::messages;
use crate::session::{MintConfirmations, SessionSnapshot, SessionState};
use am_api_types::{TxHash, WalletAddress};
use am_chain_client::{
    ContractConnector, MintContract, MintEventSink, PendingTransaction, ProviderError,
    ProviderHost, WalletProvider,
};
use std::cell::Cell;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, info, warn};

/// The user-visible alert surface.
pub trait Notifier {
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    NoProvider,
    Authorized(WalletAddress),
    /// The wallet granted access but returned no account.
    NoAccounts,
    Rejected,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    NoProvider,
    Subscribed,
    AlreadySubscribed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintOutcome {
    NoProvider,
    Mined {
        tx_hash: TxHash,
        minted_count: Option<u64>,
    },
    Rejected,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subscription {
    Idle,
    Pending,
    Registered,
}

/// Wallet session controller.
///
/// Every operation probes the host for a provider first, so installing a
/// wallet mid-session is picked up by the next call. Failures are logged and
/// reported as outcomes; none escape to the caller.
pub struct SessionController<H, N> {
    host: H,
    notifier: N,
    config: MintConfig,
    session: watch::Sender<SessionSnapshot>,
    mint_sink: MintEventSink,
    subscription: Cell<Subscription>,
    subscription_settled: Notify,
}

impl<H, N> SessionController<H, N>
where
    H: ProviderHost,
    N: Notifier,
{
    pub fn new(host: H, notifier: N, config: MintConfig) -> (Self, MintConfirmations) {
        let (session, _) = watch::channel(SessionSnapshot::default());
        let (mint_sink, events) = mpsc::unbounded_channel();
        let confirmations = MintConfirmations::new(events, config.clone());
        let controller = Self {
            host,
            notifier,
            config,
            session,
            mint_sink,
            subscription: Cell::new(Subscription::Idle),
            subscription_settled: Notify::new(),
        };
        (controller, confirmations)
    }

    pub fn config(&self) -> &MintConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.borrow().clone()
    }

    /// Observe every state change.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.subscribe()
    }

    /// Startup probe: silent restore of an already-authorized account.
    pub async fn detect_and_restore_session(&self) -> SessionState {
        let Some(provider) = self.host.detect() else {
            info!("no wallet provider found; a wallet must be installed");
            self.mark_disconnected();
            return SessionState::Disconnected;
        };
        debug!("wallet provider found");
        self.mark_connected();

        self.check_network(&provider).await;

        match provider.accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    info!(%account, "found an authorized account");
                    self.adopt(&provider, account).await;
                }
                None => info!("no authorized account found"),
            },
            Err(err) => warn!(error = %err, "could not read authorized accounts"),
        }

        self.snapshot().state
    }

    /// Interactive connect, triggered by the user.
    pub async fn request_wallet_connection(&self) -> ConnectOutcome {
        let Some(provider) = self.host.detect() else {
            self.notifier.alert(messages::INSTALL_WALLET_MESSAGE);
            self.mark_disconnected();
            return ConnectOutcome::NoProvider;
        };
        self.mark_connected();

        let accounts = match provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) if ProviderError::is_user_rejection(&err) => {
                info!("user rejected the account request");
                return ConnectOutcome::Rejected;
            }
            Err(err) => {
                warn!(error = %err, "account request failed");
                return ConnectOutcome::Failed(err.to_string());
            }
        };

        let Some(account) = accounts.into_iter().next() else {
            warn!("wallet returned no accounts");
            return ConnectOutcome::NoAccounts;
        };
        info!(%account, "connected");
        ConnectOutcome::Authorized(self.adopt(&provider, account).await)
    }

    /// Registers the `NewNFTMinted` listener once per controller; later calls
    /// are no-ops so a reconnect never duplicates notifications.
    pub async fn subscribe_to_mint_events(&self) -> SubscribeOutcome {
        match self.host.detect() {
            Some(provider) => self.subscribe_with(&provider).await,
            None => {
                debug!("no wallet provider; mint listener not registered");
                SubscribeOutcome::NoProvider
            }
        }
    }

    pub async fn refresh_minted_count(&self) -> Option<u64> {
        match self.host.detect() {
            Some(provider) => self.refresh_with(&provider).await,
            None => {
                debug!("no wallet provider; minted count not refreshed");
                None
            }
        }
    }

    /// Submits a mint and waits for it to be mined before refreshing the count.
    pub async fn request_mint(&self) -> MintOutcome {
        let Some(provider) = self.host.detect() else {
            info!("no wallet provider; mint skipped");
            return MintOutcome::NoProvider;
        };
        let contract = match provider.connect(&self.config.contract_address) {
            Ok(contract) => contract,
            Err(err) => return self.mint_failed(err),
        };

        info!("asking the wallet to sign and pay gas for the mint");
        let pending = match contract.mint().await {
            Ok(pending) => pending,
            Err(err) => return self.mint_failed(err),
        };

        let tx_hash = pending.hash().clone();
        info!(%tx_hash, "mining, please wait");
        if let Err(err) = pending.wait().await {
            return self.mint_failed(err);
        }
        info!(url = %self.config.tx_explorer_url(&tx_hash), "mined");

        let minted_count = self.refresh_with(&provider).await;
        MintOutcome::Mined {
            tx_hash,
            minted_count,
        }
    }

    async fn check_network(&self, provider: &H::Provider) {
        match provider.chain_id().await {
            Ok(chain_id) if chain_id == self.config.required_chain_id => {
                debug!(%chain_id, "connected to the required chain");
            }
            Ok(chain_id) => {
                // Soft check: every operation still runs on the wrong chain.
                warn!(%chain_id, required = %self.config.required_chain_id, "wrong network");
                self.notifier.alert(&messages::wrong_network_message(&self.config));
            }
            Err(err) => warn!(error = %err, "could not read chain id"),
        }
    }

    /// First authorized account wins; returns the account actually tracked.
    async fn adopt(&self, provider: &H::Provider, account: WalletAddress) -> WalletAddress {
        self.session.send_if_modified(|snapshot| match &snapshot.state {
            SessionState::Authorized(existing) => {
                if *existing != account {
                    debug!(%existing, ignored = %account, "keeping first authorized account");
                }
                false
            }
            _ => {
                snapshot.state = SessionState::Authorized(account.clone());
                true
            }
        });

        self.subscribe_with(provider).await;
        self.refresh_with(provider).await;

        self.snapshot().account().cloned().unwrap_or(account)
    }

    /// A call arriving while another registration is in flight waits for it
    /// and takes over if that registration fails.
    async fn subscribe_with(&self, provider: &H::Provider) -> SubscribeOutcome {
        loop {
            match self.subscription.get() {
                Subscription::Idle => break,
                Subscription::Pending => self.subscription_settled.notified().await,
                Subscription::Registered => {
                    debug!("mint listener already registered");
                    return SubscribeOutcome::AlreadySubscribed;
                }
            }
        }
        self.subscription.set(Subscription::Pending);

        let registered = match provider.connect(&self.config.contract_address) {
            Ok(contract) => contract.on_mint(self.mint_sink.clone()).await,
            Err(err) => Err(err),
        };
        let outcome = match registered {
            Ok(()) => {
                self.subscription.set(Subscription::Registered);
                info!(contract = %self.config.contract_address, "mint listener registered");
                SubscribeOutcome::Subscribed
            }
            Err(err) => {
                self.subscription.set(Subscription::Idle);
                warn!(error = %err, "could not register mint listener");
                SubscribeOutcome::Failed
            }
        };
        self.subscription_settled.notify_waiters();
        outcome
    }

    async fn refresh_with(&self, provider: &H::Provider) -> Option<u64> {
        let minted = match provider.connect(&self.config.contract_address) {
            Ok(contract) => contract.total_minted().await,
            Err(err) => Err(err),
        };
        let minted = match minted {
            Ok(minted) => minted,
            Err(err) => {
                warn!(error = %err, "could not read minted count");
                return None;
            }
        };

        if minted > self.config.total_supply {
            warn!(
                minted,
                total_supply = self.config.total_supply,
                "minted count above supply ignored"
            );
            return None;
        }

        self.session.send_if_modified(|snapshot| {
            let changed = snapshot.minted_count != Some(minted);
            snapshot.minted_count = Some(minted);
            changed
        });
        debug!(minted, "minted count refreshed");
        Some(minted)
    }

    fn mint_failed(&self, err: anyhow::Error) -> MintOutcome {
        if ProviderError::is_user_rejection(&err) {
            info!("user rejected the mint transaction");
            MintOutcome::Rejected
        } else {
            warn!(error = %err, "mint failed");
            MintOutcome::Failed(err.to_string())
        }
    }

    fn mark_disconnected(&self) {
        self.session.send_if_modified(|snapshot| {
            if snapshot.state == SessionState::Unknown {
                snapshot.state = SessionState::Disconnected;
                true
            } else {
                false
            }
        });
    }

    fn mark_connected(&self) {
        self.session.send_if_modified(|snapshot| match snapshot.state {
            SessionState::Unknown | SessionState::Disconnected => {
                snapshot.state = SessionState::Connected;
                true
            }
            _ => false,
        });
    }
}
