//! Owns the wallet session: the connected account, the observed chain id,
//! and the connect/disconnect/switch-network operations against the wallet
//! provider boundary. Connection failures become a dismissable error string,
//! never a fault.

use color_eyre::eyre::{
    Result,
    bail,
    eyre,
};
use alloy::primitives::Address;
use raffyl_abi::boundary::{
    ChainDefinition,
    SwitchChainOutcome,
    WalletEvent,
    WalletProvider,
};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionChange {
    None,
    AccountChanged,
    ChainChanged,
    Disconnected,
}

pub struct WalletSession<W: WalletProvider> {
    wallet: Option<W>,
    target: ChainDefinition,
    events: Option<mpsc::UnboundedReceiver<WalletEvent>>,
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub is_connected: bool,
    pub is_connecting: bool,
    pub error: Option<String>,
}

impl<W: WalletProvider> WalletSession<W> {
    pub fn new(wallet: Option<W>, target: ChainDefinition) -> Self {
        let events = wallet.as_ref().map(|wallet| wallet.subscribe());
        Self {
            wallet,
            target,
            events,
            account: None,
            chain_id: None,
            is_connected: false,
            is_connecting: false,
            error: None,
        }
    }

    pub fn wallet(&self) -> Option<&W> {
        self.wallet.as_ref()
    }

    pub fn target(&self) -> &ChainDefinition {
        &self.target
    }

    /// Requests account access and captures the active account and chain id.
    /// A chain id other than the configured target triggers exactly one
    /// automatic switch attempt. Failures land in `self.error`.
    pub async fn connect(&mut self) {
        let Some(wallet) = &self.wallet else {
            self.error = Some(
                "No wallet is configured. Restart with --wallet <name> to sign \
                 transactions."
                    .to_string(),
            );
            return;
        };

        self.is_connecting = true;
        self.error = None;
        match Self::establish(wallet, &self.target).await {
            Ok((account, chain_id)) => {
                info!(%account, chain_id, "wallet session established");
                self.account = Some(account);
                self.chain_id = Some(chain_id);
                self.is_connected = true;
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        self.is_connecting = false;
    }

    async fn establish(
        wallet: &W,
        target: &ChainDefinition,
    ) -> Result<(Address, u64)> {
        let accounts = wallet.request_accounts().await.map_err(|e| eyre!(e))?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| eyre!("the wallet exposes no accounts"))?;

        let mut chain_id = wallet.chain_id().await.map_err(|e| eyre!(e))?;
        if chain_id != target.chain_id {
            Self::switch_to_target(wallet, target).await?;
            chain_id = target.chain_id;
        }
        Ok((account, chain_id))
    }

    /// Asks the wallet to switch to the configured chain; when the wallet
    /// does not recognize it, submits the chain definition and retries once.
    async fn switch_to_target(wallet: &W, target: &ChainDefinition) -> Result<()> {
        match wallet
            .switch_chain(target.chain_id)
            .await
            .map_err(|e| eyre!(e))?
        {
            SwitchChainOutcome::Switched => Ok(()),
            SwitchChainOutcome::UnrecognizedChain => {
                info!(
                    chain_id = target.chain_id,
                    "wallet does not know the target chain; adding it"
                );
                wallet.add_chain(target).await.map_err(|e| eyre!(e))?;
                match wallet
                    .switch_chain(target.chain_id)
                    .await
                    .map_err(|e| eyre!(e))?
                {
                    SwitchChainOutcome::Switched => Ok(()),
                    SwitchChainOutcome::UnrecognizedChain => bail!(
                        "the wallet still does not recognize chain {}",
                        target.chain_id
                    ),
                }
            }
        }
    }

    pub async fn switch_network(&mut self) {
        let Some(wallet) = &self.wallet else {
            return;
        };
        if let Err(err) = Self::switch_to_target(wallet, &self.target).await {
            self.error = Some(err.to_string());
        } else {
            self.chain_id = Some(self.target.chain_id);
        }
    }

    /// Clears local session state. Wallet-side authorization cannot be
    /// revoked from here.
    pub fn disconnect(&mut self) {
        self.account = None;
        self.chain_id = None;
        self.is_connected = false;
        self.error = None;
    }

    pub async fn next_wallet_event(&mut self) -> Option<WalletEvent> {
        match self.events.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Folds a wallet notification into the session. An emptied account list
    /// forces a disconnect; a chain change invalidates everything cached
    /// from the previous chain, which the caller handles via the returned
    /// change marker.
    pub fn apply_wallet_event(&mut self, event: WalletEvent) -> SessionChange {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first().copied()
            {
                None => {
                    self.disconnect();
                    SessionChange::Disconnected
                }
                Some(account) => {
                    if self.is_connected && self.account != Some(account) {
                        self.account = Some(account);
                        SessionChange::AccountChanged
                    } else {
                        SessionChange::None
                    }
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                if self.chain_id == Some(chain_id) {
                    return SessionChange::None;
                }
                self.chain_id = Some(chain_id);
                SessionChange::ChainChanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use raffyl_abi::{
        boundary::NativeCurrency,
        test_helpers::{
            MockWallet,
            addr,
        },
    };

    fn target() -> ChainDefinition {
        ChainDefinition {
            chain_id: 4202,
            name: "Lisk Sepolia".to_string(),
            rpc_url: "https://rpc.sepolia-api.lisk.com".to_string(),
            explorer_url: "https://sepolia-blockscout.lisk.com".to_string(),
            native_currency: NativeCurrency {
                name: "Ethereum".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
        }
    }

    #[tokio::test]
    async fn connect__switches_once_when_the_chain_mismatches() {
        // given: a wallet sitting on mainnet that knows the target chain
        let wallet = MockWallet::new(addr(1), 1);
        wallet.add_known_chain(4202);
        let mut session = WalletSession::new(Some(wallet.clone()), target());

        // when
        session.connect().await;

        // then: exactly one switch attempt, no user interaction
        assert!(session.is_connected);
        assert_eq!(session.account, Some(addr(1)));
        assert_eq!(session.chain_id, Some(4202));
        assert_eq!(wallet.switch_attempts(), vec![4202]);
        assert!(wallet.added_chains().is_empty());
    }

    #[tokio::test]
    async fn connect__adds_the_chain_when_the_wallet_does_not_know_it() {
        // given: a wallet that has never seen the target chain
        let wallet = MockWallet::new(addr(1), 1);
        let mut session = WalletSession::new(Some(wallet.clone()), target());

        // when
        session.connect().await;

        // then: switch, add, retry
        assert!(session.is_connected);
        assert_eq!(wallet.switch_attempts(), vec![4202, 4202]);
        let added = wallet.added_chains();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].chain_id, 4202);
        assert_eq!(added[0].rpc_url, "https://rpc.sepolia-api.lisk.com");
    }

    #[tokio::test]
    async fn connect__matching_chain_never_switches() {
        let wallet = MockWallet::new(addr(1), 4202);
        let mut session = WalletSession::new(Some(wallet.clone()), target());

        session.connect().await;

        assert!(session.is_connected);
        assert!(wallet.switch_attempts().is_empty());
    }

    #[tokio::test]
    async fn connect__without_a_wallet_sets_a_user_facing_error() {
        let mut session = WalletSession::<MockWallet>::new(None, target());

        session.connect().await;

        assert!(!session.is_connected);
        assert!(session.error.as_deref().unwrap().contains("--wallet"));
    }

    #[tokio::test]
    async fn connect__rejection_is_nonfatal_and_retryable() {
        // given: a wallet that rejects the first request
        let wallet = MockWallet::new(addr(1), 4202);
        wallet.set_reject_accounts(true);
        let mut session = WalletSession::new(Some(wallet.clone()), target());

        // when
        session.connect().await;

        // then
        assert!(!session.is_connected);
        assert!(session.error.is_some());

        // and a later retry succeeds
        wallet.set_reject_accounts(false);
        session.connect().await;
        assert!(session.is_connected);
        assert!(session.error.is_none());
    }

    #[tokio::test]
    async fn wallet_events__emptied_account_list_forces_disconnect() {
        // given: a connected session
        let wallet = MockWallet::new(addr(1), 4202);
        let mut session = WalletSession::new(Some(wallet.clone()), target());
        session.connect().await;
        assert!(session.is_connected);

        // when
        wallet.emit_accounts_changed(Vec::new());
        let event = session.next_wallet_event().await.unwrap();
        let change = session.apply_wallet_event(event);

        // then
        assert_eq!(change, SessionChange::Disconnected);
        assert!(!session.is_connected);
        assert_eq!(session.account, None);
    }

    #[tokio::test]
    async fn wallet_events__chain_change_is_reported_for_a_full_reload() {
        let wallet = MockWallet::new(addr(1), 4202);
        let mut session = WalletSession::new(Some(wallet.clone()), target());
        session.connect().await;

        wallet.emit_chain_changed(1135);
        let event = session.next_wallet_event().await.unwrap();
        let change = session.apply_wallet_event(event);

        assert_eq!(change, SessionChange::ChainChanged);
        assert_eq!(session.chain_id, Some(1135));
    }

    #[tokio::test]
    async fn wallet_events__account_swap_keeps_the_session_connected() {
        let wallet = MockWallet::new(addr(1), 4202);
        let mut session = WalletSession::new(Some(wallet.clone()), target());
        session.connect().await;

        wallet.emit_accounts_changed(vec![addr(2)]);
        let event = session.next_wallet_event().await.unwrap();
        let change = session.apply_wallet_event(event);

        assert_eq!(change, SessionChange::AccountChanged);
        assert!(session.is_connected);
        assert_eq!(session.account, Some(addr(2)));
    }
}
