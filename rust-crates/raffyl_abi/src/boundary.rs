//! Capability interfaces over the external collaborators: the injected
//! wallet, the `EventFactory`, per-instance `Event` contracts, and the
//! fungible-token standard. Everything above this module talks to the chain
//! through these traits only.
#![allow(async_fn_in_trait)]

use alloy::primitives::{
    Address,
    B256,
    U256,
};
use anyhow::Result;
use tokio::sync::mpsc;

/// The chain's base asset is denoted by the all-zero token address.
pub const NATIVE_TOKEN: Address = Address::ZERO;

/// Raw per-event state as the contract reports it. Lifecycle interpretation
/// happens client-side.
#[derive(Clone, Debug)]
pub struct EventInfo {
    pub name: String,
    pub organizer: Address,
    pub token_address: Address,
    pub prize_amount: U256,
    pub winner_count: u64,
    pub state: u8,
    pub participant_count: u64,
    pub is_funded: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxStatus {
    pub hash: B256,
    pub success: bool,
}

/// A transaction accepted by the node but not yet included in a block. The
/// hash is displayable immediately; `confirm` resolves on inclusion.
pub trait PendingTx {
    fn tx_hash(&self) -> B256;
    async fn confirm(self) -> Result<TxStatus>;
}

pub trait FactoryReader {
    async fn all_events(&self) -> Result<Vec<Address>>;
    async fn events_by_organizer(&self, organizer: Address) -> Result<Vec<Address>>;
}

pub trait FactoryWriter {
    type Tx: PendingTx;

    async fn create_event(
        &self,
        name: String,
        token_address: Address,
        prize_amount: U256,
        winner_count: u64,
    ) -> Result<Self::Tx>;
}

pub trait EventReader {
    async fn info(&self) -> Result<EventInfo>;
    async fn contract_balance(&self) -> Result<U256>;
    async fn participants(&self) -> Result<Vec<Address>>;
    async fn winners(&self) -> Result<Vec<Address>>;
    async fn is_registered(&self, account: Address) -> Result<bool>;
    async fn is_winner(&self, account: Address) -> Result<bool>;
}

pub trait EventWriter {
    type Tx: PendingTx;

    async fn register(&self) -> Result<Self::Tx>;
    /// `native_value` attaches the chain's base asset to the call; it is
    /// `Some` exactly when the prize token is [`NATIVE_TOKEN`].
    async fn fund_event(
        &self,
        amount: U256,
        native_value: Option<U256>,
    ) -> Result<Self::Tx>;
    async fn select_winners(&self) -> Result<Self::Tx>;
    async fn disburse_prizes(&self) -> Result<Self::Tx>;
    async fn withdraw_balance(&self) -> Result<Self::Tx>;
}

pub trait TokenReader {
    async fn symbol(&self) -> Result<String>;
    async fn decimals(&self) -> Result<u8>;
    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256>;
    async fn balance_of(&self, account: Address) -> Result<U256>;
}

pub trait TokenWriter {
    type Tx: PendingTx;

    async fn approve(&self, spender: Address, amount: U256) -> Result<Self::Tx>;
}

/// Constructs typed contract handles. Reader handles are always available;
/// writer handles exist only while a signing account is attached, and
/// requesting one without a signer fails before any network traffic.
pub trait ContractGateway: Clone {
    type FactoryReader: FactoryReader;
    type FactoryWriter: FactoryWriter;
    type EventReader: EventReader;
    type EventWriter: EventWriter;
    type TokenReader: TokenReader;
    type TokenWriter: TokenWriter;

    fn caller(&self) -> Option<Address>;
    fn factory_reader(&self) -> Self::FactoryReader;
    fn factory_writer(&self) -> Result<Self::FactoryWriter>;
    fn event_reader(&self, event: Address) -> Self::EventReader;
    fn event_writer(&self, event: Address) -> Result<Self::EventWriter>;
    fn token_reader(&self, token: Address) -> Self::TokenReader;
    fn token_writer(&self, token: Address) -> Result<Self::TokenWriter>;

    async fn native_balance(&self, account: Address) -> Result<U256>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// What a wallet needs to know to add a network it has never seen, mirroring
/// the `wallet_addEthereumChain` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainDefinition {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub native_currency: NativeCurrency,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Distinguishes the one switch failure that has a recovery path: a chain
/// the wallet does not recognize can be added and the switch retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchChainOutcome {
    Switched,
    UnrecognizedChain,
}

pub trait WalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>>;
    async fn chain_id(&self) -> Result<u64>;
    async fn switch_chain(&self, chain_id: u64) -> Result<SwitchChainOutcome>;
    async fn add_chain(&self, definition: &ChainDefinition) -> Result<()>;
    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent>;
}
