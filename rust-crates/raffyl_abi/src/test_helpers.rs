//! In-memory stand-ins for the chain and the wallet, implementing the same
//! boundary traits as the live gateway. The mock chain applies transaction
//! effects at confirmation time and enforces the contract rules the client
//! assumes, so sequencing bugs (approve before fund, state regressions)
//! surface in tests.

use crate::boundary::{
    ChainDefinition,
    ContractGateway,
    EventInfo,
    EventReader,
    EventWriter,
    FactoryReader,
    FactoryWriter,
    PendingTx,
    SwitchChainOutcome,
    TokenReader,
    TokenWriter,
    TxStatus,
    WalletEvent,
    WalletProvider,
};
use alloy::primitives::{
    Address,
    B256,
    U256,
};
use anyhow::{
    Result,
    anyhow,
    bail,
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
};
use tokio::sync::mpsc;

pub const STATE_OPEN: u8 = 0;
pub const STATE_WINNERS_SELECTED: u8 = 1;
pub const STATE_COMPLETED: u8 = 2;

/// Deterministic test address: twenty copies of `n`.
pub fn addr(n: u8) -> Address {
    Address::from([n; 20])
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainOp {
    CreateEvent {
        name: String,
        token_address: Address,
        prize_amount: U256,
        winner_count: u64,
    },
    Register {
        event: Address,
    },
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    Fund {
        event: Address,
        amount: U256,
        native: bool,
    },
    SelectWinners {
        event: Address,
    },
    Disburse {
        event: Address,
    },
    Withdraw {
        event: Address,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpRecord {
    Submitted(ChainOp),
    Confirmed(ChainOp),
    Reverted(ChainOp),
}

#[derive(Clone, Debug)]
pub struct MockEvent {
    pub name: String,
    pub organizer: Address,
    pub token_address: Address,
    pub prize_amount: U256,
    pub winner_count: u64,
    pub state: u8,
    pub is_funded: bool,
    pub participants: Vec<Address>,
    pub winners: Vec<Address>,
    pub balance: U256,
    pub fail_reads: bool,
}

#[derive(Clone, Debug, Default)]
pub struct MockToken {
    pub symbol: String,
    pub decimals: u8,
    pub fail_metadata: bool,
    pub balances: HashMap<Address, U256>,
    pub allowances: HashMap<(Address, Address), U256>,
}

#[derive(Default)]
struct ChainState {
    events: Vec<(Address, MockEvent)>,
    tokens: HashMap<Address, MockToken>,
    native_balances: HashMap<Address, U256>,
    ops: Vec<OpRecord>,
    next_address: u64,
    next_tx: u64,
}

impl ChainState {
    fn event_mut(&mut self, address: Address) -> Option<&mut MockEvent> {
        self.events
            .iter_mut()
            .find(|(candidate, _)| *candidate == address)
            .map(|(_, event)| event)
    }

    fn event(&self, address: Address) -> Option<&MockEvent> {
        self.events
            .iter()
            .find(|(candidate, _)| *candidate == address)
            .map(|(_, event)| event)
    }
}

#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_address(&self, state: &mut ChainState) -> Address {
        state.next_address += 1;
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&state.next_address.to_be_bytes());
        Address::from(bytes)
    }

    pub fn add_token(&self, symbol: &str, decimals: u8) -> Address {
        let mut state = self.state.lock().unwrap();
        let address = self.fresh_address(&mut state);
        state.tokens.insert(
            address,
            MockToken {
                symbol: symbol.to_string(),
                decimals,
                ..MockToken::default()
            },
        );
        address
    }

    pub fn add_event(
        &self,
        name: &str,
        organizer: Address,
        token_address: Address,
        prize_amount: U256,
        winner_count: u64,
    ) -> Address {
        let mut state = self.state.lock().unwrap();
        let address = self.fresh_address(&mut state);
        state.events.push((
            address,
            MockEvent {
                name: name.to_string(),
                organizer,
                token_address,
                prize_amount,
                winner_count,
                state: STATE_OPEN,
                is_funded: false,
                participants: Vec::new(),
                winners: Vec::new(),
                balance: U256::ZERO,
                fail_reads: false,
            },
        ));
        address
    }

    pub fn event(&self, address: Address) -> MockEvent {
        self.state
            .lock()
            .unwrap()
            .event(address)
            .cloned()
            .expect("unknown mock event address")
    }

    pub fn set_fail_reads(&self, address: Address, fail: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(event) = state.event_mut(address) {
            event.fail_reads = fail;
        }
    }

    pub fn set_fail_token_metadata(&self, token: Address, fail: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(token) = state.tokens.get_mut(&token) {
            token.fail_metadata = fail;
        }
    }

    pub fn set_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) {
        let mut state = self.state.lock().unwrap();
        if let Some(token) = state.tokens.get_mut(&token) {
            token.allowances.insert((owner, spender), amount);
        }
    }

    pub fn set_native_balance(&self, account: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .native_balances
            .insert(account, amount);
    }

    pub fn records(&self) -> Vec<OpRecord> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn gateway(&self, caller: Option<Address>) -> MockGateway {
        MockGateway {
            chain: self.clone(),
            caller,
        }
    }

    fn submit(&self, op: ChainOp, caller: Address) -> MockPendingTx {
        let hash = {
            let mut state = self.state.lock().unwrap();
            state.next_tx += 1;
            state.ops.push(OpRecord::Submitted(op.clone()));
            let mut bytes = [0u8; 32];
            bytes[24..].copy_from_slice(&state.next_tx.to_be_bytes());
            B256::from(bytes)
        };
        MockPendingTx {
            chain: self.clone(),
            op,
            caller,
            hash,
        }
    }

    /// Applies the contract-side rules for one transaction. Returns false
    /// (a reverted receipt) instead of erroring, matching how a live chain
    /// reports failed inclusion.
    fn apply(&self, op: &ChainOp, caller: Address) -> bool {
        let mut state = self.state.lock().unwrap();
        match op {
            ChainOp::CreateEvent {
                name,
                token_address,
                prize_amount,
                winner_count,
            } => {
                let address = self.fresh_address(&mut state);
                state.events.push((
                    address,
                    MockEvent {
                        name: name.clone(),
                        organizer: caller,
                        token_address: *token_address,
                        prize_amount: *prize_amount,
                        winner_count: *winner_count,
                        state: STATE_OPEN,
                        is_funded: false,
                        participants: Vec::new(),
                        winners: Vec::new(),
                        balance: U256::ZERO,
                        fail_reads: false,
                    },
                ));
                true
            }
            ChainOp::Register { event } => {
                let Some(event) = state.event_mut(*event) else {
                    return false;
                };
                if event.state != STATE_OPEN
                    || event.organizer == caller
                    || event.participants.contains(&caller)
                {
                    return false;
                }
                event.participants.push(caller);
                true
            }
            ChainOp::Approve {
                token,
                spender,
                amount,
            } => {
                let Some(token) = state.tokens.get_mut(token) else {
                    return false;
                };
                token.allowances.insert((caller, *spender), *amount);
                true
            }
            ChainOp::Fund {
                event,
                amount,
                native,
            } => {
                let Some((event_address, event)) = state
                    .events
                    .iter()
                    .find(|(candidate, _)| candidate == event)
                    .map(|(address, event)| (*address, event.clone()))
                else {
                    return false;
                };
                if event.is_funded || event.organizer != caller {
                    return false;
                }
                if *native {
                    if event.token_address != Address::ZERO {
                        return false;
                    }
                } else {
                    let Some(token) = state.tokens.get_mut(&event.token_address)
                    else {
                        return false;
                    };
                    let allowance = token
                        .allowances
                        .get(&(caller, event_address))
                        .copied()
                        .unwrap_or(U256::ZERO);
                    if allowance < *amount {
                        return false;
                    }
                    token
                        .allowances
                        .insert((caller, event_address), allowance - *amount);
                }
                let event = state.event_mut(event_address).unwrap();
                event.balance += *amount;
                event.is_funded = true;
                true
            }
            ChainOp::SelectWinners { event } => {
                let Some(event) = state.event_mut(*event) else {
                    return false;
                };
                if event.organizer != caller
                    || event.state != STATE_OPEN
                    || (event.participants.len() as u64) < event.winner_count
                {
                    return false;
                }
                // Winner randomness is the real contract's concern; the mock
                // picks the first N entrants so tests stay deterministic.
                event.winners = event
                    .participants
                    .iter()
                    .take(event.winner_count as usize)
                    .copied()
                    .collect();
                event.state = STATE_WINNERS_SELECTED;
                true
            }
            ChainOp::Disburse { event } => {
                let Some(event) = state.event_mut(*event) else {
                    return false;
                };
                if event.organizer != caller
                    || event.state != STATE_WINNERS_SELECTED
                    || !event.is_funded
                    || event.winner_count == 0
                {
                    return false;
                }
                // Integer per-winner split; indivisible prizes leave dust for
                // the organizer to withdraw after completion.
                let per_winner = event.prize_amount / U256::from(event.winner_count);
                let total = per_winner * U256::from(event.winner_count);
                if event.balance < total {
                    return false;
                }
                event.balance -= total;
                event.state = STATE_COMPLETED;
                true
            }
            ChainOp::Withdraw { event } => {
                let Some(event) = state.event_mut(*event) else {
                    return false;
                };
                if event.organizer != caller
                    || event.state != STATE_COMPLETED
                    || event.balance.is_zero()
                {
                    return false;
                }
                event.balance = U256::ZERO;
                true
            }
        }
    }
}

pub struct MockPendingTx {
    chain: MockChain,
    op: ChainOp,
    caller: Address,
    hash: B256,
}

impl PendingTx for MockPendingTx {
    fn tx_hash(&self) -> B256 {
        self.hash
    }

    async fn confirm(self) -> Result<TxStatus> {
        let success = self.chain.apply(&self.op, self.caller);
        let record = if success {
            OpRecord::Confirmed(self.op.clone())
        } else {
            OpRecord::Reverted(self.op.clone())
        };
        self.chain.state.lock().unwrap().ops.push(record);
        Ok(TxStatus {
            hash: self.hash,
            success,
        })
    }
}

#[derive(Clone)]
pub struct MockGateway {
    chain: MockChain,
    caller: Option<Address>,
}

impl MockGateway {
    fn require_signer(&self) -> Result<Address> {
        self.caller
            .ok_or_else(|| anyhow!("no signing wallet is connected"))
    }
}

impl ContractGateway for MockGateway {
    type FactoryReader = MockFactoryReader;
    type FactoryWriter = MockFactoryWriter;
    type EventReader = MockEventReader;
    type EventWriter = MockEventWriter;
    type TokenReader = MockTokenReader;
    type TokenWriter = MockTokenWriter;

    fn caller(&self) -> Option<Address> {
        self.caller
    }

    fn factory_reader(&self) -> MockFactoryReader {
        MockFactoryReader {
            chain: self.chain.clone(),
        }
    }

    fn factory_writer(&self) -> Result<MockFactoryWriter> {
        let caller = self.require_signer()?;
        Ok(MockFactoryWriter {
            chain: self.chain.clone(),
            caller,
        })
    }

    fn event_reader(&self, event: Address) -> MockEventReader {
        MockEventReader {
            chain: self.chain.clone(),
            event,
        }
    }

    fn event_writer(&self, event: Address) -> Result<MockEventWriter> {
        let caller = self.require_signer()?;
        Ok(MockEventWriter {
            chain: self.chain.clone(),
            event,
            caller,
        })
    }

    fn token_reader(&self, token: Address) -> MockTokenReader {
        MockTokenReader {
            chain: self.chain.clone(),
            token,
        }
    }

    fn token_writer(&self, token: Address) -> Result<MockTokenWriter> {
        let caller = self.require_signer()?;
        Ok(MockTokenWriter {
            chain: self.chain.clone(),
            token,
            caller,
        })
    }

    async fn native_balance(&self, account: Address) -> Result<U256> {
        Ok(self
            .chain
            .state
            .lock()
            .unwrap()
            .native_balances
            .get(&account)
            .copied()
            .unwrap_or(U256::ZERO))
    }
}

pub struct MockFactoryReader {
    chain: MockChain,
}

impl FactoryReader for MockFactoryReader {
    async fn all_events(&self) -> Result<Vec<Address>> {
        let state = self.chain.state.lock().unwrap();
        Ok(state.events.iter().map(|(address, _)| *address).collect())
    }

    async fn events_by_organizer(&self, organizer: Address) -> Result<Vec<Address>> {
        let state = self.chain.state.lock().unwrap();
        Ok(state
            .events
            .iter()
            .filter(|(_, event)| event.organizer == organizer)
            .map(|(address, _)| *address)
            .collect())
    }
}

pub struct MockFactoryWriter {
    chain: MockChain,
    caller: Address,
}

impl FactoryWriter for MockFactoryWriter {
    type Tx = MockPendingTx;

    async fn create_event(
        &self,
        name: String,
        token_address: Address,
        prize_amount: U256,
        winner_count: u64,
    ) -> Result<MockPendingTx> {
        Ok(self.chain.submit(
            ChainOp::CreateEvent {
                name,
                token_address,
                prize_amount,
                winner_count,
            },
            self.caller,
        ))
    }
}

pub struct MockEventReader {
    chain: MockChain,
    event: Address,
}

impl MockEventReader {
    fn snapshot(&self) -> Result<MockEvent> {
        let state = self.chain.state.lock().unwrap();
        let event = state
            .event(self.event)
            .ok_or_else(|| anyhow!("no contract deployed at {}", self.event))?;
        if event.fail_reads {
            bail!("simulated read failure for {}", self.event);
        }
        Ok(event.clone())
    }
}

impl EventReader for MockEventReader {
    async fn info(&self) -> Result<EventInfo> {
        let event = self.snapshot()?;
        Ok(EventInfo {
            name: event.name.clone(),
            organizer: event.organizer,
            token_address: event.token_address,
            prize_amount: event.prize_amount,
            winner_count: event.winner_count,
            state: event.state,
            participant_count: event.participants.len() as u64,
            is_funded: event.is_funded,
        })
    }

    async fn contract_balance(&self) -> Result<U256> {
        Ok(self.snapshot()?.balance)
    }

    async fn participants(&self) -> Result<Vec<Address>> {
        Ok(self.snapshot()?.participants)
    }

    async fn winners(&self) -> Result<Vec<Address>> {
        Ok(self.snapshot()?.winners)
    }

    async fn is_registered(&self, account: Address) -> Result<bool> {
        Ok(self.snapshot()?.participants.contains(&account))
    }

    async fn is_winner(&self, account: Address) -> Result<bool> {
        Ok(self.snapshot()?.winners.contains(&account))
    }
}

pub struct MockEventWriter {
    chain: MockChain,
    event: Address,
    caller: Address,
}

impl EventWriter for MockEventWriter {
    type Tx = MockPendingTx;

    async fn register(&self) -> Result<MockPendingTx> {
        Ok(self
            .chain
            .submit(ChainOp::Register { event: self.event }, self.caller))
    }

    async fn fund_event(
        &self,
        amount: U256,
        native_value: Option<U256>,
    ) -> Result<MockPendingTx> {
        Ok(self.chain.submit(
            ChainOp::Fund {
                event: self.event,
                amount,
                native: native_value.is_some(),
            },
            self.caller,
        ))
    }

    async fn select_winners(&self) -> Result<MockPendingTx> {
        Ok(self
            .chain
            .submit(ChainOp::SelectWinners { event: self.event }, self.caller))
    }

    async fn disburse_prizes(&self) -> Result<MockPendingTx> {
        Ok(self
            .chain
            .submit(ChainOp::Disburse { event: self.event }, self.caller))
    }

    async fn withdraw_balance(&self) -> Result<MockPendingTx> {
        Ok(self
            .chain
            .submit(ChainOp::Withdraw { event: self.event }, self.caller))
    }
}

pub struct MockTokenReader {
    chain: MockChain,
    token: Address,
}

impl MockTokenReader {
    fn snapshot(&self) -> Result<MockToken> {
        let state = self.chain.state.lock().unwrap();
        state
            .tokens
            .get(&self.token)
            .cloned()
            .ok_or_else(|| anyhow!("no token deployed at {}", self.token))
    }
}

impl TokenReader for MockTokenReader {
    async fn symbol(&self) -> Result<String> {
        let token = self.snapshot()?;
        if token.fail_metadata {
            bail!("simulated non-standard token at {}", self.token);
        }
        Ok(token.symbol)
    }

    async fn decimals(&self) -> Result<u8> {
        let token = self.snapshot()?;
        if token.fail_metadata {
            bail!("simulated non-standard token at {}", self.token);
        }
        Ok(token.decimals)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        Ok(self
            .snapshot()?
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn balance_of(&self, account: Address) -> Result<U256> {
        Ok(self
            .snapshot()?
            .balances
            .get(&account)
            .copied()
            .unwrap_or(U256::ZERO))
    }
}

pub struct MockTokenWriter {
    chain: MockChain,
    token: Address,
    caller: Address,
}

impl TokenWriter for MockTokenWriter {
    type Tx = MockPendingTx;

    async fn approve(&self, spender: Address, amount: U256) -> Result<MockPendingTx> {
        Ok(self.chain.submit(
            ChainOp::Approve {
                token: self.token,
                spender,
                amount,
            },
            self.caller,
        ))
    }
}

struct MockWalletInner {
    accounts: Mutex<Vec<Address>>,
    chain_id: Mutex<u64>,
    known_chains: Mutex<Vec<u64>>,
    switch_attempts: Mutex<Vec<u64>>,
    added_chains: Mutex<Vec<ChainDefinition>>,
    reject_accounts: Mutex<bool>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<WalletEvent>>>,
}

#[derive(Clone)]
pub struct MockWallet {
    inner: Arc<MockWalletInner>,
}

impl MockWallet {
    pub fn new(account: Address, chain_id: u64) -> Self {
        Self {
            inner: Arc::new(MockWalletInner {
                accounts: Mutex::new(vec![account]),
                chain_id: Mutex::new(chain_id),
                known_chains: Mutex::new(vec![chain_id]),
                switch_attempts: Mutex::new(Vec::new()),
                added_chains: Mutex::new(Vec::new()),
                reject_accounts: Mutex::new(false),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn add_known_chain(&self, chain_id: u64) {
        self.inner.known_chains.lock().unwrap().push(chain_id);
    }

    pub fn set_reject_accounts(&self, reject: bool) {
        *self.inner.reject_accounts.lock().unwrap() = reject;
    }

    pub fn switch_attempts(&self) -> Vec<u64> {
        self.inner.switch_attempts.lock().unwrap().clone()
    }

    pub fn added_chains(&self) -> Vec<ChainDefinition> {
        self.inner.added_chains.lock().unwrap().clone()
    }

    pub fn emit_accounts_changed(&self, accounts: Vec<Address>) {
        *self.inner.accounts.lock().unwrap() = accounts.clone();
        self.notify(WalletEvent::AccountsChanged(accounts));
    }

    pub fn emit_chain_changed(&self, chain_id: u64) {
        *self.inner.chain_id.lock().unwrap() = chain_id;
        self.notify(WalletEvent::ChainChanged(chain_id));
    }

    fn notify(&self, event: WalletEvent) {
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .retain(|sender| sender.send(event.clone()).is_ok());
    }
}

impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if *self.inner.reject_accounts.lock().unwrap() {
            bail!("user rejected the connection request");
        }
        Ok(self.inner.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(*self.inner.chain_id.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<SwitchChainOutcome> {
        self.inner.switch_attempts.lock().unwrap().push(chain_id);
        if !self.inner.known_chains.lock().unwrap().contains(&chain_id) {
            return Ok(SwitchChainOutcome::UnrecognizedChain);
        }
        *self.inner.chain_id.lock().unwrap() = chain_id;
        self.notify(WalletEvent::ChainChanged(chain_id));
        Ok(SwitchChainOutcome::Switched)
    }

    async fn add_chain(&self, definition: &ChainDefinition) -> Result<()> {
        self.inner
            .added_chains
            .lock()
            .unwrap()
            .push(definition.clone());
        self.inner
            .known_chains
            .lock()
            .unwrap()
            .push(definition.chain_id);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.subscribers.lock().unwrap().push(sender);
        receiver
    }
}

/// Ready-made scenario: one organizer, two entrants, one ERC-20 prize token
/// and one open event paying out of it.
pub struct TestContext {
    pub chain: MockChain,
    pub organizer: Address,
    pub alice: Address,
    pub bob: Address,
    pub token: Address,
    pub event: Address,
}

impl TestContext {
    pub fn new() -> Self {
        let chain = MockChain::new();
        let organizer = addr(0xA0);
        let alice = addr(0xA1);
        let bob = addr(0xA2);
        let token = chain.add_token("USDC", 6);
        let event = chain.add_event(
            "Launch Party",
            organizer,
            token,
            U256::from(100_000_000u64),
            2,
        );
        Self {
            chain,
            organizer,
            alice,
            bob,
            token,
            event,
        }
    }

    pub fn organizer_gateway(&self) -> MockGateway {
        self.chain.gateway(Some(self.organizer))
    }

    pub fn alice_gateway(&self) -> MockGateway {
        self.chain.gateway(Some(self.alice))
    }

    pub fn bob_gateway(&self) -> MockGateway {
        self.chain.gateway(Some(self.bob))
    }

    pub fn viewer_gateway(&self) -> MockGateway {
        self.chain.gateway(None)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
