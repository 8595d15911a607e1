//! Chain-facing implementations of the boundary traits: contract handles
//! over an alloy provider, and a wallet provider backed by a local keystore
//! signer plus a registry of known networks.

use crate::{
    IERC20,
    IEvent,
    IEventFactory,
    boundary::{
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
    },
};
use alloy::{
    network::{
        Ethereum,
        EthereumWallet,
    },
    primitives::{
        Address,
        B256,
        U256,
    },
    providers::{
        DynProvider,
        PendingTransactionBuilder,
        Provider,
        ProviderBuilder,
    },
    signers::local::PrivateKeySigner,
};
use anyhow::{
    Context,
    Result,
    anyhow,
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
};
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AlloyGateway {
    provider: DynProvider,
    caller: Option<Address>,
    factory: Address,
}

impl AlloyGateway {
    pub fn read_only(provider: DynProvider, factory: Address) -> Self {
        Self {
            provider,
            caller: None,
            factory,
        }
    }

    pub fn with_signer(
        provider: DynProvider,
        caller: Address,
        factory: Address,
    ) -> Self {
        Self {
            provider,
            caller: Some(caller),
            factory,
        }
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    fn require_signer(&self) -> Result<Address> {
        self.caller
            .ok_or_else(|| anyhow!("no signing wallet is connected"))
    }
}

impl ContractGateway for AlloyGateway {
    type FactoryReader = AlloyFactoryReader;
    type FactoryWriter = AlloyFactoryWriter;
    type EventReader = AlloyEventReader;
    type EventWriter = AlloyEventWriter;
    type TokenReader = AlloyTokenReader;
    type TokenWriter = AlloyTokenWriter;

    fn caller(&self) -> Option<Address> {
        self.caller
    }

    fn factory_reader(&self) -> AlloyFactoryReader {
        AlloyFactoryReader {
            instance: IEventFactory::new(self.factory, self.provider.clone()),
        }
    }

    fn factory_writer(&self) -> Result<AlloyFactoryWriter> {
        self.require_signer()?;
        Ok(AlloyFactoryWriter {
            instance: IEventFactory::new(self.factory, self.provider.clone()),
        })
    }

    fn event_reader(&self, event: Address) -> AlloyEventReader {
        AlloyEventReader {
            instance: IEvent::new(event, self.provider.clone()),
        }
    }

    fn event_writer(&self, event: Address) -> Result<AlloyEventWriter> {
        self.require_signer()?;
        Ok(AlloyEventWriter {
            instance: IEvent::new(event, self.provider.clone()),
        })
    }

    fn token_reader(&self, token: Address) -> AlloyTokenReader {
        AlloyTokenReader {
            instance: IERC20::new(token, self.provider.clone()),
        }
    }

    fn token_writer(&self, token: Address) -> Result<AlloyTokenWriter> {
        self.require_signer()?;
        Ok(AlloyTokenWriter {
            instance: IERC20::new(token, self.provider.clone()),
        })
    }

    async fn native_balance(&self, account: Address) -> Result<U256> {
        self.provider
            .get_balance(account)
            .await
            .context("native balance query failed")
    }
}

pub struct AlloyPendingTx(PendingTransactionBuilder<Ethereum>);

impl PendingTx for AlloyPendingTx {
    fn tx_hash(&self) -> B256 {
        *self.0.tx_hash()
    }

    async fn confirm(self) -> Result<TxStatus> {
        let hash = *self.0.tx_hash();
        let receipt = self
            .0
            .get_receipt()
            .await
            .context("waiting for the transaction receipt failed")?;
        Ok(TxStatus {
            hash,
            success: receipt.status(),
        })
    }
}

pub struct AlloyFactoryReader {
    instance: IEventFactory::IEventFactoryInstance<DynProvider>,
}

impl FactoryReader for AlloyFactoryReader {
    async fn all_events(&self) -> Result<Vec<Address>> {
        self.instance
            .getAllEvents()
            .call()
            .await
            .context("getAllEvents call failed")
    }

    async fn events_by_organizer(&self, organizer: Address) -> Result<Vec<Address>> {
        self.instance
            .getEventsByOrganizer(organizer)
            .call()
            .await
            .context("getEventsByOrganizer call failed")
    }
}

pub struct AlloyFactoryWriter {
    instance: IEventFactory::IEventFactoryInstance<DynProvider>,
}

impl FactoryWriter for AlloyFactoryWriter {
    type Tx = AlloyPendingTx;

    async fn create_event(
        &self,
        name: String,
        token_address: Address,
        prize_amount: U256,
        winner_count: u64,
    ) -> Result<AlloyPendingTx> {
        let pending = self
            .instance
            .createEvent(name, token_address, prize_amount, U256::from(winner_count))
            .send()
            .await
            .context("createEvent submission failed")?;
        Ok(AlloyPendingTx(pending))
    }
}

pub struct AlloyEventReader {
    instance: IEvent::IEventInstance<DynProvider>,
}

impl EventReader for AlloyEventReader {
    async fn info(&self) -> Result<EventInfo> {
        let raw = self
            .instance
            .getEventInfo()
            .call()
            .await
            .context("getEventInfo call failed")?;
        Ok(EventInfo {
            name: raw.name,
            organizer: raw.organizer,
            token_address: raw.tokenAddress,
            prize_amount: raw.prizeAmount,
            winner_count: u64::try_from(raw.winnerCount)
                .map_err(|_| anyhow!("winner count exceeds the u64 range"))?,
            state: raw.state,
            participant_count: u64::try_from(raw.participantCount)
                .map_err(|_| anyhow!("participant count exceeds the u64 range"))?,
            is_funded: raw.isFunded,
        })
    }

    async fn contract_balance(&self) -> Result<U256> {
        self.instance
            .getContractBalance()
            .call()
            .await
            .context("getContractBalance call failed")
    }

    async fn participants(&self) -> Result<Vec<Address>> {
        self.instance
            .getParticipants()
            .call()
            .await
            .context("getParticipants call failed")
    }

    async fn winners(&self) -> Result<Vec<Address>> {
        self.instance
            .getWinners()
            .call()
            .await
            .context("getWinners call failed")
    }

    async fn is_registered(&self, account: Address) -> Result<bool> {
        self.instance
            .isRegistered(account)
            .call()
            .await
            .context("isRegistered call failed")
    }

    async fn is_winner(&self, account: Address) -> Result<bool> {
        self.instance
            .isWinner(account)
            .call()
            .await
            .context("isWinner call failed")
    }
}

pub struct AlloyEventWriter {
    instance: IEvent::IEventInstance<DynProvider>,
}

impl EventWriter for AlloyEventWriter {
    type Tx = AlloyPendingTx;

    async fn register(&self) -> Result<AlloyPendingTx> {
        let pending = self
            .instance
            .register()
            .send()
            .await
            .context("register submission failed")?;
        Ok(AlloyPendingTx(pending))
    }

    async fn fund_event(
        &self,
        amount: U256,
        native_value: Option<U256>,
    ) -> Result<AlloyPendingTx> {
        let mut call = self.instance.fundEvent(amount);
        if let Some(value) = native_value {
            call = call.value(value);
        }
        let pending = call
            .send()
            .await
            .context("fundEvent submission failed")?;
        Ok(AlloyPendingTx(pending))
    }

    async fn select_winners(&self) -> Result<AlloyPendingTx> {
        let pending = self
            .instance
            .selectWinners()
            .send()
            .await
            .context("selectWinners submission failed")?;
        Ok(AlloyPendingTx(pending))
    }

    async fn disburse_prizes(&self) -> Result<AlloyPendingTx> {
        let pending = self
            .instance
            .disbursePrizes()
            .send()
            .await
            .context("disbursePrizes submission failed")?;
        Ok(AlloyPendingTx(pending))
    }

    async fn withdraw_balance(&self) -> Result<AlloyPendingTx> {
        let pending = self
            .instance
            .withdrawBalance()
            .send()
            .await
            .context("withdrawBalance submission failed")?;
        Ok(AlloyPendingTx(pending))
    }
}

pub struct AlloyTokenReader {
    instance: IERC20::IERC20Instance<DynProvider>,
}

impl TokenReader for AlloyTokenReader {
    async fn symbol(&self) -> Result<String> {
        self.instance
            .symbol()
            .call()
            .await
            .context("token symbol call failed")
    }

    async fn decimals(&self) -> Result<u8> {
        self.instance
            .decimals()
            .call()
            .await
            .context("token decimals call failed")
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.instance
            .allowance(owner, spender)
            .call()
            .await
            .context("token allowance call failed")
    }

    async fn balance_of(&self, account: Address) -> Result<U256> {
        self.instance
            .balanceOf(account)
            .call()
            .await
            .context("token balanceOf call failed")
    }
}

pub struct AlloyTokenWriter {
    instance: IERC20::IERC20Instance<DynProvider>,
}

impl TokenWriter for AlloyTokenWriter {
    type Tx = AlloyPendingTx;

    async fn approve(&self, spender: Address, amount: U256) -> Result<AlloyPendingTx> {
        let pending = self
            .instance
            .approve(spender, amount)
            .send()
            .await
            .context("approve submission failed")?;
        Ok(AlloyPendingTx(pending))
    }
}

pub async fn connect_read_only(rpc_url: &str) -> Result<DynProvider> {
    let provider = ProviderBuilder::new()
        .connect(rpc_url)
        .await
        .with_context(|| format!("connecting to RPC endpoint {rpc_url} failed"))?;
    Ok(provider.erased())
}

pub async fn connect_with_signer(
    signer: &PrivateKeySigner,
    rpc_url: &str,
) -> Result<DynProvider> {
    let wallet = EthereumWallet::from(signer.clone());
    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect(rpc_url)
        .await
        .with_context(|| format!("connecting to RPC endpoint {rpc_url} failed"))?;
    Ok(provider.erased())
}

struct ActiveNetwork {
    rpc_url: String,
    provider: DynProvider,
}

struct KeystoreWalletInner {
    signer: PrivateKeySigner,
    networks: Mutex<HashMap<u64, ChainDefinition>>,
    active: Mutex<ActiveNetwork>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<WalletEvent>>>,
}

/// A [`WalletProvider`] over an unlocked keystore signer. Where a browser
/// wallet extension owns the account list and the active network, this owns
/// a single signer and re-targets its RPC connection when asked to switch
/// chains; switching to a chain missing from the registry reports
/// [`SwitchChainOutcome::UnrecognizedChain`] until the chain is added.
#[derive(Clone)]
pub struct KeystoreWallet {
    inner: Arc<KeystoreWalletInner>,
}

impl KeystoreWallet {
    pub async fn connect(
        signer: PrivateKeySigner,
        initial: ChainDefinition,
        known_networks: Vec<ChainDefinition>,
    ) -> Result<Self> {
        let provider = connect_with_signer(&signer, &initial.rpc_url).await?;
        let mut networks: HashMap<u64, ChainDefinition> = known_networks
            .into_iter()
            .map(|definition| (definition.chain_id, definition))
            .collect();
        networks.insert(initial.chain_id, initial.clone());
        Ok(Self {
            inner: Arc::new(KeystoreWalletInner {
                signer,
                networks: Mutex::new(networks),
                active: Mutex::new(ActiveNetwork {
                    rpc_url: initial.rpc_url,
                    provider,
                }),
                subscribers: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn address(&self) -> Address {
        self.inner.signer.address()
    }

    pub fn provider(&self) -> DynProvider {
        self.inner.active.lock().unwrap().provider.clone()
    }

    pub fn active_rpc_url(&self) -> String {
        self.inner.active.lock().unwrap().rpc_url.clone()
    }

    fn notify(&self, event: WalletEvent) {
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .retain(|sender| sender.send(event.clone()).is_ok());
    }
}

impl WalletProvider for KeystoreWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(vec![self.inner.signer.address()])
    }

    async fn chain_id(&self) -> Result<u64> {
        let provider = self.provider();
        provider
            .get_chain_id()
            .await
            .context("eth_chainId request failed")
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<SwitchChainOutcome> {
        let definition = {
            let networks = self.inner.networks.lock().unwrap();
            networks.get(&chain_id).cloned()
        };
        let Some(definition) = definition else {
            return Ok(SwitchChainOutcome::UnrecognizedChain);
        };

        let provider =
            connect_with_signer(&self.inner.signer, &definition.rpc_url).await?;
        {
            let mut active = self.inner.active.lock().unwrap();
            active.rpc_url = definition.rpc_url.clone();
            active.provider = provider;
        }
        self.notify(WalletEvent::ChainChanged(chain_id));
        Ok(SwitchChainOutcome::Switched)
    }

    async fn add_chain(&self, definition: &ChainDefinition) -> Result<()> {
        self.inner
            .networks
            .lock()
            .unwrap()
            .insert(definition.chain_id, definition.clone());
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.subscribers.lock().unwrap().push(sender);
        receiver
    }
}
