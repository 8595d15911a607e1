use crate::{
    actions::{
        self,
        CreateEventRequest,
    },
    aggregator::{
        self,
        EventSource,
        EventSummary,
    },
    rules,
    session::{
        SessionChange,
        WalletSession,
    },
    ui,
    wallets,
};
use alloy::{
    primitives::{
        Address,
        B256,
        U256,
    },
    providers::DynProvider,
};
use chrono::Local;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use deployments::{
    DeploymentEnv,
    DeploymentStore,
    NetworkConfig,
    TokenConfig,
    TokenTable,
};
use raffyl_abi::{
    boundary::{
        ChainDefinition,
        ContractGateway,
        NativeCurrency,
        PendingTx,
        WalletEvent,
    },
    format_tx_hash,
    gateway::{
        AlloyGateway,
        KeystoreWallet,
        connect_read_only,
    },
};
use std::{
    path::PathBuf,
    str::FromStr,
};
use tracing::error;

const MAX_ERRORS: usize = 50;

#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub name: String,
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub env: DeploymentEnv,
    pub rpc_url: Option<String>,
    pub wallet: Option<WalletConfig>,
    pub factory: Option<Address>,
    pub tokens_path: Option<PathBuf>,
}

fn chain_definition(network: &NetworkConfig) -> ChainDefinition {
    ChainDefinition {
        chain_id: network.chain_id,
        name: network.name.clone(),
        rpc_url: network.rpc_url.clone(),
        explorer_url: network.block_explorer.clone(),
        native_currency: NativeCurrency {
            name: network.native_currency.name.clone(),
            symbol: network.native_currency.symbol.clone(),
            decimals: network.native_currency.decimals,
        },
    }
}

fn resolve_factory(
    env: DeploymentEnv,
    network: &NetworkConfig,
    override_address: Option<Address>,
) -> Result<Address> {
    if let Some(address) = override_address {
        return Ok(address);
    }

    let store = DeploymentStore::new(env).map_err(|e| eyre!(e))?;
    let record = store.load().map_err(|e| eyre!(e))?;
    if let Some(record) = record {
        if record.is_for_chain(network.chain_id) {
            return Address::from_str(&record.factory_address).map_err(|e| {
                eyre!("Deployment record contains an invalid factory address: {e}")
            });
        }
        return Err(eyre!(format_factory_summary(env, network, Some(&record))));
    }

    if let Some(builtin) = env.builtin_factory() {
        return Address::from_str(builtin)
            .map_err(|e| eyre!("Builtin factory address is invalid: {e}"));
    }

    Err(eyre!(format_factory_summary(env, network, None)))
}

fn format_factory_summary(
    env: DeploymentEnv,
    network: &NetworkConfig,
    record: Option<&deployments::DeploymentRecord>,
) -> String {
    let mut message = format!(
        "No event factory is recorded for {env} (chain {}).\n\nRecorded factory:",
        network.chain_id
    );
    match record {
        Some(record) => {
            message.push_str(&format!(
                "\n  {} - {} on chain {} @ {}",
                record.recorded_at,
                record.factory_address,
                record.chain_id,
                record.network_url,
            ));
        }
        None => message.push_str("\n  (none recorded)"),
    }
    message.push_str(&format!(
        "\n\nRecord one with: raffyl-cli --{} set-factory <address>",
        env.dir_name()
    ));
    message
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub env: DeploymentEnv,
    pub network_name: String,
    pub chain_id: u64,
    pub explorer_url: String,
    pub factory: Address,
    pub account: Option<Address>,
    pub is_connected: bool,
    pub is_connecting: bool,
    pub connection_error: Option<String>,
    pub native_balance: Option<U256>,
    pub native_symbol: String,
    pub native_decimals: u8,
    pub events: Vec<EventSummary>,
    pub my_events: Vec<EventSummary>,
    pub tokens: Vec<TokenConfig>,
    pub status: String,
    pub errors: Vec<String>,
    pub last_refresh: Option<String>,
    pub last_tx: Option<String>,
}

pub struct AppController {
    pub session: WalletSession<KeystoreWallet>,
    env: DeploymentEnv,
    network: NetworkConfig,
    factory: Address,
    tokens: TokenTable,
    read_provider: DynProvider,
    gateway: AlloyGateway,
    events: Vec<EventSummary>,
    my_events: Vec<EventSummary>,
    native_balance: Option<U256>,
    status: String,
    errors: Vec<String>,
    last_refresh: Option<String>,
    last_tx: Option<B256>,
}

impl AppController {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let AppConfig {
            env,
            rpc_url,
            wallet,
            factory,
            tokens_path,
        } = config;

        let mut network = env.network();
        if let Some(url) = rpc_url {
            network.rpc_url = url;
        }

        let factory = resolve_factory(env, &network, factory)?;
        let tokens = TokenTable::load_or_builtin(tokens_path.as_deref())
            .map_err(|e| eyre!(e))?;

        let wallet = match wallet {
            Some(WalletConfig { name, dir }) => {
                let descriptor = wallets::find_wallet(&dir, &name)
                    .wrap_err("Unable to locate the signing wallet")?;
                let signer = wallets::unlock_wallet(&descriptor)?;
                let target = chain_definition(&network);
                let known = deployments::known_networks()
                    .iter()
                    .map(chain_definition)
                    .collect();
                let wallet = KeystoreWallet::connect(signer, target, known)
                    .await
                    .map_err(|e| eyre!(e))?;
                Some(wallet)
            }
            None => None,
        };

        let read_provider = connect_read_only(&network.rpc_url)
            .await
            .map_err(|e| eyre!(e))?;
        let gateway = AlloyGateway::read_only(read_provider.clone(), factory);
        let session = WalletSession::new(wallet, chain_definition(&network));

        Ok(Self {
            session,
            env,
            network,
            factory,
            tokens,
            read_provider,
            gateway,
            events: Vec::new(),
            my_events: Vec::new(),
            native_balance: None,
            status: String::from("Ready"),
            errors: Vec::new(),
            last_refresh: None,
            last_tx: None,
        })
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            env: self.env,
            network_name: self.network.name.clone(),
            chain_id: self.network.chain_id,
            explorer_url: self.network.block_explorer.clone(),
            factory: self.factory,
            account: self.session.account,
            is_connected: self.session.is_connected,
            is_connecting: self.session.is_connecting,
            connection_error: self.session.error.clone(),
            native_balance: self.native_balance,
            native_symbol: self.network.native_currency.symbol.clone(),
            native_decimals: self.network.native_currency.decimals,
            events: self.events.clone(),
            my_events: self.my_events.clone(),
            tokens: self.tokens.tokens().to_vec(),
            status: self.status.clone(),
            errors: self.errors.iter().rev().take(5).cloned().collect(),
            last_refresh: self.last_refresh.clone(),
            last_tx: self.last_tx.map(|hash| self.explorer_tx_line(hash)),
        }
    }

    fn explorer_tx_line(&self, hash: B256) -> String {
        if self.network.block_explorer.is_empty() {
            format!("{hash:#x}")
        } else {
            format!("{}/tx/{hash:#x}", self.network.block_explorer)
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.errors.clear();
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > MAX_ERRORS {
            let drain = self.errors.len() - MAX_ERRORS;
            self.errors.drain(0..drain);
        }
    }

    fn rebuild_gateway(&mut self) {
        self.gateway = match (self.session.wallet(), self.session.account) {
            (Some(wallet), Some(account)) if self.session.is_connected => {
                AlloyGateway::with_signer(wallet.provider(), account, self.factory)
            }
            _ => AlloyGateway::read_only(self.read_provider.clone(), self.factory),
        };
    }

    pub async fn connect(&mut self) {
        self.session.connect().await;
        self.rebuild_gateway();
        if let Some(account) = self.session.account.filter(|_| self.session.is_connected)
        {
            self.set_status(format!(
                "Connected as {}",
                raffyl_abi::format_address(account)
            ));
            self.refresh().await;
        } else if let Some(error) = self.session.error.clone() {
            self.push_errors(vec![error]);
        }
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
        self.rebuild_gateway();
        self.my_events.clear();
        self.native_balance = None;
        self.set_status("Wallet disconnected");
    }

    /// Command-then-resynchronize: the chain is the sole source of truth, so
    /// every refresh re-reads it instead of patching local copies.
    pub async fn refresh(&mut self) {
        match aggregator::load_events(
            &self.gateway,
            EventSource::All,
            self.session.account,
            &self.tokens,
        )
        .await
        {
            Ok(events) => self.events = events,
            Err(err) => self.push_errors(vec![format!("Loading events failed: {err}")]),
        }

        match self.session.account {
            Some(account) => {
                match aggregator::load_events(
                    &self.gateway,
                    EventSource::Organizer(account),
                    Some(account),
                    &self.tokens,
                )
                .await
                {
                    Ok(events) => self.my_events = events,
                    Err(err) => self
                        .push_errors(vec![format!("Loading your events failed: {err}")]),
                }
                match self.gateway.native_balance(account).await {
                    Ok(balance) => self.native_balance = Some(balance),
                    Err(err) => {
                        self.push_errors(vec![format!("Balance lookup failed: {err}")])
                    }
                }
            }
            None => {
                self.my_events.clear();
                self.native_balance = None;
            }
        }

        self.last_refresh = Some(Local::now().format("%H:%M:%S").to_string());
    }

    pub async fn handle_wallet_event(&mut self, event: WalletEvent) {
        match self.session.apply_wallet_event(event) {
            SessionChange::ChainChanged => {
                // Everything cached belongs to the previous chain.
                self.rebuild_gateway();
                self.set_status("Network changed; reloading");
                self.refresh().await;
            }
            SessionChange::AccountChanged => {
                self.rebuild_gateway();
                self.set_status("Active account changed");
                self.refresh().await;
            }
            SessionChange::Disconnected => {
                self.rebuild_gateway();
                self.my_events.clear();
                self.native_balance = None;
                self.set_status("Wallet disconnected");
            }
            SessionChange::None => {}
        }
    }

    pub fn find_event(&self, address: Address) -> Option<EventSummary> {
        self.events
            .iter()
            .chain(self.my_events.iter())
            .find(|event| event.address == address)
            .cloned()
    }

    pub async fn register(&mut self, address: Address) {
        let Some(event) = self.find_event(address) else {
            self.push_errors(vec![format!("Unknown event {address}")]);
            return;
        };
        let permissions = rules::permissions(&event, self.session.account);
        match actions::register(&self.gateway, event.address, &permissions).await {
            Ok(tx) => {
                self.track(tx, format!("Registered for {}", event.name)).await;
            }
            Err(err) => self.push_errors(vec![format!("Registration failed: {err}")]),
        }
    }

    pub async fn fund(&mut self, address: Address) {
        let Some(event) = self.find_event(address) else {
            self.push_errors(vec![format!("Unknown event {address}")]);
            return;
        };
        let permissions = rules::permissions(&event, self.session.account);
        match actions::fund_event(&self.gateway, &event, &permissions).await {
            Ok(tx) => self.track(tx, format!("Funded {}", event.name)).await,
            Err(err) => self.push_errors(vec![format!("Funding failed: {err}")]),
        }
    }

    pub async fn select_winners(&mut self, address: Address) {
        let Some(event) = self.find_event(address) else {
            self.push_errors(vec![format!("Unknown event {address}")]);
            return;
        };
        let permissions = rules::permissions(&event, self.session.account);
        match actions::select_winners(&self.gateway, event.address, &permissions).await
        {
            Ok(tx) => {
                self.track(tx, format!("Winners selected for {}", event.name))
                    .await;
            }
            Err(err) => {
                self.push_errors(vec![format!("Winner selection failed: {err}")])
            }
        }
    }

    pub async fn disburse(&mut self, address: Address) {
        let Some(event) = self.find_event(address) else {
            self.push_errors(vec![format!("Unknown event {address}")]);
            return;
        };
        let permissions = rules::permissions(&event, self.session.account);
        match actions::disburse_prizes(&self.gateway, event.address, &permissions)
            .await
        {
            Ok(tx) => {
                self.track(tx, format!("Prizes disbursed for {}", event.name)).await;
            }
            Err(err) => self.push_errors(vec![format!("Disbursement failed: {err}")]),
        }
    }

    pub async fn withdraw(&mut self, address: Address) {
        let Some(event) = self.find_event(address) else {
            self.push_errors(vec![format!("Unknown event {address}")]);
            return;
        };
        let permissions = rules::permissions(&event, self.session.account);
        match actions::withdraw_balance(&self.gateway, event.address, &permissions)
            .await
        {
            Ok(tx) => {
                self.track(tx, format!("Balance withdrawn from {}", event.name))
                    .await;
            }
            Err(err) => self.push_errors(vec![format!("Withdrawal failed: {err}")]),
        }
    }

    pub async fn create_event(&mut self, request: CreateEventRequest) {
        match actions::create_event(&self.gateway, &request).await {
            Ok(tx) => {
                self.track(tx, format!("Created event '{}'", request.name.trim()))
                    .await;
            }
            Err(err) => self.push_errors(vec![format!("Create event failed: {err}")]),
        }
    }

    /// Records the pending hash for display, waits for inclusion, then
    /// re-aggregates from the chain on success.
    async fn track(&mut self, tx: impl PendingTx, success_message: String) {
        let hash = tx.tx_hash();
        self.last_tx = Some(hash);
        self.set_status(format!(
            "Submitted {}; awaiting confirmation...",
            format_tx_hash(hash)
        ));
        match actions::confirm(tx).await {
            Ok(_) => {
                self.set_status(format!(
                    "{success_message} ({})",
                    format_tx_hash(hash)
                ));
                self.refresh().await;
            }
            Err(err) => self.push_errors(vec![err.to_string()]),
        }
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let mut controller = AppController::new(config).await?;
    // Mirrors the silent reconnect a browser front end performs on mount:
    // an already-authorized wallet connects without being asked.
    if controller.session.wallet().is_some() {
        controller.connect().await;
    }
    if !controller.session.is_connected {
        controller.refresh().await;
    }

    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();
    ui::terminal_enter(&mut ui_state)?;
    let result = run_loop(controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    result
}

async fn run_loop(
    mut controller: AppController,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    let mut snapshot = controller.snapshot();
    ui::draw(ui_state, &snapshot).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            wallet_event = controller.session.next_wallet_event() => {
                let Some(wallet_event) = wallet_event else { continue; };
                controller.handle_wallet_event(wallet_event).await;
                snapshot = controller.snapshot();
                ui::draw(ui_state, &snapshot)
                    .wrap_err("draw after wallet notification failed")?;
            }
            raw_event = input_events.recv() => {
                let Some(raw_event) = raw_event else { break; };
                let Some(user_event) =
                    ui::interpret_event(ui_state, raw_event, &snapshot)
                else {
                    continue;
                };
                match user_event {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {
                        ui::draw(ui_state, &snapshot)
                            .wrap_err("redraw failed")?;
                        continue;
                    }
                    ui::UserEvent::Refresh => {
                        show_processing(
                            &mut controller,
                            ui_state,
                            "Refreshing...",
                        )?;
                        controller.refresh().await;
                        controller.set_status("Refreshed");
                    }
                    ui::UserEvent::Connect => {
                        show_processing(
                            &mut controller,
                            ui_state,
                            "Connecting wallet...",
                        )?;
                        controller.connect().await;
                    }
                    ui::UserEvent::Disconnect => controller.disconnect(),
                    ui::UserEvent::Register(address) => {
                        show_processing(
                            &mut controller,
                            ui_state,
                            "Submitting registration...",
                        )?;
                        controller.register(address).await;
                    }
                    ui::UserEvent::Fund(address) => {
                        show_processing(
                            &mut controller,
                            ui_state,
                            "Funding event...",
                        )?;
                        controller.fund(address).await;
                    }
                    ui::UserEvent::SelectWinners(address) => {
                        show_processing(
                            &mut controller,
                            ui_state,
                            "Selecting winners...",
                        )?;
                        controller.select_winners(address).await;
                    }
                    ui::UserEvent::Disburse(address) => {
                        show_processing(
                            &mut controller,
                            ui_state,
                            "Disbursing prizes...",
                        )?;
                        controller.disburse(address).await;
                    }
                    ui::UserEvent::Withdraw(address) => {
                        show_processing(
                            &mut controller,
                            ui_state,
                            "Withdrawing balance...",
                        )?;
                        controller.withdraw(address).await;
                    }
                    ui::UserEvent::CreateEvent(request) => {
                        show_processing(
                            &mut controller,
                            ui_state,
                            "Creating event...",
                        )?;
                        controller.create_event(request).await;
                    }
                }
                snapshot = controller.snapshot();
                ui::draw(ui_state, &snapshot)
                    .wrap_err("draw after user action failed")?;
            }
        }
    }
    Ok(())
}

fn show_processing(
    controller: &mut AppController,
    ui_state: &mut ui::UiState,
    message: &str,
) -> Result<()> {
    controller.set_status(message);
    let snapshot = controller.snapshot();
    ui::draw(ui_state, &snapshot).wrap_err("draw while processing failed")
}
