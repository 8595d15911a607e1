mod wallets;

use anyhow::{
    Context,
    Result,
    anyhow,
    bail,
    ensure,
};
use alloy::{
    primitives::Address,
    providers::Provider,
    signers::local::PrivateKeySigner,
};
use clap::{
    ArgGroup,
    Parser,
    Subcommand,
};
use deployments::{
    DeploymentEnv,
    DeploymentStore,
    NetworkConfig,
    TokenConfig,
    TokenTable,
};
use raffyl::{
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
};
use raffyl_abi::{
    boundary::{
        ContractGateway,
        FactoryReader,
        PendingTx,
        TokenReader,
    },
    format_token_amount,
    gateway::{
        AlloyGateway,
        connect_read_only,
        connect_with_signer,
    },
};
use std::{
    path::PathBuf,
    str::FromStr,
};

use crate::wallets::{
    find_wallet,
    resolve_wallet_dir,
    store_wallet,
    unlock_wallet,
};

#[derive(Parser, Debug)]
#[command(
    name = "raffyl-cli",
    about = "Organizer utilities for Raffyl raffle events",
    version,
    group(
        ArgGroup::new("network")
            .args(["mainnet", "testnet", "local"])
            .required(true)
    )
)]
struct Args {
    /// Use Lisk mainnet
    #[arg(long)]
    mainnet: bool,

    /// Use Lisk Sepolia
    #[arg(long)]
    testnet: bool,

    /// Use a local node
    #[arg(long)]
    local: bool,

    /// Override the RPC URL for the selected network
    #[arg(long)]
    rpc_url: Option<String>,

    /// Keystore wallet to sign with
    #[arg(long)]
    wallet: Option<String>,

    /// Override the wallet directory (defaults to ~/.raffyl/wallets)
    #[arg(long)]
    wallet_dir: Option<String>,

    /// Override the EventFactory address
    #[arg(long)]
    factory: Option<String>,

    /// Known-token table override (JSON array)
    #[arg(long)]
    tokens: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record the EventFactory address for this environment
    SetFactory { address: String },

    /// List events (all of them, or only yours with --mine)
    List {
        #[arg(long)]
        mine: bool,
    },

    /// Show one event in full
    Show { event: String },

    /// Create a raffle event
    CreateEvent {
        name: String,
        /// Token symbol from the known-token table, or a token address
        #[arg(long)]
        token: String,
        /// Total prize as a decimal amount, e.g. "1.5"
        #[arg(long)]
        prize: String,
        /// Number of winners the prize is split among
        #[arg(long, default_value_t = 3)]
        winners: u64,
    },

    /// Register the wallet as a participant
    Register { event: String },

    /// Fund an event with its full prize amount
    Fund { event: String },

    /// Trigger on-chain winner selection
    SelectWinners { event: String },

    /// Disburse prizes to the selected winners
    Disburse { event: String },

    /// Withdraw the residual balance of a completed event
    Withdraw { event: String },

    /// Generate a new keystore wallet
    CreateWallet { name: String },

    /// Import a raw private key into a keystore wallet
    ImportWallet {
        name: String,
        /// Hex-encoded private key; prompted for when omitted
        #[arg(long)]
        private_key: Option<String>,
    },
}

fn from_eyre(err: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("{err:#}")
}

fn parse_address(text: &str) -> Result<Address> {
    Address::from_str(text).map_err(|e| anyhow!("Invalid address '{text}': {e}"))
}

fn resolve_factory(
    env: DeploymentEnv,
    network: &NetworkConfig,
    override_address: Option<&str>,
) -> Result<Address> {
    if let Some(address) = override_address {
        return parse_address(address);
    }
    let store = DeploymentStore::new(env)?;
    if let Some(record) = store.load()? {
        ensure!(
            record.is_for_chain(network.chain_id),
            "Recorded factory belongs to chain {}, but {env} is chain {}; \
             run set-factory again",
            record.chain_id,
            network.chain_id
        );
        return parse_address(&record.factory_address);
    }
    if let Some(builtin) = env.builtin_factory() {
        return parse_address(builtin);
    }
    bail!("No factory recorded for {env}; run: raffyl-cli --{} set-factory <address>", env.dir_name())
}

async fn verify_chain(
    provider: &alloy::providers::DynProvider,
    network: &NetworkConfig,
) -> Result<()> {
    let observed = provider
        .get_chain_id()
        .await
        .context("eth_chainId request failed")?;
    ensure!(
        observed == network.chain_id,
        "RPC endpoint reports chain {observed}, expected chain {} for {}",
        network.chain_id,
        network.name
    );
    Ok(())
}

struct Session {
    gateway: AlloyGateway,
    caller: Option<Address>,
    tokens: TokenTable,
    network: NetworkConfig,
}

async fn open_session(args: &Args, signing: bool) -> Result<Session> {
    let env = if args.mainnet {
        DeploymentEnv::Main
    } else if args.testnet {
        DeploymentEnv::Test
    } else {
        DeploymentEnv::Local
    };

    let mut network = env.network();
    if let Some(url) = &args.rpc_url {
        network.rpc_url = url.clone();
    }
    let factory = resolve_factory(env, &network, args.factory.as_deref())?;
    let tokens = TokenTable::load_or_builtin(args.tokens.as_deref())?;

    if signing {
        ensure!(
            args.wallet.is_some(),
            "this command signs transactions; pass --wallet <name>"
        );
    }
    let signer = match args.wallet.as_deref() {
        Some(name) => {
            let dir = resolve_wallet_dir(args.wallet_dir.as_deref())?;
            let descriptor = find_wallet(&dir, name)?;
            Some(unlock_wallet(&descriptor)?)
        }
        None => None,
    };

    let (gateway, caller) = match signer {
        Some(signer) => {
            let caller = signer.address();
            let provider = connect_with_signer(&signer, &network.rpc_url).await?;
            verify_chain(&provider, &network).await?;
            (
                AlloyGateway::with_signer(provider, caller, factory),
                Some(caller),
            )
        }
        None => {
            let provider = connect_read_only(&network.rpc_url).await?;
            verify_chain(&provider, &network).await?;
            (AlloyGateway::read_only(provider, factory), None)
        }
    };

    Ok(Session {
        gateway,
        caller,
        tokens,
        network,
    })
}

fn print_event_row(event: &EventSummary) {
    println!(
        "{:<28} {:<44} {:<17} {:>12} {:>9} {:>8} {:>9}",
        event.name.chars().take(28).collect::<String>(),
        event.address,
        event.state.label(),
        format!(
            "{} {}",
            format_token_amount(event.prize_amount, event.token_decimals),
            event.token_symbol
        ),
        event.participant_count(),
        format!("{}/{}", event.winners.len(), event.winner_count),
        if event.is_funded { "funded" } else { "unfunded" },
    );
}

fn print_event_detail(event: &EventSummary, caller: Option<Address>) {
    println!("{}", event.name);
    println!("  address        {}", event.address);
    println!("  organizer      {}", event.organizer);
    println!("  state          {}", event.state.label());
    println!(
        "  prize          {} {} ({} per winner)",
        format_token_amount(event.prize_amount, event.token_decimals),
        event.token_symbol,
        format_token_amount(event.prize_per_winner(), event.token_decimals),
    );
    println!(
        "  prize token    {}",
        if event.is_native_prize() {
            "native".to_string()
        } else {
            event.token_address.to_string()
        }
    );
    println!("  funded         {}", event.is_funded);
    println!(
        "  balance        {} {}",
        format_token_amount(event.contract_balance, event.token_decimals),
        event.token_symbol
    );
    println!("  participants   {}", event.participant_count());
    for participant in &event.participants {
        let marker = if caller == Some(*participant) { " (you)" } else { "" };
        println!("    {participant}{marker}");
    }
    println!("  winners        {}", event.winners.len());
    for winner in &event.winners {
        let marker = if caller == Some(*winner) { " (you)" } else { "" };
        println!("    {winner}{marker}");
    }
}

async fn resolve_token(session: &Session, token: &str) -> Result<TokenConfig> {
    if let Some(known) = session.tokens.by_symbol(token) {
        return Ok(known.clone());
    }
    let address = parse_address(token)
        .with_context(|| format!("'{token}' is neither a known symbol nor an address"))?;
    if let Some(known) = session.tokens.by_address(&address.to_string()) {
        return Ok(known.clone());
    }
    // Unknown address: pull symbol and decimals from the contract itself.
    let reader = session.gateway.token_reader(address);
    let symbol = reader
        .symbol()
        .await
        .context("token symbol lookup failed; is this an ERC-20?")?;
    let decimals = reader
        .decimals()
        .await
        .context("token decimals lookup failed; is this an ERC-20?")?;
    Ok(TokenConfig {
        symbol: symbol.clone(),
        name: symbol,
        address: address.to_string(),
        decimals,
    })
}

async fn load_summary(session: &Session, event: &str) -> Result<EventSummary> {
    let address = parse_address(event)?;
    aggregator::load_event(&session.gateway, address, session.caller, &session.tokens)
        .await
        .map_err(from_eyre)
}

async fn confirm_and_report(tx: impl PendingTx, verb: &str) -> Result<()> {
    let hash = tx.tx_hash();
    println!("submitted {hash:#x}; awaiting confirmation...");
    actions::confirm(tx).await.map_err(from_eyre)?;
    println!("{verb} confirmed ({hash:#x})");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    deployments::ensure_structure().context("initializing deployment directories")?;

    let env = if args.mainnet {
        DeploymentEnv::Main
    } else if args.testnet {
        DeploymentEnv::Test
    } else {
        DeploymentEnv::Local
    };

    match &args.command {
        Command::SetFactory { address } => {
            let parsed = parse_address(address)?;
            let mut network = env.network();
            if let Some(url) = &args.rpc_url {
                network.rpc_url = url.clone();
            }
            let provider = connect_read_only(&network.rpc_url).await?;
            verify_chain(&provider, &network).await?;
            let record = deployments::record_factory(
                env,
                parsed.to_string(),
                network.chain_id,
                &network.rpc_url,
            )?;
            println!(
                "recorded factory {} for {env} (chain {}) at {}",
                record.factory_address, record.chain_id, record.recorded_at
            );
        }
        Command::List { mine } => {
            let session = open_session(&args, false).await?;
            let source = if *mine {
                let caller = session
                    .caller
                    .context("--mine needs --wallet to know whose events to list")?;
                EventSource::Organizer(caller)
            } else {
                EventSource::All
            };
            let events = aggregator::load_events(
                &session.gateway,
                source,
                session.caller,
                &session.tokens,
            )
            .await
            .map_err(from_eyre)?;
            if events.is_empty() {
                println!("no events found on {}", session.network.name);
            }
            for event in &events {
                print_event_row(event);
            }
        }
        Command::Show { event } => {
            let session = open_session(&args, false).await?;
            let summary = load_summary(&session, event).await?;
            print_event_detail(&summary, session.caller);
        }
        Command::CreateEvent {
            name,
            token,
            prize,
            winners,
        } => {
            let session = open_session(&args, true).await?;
            let token = resolve_token(&session, token).await?;
            let request = CreateEventRequest {
                name: name.clone(),
                token,
                prize_amount: prize.clone(),
                winner_count: *winners,
            };
            let tx = actions::create_event(&session.gateway, &request)
                .await
                .map_err(from_eyre)?;
            confirm_and_report(tx, "event creation").await?;
            // The factory listing is append-only, so the newest entry is ours.
            let all = session
                .gateway
                .factory_reader()
                .all_events()
                .await
                .context("listing events after creation failed")?;
            if let Some(address) = all.last() {
                println!("event contract: {address}");
            }
        }
        Command::Register { event } => {
            let session = open_session(&args, true).await?;
            let summary = load_summary(&session, event).await?;
            let permissions = rules::permissions(&summary, session.caller);
            let tx = actions::register(&session.gateway, summary.address, &permissions)
                .await
                .map_err(from_eyre)?;
            confirm_and_report(tx, "registration").await?;
        }
        Command::Fund { event } => {
            let session = open_session(&args, true).await?;
            let summary = load_summary(&session, event).await?;
            let permissions = rules::permissions(&summary, session.caller);
            let tx = actions::fund_event(&session.gateway, &summary, &permissions)
                .await
                .map_err(from_eyre)?;
            confirm_and_report(tx, "funding").await?;
        }
        Command::SelectWinners { event } => {
            let session = open_session(&args, true).await?;
            let summary = load_summary(&session, event).await?;
            let permissions = rules::permissions(&summary, session.caller);
            let tx = actions::select_winners(
                &session.gateway,
                summary.address,
                &permissions,
            )
            .await
            .map_err(from_eyre)?;
            confirm_and_report(tx, "winner selection").await?;
        }
        Command::Disburse { event } => {
            let session = open_session(&args, true).await?;
            let summary = load_summary(&session, event).await?;
            let permissions = rules::permissions(&summary, session.caller);
            let tx = actions::disburse_prizes(
                &session.gateway,
                summary.address,
                &permissions,
            )
            .await
            .map_err(from_eyre)?;
            confirm_and_report(tx, "disbursement").await?;
        }
        Command::Withdraw { event } => {
            let session = open_session(&args, true).await?;
            let summary = load_summary(&session, event).await?;
            let permissions = rules::permissions(&summary, session.caller);
            let tx = actions::withdraw_balance(
                &session.gateway,
                summary.address,
                &permissions,
            )
            .await
            .map_err(from_eyre)?;
            confirm_and_report(tx, "withdrawal").await?;
        }
        Command::CreateWallet { name } => {
            let dir = resolve_wallet_dir(args.wallet_dir.as_deref())?;
            let signer = PrivateKeySigner::random();
            let path = store_wallet(&dir, name, &signer)?;
            println!("created wallet '{name}' at {}", path.display());
            println!("address: {}", signer.address());
        }
        Command::ImportWallet { name, private_key } => {
            let raw = match private_key {
                Some(key) => key.clone(),
                None => rpassword::prompt_password("Private key (hex): ")
                    .context("Failed to read the private key")?,
            };
            let stripped = raw.trim().trim_start_matches("0x");
            let bytes = hex::decode(stripped).context("private key is not valid hex")?;
            let signer = PrivateKeySigner::from_slice(&bytes)
                .map_err(|_| anyhow!("private key is not a valid secp256k1 scalar"))?;
            let dir = resolve_wallet_dir(args.wallet_dir.as_deref())?;
            let path = store_wallet(&dir, name, &signer)?;
            println!("imported wallet '{name}' at {}", path.display());
            println!("address: {}", signer.address());
        }
    }

    Ok(())
}
