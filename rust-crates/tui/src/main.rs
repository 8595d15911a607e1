use alloy::primitives::Address;
use color_eyre::eyre::{
    Result,
    eyre,
};
use deployments::DeploymentEnv;
use raffyl::{
    client::{
        self,
        AppConfig,
        WalletConfig,
    },
    wallets,
};
use std::{
    path::PathBuf,
    str::FromStr,
};
use tracing_subscriber::EnvFilter;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: raffyl [--mainnet | --testnet | --local] [--rpc-url <url>]\n\
         [--wallet <name>] [--wallet-dir <path>]\n\
         [--factory <address>] [--tokens <path>]\n\
         \n\
         Flags:\n\
           --mainnet           Connect to Lisk mainnet\n\
           --testnet           Connect to Lisk Sepolia (default factory available)\n\
           --local             Connect to a local node on http://localhost:8545\n\
           --rpc-url <url>     Override the RPC URL for the selected network\n\
           --wallet <name>     Keystore wallet to sign with (omit to browse read-only)\n\
           --wallet-dir <path> Override the wallet directory (defaults to ~/.raffyl/wallets)\n\
           --factory <address> Override the EventFactory address\n\
           --tokens <path>     Known-token table override (JSON array)",
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<AppConfig> {
    let mut args = std::env::args().skip(1);
    let mut env: Option<DeploymentEnv> = None;
    let mut rpc_url: Option<String> = None;
    let mut wallet_name: Option<String> = None;
    let mut wallet_dir: Option<String> = None;
    let mut factory: Option<Address> = None;
    let mut tokens_path: Option<PathBuf> = None;

    let set_env = |current: &mut Option<DeploymentEnv>,
                   value: DeploymentEnv|
     -> Result<()> {
        if current.is_some() {
            return Err(eyre!(
                "Multiple network flags provided; choose one of --mainnet/--testnet/--local"
            ));
        }
        *current = Some(value);
        Ok(())
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mainnet" => set_env(&mut env, DeploymentEnv::Main)?,
            "--testnet" => set_env(&mut env, DeploymentEnv::Test)?,
            "--local" => set_env(&mut env, DeploymentEnv::Local)?,
            "--rpc-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--rpc-url requires a URL argument"))?;
                if rpc_url.is_some() {
                    return Err(eyre!("--rpc-url may only be specified once"));
                }
                if env.is_none() {
                    return Err(eyre!(
                        "--rpc-url must follow a network flag (--mainnet/--testnet/--local)"
                    ));
                }
                rpc_url = Some(url);
            }
            "--wallet" => {
                let name = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet requires a wallet name"))?;
                if wallet_name.is_some() {
                    return Err(eyre!("--wallet may only be specified once"));
                }
                wallet_name = Some(name);
            }
            "--wallet-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet-dir requires a path argument"))?;
                if wallet_dir.is_some() {
                    return Err(eyre!("--wallet-dir may only be specified once"));
                }
                wallet_dir = Some(dir);
            }
            "--factory" => {
                let address = args
                    .next()
                    .ok_or_else(|| eyre!("--factory requires an address argument"))?;
                if factory.is_some() {
                    return Err(eyre!("--factory may only be specified once"));
                }
                factory = Some(
                    Address::from_str(&address)
                        .map_err(|e| eyre!("Invalid factory address: {e}"))?,
                );
            }
            "--tokens" => {
                let path = args
                    .next()
                    .ok_or_else(|| eyre!("--tokens requires a path argument"))?;
                if tokens_path.is_some() {
                    return Err(eyre!("--tokens may only be specified once"));
                }
                tokens_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let env = env.ok_or_else(|| {
        eyre!("Select a network with --mainnet, --testnet, or --local")
    })?;

    let wallet = match wallet_name {
        Some(name) => {
            let dir = wallets::resolve_wallet_dir(wallet_dir.as_deref())?;
            Some(WalletConfig { name, dir })
        }
        None => None,
    };

    Ok(AppConfig {
        env,
        rpc_url,
        wallet,
        factory,
        tokens_path,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    deployments::ensure_structure().map_err(|e| eyre!(e))?;

    // The terminal belongs to the TUI, so logs go to a file.
    let file_appender =
        tracing_appender::rolling::never(deployments::DEPLOYMENTS_ROOT, "raffyl.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!("starting raffyl client");
    let app_config = parse_cli_args()?;
    client::run_app(app_config).await
}
