use anyhow::{
    Context,
    Result,
    anyhow,
};
use chrono::Utc;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    fs,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENTS_FILE: &str = "deployments.json";
const TOKENS_FILE: &str = "tokens.json";

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Factory deployed on Lisk Sepolia for the hosted testnet environment.
pub const TESTNET_FACTORY: &str = "0x82a88dECbAeE6953d5349513466D084fb4E35031";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentEnv {
    Main,
    Test,
    Local,
}

impl DeploymentEnv {
    pub fn dir_name(self) -> &'static str {
        match self {
            DeploymentEnv::Main => "main",
            DeploymentEnv::Test => "test",
            DeploymentEnv::Local => "local",
        }
    }

    pub fn network(self) -> NetworkConfig {
        match self {
            DeploymentEnv::Main => NetworkConfig {
                chain_id: 1135,
                name: "Lisk".to_string(),
                rpc_url: "https://rpc.api.lisk.com".to_string(),
                block_explorer: "https://blockscout.lisk.com".to_string(),
                native_currency: NativeCurrencyConfig::eth(),
            },
            DeploymentEnv::Test => NetworkConfig {
                chain_id: 4202,
                name: "Lisk Sepolia".to_string(),
                rpc_url: "https://rpc.sepolia-api.lisk.com".to_string(),
                block_explorer: "https://sepolia-blockscout.lisk.com".to_string(),
                native_currency: NativeCurrencyConfig::eth(),
            },
            DeploymentEnv::Local => NetworkConfig {
                chain_id: 31337,
                name: "Local Node".to_string(),
                rpc_url: "http://localhost:8545".to_string(),
                block_explorer: String::new(),
                native_currency: NativeCurrencyConfig::eth(),
            },
        }
    }

    pub fn builtin_factory(self) -> Option<&'static str> {
        match self {
            DeploymentEnv::Test => Some(TESTNET_FACTORY),
            DeploymentEnv::Main | DeploymentEnv::Local => None,
        }
    }
}

impl fmt::Display for DeploymentEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentEnv::Main => "Lisk Mainnet",
            DeploymentEnv::Test => "Lisk Sepolia",
            DeploymentEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeCurrencyConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrencyConfig {
    fn eth() -> Self {
        Self {
            name: "Ethereum".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub block_explorer: String,
    pub native_currency: NativeCurrencyConfig,
}

pub fn known_networks() -> Vec<NetworkConfig> {
    vec![
        DeploymentEnv::Main.network(),
        DeploymentEnv::Test.network(),
        DeploymentEnv::Local.network(),
    ]
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub recorded_at: String,
    pub factory_address: String,
    pub chain_id: u64,
    pub network_url: String,
    #[serde(default)]
    pub deployment_block: Option<u64>,
}

impl DeploymentRecord {
    pub fn is_for_chain(&self, chain_id: u64) -> bool {
        self.chain_id == chain_id
    }
}

#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(env: DeploymentEnv) -> Result<Self> {
        let path = ensure_store(env)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<DeploymentRecord>> {
        let data = fs::read(&self.path).context("Failed to read deployment records")?;
        parse_record(&data)
    }

    pub fn save(&self, record: DeploymentRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(&record)
            .context("Failed to serialize deployment record")?;
        fs::write(&self.path, json).context("Failed to write deployment record")?;
        Ok(())
    }
}

fn parse_record(data: &[u8]) -> Result<Option<DeploymentRecord>> {
    if data.is_empty() || data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    if let Ok(record) = serde_json::from_slice::<DeploymentRecord>(data) {
        return Ok(Some(record));
    }
    if let Ok(mut records) = serde_json::from_slice::<Vec<DeploymentRecord>>(data) {
        return Ok(records.pop());
    }
    Err(anyhow!(
        "Failed to parse deployment record JSON; expected a single record object"
    ))
}

pub fn record_factory(
    env: DeploymentEnv,
    factory_address: impl AsRef<str>,
    chain_id: u64,
    network_url: impl AsRef<str>,
) -> Result<DeploymentRecord> {
    let store = DeploymentStore::new(env)?;
    let record = DeploymentRecord {
        recorded_at: Utc::now().to_rfc3339(),
        factory_address: factory_address.as_ref().to_string(),
        chain_id,
        network_url: network_url.as_ref().to_string(),
        deployment_block: None,
    };
    store.save(record.clone())?;
    Ok(record)
}

pub fn ensure_structure() -> Result<()> {
    for env in [
        DeploymentEnv::Main,
        DeploymentEnv::Test,
        DeploymentEnv::Local,
    ] {
        let _ = ensure_store(env)?;
    }
    Ok(())
}

fn ensure_store(env: DeploymentEnv) -> Result<PathBuf> {
    let root = Path::new(DEPLOYMENTS_ROOT);
    if !root.exists() {
        fs::create_dir_all(root).context("Failed to create .deployments directory")?;
    }

    let env_dir = root.join(env.dir_name());
    if !env_dir.exists() {
        fs::create_dir_all(&env_dir).with_context(|| {
            format!("Failed to create .deployments/{} directory", env.dir_name())
        })?;
    }

    let file_path = env_dir.join(DEPLOYMENTS_FILE);
    if !file_path.exists() {
        let mut file = fs::File::create(&file_path).with_context(|| {
            format!("Failed to create deployment record file for {env}")
        })?;
        file.write_all(b"").with_context(|| {
            format!("Failed to initialize deployment record file for {env}")
        })?;
    }

    Ok(file_path)
}

/// One entry of the known-token table. Addresses here are configuration, not
/// verified deployments; operators override the whole table via
/// `.deployments/tokens.json`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenConfig {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub decimals: u8,
}

#[derive(Clone, Debug)]
pub struct TokenTable {
    tokens: Vec<TokenConfig>,
}

impl TokenTable {
    pub fn builtin() -> Self {
        let tokens = vec![
            TokenConfig {
                symbol: "ETH".to_string(),
                name: "Ethereum".to_string(),
                address: ZERO_ADDRESS.to_string(),
                decimals: 18,
            },
            TokenConfig {
                symbol: "LSK".to_string(),
                name: "Lisk Token".to_string(),
                address: "0x8a21CF9Ba08Ae709D64Cb25AfAA951183EC9FF6D".to_string(),
                decimals: 18,
            },
            TokenConfig {
                symbol: "USDC".to_string(),
                name: "USD Coin".to_string(),
                address: "0x72db95F0716cF79C0efe160F23fB17bF1c161317".to_string(),
                decimals: 6,
            },
            TokenConfig {
                symbol: "USDT".to_string(),
                name: "Tether USD".to_string(),
                address: "0x2728DD8B45B788e26d12B13Db5A244e5403e7eda".to_string(),
                decimals: 6,
            },
            TokenConfig {
                symbol: "DAI".to_string(),
                name: "Dai Stablecoin".to_string(),
                address: "0x0DB2a8Aa2E2C023Cfb61c617d40162cc9F4c27aB".to_string(),
                decimals: 18,
            },
        ];
        Self { tokens }
    }

    pub fn from_tokens(tokens: Vec<TokenConfig>) -> Self {
        Self { tokens }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("Failed to read token table at {}", path.display()))?;
        let tokens: Vec<TokenConfig> = serde_json::from_slice(&data).with_context(
            || format!("Failed to parse token table at {}", path.display()),
        )?;
        Ok(Self { tokens })
    }

    /// The builtin table unless an override file exists at `path` (or at the
    /// default `.deployments/tokens.json` when `path` is `None`).
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        let default_path = Path::new(DEPLOYMENTS_ROOT).join(TOKENS_FILE);
        let path = path.unwrap_or(&default_path);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::builtin())
        }
    }

    pub fn tokens(&self) -> &[TokenConfig] {
        &self.tokens
    }

    pub fn by_address(&self, address: &str) -> Option<&TokenConfig> {
        self.tokens
            .iter()
            .find(|token| token.address.eq_ignore_ascii_case(address))
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenConfig> {
        self.tokens
            .iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
    }
}

pub fn is_native_token(address: &str) -> bool {
    address.eq_ignore_ascii_case(ZERO_ADDRESS)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn token_lookup__by_address_ignores_case() {
        // given
        let table = TokenTable::builtin();

        // when
        let upper = table.by_address("0x8A21CF9BA08AE709D64CB25AFAA951183EC9FF6D");
        let lower = table.by_address("0x8a21cf9ba08ae709d64cb25afaa951183ec9ff6d");

        // then
        assert_eq!(upper.unwrap().symbol, "LSK");
        assert_eq!(lower.unwrap().symbol, "LSK");
    }

    #[test]
    fn token_lookup__by_symbol_ignores_case() {
        let table = TokenTable::builtin();
        assert_eq!(table.by_symbol("usdc").unwrap().decimals, 6);
        assert!(table.by_symbol("BUSD").is_none());
    }

    #[test]
    fn is_native_token__matches_the_zero_sentinel_only() {
        assert!(is_native_token(ZERO_ADDRESS));
        assert!(is_native_token("0x0000000000000000000000000000000000000000"));
        assert!(!is_native_token(TESTNET_FACTORY));
    }

    #[test]
    fn parse_record__accepts_single_object_or_array() {
        // given
        let single = br#"{
            "recorded_at": "2026-01-12T10:00:00Z",
            "factory_address": "0x82a88dECbAeE6953d5349513466D084fb4E35031",
            "chain_id": 4202,
            "network_url": "https://rpc.sepolia-api.lisk.com"
        }"#;
        let array = br#"[
            {
                "recorded_at": "2026-01-10T10:00:00Z",
                "factory_address": "0x0000000000000000000000000000000000000001",
                "chain_id": 4202,
                "network_url": "https://rpc.sepolia-api.lisk.com"
            },
            {
                "recorded_at": "2026-01-12T10:00:00Z",
                "factory_address": "0x0000000000000000000000000000000000000002",
                "chain_id": 4202,
                "network_url": "https://rpc.sepolia-api.lisk.com"
            }
        ]"#;

        // when
        let from_single = parse_record(single).unwrap().unwrap();
        let from_array = parse_record(array).unwrap().unwrap();

        // then
        assert!(from_single.is_for_chain(4202));
        assert_eq!(
            from_array.factory_address,
            "0x0000000000000000000000000000000000000002"
        );
    }

    #[test]
    fn parse_record__empty_file_means_no_record() {
        assert!(parse_record(b"").unwrap().is_none());
        assert!(parse_record(b"  \n").unwrap().is_none());
    }

    #[test]
    fn networks__cover_the_three_environments() {
        let networks = known_networks();
        let ids: Vec<u64> = networks.iter().map(|n| n.chain_id).collect();
        assert_eq!(ids, vec![1135, 4202, 31337]);
    }
}
