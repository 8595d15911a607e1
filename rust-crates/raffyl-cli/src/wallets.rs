use anyhow::{
    Context,
    Result,
    bail,
};
use alloy::signers::local::PrivateKeySigner;
use eth_keystore::{
    decrypt_key,
    encrypt_key,
};
use rpassword::prompt_password;
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

#[derive(Clone, Debug)]
pub struct WalletDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

pub fn default_wallet_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".raffyl").join("wallets"))
}

pub fn resolve_wallet_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_wallet_dir(),
    }
}

pub fn list_wallets(dir: &Path) -> Result<Vec<WalletDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut wallets = Vec::new();
    for entry in fs::read_dir(dir).context("Failed to read wallet directory")? {
        let entry = entry.context("Failed to read wallet entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("wallet") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid wallet filename {:?}", path))?
            .to_owned();
        wallets.push(WalletDescriptor::new(name, path));
    }
    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

pub fn find_wallet(dir: &Path, name: &str) -> Result<WalletDescriptor> {
    let wallets = list_wallets(dir)?;
    wallets
        .into_iter()
        .find(|w| w.name == name)
        .ok_or_else(|| anyhow::anyhow!("Wallet '{name}' not found in {}", dir.display()))
}

pub fn unlock_wallet(descriptor: &WalletDescriptor) -> Result<PrivateKeySigner> {
    let prompt = format!("Enter password for wallet '{}': ", descriptor.name);
    let password = prompt_password(prompt).context("Failed to read wallet password")?;

    let secret = decrypt_key(&descriptor.path, password.as_bytes()).map_err(|_| {
        anyhow::anyhow!("Invalid password for wallet '{}'", descriptor.name)
    })?;

    PrivateKeySigner::from_slice(&secret).map_err(|_| {
        anyhow::anyhow!(
            "Wallet '{}' contained unsupported key material",
            descriptor.name
        )
    })
}

/// Encrypts `signer` into `dir/<name>.wallet`, prompting for a password
/// twice. Refuses to overwrite an existing wallet of the same name.
pub fn store_wallet(
    dir: &Path,
    name: &str,
    signer: &PrivateKeySigner,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| {
        format!("Failed to create wallet directory {}", dir.display())
    })?;
    let file_name = format!("{name}.wallet");
    let path = dir.join(&file_name);
    if path.exists() {
        bail!("Wallet '{name}' already exists at {}", path.display());
    }

    let password =
        prompt_password(format!("Choose a password for wallet '{name}': "))
            .context("Failed to read wallet password")?;
    let confirmation = prompt_password("Repeat the password: ")
        .context("Failed to read wallet password")?;
    if password != confirmation {
        bail!("Passwords do not match");
    }

    let mut rng = rand::thread_rng();
    let secret = signer.to_bytes();
    encrypt_key(dir, &mut rng, secret, password.as_bytes(), Some(&file_name))
        .context("Failed to encrypt the wallet keystore")?;
    Ok(path)
}
