use crate::{app::AppResult, chain::SigningKey};
use clap::Parser;
use color_eyre::eyre::WrapErr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dapp-tui", version)]
#[command(about = "Terminal browser for on-chain dapps", long_about = None)]
pub struct Args {
    /// JSON-RPC endpoint of the node to browse through
    #[arg(long, env = "ETH_RPC_URL")]
    rpc_url: String,

    /// Hex private key used to sign transactions; read-only without it
    #[arg(long, env = "ETH_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Log file (defaults to a fresh file in the temp directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Where visit history and settings are stored
    #[arg(long, env = "DAPP_TUI_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// ENS name or contract address to open at startup
    url: Option<String>,
}

/// Validated startup configuration.
#[derive(Debug)]
pub struct Settings {
    pub rpc_url: String,
    pub signing_key: Option<SigningKey>,
    pub log_file: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub url: Option<String>,
}

impl Args {
    pub fn into_settings(self) -> AppResult<Settings> {
        let signing_key = self
            .private_key
            .as_deref()
            .map(SigningKey::from_hex)
            .transpose()
            .wrap_err("failed to load --private-key")?;
        let url = self
            .url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        Ok(Settings {
            rpc_url: self.rpc_url,
            signing_key,
            log_file: self.log_file,
            data_dir: self.data_dir,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn parses_key_and_startup_url() {
        let args = Args::try_parse_from([
            "dapp-tui",
            "--rpc-url",
            "http://localhost:8545",
            "--private-key",
            ANVIL_KEY,
            " app.eth ",
        ])
        .unwrap();
        let settings = args.into_settings().unwrap();

        assert_eq!(settings.rpc_url, "http://localhost:8545");
        assert_eq!(settings.url.as_deref(), Some("app.eth"));
        let key = settings.signing_key.unwrap();
        assert_eq!(
            format!("{:#x}", key.address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn rejects_bad_key_up_front() {
        let args = Args::try_parse_from([
            "dapp-tui",
            "--rpc-url",
            "http://localhost:8545",
            "--private-key",
            "0x1234",
        ])
        .unwrap();
        assert!(args.into_settings().is_err());
    }
}
