use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;
use serde::Deserialize;
use serde::Serialize;

pub const API_KEY_ENV: &str = "RESERVOIR_API_KEY";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub fallback_contract: String,
    pub output_dir: PathBuf,
    pub page_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://api-apechain.reservoir.tools".to_string(),
            api_key: None,
            fallback_contract: "0xb3443b6bd585ba4118cae2bedb61c7ec4a8281df".to_string(),
            output_dir: PathBuf::from("data"),
            page_limit: 1000,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let toml_str = fs::read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;

        Ok(config)
    }

    /// Read the config file if there is one, then apply environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            info!("Reading config from {}", path.display());
            Self::from_file(path)?
        } else {
            Self::default()
        };

        if let Some(api_key) = std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty()) {
            config.api_key = Some(api_key);
        }

        Ok(config)
    }
}

/// Fetch all active listings of an NFT contract from Reservoir.
#[derive(Debug, Parser)]
pub struct Cli {
    /// Contract address to fetch listings for.
    #[arg(long, short, env = "DEFAULT_CONTRACT_ADDRESS")]
    pub contract: Option<String>,
}

impl Cli {
    /// The contract to query, falling back to the configured default.
    pub fn contract_or(&self, fallback: &str) -> String {
        match self.contract.as_deref().filter(|contract| !contract.is_empty()) {
            Some(contract) => contract.to_string(),
            None => {
                info!("No contract address provided, using default: {fallback}");
                fallback.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_unwrap::ResultExt;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
                api_url = "http://localhost:8080"
                page_limit = 20
            "#,
        )
        .unwrap_or_log();

        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.page_limit, 20);
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("does/not/exist.toml")).unwrap_or_log();

        assert_eq!(config.page_limit, 1000);
        assert_eq!(
            config.fallback_contract,
            "0xb3443b6bd585ba4118cae2bedb61c7ec4a8281df"
        );
    }

    #[test]
    fn test_contract_flag() {
        let cli = Cli::try_parse_from(["listings-snapshot", "-c", "0xabc"]).unwrap_or_log();
        assert_eq!(cli.contract_or("0xdefault"), "0xabc");

        let cli = Cli::try_parse_from(["listings-snapshot", "--contract", "0xdef"]).unwrap_or_log();
        assert_eq!(cli.contract_or("0xdefault"), "0xdef");
    }

    #[test]
    fn test_empty_contract_falls_back() {
        let cli = Cli { contract: Some(String::new()) };
        assert_eq!(cli.contract_or("0xdefault"), "0xdefault");

        let cli = Cli { contract: None };
        assert_eq!(cli.contract_or("0xdefault"), "0xdefault");
    }
}
