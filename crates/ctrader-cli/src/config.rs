//! Configuration file handling for the ctrader CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

const DEFAULT_SERVER: &str = "http://localhost:8080";
const DEFAULT_PROVIDER: &str = "gdax";
const DEFAULT_PRODUCT: &str = "btc-eur";

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default server URL
    pub server: Option<String>,
    /// Default output format
    pub output: Option<OutputFormat>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Default exchange provider for ticker commands
    pub provider: Option<String>,
    /// Default product for ticker commands
    pub product: Option<String>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("ctrader");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        server: Option<&str>,
        output: Option<OutputFormat>,
        no_color: bool,
    ) -> MergedConfig {
        MergedConfig {
            server: server
                .map(String::from)
                .or_else(|| self.server.clone())
                .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            output: output.or(self.output).unwrap_or_default(),
            no_color: no_color || self.no_color.unwrap_or(false),
            provider: self
                .provider
                .clone()
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            product: self
                .product
                .clone()
                .unwrap_or_else(|| DEFAULT_PRODUCT.to_string()),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub server: String,
    pub output: OutputFormat,
    pub no_color: bool,
    pub provider: String,
    pub product: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let merged = Config::default().merge_with_args(None, None, false);
        assert_eq!(merged.server, "http://localhost:8080");
        assert_eq!(merged.output, OutputFormat::Table);
        assert!(!merged.no_color);
        assert_eq!(merged.provider, "gdax");
        assert_eq!(merged.product, "btc-eur");
    }

    #[test]
    fn test_args_override_file() {
        let config = Config {
            server: Some("http://trader:9000".into()),
            output: Some(OutputFormat::Json),
            no_color: Some(true),
            provider: Some("kraken".into()),
            product: None,
        };

        let merged = config.merge_with_args(Some("http://other:1"), Some(OutputFormat::Table), false);
        assert_eq!(merged.server, "http://other:1");
        assert_eq!(merged.output, OutputFormat::Table);
        assert!(merged.no_color);
        assert_eq!(merged.provider, "kraken");
        assert_eq!(merged.product, "btc-eur");

        let merged = config.merge_with_args(None, None, false);
        assert_eq!(merged.server, "http://trader:9000");
        assert_eq!(merged.output, OutputFormat::Json);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server = \"http://trader:9000\"\noutput = \"json\"\nproduct = \"eth-eur\""
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.server.as_deref(), Some("http://trader:9000"));
        assert_eq!(config.output, Some(OutputFormat::Json));
        assert_eq!(config.product.as_deref(), Some("eth-eur"));
        assert!(config.provider.is_none());
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server = [").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }
}
