use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::hedge::HedgeConvention;

/// Default config location, overridden by `CONFIG_FILE`
pub const DEFAULT_CONFIG_PATH: &str = "config/dn_hedge.toml";

/// Prefix for environment overrides, e.g. `DN_HEDGE__HEDGE__CONVENTION`
pub const ENV_PREFIX: &str = "DN_HEDGE";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub hedge: HedgeConfig,
    pub exchange: ExchangeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default underlying for new positions
    pub underlying_symbol: String,
    /// Directory holding the store file; a leading `~` is the home directory
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            underlying_symbol: "BTC".to_string(),
            data_dir: "~/.dn_hedge".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HedgeConfig {
    pub convention: HedgeConvention,
    /// Band used when a new position does not give one
    pub default_band: Decimal,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            convention: HedgeConvention::ShortOption,
            default_band: dec!(0.05),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub api_endpoint: String,
    /// Upper bound for one delta fetch
    pub timeout_ms: u64,
    /// Year assumed for `DDMMM` expiry tokens
    pub expiry_year: i32,
    /// Spot price used by the mock delta source
    pub mock_spot_price: Decimal,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "https://eapi.binance.com".to_string(),
            timeout_ms: 5000,
            expiry_year: 2026,
            mock_spot_price: dec!(67000),
        }
    }
}

impl ExchangeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub output: String,
    /// Empty means stderr
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "pretty".to_string(),
            file_path: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `CONFIG_FILE` (or the default path, if present) with
    /// `DN_HEDGE__SECTION__KEY` environment overrides on top
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_layered(Path::new(&path))
    }

    pub fn load_layered(path: &Path) -> Result<Self> {
        let layered = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("building layered configuration")?;

        let config: Config = layered
            .try_deserialize()
            .context("deserializing configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.general.underlying_symbol.trim().is_empty() {
            bail!("general.underlying_symbol must not be empty");
        }
        if self.hedge.default_band <= Decimal::ZERO {
            bail!("hedge.default_band must be positive, got {}", self.hedge.default_band);
        }
        url::Url::parse(&self.exchange.api_endpoint)
            .with_context(|| format!("exchange.api_endpoint '{}'", self.exchange.api_endpoint))?;
        if self.exchange.timeout_ms == 0 {
            bail!("exchange.timeout_ms must be positive");
        }
        if self.exchange.mock_spot_price <= Decimal::ZERO {
            bail!("exchange.mock_spot_price must be positive");
        }
        Ok(())
    }

    /// Data directory with `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.general.data_dir)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(format!("{}{}", home, rest));
        }
    }
    PathBuf::from(path)
}
