//! Configuration management for the marketplace indexer.
//!
//! Provides a builder-pattern configuration plus environment-variable
//! loading for the binary. One configuration describes one watched stream:
//! a `(package, module)` pair polled against one RPC endpoint.

use crate::utils::error::{IndexerError, Result};
use std::str::FromStr;

const MAINNET_RPC_URL: &str = "https://fullnode.mainnet.sui.io:443";
const TESTNET_RPC_URL: &str = "https://fullnode.testnet.sui.io:443";
const DEVNET_RPC_URL: &str = "https://fullnode.devnet.sui.io:443";
const LOCALNET_RPC_URL: &str = "http://127.0.0.1:9000";

const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_ERROR_RETRY_MS: u64 = 5_000;
const DEFAULT_BATCH_SIZE: usize = 50;

/// Network selection, mapped to a default fullnode URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl Network {
    /// Returns the default fullnode RPC URL for this network.
    #[must_use]
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_RPC_URL,
            Network::Testnet => TESTNET_RPC_URL,
            Network::Devnet => DEVNET_RPC_URL,
            Network::Localnet => LOCALNET_RPC_URL,
        }
    }
}

impl FromStr for Network {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" | "local" => Ok(Network::Localnet),
            other => Err(IndexerError::ConfigError(format!(
                "unknown network: {other}"
            ))),
        }
    }
}

/// Configuration for one watcher instance.
///
/// Use [`IndexerConfigBuilder`] to construct instances, or
/// [`IndexerConfig::from_env`] in the binary.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Network the package is deployed on.
    pub network: Network,

    /// RPC endpoint URL. Defaults to the network's fullnode unless
    /// overridden.
    pub rpc_url: String,

    /// Database connection URL.
    pub database_url: String,

    /// Package id whose events are watched.
    pub package_id: String,

    /// Move module within the package, e.g. `task_manager`.
    pub module: String,

    /// Delay between polls when a page comes back empty.
    pub poll_interval_ms: u64,

    /// Backoff delay after an RPC failure.
    pub error_retry_ms: u64,

    /// Maximum events requested per page.
    pub batch_size: usize,
}

impl IndexerConfig {
    /// The cursor key for this watcher's stream.
    #[must_use]
    pub fn stream_id(&self) -> String {
        format!("{}::{}", self.package_id, self.module)
    }

    /// Builds a configuration from environment variables.
    ///
    /// Required: `DATABASE_URL`, `PACKAGE_ID`, `MODULE`. Optional:
    /// `NETWORK` (default mainnet), `RPC_URL` (overrides the network
    /// default), `POLL_INTERVAL_MS`, `ERROR_RETRY_MS`, `BATCH_SIZE`.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::EnvVarError` for missing required variables
    /// and `IndexerError::ConfigError` for unparseable values.
    pub fn from_env() -> Result<Self> {
        let mut builder = IndexerConfigBuilder::new()
            .with_database(std::env::var("DATABASE_URL")?)
            .package_id(std::env::var("PACKAGE_ID")?)
            .module(std::env::var("MODULE")?);

        if let Ok(network) = std::env::var("NETWORK") {
            builder = builder.with_network(network.parse()?);
        }
        if let Ok(url) = std::env::var("RPC_URL") {
            builder = builder.with_rpc(url);
        }
        if let Ok(ms) = std::env::var("POLL_INTERVAL_MS") {
            builder = builder.with_poll_interval_ms(parse_env("POLL_INTERVAL_MS", &ms)?);
        }
        if let Ok(ms) = std::env::var("ERROR_RETRY_MS") {
            builder = builder.with_error_retry_ms(parse_env("ERROR_RETRY_MS", &ms)?);
        }
        if let Ok(size) = std::env::var("BATCH_SIZE") {
            builder = builder.with_batch_size(parse_env("BATCH_SIZE", &size)?);
        }

        builder.build()
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| IndexerError::ConfigError(format!("invalid {name}: {value}")))
}

/// Builder for [`IndexerConfig`].
///
/// # Example
///
/// ```
/// use market_indexer::IndexerConfigBuilder;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = IndexerConfigBuilder::new()
///     .with_database("postgresql://localhost/marketplace")
///     .package_id("0xabc")
///     .module("task_manager")
///     .with_poll_interval_ms(1000)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct IndexerConfigBuilder {
    network: Option<Network>,
    rpc_url: Option<String>,
    database_url: Option<String>,
    package_id: Option<String>,
    module: Option<String>,
    poll_interval_ms: Option<u64>,
    error_retry_ms: Option<u64>,
    batch_size: Option<usize>,
}

impl IndexerConfigBuilder {
    /// Creates a new configuration builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the network; its fullnode URL is used unless an explicit
    /// RPC URL is also set.
    #[must_use]
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    /// Sets an explicit RPC endpoint URL, overriding the network default.
    #[must_use]
    pub fn with_rpc(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Sets the database connection URL.
    #[must_use]
    pub fn with_database(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Sets the package id to watch.
    #[must_use]
    pub fn package_id(mut self, id: impl Into<String>) -> Self {
        self.package_id = Some(id.into());
        self
    }

    /// Sets the Move module to watch.
    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Sets the idle poll interval in milliseconds (default: 2000).
    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = Some(ms);
        self
    }

    /// Sets the error backoff delay in milliseconds (default: 5000).
    #[must_use]
    pub fn with_error_retry_ms(mut self, ms: u64) -> Self {
        self.error_retry_ms = Some(ms);
        self
    }

    /// Sets the maximum events per fetched page (default: 50).
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Builds the configuration, validating required fields.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::ConfigError` if the database URL, package id
    /// or module is missing, or if the batch size is zero.
    pub fn build(self) -> Result<IndexerConfig> {
        let database_url = self
            .database_url
            .ok_or_else(|| IndexerError::ConfigError("database URL is required".to_string()))?;
        let package_id = self
            .package_id
            .ok_or_else(|| IndexerError::ConfigError("package id is required".to_string()))?;
        let module = self
            .module
            .ok_or_else(|| IndexerError::ConfigError("module is required".to_string()))?;

        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(IndexerError::ConfigError(
                "batch size must be positive".to_string(),
            ));
        }

        let network = self.network.unwrap_or_default();
        let rpc_url = self
            .rpc_url
            .unwrap_or_else(|| network.default_rpc_url().to_string());

        Ok(IndexerConfig {
            network,
            rpc_url,
            database_url,
            package_id,
            module,
            poll_interval_ms: self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            error_retry_ms: self.error_retry_ms.unwrap_or(DEFAULT_ERROR_RETRY_MS),
            batch_size,
        })
    }
}
