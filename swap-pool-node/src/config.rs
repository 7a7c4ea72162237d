//! Node Configuration
//!
//! Loaded from a TOML file with every section optional:
//!
//! ```toml
//! log_level = "info"
//!
//! [server]
//! bind = "127.0.0.1:3001"
//! request_timeout_secs = 30
//! cors_origins = ["*"]
//!
//! [database]
//! path = "data/swap-pool.db"
//! in_memory = false
//!
//! [dex]
//! mode = "okx"            # or "simulated"
//! base_url = "https://web3.okx.com"
//! chain_index = "196"     # catalog and quotes
//! chain_id = "195"        # prepared executions
//! slippage = "1"
//! timeout_secs = 15
//!
//! [settlement]
//! delay_ms = 2000
//! ```
//!
//! API credentials can be supplied through `OKX_API_KEY`, `OKX_SECRET_KEY`
//! and `OKX_PASSPHRASE`, which take precedence over the file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub dex: DexConfig,
    pub settlement: SettlementConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            dex: DexConfig::default(),
            settlement: SettlementConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; `"*"` allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".into(),
            request_timeout_secs: 30,
            cors_origins: vec!["*".into()],
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Ignore `path` and keep everything in memory
    pub in_memory: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/swap-pool.db"),
            in_memory: false,
        }
    }
}

/// Which DEX backend the node talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DexMode {
    Okx,
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DexConfig {
    pub mode: DexMode,
    pub base_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    pub chain_index: String,
    pub chain_id: String,
    /// Execution slippage in percent
    pub slippage: String,
    pub timeout_secs: u64,
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            mode: DexMode::Okx,
            base_url: "https://web3.okx.com".into(),
            api_key: String::new(),
            secret_key: String::new(),
            passphrase: String::new(),
            chain_index: "196".into(),
            chain_id: "195".into(),
            slippage: "1".into(),
            timeout_secs: 15,
        }
    }
}

impl DexConfig {
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.secret_key.is_empty() && !self.passphrase.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Simulated confirmation delay
    pub delay_ms: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self { delay_ms: 2000 }
    }
}

impl SettlementConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl NodeConfig {
    /// Read, apply environment overrides and validate
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: NodeConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.check()?;

        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Overlay DEX credentials from the environment
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str, field: &mut String| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = value;
            }
        };
        set("OKX_API_KEY", &mut self.dex.api_key);
        set("OKX_SECRET_KEY", &mut self.dex.secret_key);
        set("OKX_PASSPHRASE", &mut self.dex.passphrase);
    }

    /// Validate and fold the problems into one error
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|errors| anyhow::anyhow!("invalid configuration: {}", errors.join("; ")))
    }

    /// Validate the configuration at startup.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.bind.parse::<SocketAddr>().is_err() {
            errors.push(format!("server.bind '{}' is not a socket address", self.server.bind));
        }
        if self.server.request_timeout_secs == 0 {
            errors.push("server.request_timeout_secs must be > 0".into());
        }
        if !self.database.in_memory && self.database.path.as_os_str().is_empty() {
            errors.push("database.path must not be empty".into());
        }
        if self.dex.mode == DexMode::Okx && self.dex.base_url.is_empty() {
            errors.push("dex.base_url must not be empty".into());
        }
        if self.dex.chain_id.is_empty() {
            errors.push("dex.chain_id must not be empty".into());
        }
        if self.dex.chain_index.is_empty() {
            errors.push("dex.chain_index must not be empty".into());
        }
        match self.dex.slippage.parse::<f64>() {
            Ok(s) if (0.0..100.0).contains(&s) => {}
            _ => errors.push(format!("dex.slippage '{}' must be in [0, 100)", self.dex.slippage)),
        }
        if self.dex.timeout_secs == 0 {
            errors.push("dex.timeout_secs must be > 0".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
