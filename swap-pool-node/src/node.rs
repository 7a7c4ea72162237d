//! Node assembly: store, DEX backend, settlement and the HTTP server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use lib_dex::{DexClient, OkxConfig, OkxDexClient, SimulatedDexClient, TokenCatalog};
use lib_pool_governance::{ExecutionSettings, SimulatedSettlement, SwapPoolService};
use lib_pool_storage::SqliteStore;
use tracing::{info, warn};

use crate::api;
use crate::config::{DexMode, NodeConfig};

async fn open_store(config: &NodeConfig) -> Result<SqliteStore> {
    if config.database.in_memory {
        warn!("Using in-memory pool store; data is lost on shutdown");
        return SqliteStore::open_in_memory()
            .await
            .context("failed to open in-memory pool store");
    }

    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    SqliteStore::open(path)
        .await
        .with_context(|| format!("failed to open pool store at {}", path.display()))
}

/// OKX when configured with credentials, the simulated client otherwise
fn dex_backend(config: &NodeConfig) -> (Arc<dyn DexClient>, Arc<dyn TokenCatalog>) {
    let dex = &config.dex;
    if dex.mode == DexMode::Okx && dex.has_credentials() {
        info!("Using OKX DEX aggregator at {}", dex.base_url);
        let client = Arc::new(OkxDexClient::new(OkxConfig {
            base_url: dex.base_url.clone(),
            api_key: dex.api_key.clone(),
            secret_key: dex.secret_key.clone(),
            passphrase: dex.passphrase.clone(),
            chain_index: dex.chain_index.clone(),
            timeout: dex.timeout(),
        }));
        let swaps: Arc<dyn DexClient> = client.clone();
        let catalog: Arc<dyn TokenCatalog> = client;
        return (swaps, catalog);
    }

    if dex.mode == DexMode::Okx {
        warn!("OKX credentials missing; falling back to the simulated DEX");
    } else {
        info!("Using simulated DEX");
    }
    let client = Arc::new(SimulatedDexClient::new(dex.chain_index.clone()));
    let simulated: Arc<dyn DexClient> = client.clone();
    let catalog: Arc<dyn TokenCatalog> = client;
    (simulated, catalog)
}

/// Build the governance service described by the configuration
pub async fn build_service(config: &NodeConfig) -> Result<SwapPoolService> {
    let store = open_store(config).await?;
    let (dex, catalog) = dex_backend(config);
    let settlement = Arc::new(SimulatedSettlement::new(config.settlement.delay()));

    Ok(SwapPoolService::new(
        store,
        dex,
        catalog,
        settlement,
        ExecutionSettings {
            slippage: config.dex.slippage.clone(),
            chain_id: config.dex.chain_id.clone(),
            dex_timeout: config.dex.timeout(),
        },
    ))
}

/// Serve until ctrl-c
pub async fn run(config: NodeConfig) -> Result<()> {
    let service = Arc::new(build_service(&config).await?);
    let app = api::router(service.clone(), &config.server);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Swap pool node listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    service.store().close().await;
    info!("Swap pool node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
