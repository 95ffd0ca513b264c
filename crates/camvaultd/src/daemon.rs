//! Daemon lifecycle: key loading, store checks, metrics, HTTP API server

use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tracing::{error, info, warn};

use camvault_core::config::VaultConfig;
use camvault_crypto::{KeyOrigin, KeyProvider};
use camvault_storage::ArtifactStore;

use crate::api::{self, AppState};
use crate::metrics::{HealthState, VaultMetrics};
use crate::vault::Vault;

pub async fn run(config: VaultConfig) -> Result<()> {
    info!("daemon starting");

    // ── Artifact store ───────────────────────────────────────────────────
    let store = ArtifactStore::open(&config.storage.dir)
        .with_context(|| format!("opening store {}", config.storage.dir.display()))?;

    match camvault_storage::check_health(&store) {
        Ok(()) => info!(dir = %store.root().display(), "artifact store: writable"),
        Err(e) => warn!(dir = %store.root().display(), "artifact store: {e}"),
    }

    // ── Keypair (generated once on first start) ──────────────────────────
    let provider = KeyProvider::from_config(&config);
    let keys = tokio::task::spawn_blocking(move || provider.load_or_create())
        .await
        .context("key loading task")??;

    match keys.origin() {
        KeyOrigin::Generated => info!(bits = keys.modulus_bits(), "RSA keypair generated"),
        KeyOrigin::Loaded => info!(bits = keys.modulus_bits(), "RSA keypair loaded"),
    }

    // ── Metrics ──────────────────────────────────────────────────────────
    let mut registry = Registry::default();
    let metrics = VaultMetrics::new(&mut registry);

    if let Some(addr) = config.server.metrics_addr.clone() {
        let health = HealthState {
            registry: Arc::new(registry),
            store: store.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = crate::metrics::serve(addr, health).await {
                error!("metrics server failed: {e}");
            }
        });
    }

    // ── HTTP API ─────────────────────────────────────────────────────────
    let state = AppState {
        vault: Arc::new(Vault::new(Arc::new(keys), store)),
        metrics,
    };
    let app = api::router(state, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("api bind {}", config.server.listen))?;

    info!(addr = %config.server.listen, "api: listening");
    notify_ready();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("api server")?;

    info!("daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("installing ctrl-c handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(unix)]
fn notify_ready() {
    // sd_notify(READY=1) when running under systemd; no-op without $NOTIFY_SOCKET
    if let Ok(socket) = std::env::var("NOTIFY_SOCKET") {
        use std::os::unix::net::UnixDatagram;
        if let Ok(sock) = UnixDatagram::unbound() {
            let _ = sock.send_to(b"READY=1\n", &socket);
            tracing::debug!(notify_socket = %socket, "sent systemd READY=1");
        }
    }
}

#[cfg(not(unix))]
fn notify_ready() {}
