//! Prometheus /metrics + health check HTTP endpoints
//!
//! Endpoints:
//!   GET /metrics  — Prometheus text format
//!   GET /healthz  — Liveness probe (always 200 if process is running)
//!   GET /readyz   — Readiness probe (200 if the artifact store is writable)

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use camvault_storage::ArtifactStore;
use prometheus_client::{
    encoding::text::encode,
    metrics::{counter::Counter, family::Family, histogram::Histogram},
    registry::Registry,
};
use std::sync::Arc;
use std::time::Duration;

type Labels = Vec<(String, String)>;

/// Counters and timings for the vault API
#[derive(Clone)]
pub struct VaultMetrics {
    uploads: Counter,
    decrypts: Counter,
    failures: Family<Labels, Counter>,
    operation_duration: Family<Labels, Histogram>,
}

impl VaultMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let metrics = Self {
            uploads: Counter::default(),
            decrypts: Counter::default(),
            failures: Family::default(),
            operation_duration: Family::<Labels, Histogram>::new_with_constructor(|| {
                Histogram::new([0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0])
            }),
        };

        registry.register(
            "camvault_uploads",
            "Artifacts encrypted and stored",
            metrics.uploads.clone(),
        );
        registry.register(
            "camvault_decrypts",
            "Artifacts retrieved and decrypted",
            metrics.decrypts.clone(),
        );
        registry.register(
            "camvault_failures",
            "Failed operations by operation and error kind",
            metrics.failures.clone(),
        );
        registry.register(
            "camvault_operation_duration_seconds",
            "Time to seal (encrypt + store) or open (retrieve + decrypt) an artifact",
            metrics.operation_duration.clone(),
        );

        metrics
    }

    pub fn upload_ok(&self, elapsed: Duration) {
        self.uploads.inc();
        self.observe("seal", elapsed);
    }

    pub fn decrypt_ok(&self, elapsed: Duration) {
        self.decrypts.inc();
        self.observe("open", elapsed);
    }

    pub fn failure(&self, op: &str, kind: &str) {
        self.failures
            .get_or_create(&vec![
                ("op".to_string(), op.to_string()),
                ("kind".to_string(), kind.to_string()),
            ])
            .inc();
    }

    fn observe(&self, op: &str, elapsed: Duration) {
        self.operation_duration
            .get_or_create(&vec![("op".to_string(), op.to_string())])
            .observe(elapsed.as_secs_f64());
    }
}

/// Shared health state updated by the daemon
#[derive(Clone)]
pub struct HealthState {
    pub registry: Arc<Registry>,
    pub store: ArtifactStore,
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .with_state(state)
}

/// Serve Prometheus metrics and health endpoints on `addr` (e.g. "127.0.0.1:9100")
pub async fn serve(addr: String, state: HealthState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("metrics bind {addr}: {e}"))?;

    tracing::info!(addr = %addr, "metrics: listening on /metrics, /healthz, /readyz");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| anyhow::anyhow!("metrics server: {e}"))
}

async fn metrics_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let mut body = String::new();
    match encode(&mut body, &state.registry) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!("metrics encode failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}

/// Liveness probe: returns 200 if the process is running.
async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe: returns 200 if the store directory is writable, 503 otherwise.
async fn readyz_handler(State(state): State<HealthState>) -> impl IntoResponse {
    match camvault_storage::check_health(&state.store) {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!("readiness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unwritable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state(dir: &std::path::Path) -> (HealthState, VaultMetrics) {
        let mut registry = Registry::default();
        let metrics = VaultMetrics::new(&mut registry);
        let state = HealthState {
            registry: Arc::new(registry),
            store: ArtifactStore::open(dir.join("vault")).unwrap(),
        };
        (state, metrics)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_exposes_counters() {
        let dir = tempfile::tempdir().unwrap();
        let (state, metrics) = state(dir.path());
        metrics.upload_ok(Duration::from_millis(12));
        metrics.failure("decrypt", "framing");

        let (status, body) = get(router(state), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("camvault_uploads_total 1"));
        assert!(body.contains("camvault_failures_total{op=\"decrypt\",kind=\"framing\"} 1"));
        assert!(body.contains("camvault_operation_duration_seconds_count{op=\"seal\"} 1"));
        assert!(!body.contains("cipher_duration"));
    }

    #[tokio::test]
    async fn test_probes() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = state(dir.path());

        assert_eq!(get(router(state.clone()), "/healthz").await.0, StatusCode::OK);
        assert_eq!(get(router(state.clone()), "/readyz").await.0, StatusCode::OK);

        std::fs::remove_dir(state.store.root()).unwrap();
        assert_eq!(
            get(router(state), "/readyz").await.0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
