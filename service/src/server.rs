//! Router assembly and the serve loop.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::handlers;
use crate::metrics::GateMetrics;
use axum::routing::{get, post};
use axum::Router;
use portcullis_gate::HumanVerificationGate;
use portcullis_types::VerificationPolicy;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Shared state handed to every handler: the gate, the base policy for
/// gated endpoints, and the metrics registry behind `/metrics`.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<HumanVerificationGate>,
    pub policy: VerificationPolicy,
    pub metrics: Arc<GateMetrics>,
}

impl AppState {
    pub fn new(
        gate: Arc<HumanVerificationGate>,
        policy: VerificationPolicy,
        metrics: Arc<GateMetrics>,
    ) -> Self {
        Self {
            gate,
            policy,
            metrics,
        }
    }
}

/// Assemble the service router.
///
/// The contact endpoint is browser-facing, so CORS is left permissive;
/// admission control is the gate's job, not the browser's.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/contact", post(handlers::submit_contact))
        .route("/api/verify", post(handlers::verify))
        .route("/healthz", get(handlers::health_check))
        .route("/metrics", get(handlers::export_metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve until the process is stopped.
pub async fn run(config: &ServiceConfig, state: AppState) -> Result<(), ServiceError> {
    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "admission service listening");
    serve(listener, state).await
}

/// Serve on an already-bound listener. Split from [`run`] so tests can bind
/// port zero themselves.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), ServiceError> {
    // ConnectInfo carries the peer address into the handlers, which use it
    // as the client IP when no forwarding header is present.
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app).await?;
    Ok(())
}
