use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use relay_coordinator::SwapCoordinator;
use relay_observability::Metrics;
use relay_pool::ConnectionPool;
use relay_route::ChainRegistry;
use relay_shield::DdosShield;
use relay_store::SwapStore;

use crate::handlers;
use crate::shield_mw::shield_layer;

/// Shared state handed to every handler. Every field is an `Arc` so cloning
/// `AppState` per request is cheap — axum requires `State<S>: Clone`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SwapStore>,
    pub coordinator: Arc<SwapCoordinator>,
    pub registry: Arc<ChainRegistry>,
    pub shield: Arc<DdosShield>,
    pub metrics: Arc<Metrics>,
    pub pools: Arc<Vec<Arc<ConnectionPool>>>,
    pub monitors_healthy: Arc<AtomicBool>,
}

/// The REST control surface (C10): swap intake/inspection, admin actions,
/// health and metrics. Built once at startup and run for the life of the
/// process.
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any);

        Router::new()
            .route("/swaps", post(handlers::create_swap))
            .route("/swaps/:id", get(handlers::get_swap))
            .route("/admin/emergency-stop", post(handlers::emergency_stop))
            .route("/admin/blacklist/:ip", post(handlers::blacklist_ip))
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::metrics))
            .layer(axum::middleware::from_fn_with_state(
                self.state.clone(),
                shield_layer,
            ))
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Binds `addr` and serves until the process is killed; the returned
    /// future resolves only on a fatal listener error.
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "control API listening");
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}
