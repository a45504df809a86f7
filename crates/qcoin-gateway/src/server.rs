//! Gateway server: shared ledger state, router, and listener

use crate::handlers;
use axum::{
    routing::{get, post},
    Router,
};
use qcoin_core::{Error, GatewayConfig};
use qcoin_ledger::{Ledger, LedgerConfig, QueryFacade, SharedLedger};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub gateway: GatewayConfig,
    pub ledger: LedgerConfig,
}

/// State shared by every handler.
pub struct AppState {
    pub ledger: SharedLedger,
    pub query: QueryFacade,
    pub config: LedgerConfig,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: LedgerConfig) -> Self {
        let ledger = SharedLedger::new(Ledger::with_config(config.clone()));
        Self {
            query: ledger.query(),
            ledger,
            config,
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mine", post(handlers::mine))
        .route("/balance", get(handlers::balance))
        .route("/chain", get(handlers::chain))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .route("/surface", get(handlers::surface))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub async fn start_gateway(config: ServerConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.ledger.clone()));
    let app = router(state);

    let addr = format!("{}:{}", config.gateway.bind.to_addr(), config.gateway.port);
    let bind_addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::bind_error(&addr, format!("{}", e)))?;

    info!("qcoin gateway v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  Bind mode: {:?}", config.gateway.bind);
    info!(
        "  Admission: integration > {}, coherence > {}, decoherence < {}",
        config.ledger.admission.min_integration,
        config.ledger.admission.min_coherence,
        config.ledger.admission.max_decoherence
    );
    info!(
        "  Mining: max {} attempts, difficulty <= {}",
        config.ledger.mining.max_attempts, config.ledger.mining.max_difficulty
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| Error::bind_error(&addr, e.to_string()))?;
    axum::serve(listener, app).await?;
    Ok(())
}
