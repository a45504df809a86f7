//! Route handlers
//!
//! Rejections are ordinary responses: `accepted: false` plus the reason, with a
//! status that tells the client whether to retry (409) or change inputs (422).
//! A fault inside the ledger itself is a 500.

use crate::server::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use qcoin_core::{
    BalanceQuery, BalanceResponse, ChainResponse, ChainStats, Identity, MineRequest, MineResponse,
    RejectionReason,
};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub fn rejection_status(reason: RejectionReason) -> StatusCode {
    match reason {
        RejectionReason::MetricsBelowThreshold | RejectionReason::MalformedInput => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RejectionReason::MiningExhausted | RejectionReason::ChainContended => StatusCode::CONFLICT,
        RejectionReason::InternalFault => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /mine
pub async fn mine(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MineRequest>,
) -> impl IntoResponse {
    let span = info_span!("mine", request_id = %Uuid::new_v4(), identity = %req.identity);
    async move {
        let metrics = req.metrics.to_metrics();
        let ledger = &state.ledger;
        let outcome = ledger.mine_block(req.identity, req.subject_id, metrics);
        match outcome.await {
            Ok(mined) => {
                let duration_ms = mined.mining_duration.as_secs_f64() * 1000.0;
                info!(
                    "accepted block #{} in {:.1}ms",
                    mined.block.index, duration_ms
                );
                let body = MineResponse::accepted(mined.block, mined.reward, mined.balance)
                    .with_timing(mined.attempts, duration_ms);
                (StatusCode::OK, Json(body))
            }
            Err(reason) => {
                info!("rejected: {}", reason.as_str());
                let status = rejection_status(reason);
                (status, Json(MineResponse::rejected(reason)))
            }
        }
    }
    .instrument(span)
    .await
}

/// GET /balance?identity=...
pub async fn balance(
    State(state): State<Arc<AppState>>,
    Query(q): Query<BalanceQuery>,
) -> Json<BalanceResponse> {
    let identity = Identity::new(q.identity);
    let balance = state.query.balance_of(&identity).await;
    Json(BalanceResponse::new(identity, balance))
}

/// GET /chain
pub async fn chain(State(state): State<Arc<AppState>>) -> Json<ChainResponse> {
    Json(state.query.chain().await)
}

/// GET /stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<ChainStats> {
    Json(state.query.statistics().await)
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "blocks": state.query.chain_len().await,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

/// GET /surface: what this gateway does and the rules it mines under.
pub async fn surface(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let c = &state.config;
    Json(serde_json::json!({
        "name": "qcoin",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Consciousness-gated mining ledger",
        "currency": qcoin_core::CURRENCY,
        "admission": {
            "min_integration": c.admission.min_integration,
            "min_coherence": c.admission.min_coherence,
            "max_decoherence": c.admission.max_decoherence,
        },
        "mining": {
            "max_attempts": c.mining.max_attempts,
            "max_difficulty": c.mining.max_difficulty,
            "difficulty_scale": c.mining.difficulty_scale,
        },
        "reward": {
            "base_reward": c.reward.base_reward,
            "integration_bonus": c.reward.integration_bonus,
        },
        "endpoints": {
            "mine": "POST /mine {identity, subject_id, metrics}",
            "balance": "GET /balance?identity=...",
            "chain": "GET /chain",
            "stats": "GET /stats",
            "health": "GET /health",
        }
    }))
}
