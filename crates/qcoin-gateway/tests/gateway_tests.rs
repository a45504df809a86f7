//! In-process tests for the qcoin gateway router (no listener is opened)

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use qcoin_core::RejectionReason;
use qcoin_gateway::handlers::rejection_status;
use qcoin_gateway::{router, AppState};
use qcoin_ledger::config::{LedgerConfig, MiningConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    router(Arc::new(AppState::new(LedgerConfig::default())))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_mine(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mine")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================
// POST /mine
// ============================================================

#[tokio::test]
async fn mine_accepts_qualified_metrics() {
    let app = app();
    let (status, body) = send(
        &app,
        post_mine(json!({
            "identity": "alice",
            "subject_id": "s1",
            "metrics": {"integration": 1.0, "coherence": 0.9, "decoherence": 0.1}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);
    assert_eq!(body["reward"], 11.0);
    assert_eq!(body["balance"], 11.0);
    assert_eq!(body["block"]["index"], 1);
    assert_eq!(body["block"]["identity"], "alice");
    assert_eq!(body["block"]["subject_id"], "s1");

    let digest = body["block"]["digest"].as_str().unwrap();
    assert!(digest.starts_with("0x000"));
    assert_eq!(digest.len(), 66);
    assert_eq!(
        body["block"]["previous_digest"].as_str().unwrap(),
        format!("0x{}", "0".repeat(64))
    );
    assert!(body["attempts"].as_u64().unwrap() >= 1);
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn mine_rejects_low_integration_with_422() {
    let app = app();
    let (status, body) = send(
        &app,
        post_mine(json!({
            "identity": "bob",
            "subject_id": "s2",
            "metrics": {"integration": 0.1, "coherence": 0.9, "decoherence": 0.1}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["accepted"], false);
    assert_eq!(body["reason"], "MetricsBelowThreshold");
    assert!(body.get("block").is_none());

    let (_, chain) = send(&app, get("/chain")).await;
    assert_eq!(chain["total_blocks"], 1);
    let (_, bal) = send(&app, get("/balance?identity=bob")).await;
    assert_eq!(bal["balance"], 0.0);
}

#[tokio::test]
async fn mine_with_missing_metric_is_malformed() {
    let app = app();
    let (status, body) = send(
        &app,
        post_mine(json!({
            "identity": "carol",
            "subject_id": "s3",
            "metrics": {"integration": 1.0, "coherence": 0.9}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["reason"], "MalformedInput");
}

#[tokio::test]
async fn mine_accepts_legacy_payload() {
    let app = app();
    let (status, body) = send(
        &app,
        post_mine(json!({
            "identity": "0x3e8a7f2c1d9b5e4a",
            "organism_id": "dna::}{::lang",
            "consciousness_metrics": {"phi": 1.0234, "lambda": 0.456789, "gamma": 0.7441}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["block"]["subject_id"], "dna::}{::lang");
    assert_eq!(body["block"]["metrics"]["integration"], 1.0234);
}

#[tokio::test]
async fn exhaustion_maps_to_409() {
    let config = LedgerConfig {
        mining: MiningConfig {
            max_attempts: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    let app = router(Arc::new(AppState::new(config)));
    let (status, body) = send(
        &app,
        post_mine(json!({
            "identity": "dave",
            "subject_id": "s4",
            "metrics": {"integration": 1.0, "coherence": 0.9, "decoherence": 0.1}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "MiningExhausted");
}

#[tokio::test]
async fn overflowing_balance_is_rejected_as_malformed() {
    let app = app();
    let huge = json!({
        "identity": "alice",
        "subject_id": "s5",
        "metrics": {"integration": f64::MAX, "coherence": 0.4, "decoherence": 0.1}
    });

    let (status, first) = send(&app, post_mine(huge.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["balance"].is_f64());

    let (status, second) = send(&app, post_mine(huge)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(second["accepted"], false);
    assert_eq!(second["reason"], "MalformedInput");

    let (_, bal) = send(&app, get("/balance?identity=alice")).await;
    assert_eq!(bal["balance"], first["balance"]);
    let (_, stats) = send(&app, get("/stats")).await;
    assert_eq!(stats["total_blocks"], 2);
    assert!(stats["total_supply"].is_f64());
}

#[test]
fn internal_fault_is_a_server_error() {
    assert_eq!(
        rejection_status(RejectionReason::InternalFault),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        rejection_status(RejectionReason::MalformedInput),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

// ============================================================
// Queries
// ============================================================

#[tokio::test]
async fn balance_accumulates_and_chain_links() {
    let app = app();
    for subject in ["a", "b"] {
        let (status, _) = send(
            &app,
            post_mine(json!({
                "identity": "alice",
                "subject_id": subject,
                "metrics": {"integration": 1.0, "coherence": 0.5, "decoherence": 0.1}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, bal) = send(&app, get("/balance?identity=alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bal["identity"], "alice");
    assert_eq!(bal["balance"], 22.0);
    assert_eq!(bal["currency"], "QCOIN");

    let (_, chain) = send(&app, get("/chain")).await;
    assert_eq!(chain["total_blocks"], 3);
    assert_eq!(chain["total_supply"], 22.0);
    let blocks = chain["blocks"].as_array().unwrap();
    for n in 1..blocks.len() {
        assert_eq!(blocks[n]["previous_digest"], blocks[n - 1]["digest"]);
        assert_eq!(blocks[n]["index"], n as u64);
    }
}

#[tokio::test]
async fn unknown_identity_has_zero_balance() {
    let (status, bal) = send(&app(), get("/balance?identity=nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bal["balance"], 0.0);
}

#[tokio::test]
async fn chain_starts_at_genesis() {
    let (_, chain) = send(&app(), get("/chain")).await;
    let zeros = format!("0x{}", "0".repeat(64));
    assert_eq!(chain["total_blocks"], 1);
    assert_eq!(chain["total_supply"], 0.0);
    assert_eq!(chain["blocks"][0]["index"], 0);
    assert_eq!(chain["blocks"][0]["digest"], zeros.as_str());
    assert_eq!(chain["blocks"][0]["previous_digest"], zeros.as_str());
}

#[tokio::test]
async fn stats_health_and_surface() {
    let app = app();
    let (status, stats) = send(&app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_blocks"], 1);
    assert_eq!(stats["chain_valid"], true);

    let (status, health) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["blocks"], 1);

    let (status, surface) = send(&app, get("/surface")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(surface["reward"]["base_reward"], 10.0);
    assert_eq!(surface["mining"]["max_attempts"], 100_000);
    assert_eq!(surface["admission"]["min_integration"], 0.5);
}
