//! Telegram webhook listener.
//!
//! Telegram redelivers updates that are not answered with a 2xx status, so
//! `POST /` answers `200 OK` for every update, including ones it drops.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use kiro_bridge::BridgeController;
use kiro_telegram::parse_update;

pub const WEBHOOK_BANNER: &str = "Kiro-Telegram Bridge";

pub fn build_webhook_router(controller: BridgeController) -> Router {
    Router::new()
        .route("/", get(handle_banner).post(handle_update))
        .with_state(Arc::new(controller))
}

async fn handle_banner() -> &'static str {
    WEBHOOK_BANNER
}

async fn handle_update(
    State(controller): State<Arc<BridgeController>>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    match parse_update(&body) {
        Ok(event) => {
            tracing::info!(
                conversation = %event.conversation_id(),
                kind = event.kind(),
                "accepted telegram update"
            );
            controller.handle_event(event).await;
        }
        Err(error) => {
            tracing::debug!(
                reason_code = error.reason_code(),
                diagnostic = %error,
                "dropping telegram update"
            );
        }
    }
    (StatusCode::OK, "OK")
}
