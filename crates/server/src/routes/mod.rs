//! HTTP route handlers for the fulfillment bridge.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness check
//!
//! # Order intake
//! POST /webhooks/orders/created       - Commerce-platform order webhook
//!
//! # Issuance (internal API)
//! POST /download-credentials          - Mint a credential, returns the token
//!
//! # Customer-facing
//! GET  /downloads/{token}             - Redeem a token (stream or redirect)
//! GET  /orders/{order_id}/downloads   - Delivery page for an order
//! ```

pub mod credentials;
pub mod delivery;
pub mod downloads;
pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/webhooks/orders/created", post(webhook::order_created))
        .route("/download-credentials", post(credentials::issue))
        .route("/downloads/{token}", get(downloads::redeem))
        .route("/orders/{order_id}/downloads", get(delivery::show))
}

/// Build the complete application router, middleware included.
#[must_use]
pub fn router(state: AppState) -> Router {
    routes()
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
