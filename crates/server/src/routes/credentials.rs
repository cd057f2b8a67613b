//! Internal credential issuance endpoint.
//!
//! `POST /download-credentials` mints a credential outside the webhook flow
//! (support tooling, manual re-issues). Not exposed to customers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, TimeDelta, Utc};
use dropwire_core::{AssetLocator, DownloadToken, OrderRef};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::fulfillment::IssueError;
use crate::state::AppState;

/// Issuance request body.
#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    /// Originating order reference.
    pub order_id: OrderRef,
    /// Locator of the asset to credential.
    pub asset_locator: AssetLocator,
    /// Redemptions allowed.
    pub max_uses: u32,
    /// Lifetime in seconds.
    pub ttl_seconds: i64,
}

/// Issuance response body.
#[derive(Debug, Serialize)]
pub struct IssueResponse {
    /// The minted token.
    pub token: DownloadToken,
    /// When the credential becomes void.
    pub expires_at: DateTime<Utc>,
}

/// Mint a download credential.
#[instrument(skip(state, request), fields(order_id = %request.order_id))]
pub async fn issue(
    State(state): State<AppState>,
    Json(request): Json<IssueRequest>,
) -> Result<(StatusCode, Json<IssueResponse>)> {
    // TimeDelta::seconds panics on out-of-range input; reject it as a bad ttl
    let ttl = TimeDelta::try_seconds(request.ttl_seconds).ok_or(IssueError::InvalidTtl)?;

    let token = state
        .issuer()
        .issue(request.order_id, request.asset_locator, request.max_uses, ttl)?;

    let expires_at = state
        .store()
        .get(&token)
        .map(|credential| credential.expires_at)
        .ok_or_else(|| AppError::Internal("issued credential vanished".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse { token, expires_at }),
    ))
}
