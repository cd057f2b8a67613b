//! Token redemption endpoint.
//!
//! `GET /downloads/{token}` consumes one use of the credential and delivers
//! the asset: local files stream back as attachments, URL locators redirect.
//! The use is consumed at `try_redeem` time, before any bytes move; a client
//! that disconnects mid-stream does not get it back.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use dropwire_core::DownloadToken;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::Result;
use crate::services::AssetContent;
use crate::state::AppState;

/// Redeem a download token.
#[instrument(skip(state))]
pub async fn redeem(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response> {
    let token = DownloadToken::from_string(token);

    // Atomic check-and-decrement; expected failures map to 404/403
    let locator = state.store().try_redeem(&token)?;
    tracing::info!(locator = %locator, "Redeemed download token");

    match state.assets().open(&locator).await? {
        AssetContent::Redirect(url) => Ok(Redirect::temporary(url.as_str()).into_response()),
        AssetContent::File {
            file,
            len,
            file_name,
        } => {
            let body = Body::from_stream(ReaderStream::new(file));
            let headers = [
                (
                    header::CONTENT_TYPE,
                    "application/octet-stream".to_string(),
                ),
                (header::CONTENT_LENGTH, len.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file_name}\""),
                ),
            ];
            Ok((headers, body).into_response())
        }
    }
}
