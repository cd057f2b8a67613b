//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures unexpected errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Redemption outcomes (`NotFound`/`Expired`/`Exhausted`) are expected
//! end-user results, not exceptions: they map to stable status codes and are
//! never reported to Sentry.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::fulfillment::{IssueError, RedeemError};
use crate::services::{AssetError, CatalogError, NotifyError};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A redemption attempt failed in one of the expected ways.
    #[error("Redemption failed: {0}")]
    Redeem(#[from] RedeemError),

    /// Credential issuance was given bad parameters.
    #[error("Issuance rejected: {0}")]
    Issue(#[from] IssueError),

    /// The asset behind a successfully redeemed credential failed to open.
    #[error("Asset source error: {0}")]
    Asset(#[from] AssetError),

    /// The catalog resolver failed outright.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The notifier failed to deliver.
    #[error("Notifier error: {0}")]
    Notify(#[from] NotifyError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Redeem(err) => match err {
                RedeemError::NotFound => StatusCode::NOT_FOUND,
                RedeemError::Expired | RedeemError::Exhausted => StatusCode::FORBIDDEN,
            },
            Self::Issue(err) => match err {
                IssueError::InvalidMaxUses | IssueError::InvalidTtl => StatusCode::BAD_REQUEST,
                IssueError::TokenCollision(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Asset(_) | Self::Catalog(_) | Self::Notify(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            // Texts are part of the customer-facing contract
            Self::Redeem(err) => match err {
                RedeemError::NotFound => "Invalid download link.".to_string(),
                RedeemError::Expired => "Download link expired.".to_string(),
                RedeemError::Exhausted => "Download limit exceeded.".to_string(),
            },
            Self::Issue(err) => match err {
                IssueError::InvalidMaxUses | IssueError::InvalidTtl => err.to_string(),
                IssueError::TokenCollision(_) => "Internal server error".to_string(),
            },
            Self::NotFound(msg) => format!("Not found: {msg}"),
            Self::BadRequest(msg) => format!("Bad request: {msg}"),
            // Don't expose internal error details to clients
            Self::Asset(_) | Self::Catalog(_) | Self::Notify(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture unexpected server-side failures to Sentry
        if matches!(
            self,
            Self::Asset(_)
                | Self::Catalog(_)
                | Self::Notify(_)
                | Self::Internal(_)
                | Self::Issue(IssueError::TokenCollision(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_redemption_status_codes() {
        assert_eq!(
            get_status(AppError::Redeem(RedeemError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Redeem(RedeemError::Expired)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Redeem(RedeemError::Exhausted)),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_issue_status_codes() {
        assert_eq!(
            get_status(AppError::Issue(IssueError::InvalidMaxUses)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Issue(IssueError::InvalidTtl)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_generic_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("order".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_customer_facing_messages() {
        assert_eq!(
            AppError::Redeem(RedeemError::NotFound).message(),
            "Invalid download link."
        );
        assert_eq!(
            AppError::Redeem(RedeemError::Expired).message(),
            "Download link expired."
        );
        assert_eq!(
            AppError::Redeem(RedeemError::Exhausted).message(),
            "Download limit exceeded."
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("connection pool exploded".to_string());
        assert_eq!(err.message(), "Internal server error");
    }
}
