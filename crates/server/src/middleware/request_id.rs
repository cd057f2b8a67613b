//! Request correlation middleware.
//!
//! Every request gets an ID (honoring one supplied by an upstream proxy) that
//! is recorded in the tracing span, tagged on the Sentry scope, and echoed in
//! the response. Webhook requests additionally tag the sending shop's domain,
//! so errors in Sentry group per tenant.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

use crate::routes::webhook::SHOP_DOMAIN_HEADER;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Ensure every request has a request ID and correlation tags.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let shop_domain = request
        .headers()
        .get(SHOP_DOMAIN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
        if let Some(domain) = &shop_domain {
            scope.set_tag("shop_domain", domain);
        }
    });

    let mut response = next.run(request).await;

    // Echo the ID so support can correlate a customer report with logs
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
