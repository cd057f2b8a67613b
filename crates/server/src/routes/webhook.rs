//! Order-created webhook intake.
//!
//! The commerce platform calls this for every new order. The flow:
//! resolve the owning tenant from the shop-domain header, map each line item
//! to an asset locator, mint one credential per resolved item, record it in
//! the delivery log, then email the customer a link to their delivery page.
//!
//! Line items are credentialed independently: one resolver failure never
//! aborts the rest of the order. A failed notification is logged and does
//! not revoke anything; the delivery page stays reachable.

use askama::Template;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use dropwire_core::{Email, OrderRef, ProductRef};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::fulfillment::DeliveryItem;
use crate::services::Tenant;
use crate::state::AppState;

/// Header carrying the shop domain on platform webhooks (Shopify convention).
pub const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";

/// An order identifier as platforms actually send it: number or string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawOrderId {
    Number(u64),
    Text(String),
}

impl From<RawOrderId> for OrderRef {
    fn from(raw: RawOrderId) -> Self {
        match raw {
            RawOrderId::Number(n) => Self::new(n.to_string()),
            RawOrderId::Text(s) => Self::new(s),
        }
    }
}

/// One purchased line item.
#[derive(Debug, Deserialize)]
pub struct LineItem {
    /// Product reference used for catalog lookup (Shopify sends `sku`).
    #[serde(alias = "sku")]
    pub product_ref: ProductRef,
    /// Human-readable title for the delivery page.
    pub title: String,
}

/// Order-created webhook payload.
#[derive(Debug, Deserialize)]
pub struct OrderCreated {
    /// Platform order identifier.
    pub id: RawOrderId,
    /// Buyer email, if the platform shared one.
    pub email: Option<String>,
    /// Purchased line items, in order.
    pub line_items: Vec<LineItem>,
}

/// HTML template for the delivery email.
#[derive(Template)]
#[template(path = "email/delivery.html")]
struct DeliveryEmailHtml<'a> {
    shop_name: &'a str,
    delivery_url: &'a str,
}

/// Plain text template for the delivery email.
#[derive(Template)]
#[template(path = "email/delivery.txt")]
struct DeliveryEmailText<'a> {
    shop_name: &'a str,
    delivery_url: &'a str,
}

/// Handle an order-created webhook.
#[instrument(skip(state, headers, payload))]
pub async fn order_created(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OrderCreated>,
) -> Result<StatusCode> {
    let domain = headers
        .get(SHOP_DOMAIN_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(format!("missing {SHOP_DOMAIN_HEADER} header")))?;

    let tenant = state
        .tenants()
        .lookup_by_domain(domain)
        .await
        .ok_or_else(|| AppError::NotFound(format!("unknown shop domain {domain}")))?;

    let order_id = OrderRef::from(payload.id);
    tracing::info!(
        order_id = %order_id,
        tenant = %tenant.domain,
        line_items = payload.line_items.len(),
        "Received new order"
    );

    let issued = fulfill_line_items(&state, &tenant, &order_id, &payload.line_items).await;

    if issued > 0 {
        notify_customer(&state, &tenant, &order_id, payload.email.as_deref()).await;
    } else {
        tracing::info!(order_id = %order_id, "Order has no digital goods, nothing to deliver");
    }

    Ok(StatusCode::OK)
}

/// Resolve and credential each line item independently.
///
/// Returns the number of credentials issued. Items without a digital asset
/// are skipped; resolver or issuance failures are logged and do not affect
/// the other items.
async fn fulfill_line_items(
    state: &AppState,
    tenant: &Tenant,
    order_id: &OrderRef,
    line_items: &[LineItem],
) -> usize {
    let config = state.config();
    let mut issued = 0;

    for item in line_items {
        let locator = match state.catalog().resolve(tenant, &item.product_ref).await {
            Ok(Some(locator)) => locator,
            Ok(None) => {
                tracing::debug!(product_ref = %item.product_ref, "No digital asset for line item");
                continue;
            }
            Err(e) => {
                tracing::warn!(
                    product_ref = %item.product_ref,
                    error = %e,
                    "Catalog resolution failed, skipping line item"
                );
                continue;
            }
        };

        match state.issuer().issue(
            order_id.clone(),
            locator,
            config.download_max_uses,
            config.download_ttl,
        ) {
            Ok(token) => {
                state.deliveries().record_delivery(
                    order_id.clone(),
                    DeliveryItem {
                        product_ref: item.product_ref.clone(),
                        title: item.title.clone(),
                        token,
                    },
                );
                issued += 1;
            }
            Err(e) => {
                tracing::error!(
                    product_ref = %item.product_ref,
                    error = %e,
                    "Credential issuance failed for line item"
                );
            }
        }
    }

    issued
}

/// Email the customer their delivery-page link.
///
/// Failures are logged only: the credentials stay valid and the delivery
/// page remains the recovery path.
async fn notify_customer(
    state: &AppState,
    tenant: &Tenant,
    order_id: &OrderRef,
    email: Option<&str>,
) {
    let Some(raw) = email else {
        tracing::warn!(order_id = %order_id, "Order has no customer email, skipping notification");
        return;
    };

    let recipient = match Email::parse(raw) {
        Ok(recipient) => recipient,
        Err(e) => {
            tracing::warn!(order_id = %order_id, error = %e, "Invalid customer email, skipping notification");
            return;
        }
    };

    let delivery_url = state.config().delivery_page_url(order_id.as_str());
    let subject = format!("Your {} downloads are ready", tenant.name);

    let rendered = DeliveryEmailHtml {
        shop_name: &tenant.name,
        delivery_url: &delivery_url,
    }
    .render()
    .and_then(|html| {
        DeliveryEmailText {
            shop_name: &tenant.name,
            delivery_url: &delivery_url,
        }
        .render()
        .map(|text| (text, html))
    });

    let (text, html) = match rendered {
        Ok(bodies) => bodies,
        Err(e) => {
            tracing::error!(order_id = %order_id, error = %e, "Failed to render delivery email");
            return;
        }
    };

    if let Err(e) = state
        .notifier()
        .notify(&recipient, &subject, &text, &html)
        .await
    {
        tracing::error!(
            order_id = %order_id,
            error = %e,
            "Failed to send delivery email; credentials remain valid"
        );
    }
}
