//! Delivery page.
//!
//! `GET /orders/{order_id}/downloads` renders the order's download links.
//! The page is idempotent and pollable: it reflects whatever the delivery
//! log holds at read time, so a customer whose email never arrived can still
//! be pointed here.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use dropwire_core::OrderRef;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// One download link on the delivery page.
pub struct DeliveryLinkView {
    /// Product title as sold.
    pub title: String,
    /// Absolute redemption URL.
    pub url: String,
}

/// Delivery page template.
#[derive(Template, WebTemplate)]
#[template(path = "delivery.html")]
pub struct DeliveryPageTemplate {
    /// Order reference shown in the heading.
    pub order_id: String,
    /// Download links, in line-item order.
    pub items: Vec<DeliveryLinkView>,
}

/// Display the delivery page for an order.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<DeliveryPageTemplate> {
    let order = OrderRef::new(order_id);
    let record = state
        .deliveries()
        .render(&order)
        .ok_or_else(|| AppError::NotFound(format!("order {order}")))?;

    let items = record
        .into_iter()
        .map(|item| DeliveryLinkView {
            title: item.title,
            url: state.config().download_url(item.token.as_str()),
        })
        .collect();

    Ok(DeliveryPageTemplate {
        order_id: order.into_inner(),
        items,
    })
}
