//! Per-order delivery record index.
//!
//! While an order's line items are being credentialed, each issued token is
//! appended here under the order reference. The delivery page renders this
//! record; the email notification only carries a link to that page, so a
//! customer who never receives the email can still be sent the page URL by
//! support.
//!
//! Purely additive: records are appended during webhook processing and read
//! afterwards, never removed. Reads see every append that happened before
//! them (read-your-writes within the process).

use std::collections::HashMap;
use std::sync::RwLock;

use dropwire_core::{DownloadToken, OrderRef, ProductRef};

/// One deliverable line item: the product and the token that unlocks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryItem {
    /// Product reference as received from the commerce platform.
    pub product_ref: ProductRef,
    /// Human-readable title for the delivery page.
    pub title: String,
    /// Token redeemable for the product's asset.
    pub token: DownloadToken,
}

/// Order → issued-credential index backing the delivery page.
#[derive(Debug, Default)]
pub struct DeliveryLog {
    records: RwLock<HashMap<OrderRef, Vec<DeliveryItem>>>,
}

impl DeliveryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an issued credential to `order_id`'s record.
    ///
    /// Items render in the order they were recorded, which matches the order
    /// of line items in the originating webhook.
    pub fn record_delivery(&self, order_id: OrderRef, item: DeliveryItem) {
        let mut records = self.records.write().expect("delivery log poisoned");
        records.entry(order_id).or_default().push(item);
    }

    /// Snapshot the delivery record for `order_id`.
    ///
    /// Returns `None` when no credential was ever recorded for the order;
    /// an empty record is indistinguishable from an unknown one.
    #[must_use]
    pub fn render(&self, order_id: &OrderRef) -> Option<Vec<DeliveryItem>> {
        let records = self.records.read().expect("delivery log poisoned");
        records.get(order_id).cloned()
    }
}
