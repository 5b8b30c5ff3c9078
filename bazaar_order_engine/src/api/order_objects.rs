use serde::{Deserialize, Serialize};

use crate::db_types::{LineItem, LineItemRequest, Order, PaymentMethod, ShippingAddress};

/// An incoming order as submitted by a customer. Prices are deliberately absent; the catalog is the only price
/// authority.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderRequest {
    pub customer_id: String,
    pub items: Vec<LineItemRequest>,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// The result of a successful order placement.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<LineItem>,
    /// The provider checkout reference the customer completes payment against. Absent for cash-on-delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_order_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<LineItem>,
}
