use bazaar_order_engine::db_types::{LineItemRequest, PaymentMethod, ShippingAddress};
use serde::Deserialize;

/// The order-placement payload. The customer id is not part of the body; it comes from the perimeter-injected
/// identity headers, so a customer can only ever place orders as themselves.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<LineItemRequest>,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
}
