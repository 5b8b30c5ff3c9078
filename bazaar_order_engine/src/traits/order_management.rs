use crate::{
    db_types::{LineItem, Order, OrderId},
    traits::OrderGatewayError,
};

/// Read-only order queries. These back the pass-through order endpoints and are deliberately free of side effects.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Fetch an order by its public order id.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderGatewayError>;

    /// Fetch the order associated with the given provider checkout reference.
    async fn fetch_order_by_provider_ref(&self, provider_order_ref: &str)
        -> Result<Option<Order>, OrderGatewayError>;

    /// Fetch the immutable line items recorded for the order.
    async fn fetch_line_items(&self, order: &Order) -> Result<Vec<LineItem>, OrderGatewayError>;

    /// All orders placed by the given customer, newest first.
    async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderGatewayError>;

    /// Every order in the store, newest first. Admin surface only.
    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderGatewayError>;
}
