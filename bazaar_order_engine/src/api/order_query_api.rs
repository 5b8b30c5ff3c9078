use crate::{
    api::order_objects::OrderWithItems,
    db_types::{Order, OrderId},
    traits::{OrderGatewayError, OrderManagement},
};

/// Read-only order queries backing the pass-through endpoints.
#[derive(Debug, Clone)]
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> OrderQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderGatewayError> {
        self.db.fetch_orders_for_customer(customer_id).await
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>, OrderGatewayError> {
        self.db.fetch_all_orders().await
    }

    pub async fn order_with_items(&self, order_id: &OrderId) -> Result<Option<OrderWithItems>, OrderGatewayError> {
        let Some(order) = self.db.fetch_order_by_order_id(order_id).await? else {
            return Ok(None);
        };
        let items = self.db.fetch_line_items(&order).await?;
        Ok(Some(OrderWithItems { order, items }))
    }
}
