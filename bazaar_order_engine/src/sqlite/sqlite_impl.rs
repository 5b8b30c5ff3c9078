//! `SqliteDatabase` is a concrete implementation of an order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the traits defined in the [`crate::traits`] module.
//!
//! Two rules hold everywhere in this file:
//! * A multi-step mutation runs inside a single transaction, so a failure partway through never leaves partial state
//!   behind (this is what discharges the all-or-nothing hold requirement).
//! * Stock decrements inside one transaction are applied in ascending [`StockKey`](crate::db_types::StockKey) order,
//!   so two concurrent multi-item holds can never wait on each other in opposite orders.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{catalog, new_pool, orders, reservations, stock};
use crate::{
    db_types::{
        LineItem,
        LineItemRequest,
        NewOrder,
        Order,
        OrderId,
        PaymentStatusType,
        PricedLineItem,
        ReservationTicket,
        StockHold,
        StockKey,
    },
    helpers::PaymentConfirmation,
    traits::{OrderGatewayDatabase, OrderGatewayError, OrderManagement, VerifiedPayment, VerifyOutcome},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, OrderGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_provider_ref(
        &self,
        provider_order_ref: &str,
    ) -> Result<Option<Order>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_provider_ref(provider_order_ref, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_line_items(&self, order: &Order) -> Result<Vec<LineItem>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_line_items(order.id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::fetch_orders_for_customer(customer_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::fetch_all_orders(&mut conn).await?;
        Ok(result)
    }
}

impl OrderGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn price_line_items(&self, items: &[LineItemRequest]) -> Result<Vec<PricedLineItem>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let mut priced = Vec::with_capacity(items.len());
        for item in items {
            let unit_price = catalog::resolve_unit_price(item, &mut conn).await?;
            priced.push(PricedLineItem {
                product_id: item.product_id,
                variant_id: item.variant_id,
                quantity: item.quantity,
                unit_price,
                line_total: unit_price * item.quantity,
            });
        }
        Ok(priced)
    }

    async fn place_order(&self, order: NewOrder) -> Result<(Order, ReservationTicket), OrderGatewayError> {
        let mut items = order.items.clone();
        items.sort_by_key(|i| i.stock_key());
        let mut tx = self.pool.begin().await?;
        // Decrements come first so the transaction's very first statement takes the write lock.
        for item in &items {
            stock::adjust(&item.stock_key(), -item.quantity, &mut tx).await?;
        }
        let record = orders::insert_order(&order, &mut tx).await?;
        orders::insert_line_items(record.id, &items, &mut tx).await?;
        reservations::record_holds(record.id, &items, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} placed; {} stock units held", record.order_id, items.len());
        let ticket = ReservationTicket::for_items(record.order_id.clone(), &items);
        Ok((record, ticket))
    }

    async fn attach_provider_ref(
        &self,
        order_id: &OrderId,
        provider_order_ref: &str,
    ) -> Result<Order, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::attach_provider_ref(order_id, provider_order_ref, &mut conn).await?;
        trace!("🗃️ Order {} linked to provider checkout [{provider_order_ref}]", order.order_id);
        Ok(order)
    }

    async fn confirm_paid_order(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerifiedPayment, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        if let Some(order) = orders::confirm_payment(confirmation, &mut conn).await? {
            debug!(
                "🗃️ Order {} marked as paid on confirmation [{}]",
                order.order_id, confirmation.provider_payment_ref
            );
            return Ok(VerifiedPayment { order, outcome: VerifyOutcome::Applied });
        }
        // The guard matched no row: the ref is unknown, the order is already paid, or it has been cancelled.
        let order = orders::fetch_order_by_provider_ref(&confirmation.provider_order_ref, &mut conn)
            .await?
            .ok_or_else(|| OrderGatewayError::ProviderRefNotFound(confirmation.provider_order_ref.clone()))?;
        let outcome = match order.payment_status {
            PaymentStatusType::Paid => VerifyOutcome::AlreadyPaid,
            _ => VerifyOutcome::OrderClosed,
        };
        Ok(VerifiedPayment { order, outcome })
    }

    async fn cancel_unpaid_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderGatewayError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::cancel_unpaid(order_id, &mut tx).await? else {
            // Guard lost: the order was paid (or already cancelled) before we got here. Nothing to release.
            return Ok(None);
        };
        let released = reservations::mark_released(order.id, &mut tx).await?;
        for hold in &released {
            stock::adjust(&hold.key, hold.quantity, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {} cancelled; {} holds released", order.order_id, released.len());
        Ok(Some(order))
    }

    async fn release_reservation(&self, order_id: &OrderId) -> Result<Vec<StockHold>, OrderGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderGatewayError::OrderNotFound(order_id.clone()))?;
        let released = reservations::mark_released(order.id, &mut tx).await?;
        for hold in &released {
            stock::adjust(&hold.key, hold.quantity, &mut tx).await?;
        }
        tx.commit().await?;
        if released.is_empty() {
            trace!("🗃️ Reservation for order {order_id} was already released. Nothing to do.");
        } else {
            debug!("🗃️ Released {} holds for order {order_id}", released.len());
        }
        Ok(released)
    }

    async fn expire_old_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>, OrderGatewayError> {
        let due = {
            let mut conn = self.pool.acquire().await?;
            orders::expired_pending(now, &mut conn).await?
        };
        let mut cancelled = Vec::with_capacity(due.len());
        // One transaction per order: a failure in one order's reconciliation must not affect the others.
        for order in due {
            match self.cancel_unpaid_order(&order.order_id).await {
                Ok(Some(order)) => {
                    debug!("🗃️ Unpaid order {} expired and was cancelled", order.order_id);
                    cancelled.push(order);
                },
                Ok(None) => {
                    trace!("🗃️ Order {} was settled before the sweep reached it", order.order_id);
                },
                Err(e) => {
                    error!("🗃️ Could not expire order {}: {e}. Continuing with the rest of the sweep.", order.order_id);
                },
            }
        }
        Ok(cancelled)
    }

    async fn adjust_stock(&self, key: &StockKey, delta: i64) -> Result<i64, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        stock::adjust(key, delta, &mut conn).await
    }

    async fn stock_on_hand(&self, key: &StockKey) -> Result<Option<i64>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        stock::on_hand(key, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), OrderGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
