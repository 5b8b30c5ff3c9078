use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{
        LineItemRequest,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        PricedLineItem,
        ReservationTicket,
        StockHold,
        StockKey,
    },
    helpers::PaymentConfirmation,
    traits::{OrderManagement, VerifiedPayment},
};

/// The behaviour a storage backend must provide to run the order placement and payment reconciliation flows.
///
/// This behaviour includes:
/// * Resolving catalog prices for incoming line items.
/// * Holding and releasing stock with all-or-nothing semantics.
/// * Persisting orders and driving their state machine through guarded, idempotent transitions.
/// * Sweeping expired unpaid orders back to a terminal state.
#[allow(async_fn_in_trait)]
pub trait OrderGatewayDatabase: Clone + OrderManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Resolve the unit price for each requested line item (variant price if a variant is given and priced, else the
    /// product offer price, else the product base price) and compute line totals. Fails with `ProductNotFound` or
    /// `VariantNotFound` for unknown ids. No state is modified.
    async fn price_line_items(&self, items: &[LineItemRequest]) -> Result<Vec<PricedLineItem>, OrderGatewayError>;

    /// In a single atomic transaction: decrement stock for every line item (in ascending [`StockKey`] order), insert
    /// the order, its line items, and its reservation rows.
    ///
    /// If any decrement fails, the whole transaction rolls back and no partial reservation is ever visible to other
    /// callers. Returns the persisted order and the reservation ticket that was recorded for it.
    async fn place_order(&self, order: NewOrder) -> Result<(Order, ReservationTicket), OrderGatewayError>;

    /// Store the checkout reference returned by the payment provider on the order.
    async fn attach_provider_ref(
        &self,
        order_id: &OrderId,
        provider_order_ref: &str,
    ) -> Result<Order, OrderGatewayError>;

    /// Apply a verified payment confirmation to the matching order.
    ///
    /// The transition is a guarded update (`payment_status = 'Created'`), so exactly one of any number of concurrent
    /// writers can apply it. Duplicate confirmations report [`VerifyOutcome::AlreadyPaid`]; confirmations for orders
    /// the expiry sweep already cancelled report [`VerifyOutcome::OrderClosed`] and change nothing.
    ///
    /// The caller is responsible for having checked the signature first.
    async fn confirm_paid_order(&self, confirmation: &PaymentConfirmation) -> Result<VerifiedPayment, OrderGatewayError>;

    /// Cancel an order whose payment is still outstanding and release its reservation, atomically.
    ///
    /// Returns `None` when the guard was lost (the order is no longer awaiting payment), leaving state untouched.
    async fn cancel_unpaid_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderGatewayError>;

    /// Release the reservation recorded for the order, restoring stock for every hold that has not been released yet.
    ///
    /// Idempotent: holds are flagged as released under a guard, so a second call (or a release racing the expiry
    /// sweep) restores nothing. Returns the holds that were actually restored by this call.
    async fn release_reservation(&self, order_id: &OrderId) -> Result<Vec<StockHold>, OrderGatewayError>;

    /// Cancel every order whose payment deadline has passed while its payment is still outstanding.
    ///
    /// Each order is resolved in its own transaction so one order's failure cannot affect the others. Returns the
    /// orders that were cancelled by this sweep.
    async fn expire_old_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>, OrderGatewayError>;

    /// Adjust the stock level of a single unit. A negative delta is rejected with `InsufficientStock` if it would
    /// take the level below zero; a positive delta always succeeds, creating the ledger row if needed.
    /// Returns the new level.
    async fn adjust_stock(&self, key: &StockKey, delta: i64) -> Result<i64, OrderGatewayError>;

    /// The current stock level of the unit, or `None` if the ledger has no row for it.
    async fn stock_on_hand(&self, key: &StockKey) -> Result<Option<i64>, OrderGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderGatewayError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Insufficient stock for unit {0}")]
    InsufficientStock(StockKey),
    #[error("Product {0} does not exist or is inactive")]
    ProductNotFound(i64),
    #[error("Variant {variant_id} does not exist on product {product_id}")]
    VariantNotFound { product_id: i64, variant_id: i64 },
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("No order matches provider reference [{0}]")]
    ProviderRefNotFound(String),
    #[error("Payment confirmation signature does not match the payload")]
    SignatureMismatch,
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidStateTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("An order must contain at least one line item")]
    EmptyOrder,
    #[error("Line item quantity must be positive, got {0}")]
    InvalidQuantity(i64),
    #[error("The payment provider could not create a checkout. {0}")]
    ProviderUnavailable(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
}

impl From<sqlx::Error> for OrderGatewayError {
    fn from(e: sqlx::Error) -> Self {
        OrderGatewayError::DatabaseError(e.to_string())
    }
}
