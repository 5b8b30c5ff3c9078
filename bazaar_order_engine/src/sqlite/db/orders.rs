use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{LineItem, NewOrder, Order, OrderId, PricedLineItem},
    helpers::PaymentConfirmation,
    traits::OrderGatewayError,
};

/// Inserts a new order using the given connection. This is not atomic on its own. Embed the call inside a
/// transaction together with the stock decrements and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderGatewayError> {
    let (order_status, payment_status) = order.initial_statuses();
    let record: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                total_amount,
                currency,
                payment_method,
                order_status,
                payment_status,
                address,
                expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.customer_id)
    .bind(order.total_amount)
    .bind(bzr_common::CURRENCY_CODE)
    .bind(order.payment_method)
    .bind(order_status)
    .bind(payment_status)
    .bind(Json(order.address.clone()))
    .bind(order.expires_at)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order {} inserted with id {}", record.order_id, record.id);
    Ok(record)
}

pub async fn insert_line_items(
    order_pk: i64,
    items: &[PricedLineItem],
    conn: &mut SqliteConnection,
) -> Result<(), OrderGatewayError> {
    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, variant_id, quantity, unit_price, line_total) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order_pk)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await
}

pub async fn fetch_order_by_provider_ref(
    provider_order_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE provider_order_ref = $1")
        .bind(provider_order_ref)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_line_items(order_pk: i64, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_pk).fetch_all(conn).await
}

pub async fn fetch_orders_for_customer(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(customer_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_all_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC, id DESC").fetch_all(conn).await
}

pub async fn attach_provider_ref(
    order_id: &OrderId,
    provider_order_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderGatewayError> {
    let record: Option<Order> = sqlx::query_as(
        "UPDATE orders SET provider_order_ref = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 RETURNING *",
    )
    .bind(provider_order_ref)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    record.ok_or_else(|| OrderGatewayError::OrderNotFound(order_id.clone()))
}

/// The paid transition. The `payment_status = 'Created'` guard makes this a compare-and-swap: of any number of
/// concurrent confirmations (or a confirmation racing the expiry sweep), exactly one writer matches the row.
/// Clearing `expires_at` is what disarms the expiry sweep for this order.
pub async fn confirm_payment(
    confirmation: &PaymentConfirmation,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderGatewayError> {
    let record: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'Paid',
                order_status = 'Confirmed',
                provider_payment_ref = $1,
                provider_signature = $2,
                expires_at = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE provider_order_ref = $3 AND payment_status = 'Created'
            RETURNING *;
        "#,
    )
    .bind(&confirmation.provider_payment_ref)
    .bind(&confirmation.signature)
    .bind(&confirmation.provider_order_ref)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// The cancellation transition, guarded the same way as [`confirm_payment`]. Returns `None` when the order is no
/// longer awaiting payment, in which case the caller must not release anything.
pub async fn cancel_unpaid(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderGatewayError> {
    let record: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                order_status = 'Cancelled',
                payment_status = 'Failed',
                expires_at = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND payment_status = 'Created'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// Unpaid provider orders whose deadline has passed, oldest deadline first.
pub async fn expired_pending(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderGatewayError> {
    let rows = sqlx::query_as(
        "SELECT * FROM orders WHERE payment_status = 'Created' AND expires_at IS NOT NULL AND expires_at <= $1 \
         ORDER BY expires_at ASC",
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
