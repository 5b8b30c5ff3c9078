use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{PricedLineItem, StockHold, StockKey},
    traits::OrderGatewayError,
};

#[derive(Debug, FromRow)]
struct ReleasedRow {
    product_id: i64,
    variant_id: Option<i64>,
    quantity: i64,
}

pub async fn record_holds(
    order_pk: i64,
    items: &[PricedLineItem],
    conn: &mut SqliteConnection,
) -> Result<(), OrderGatewayError> {
    for item in items {
        sqlx::query("INSERT INTO reservations (order_id, product_id, variant_id, quantity) VALUES ($1, $2, $3, $4)")
            .bind(order_pk)
            .bind(item.product_id)
            .bind(item.variant_id)
            .bind(item.quantity)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Flag every unreleased hold of the order as released and return them. The `released_at IS NULL` guard means a
/// second call returns an empty list, which is what makes release idempotent.
pub async fn mark_released(order_pk: i64, conn: &mut SqliteConnection) -> Result<Vec<StockHold>, OrderGatewayError> {
    let rows: Vec<ReleasedRow> = sqlx::query_as(
        "UPDATE reservations SET released_at = CURRENT_TIMESTAMP \
         WHERE order_id = $1 AND released_at IS NULL RETURNING product_id, variant_id, quantity",
    )
    .bind(order_pk)
    .fetch_all(conn)
    .await?;
    let holds = rows
        .into_iter()
        .map(|r| StockHold {
            key: StockKey { product_id: r.product_id, variant_id: r.variant_id },
            quantity: r.quantity,
        })
        .collect();
    Ok(holds)
}
