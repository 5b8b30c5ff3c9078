//! The stock ledger.
//!
//! Every mutation of a stock level goes through [`adjust`]. There is deliberately no "read then write" path here:
//! each adjustment is one conditional SQL statement, so SQLite serialises adjustments per unit and the
//! `available >= 0` invariant cannot be violated by interleaving.
use log::trace;
use sqlx::SqliteConnection;

use crate::{db_types::StockKey, traits::OrderGatewayError};

/// Adjust the stock level of a single unit and return the new level.
///
/// A negative delta is a hold: it only applies if enough stock is available, otherwise the unit is left untouched
/// and `InsufficientStock` is returned. A positive delta is a restock or a release and always succeeds, creating the
/// ledger row if it does not exist yet.
pub async fn adjust(key: &StockKey, delta: i64, conn: &mut SqliteConnection) -> Result<i64, OrderGatewayError> {
    if delta >= 0 {
        let new_level: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO stock_levels (product_id, variant_id, available) VALUES ($1, $2, $3)
            ON CONFLICT (product_id, variant_id)
            DO UPDATE SET available = available + excluded.available, updated_at = CURRENT_TIMESTAMP
            RETURNING available
            "#,
        )
        .bind(key.product_id)
        .bind(key.variant_slot())
        .bind(delta)
        .fetch_one(conn)
        .await?;
        trace!("🗃️ Stock unit {key} adjusted by +{delta} to {new_level}");
        Ok(new_level)
    } else {
        let quantity = -delta;
        let new_level: Option<i64> = sqlx::query_scalar(
            "UPDATE stock_levels SET available = available - $1, updated_at = CURRENT_TIMESTAMP \
             WHERE product_id = $2 AND variant_id = $3 AND available >= $1 RETURNING available",
        )
        .bind(quantity)
        .bind(key.product_id)
        .bind(key.variant_slot())
        .fetch_optional(conn)
        .await?;
        match new_level {
            Some(level) => {
                trace!("🗃️ Stock unit {key} adjusted by {delta} to {level}");
                Ok(level)
            },
            None => Err(OrderGatewayError::InsufficientStock(*key)),
        }
    }
}

/// The current level of the unit, or `None` if the ledger has never seen it.
pub async fn on_hand(key: &StockKey, conn: &mut SqliteConnection) -> Result<Option<i64>, OrderGatewayError> {
    let level = sqlx::query_scalar("SELECT available FROM stock_levels WHERE product_id = $1 AND variant_id = $2")
        .bind(key.product_id)
        .bind(key.variant_slot())
        .fetch_optional(conn)
        .await?;
    Ok(level)
}
