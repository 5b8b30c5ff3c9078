//! Read-only catalog lookups. Price resolution follows the storefront rule: the variant price wins if the requested
//! variant carries one, then the product offer price, then the product base price.
use bzr_common::Money;
use sqlx::SqliteConnection;

use crate::{db_types::LineItemRequest, traits::OrderGatewayError};

pub async fn resolve_unit_price(
    item: &LineItemRequest,
    conn: &mut SqliteConnection,
) -> Result<Money, OrderGatewayError> {
    let product: Option<(Money, Option<Money>)> =
        sqlx::query_as("SELECT base_price, offer_price FROM products WHERE id = $1 AND is_active = 1")
            .bind(item.product_id)
            .fetch_optional(&mut *conn)
            .await?;
    let (base_price, offer_price) = product.ok_or(OrderGatewayError::ProductNotFound(item.product_id))?;
    let variant_price = match item.variant_id {
        Some(variant_id) => {
            let price: Option<Option<Money>> =
                sqlx::query_scalar("SELECT price FROM variants WHERE id = $1 AND product_id = $2")
                    .bind(variant_id)
                    .bind(item.product_id)
                    .fetch_optional(&mut *conn)
                    .await?;
            price.ok_or(OrderGatewayError::VariantNotFound { product_id: item.product_id, variant_id })?
        },
        None => None,
    };
    Ok(variant_price.or(offer_price).unwrap_or(base_price))
}
