//! Catalog and stock seeding for tests. Catalog CRUD is owned by the admin surface in production, so these helpers
//! write the tables directly.
use bzr_common::Money;
use sqlx::SqlitePool;

use crate::{db_types::StockKey, traits::OrderGatewayDatabase, SqliteDatabase};

pub async fn seed_product(pool: &SqlitePool, name: &str, base_price: Money, offer_price: Option<Money>) -> i64 {
    sqlx::query_scalar("INSERT INTO products (name, base_price, offer_price) VALUES ($1, $2, $3) RETURNING id")
        .bind(name)
        .bind(base_price)
        .bind(offer_price)
        .fetch_one(pool)
        .await
        .expect("Error seeding product")
}

pub async fn seed_variant(pool: &SqlitePool, product_id: i64, label: &str, price: Option<Money>) -> i64 {
    sqlx::query_scalar("INSERT INTO variants (product_id, label, price) VALUES ($1, $2, $3) RETURNING id")
        .bind(product_id)
        .bind(label)
        .bind(price)
        .fetch_one(pool)
        .await
        .expect("Error seeding variant")
}

pub async fn add_stock(db: &SqliteDatabase, key: &StockKey, quantity: i64) -> i64 {
    db.adjust_stock(key, quantity).await.expect("Error seeding stock")
}
