#![allow(dead_code)]
use bazaar_order_engine::{
    db_types::{LineItemRequest, PaymentMethod, ShippingAddress},
    events::EventProducers,
    order_objects::NewOrderRequest,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::OfflineProvider,
    OrderFlowApi,
    SqliteDatabase,
};
use bzr_common::Secret;
use chrono::Duration;

pub const TEST_SECRET: &str = "test-webhook-secret";

pub type TestApi = OrderFlowApi<SqliteDatabase, OfflineProvider>;

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub fn test_secret() -> Secret<String> {
    Secret::new(TEST_SECRET.to_string())
}

pub fn api_for(db: SqliteDatabase) -> TestApi {
    api_with_timeout(db, Duration::minutes(10))
}

pub fn api_with_timeout(db: SqliteDatabase, pending_timeout: Duration) -> TestApi {
    OrderFlowApi::new(
        db,
        OfflineProvider::new("bzr_test"),
        test_secret(),
        pending_timeout,
        EventProducers::default(),
    )
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Asha Rao".to_string(),
        mobile: "9000012345".to_string(),
        state: "Karnataka".to_string(),
        city: "Bengaluru".to_string(),
        pincode: "560001".to_string(),
        full_address: "12 MG Road, Bengaluru".to_string(),
    }
}

pub fn order_request(customer_id: &str, items: Vec<LineItemRequest>, method: PaymentMethod) -> NewOrderRequest {
    NewOrderRequest { customer_id: customer_id.to_string(), items, address: address(), payment_method: method }
}

pub fn item(product_id: i64, quantity: i64) -> LineItemRequest {
    LineItemRequest { product_id, variant_id: None, quantity }
}

pub fn variant_item(product_id: i64, variant_id: i64, quantity: i64) -> LineItemRequest {
    LineItemRequest { product_id, variant_id: Some(variant_id), quantity }
}
