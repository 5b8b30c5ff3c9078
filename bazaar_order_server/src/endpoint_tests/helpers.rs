use actix_web::{http::StatusCode, test, web, App};
use bazaar_order_engine::{
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    SqliteDatabase,
};
use bzr_common::Secret;
use serde::Serialize;
use serde_json::Value;

use crate::{
    auth::{CUSTOMER_ID_HEADER, ROLE_HEADER},
    config::{ProviderConfig, ServerConfig},
};

pub const TEST_SECRET: &str = "test-webhook-secret";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        provider: ProviderConfig {
            hmac_secret: Secret::new(TEST_SECRET.to_string()),
            ref_prefix: "bzr_test".to_string(),
        },
        ..Default::default()
    }
}

pub async fn test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database")
}

/// Fire a GET at a freshly configured app and return the status with the JSON body (Null if the body is not JSON).
pub async fn get_request<F>(auth: Option<(&str, &str)>, path: &str, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut web::ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    let mut req = test::TestRequest::get().uri(path);
    if let Some((customer_id, role)) = auth {
        req = req.insert_header((CUSTOMER_ID_HEADER, customer_id)).insert_header((ROLE_HEADER, role));
    }
    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub async fn post_request<F, T>(auth: Option<(&str, &str)>, path: &str, payload: &T, configure: F) -> (StatusCode, Value)
where
    F: FnOnce(&mut web::ServiceConfig),
    T: Serialize,
{
    let app = test::init_service(App::new().configure(configure)).await;
    let mut req = test::TestRequest::post().uri(path).set_json(payload);
    if let Some((customer_id, role)) = auth {
        req = req.insert_header((CUSTOMER_ID_HEADER, customer_id)).insert_header((ROLE_HEADER, role));
    }
    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub fn order_payload(product_id: i64, quantity: i64, payment_method: &str) -> Value {
    serde_json::json!({
        "items": [{ "product_id": product_id, "quantity": quantity }],
        "address": {
            "name": "Asha Rao",
            "mobile": "9000012345",
            "state": "Karnataka",
            "city": "Bengaluru",
            "pincode": "560001",
            "full_address": "12 MG Road, Bengaluru"
        },
        "payment_method": payment_method
    })
}
