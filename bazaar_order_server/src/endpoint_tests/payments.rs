use actix_web::http::StatusCode;
use bazaar_order_engine::{
    db_types::StockKey,
    events::EventProducers,
    helpers::sign_confirmation,
    test_utils::seed,
    traits::OrderGatewayDatabase,
};
use bzr_common::{Money, Secret};
use chrono::{Duration, Utc};
use serde_json::json;

use super::helpers::{order_payload, post_request, test_config, test_db, TEST_SECRET};
use crate::server::{configure_services, order_api};

fn secret() -> Secret<String> {
    Secret::new(TEST_SECRET.to_string())
}

#[actix_web::test]
async fn a_signed_confirmation_settles_the_order_exactly_once() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let config = test_config();
    let product = seed::seed_product(db.pool(), "Brass Lamp", Money::from_rupees(1200), None).await;
    seed::add_stock(&db, &StockKey::product(product), 4).await;

    let (status, body) = post_request(
        Some(("cust-1", "customer")),
        "/orders",
        &order_payload(product, 1, "PROVIDER"),
        |cfg| configure_services(cfg, &config, db.clone(), EventProducers::default()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["order_status"], "PENDING");
    let provider_ref = body["provider_order_ref"].as_str().unwrap().to_string();

    let signature = sign_confirmation(&provider_ref, "pay_001", &secret());
    let confirmation = json!({
        "provider_order_ref": provider_ref,
        "provider_payment_ref": "pay_001",
        "signature": signature,
    });

    let (status, body) = post_request(None, "/payments/verify", &confirmation, |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "applied");
    assert_eq!(body["order"]["order_status"], "CONFIRMED");
    assert_eq!(body["order"]["payment_status"], "PAID");

    // The provider retries its webhook; the duplicate must not double-apply.
    let (status, body) = post_request(None, "/payments/verify", &confirmation, |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "already_paid");
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(3));
}

#[actix_web::test]
async fn a_forged_confirmation_is_rejected_and_changes_nothing() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let config = test_config();
    let product = seed::seed_product(db.pool(), "Silk Scarf", Money::from_rupees(2100), None).await;
    seed::add_stock(&db, &StockKey::product(product), 2).await;

    let (status, body) = post_request(
        Some(("cust-1", "customer")),
        "/orders",
        &order_payload(product, 1, "PROVIDER"),
        |cfg| configure_services(cfg, &config, db.clone(), EventProducers::default()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let provider_ref = body["provider_order_ref"].as_str().unwrap().to_string();

    let forged = json!({
        "provider_order_ref": provider_ref,
        "provider_payment_ref": "pay_999",
        "signature": "deadbeef".repeat(8),
    });
    let (status, body) = post_request(None, "/payments/verify", &forged, |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("signature"));

    // Still pending: the forged callback must not have touched the order.
    let order = {
        use bazaar_order_engine::traits::OrderManagement;
        db.fetch_order_by_provider_ref(&provider_ref).await.unwrap().unwrap()
    };
    assert_eq!(order.provider_payment_ref, None);
}

#[actix_web::test]
async fn confirmations_for_unknown_checkouts_are_not_found() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let config = test_config();
    let signature = sign_confirmation("bzr_test_missing", "pay_001", &secret());
    let confirmation = json!({
        "provider_order_ref": "bzr_test_missing",
        "provider_payment_ref": "pay_001",
        "signature": signature,
    });
    let (status, _) = post_request(None, "/payments/verify", &confirmation, |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn a_confirmation_after_expiry_is_reported_as_closed() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let mut config = test_config();
    // Orders lapse immediately, standing in for a customer who abandons checkout.
    config.pending_order_timeout = Duration::zero();
    let product = seed::seed_product(db.pool(), "Copper Jug", Money::from_rupees(640), None).await;
    seed::add_stock(&db, &StockKey::product(product), 6).await;

    let (status, body) = post_request(
        Some(("cust-1", "customer")),
        "/orders",
        &order_payload(product, 4, "PROVIDER"),
        |cfg| configure_services(cfg, &config, db.clone(), EventProducers::default()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let provider_ref = body["provider_order_ref"].as_str().unwrap().to_string();

    // Run the sweep the expiry worker would run.
    let api = order_api(&config, db.clone(), EventProducers::default());
    let cancelled = api.expire_old_orders(Utc::now() + Duration::seconds(1)).await.unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(6));

    let signature = sign_confirmation(&provider_ref, "pay_late", &secret());
    let confirmation = json!({
        "provider_order_ref": provider_ref,
        "provider_payment_ref": "pay_late",
        "signature": signature,
    });
    let (status, body) = post_request(None, "/payments/verify", &confirmation, |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "order_closed");
    assert_eq!(body["order"]["order_status"], "CANCELLED");
    // The late confirmation must not have resurrected the stock hold.
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(6));
}
