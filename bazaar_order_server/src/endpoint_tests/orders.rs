use actix_web::http::StatusCode;
use bazaar_order_engine::{
    db_types::StockKey,
    events::EventProducers,
    test_utils::seed,
    traits::OrderGatewayDatabase,
};
use bzr_common::Money;

use super::helpers::{get_request, order_payload, post_request, test_config, test_db};
use crate::server::configure_services;

#[actix_web::test]
async fn create_cod_order_and_read_it_back() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let config = test_config();
    let product = seed::seed_product(db.pool(), "Steel Bottle", Money::from_rupees(299), None).await;
    seed::add_stock(&db, &StockKey::product(product), 10).await;

    let (status, body) = post_request(
        Some(("cust-1", "customer")),
        "/orders",
        &order_payload(product, 2, "CASH_ON_DELIVERY"),
        |cfg| configure_services(cfg, &config, db.clone(), EventProducers::default()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["order_status"], "CONFIRMED");
    assert_eq!(body["order"]["payment_status"], "PENDING");
    assert_eq!(body["order"]["customer_id"], "cust-1");
    assert_eq!(body["order"]["total_amount"], 59800);
    assert!(body.get("provider_order_ref").is_none());
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(8));

    let order_id = body["order"]["order_id"].as_str().unwrap().to_string();
    let (status, body) = get_request(Some(("cust-1", "customer")), &format!("/orders/{order_id}"), |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["order_id"], order_id.as_str());
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn orders_require_identity_headers() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let config = test_config();

    let (status, body) = post_request(None, "/orders", &order_payload(1, 1, "CASH_ON_DELIVERY"), |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("x-bzr-customer-id"));
}

#[actix_web::test]
async fn insufficient_stock_is_a_bad_request() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let config = test_config();
    let product = seed::seed_product(db.pool(), "Fountain Pen", Money::from_rupees(999), None).await;
    seed::add_stock(&db, &StockKey::product(product), 1).await;

    let (status, body) = post_request(
        Some(("cust-1", "customer")),
        "/orders",
        &order_payload(product, 2, "PROVIDER"),
        |cfg| configure_services(cfg, &config, db.clone(), EventProducers::default()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Insufficient stock"));
    // Nothing was reserved for the failed request.
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(1));
}

#[actix_web::test]
async fn unknown_products_are_not_found() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let config = test_config();

    let (status, _body) = post_request(
        Some(("cust-1", "customer")),
        "/orders",
        &order_payload(424242, 1, "CASH_ON_DELIVERY"),
        |cfg| configure_services(cfg, &config, db.clone(), EventProducers::default()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn customers_see_their_own_orders_and_admins_see_all() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let config = test_config();
    let product = seed::seed_product(db.pool(), "Diya Set", Money::from_rupees(150), None).await;
    seed::add_stock(&db, &StockKey::product(product), 10).await;

    for customer in ["cust-1", "cust-2"] {
        let (status, _) = post_request(
            Some((customer, "customer")),
            "/orders",
            &order_payload(product, 1, "CASH_ON_DELIVERY"),
            |cfg| configure_services(cfg, &config, db.clone(), EventProducers::default()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get_request(Some(("cust-1", "customer")), "/orders", |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["customer_id"], "cust-1");

    let (status, body) = get_request(Some(("ops-1", "admin")), "/orders", |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn order_detail_is_owner_scoped() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let config = test_config();
    let product = seed::seed_product(db.pool(), "Jute Bag", Money::from_rupees(180), None).await;
    seed::add_stock(&db, &StockKey::product(product), 5).await;

    let (status, body) = post_request(
        Some(("cust-1", "customer")),
        "/orders",
        &order_payload(product, 1, "CASH_ON_DELIVERY"),
        |cfg| configure_services(cfg, &config, db.clone(), EventProducers::default()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["order"]["order_id"].as_str().unwrap().to_string();

    let (status, _) = get_request(Some(("cust-2", "customer")), &format!("/orders/{order_id}"), |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = get_request(Some(("ops-1", "admin")), &format!("/orders/{order_id}"), |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_request(Some(("cust-1", "customer")), "/orders/ord-doesnotexist", |cfg| {
        configure_services(cfg, &config, db.clone(), EventProducers::default())
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
