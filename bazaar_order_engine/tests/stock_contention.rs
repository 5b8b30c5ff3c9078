//! Concurrency properties of the stock ledger: no oversell under racing holds, deterministic multi-item ordering,
//! and idempotent release.
mod support;

use std::sync::Arc;

use bazaar_order_engine::{
    db_types::{PaymentMethod, StockKey},
    test_utils::seed,
    traits::{OrderGatewayDatabase, OrderGatewayError},
};
use bzr_common::Money;
use support::{api_for, item, new_test_db, order_request};

#[tokio::test]
async fn two_holds_racing_for_the_last_unit() {
    let db = new_test_db().await;
    let product = seed::seed_product(db.pool(), "Limited Print", Money::from_rupees(4500), None).await;
    seed::add_stock(&db, &StockKey::product(product), 1).await;
    let api = Arc::new(api_for(db.clone()));

    let a = Arc::clone(&api);
    let b = Arc::clone(&api);
    let req_a = order_request("cust-a", vec![item(product, 1)], PaymentMethod::CashOnDelivery);
    let req_b = order_request("cust-b", vec![item(product, 1)], PaymentMethod::CashOnDelivery);
    let task_a = tokio::spawn(async move { a.process_new_order(req_a).await });
    let task_b = tokio::spawn(async move { b.process_new_order(req_b).await });
    let results = [task_a.await.unwrap(), task_b.await.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of the racing holds may win the last unit");
    let failure = results.iter().find(|r| r.is_err()).unwrap().as_ref().unwrap_err();
    assert!(matches!(failure, OrderGatewayError::InsufficientStock(key) if *key == StockKey::product(product)));
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(0));
}

#[tokio::test]
async fn burst_of_holds_never_oversells() {
    const INITIAL_STOCK: i64 = 5;
    const CONTENDERS: usize = 10;

    let db = new_test_db().await;
    let product = seed::seed_product(db.pool(), "Festival Hamper", Money::from_rupees(999), None).await;
    seed::add_stock(&db, &StockKey::product(product), INITIAL_STOCK).await;
    let api = Arc::new(api_for(db.clone()));

    let mut tasks = Vec::with_capacity(CONTENDERS);
    for i in 0..CONTENDERS {
        let api = Arc::clone(&api);
        let req = order_request(&format!("cust-{i}"), vec![item(product, 1)], PaymentMethod::CashOnDelivery);
        tasks.push(tokio::spawn(async move { api.process_new_order(req).await }));
    }
    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(matches!(e, OrderGatewayError::InsufficientStock(_)), "unexpected error: {e}"),
        }
    }

    assert_eq!(successes as i64, INITIAL_STOCK, "successful holds must total exactly the initial stock");
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(0));
}

#[tokio::test]
async fn concurrent_multi_item_holds_succeed_when_stock_suffices() {
    let db = new_test_db().await;
    let chai = seed::seed_product(db.pool(), "Chai Tin", Money::from_rupees(240), None).await;
    let cups = seed::seed_product(db.pool(), "Cutting Glass Set", Money::from_rupees(320), None).await;
    seed::add_stock(&db, &StockKey::product(chai), 5).await;
    seed::add_stock(&db, &StockKey::product(cups), 5).await;
    let api = Arc::new(api_for(db.clone()));

    // The two requests list the same units in opposite orders; ascending-key acquisition means neither can block
    // the other indefinitely.
    let a = Arc::clone(&api);
    let b = Arc::clone(&api);
    let req_a = order_request("cust-a", vec![item(chai, 2), item(cups, 1)], PaymentMethod::CashOnDelivery);
    let req_b = order_request("cust-b", vec![item(cups, 2), item(chai, 1)], PaymentMethod::CashOnDelivery);
    let task_a = tokio::spawn(async move { a.process_new_order(req_a).await });
    let task_b = tokio::spawn(async move { b.process_new_order(req_b).await });
    task_a.await.unwrap().expect("first multi-item hold should succeed");
    task_b.await.unwrap().expect("second multi-item hold should succeed");

    assert_eq!(db.stock_on_hand(&StockKey::product(chai)).await.unwrap(), Some(2));
    assert_eq!(db.stock_on_hand(&StockKey::product(cups)).await.unwrap(), Some(2));
}

#[tokio::test]
async fn releasing_a_reservation_twice_is_a_noop() {
    let db = new_test_db().await;
    let product = seed::seed_product(db.pool(), "Block-print Dupatta", Money::from_rupees(780), None).await;
    seed::add_stock(&db, &StockKey::product(product), 4).await;
    let api = api_for(db.clone());

    let placed = api
        .process_new_order(order_request("cust-r", vec![item(product, 3)], PaymentMethod::Provider))
        .await
        .unwrap();
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(1));

    let released = db.release_reservation(&placed.order.order_id).await.expect("release should succeed");
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].quantity, 3);
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(4));

    // Both the timeout path and an explicit cancellation may try to release; the second attempt restores nothing.
    let released_again = db.release_reservation(&placed.order.order_id).await.expect("release is idempotent");
    assert!(released_again.is_empty());
    assert_eq!(db.stock_on_hand(&StockKey::product(product)).await.unwrap(), Some(4));
}
