use std::time::Duration;

use bazaar_order_engine::db_types::Order;
use chrono::Utc;
use log::*;
use tokio::task::JoinHandle;

use crate::routes::OrderApi;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker is the durable half of the payment-deadline contract: deadlines are persisted on the orders
/// themselves, so the sweep picks up where it left off after a restart, and running extra instances is harmless
/// because every cancellation is guarded.
pub fn start_expiry_worker(api: OrderApi, sweep_interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(sweep_interval);
        info!("🕰️ Unpaid order expiry worker started (sweeping every {}s)", sweep_interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running unpaid order expiry sweep");
            match api.expire_old_orders(Utc::now()).await {
                Ok(cancelled) if cancelled.is_empty() => trace!("🕰️ No orders due for expiry"),
                Ok(cancelled) => {
                    info!("🕰️ {} unpaid orders expired and released their stock", cancelled.len());
                    debug!("🕰️ Expired orders: {}", order_list(&cancelled));
                },
                Err(e) => {
                    error!("🕰️ Error running unpaid order expiry sweep: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] order_id: {} cust_id: {}", o.id, o.order_id, o.customer_id))
        .collect::<Vec<String>>()
        .join(", ")
}
