//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will stop
//! that worker from processing new requests. Everything long and non-cpu-bound here (database work, provider
//! handoffs) is expressed as async calls into the engine for that reason.
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use bazaar_order_engine::{
    db_types::OrderId,
    helpers::PaymentConfirmation,
    order_objects::NewOrderRequest,
    traits::{OfflineProvider, OrderGatewayError},
    OrderFlowApi,
    OrderQueryApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::AuthInfo,
    config::ServerOptions,
    data_objects::CreateOrderRequest,
    errors::ServerError,
    helpers::get_remote_ip,
};

pub type OrderApi = OrderFlowApi<SqliteDatabase, OfflineProvider>;
pub type QueryApi = OrderQueryApi<SqliteDatabase>;

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// -------------------------------------------   Create order  -------------------------------------------------
/// Place a new order for the authenticated customer.
///
/// Stock for every line item is reserved atomically before the order is accepted; a partial reservation is never
/// left behind. Provider orders come back with the checkout reference the customer completes payment against;
/// cash-on-delivery orders confirm immediately.
#[post("/orders")]
pub async fn create_order(
    auth: AuthInfo,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderApi>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST create order for customer [{}] with {} line items", auth.customer_id, req.items.len());
    let order = NewOrderRequest {
        customer_id: auth.customer_id,
        items: req.items,
        address: req.address,
        payment_method: req.payment_method,
    };
    let placed = api.process_new_order(order).await?;
    Ok(HttpResponse::Created().json(placed))
}

// ------------------------------------------   Verify payment  ------------------------------------------------
/// Apply an asynchronous payment confirmation from the provider.
///
/// Idempotent: the provider may deliver the same confirmation any number of times and the order transitions at most
/// once. A signature mismatch is logged as a security event with the remote peer address and rejected with 400.
#[post("/payments/verify")]
pub async fn verify_payment(
    req: HttpRequest,
    options: web::Data<ServerOptions>,
    body: web::Json<PaymentConfirmation>,
    api: web::Data<OrderApi>,
) -> Result<HttpResponse, ServerError> {
    let confirmation = body.into_inner();
    trace!("💻️ Received payment confirmation for [{}]", confirmation.provider_order_ref);
    let provider_order_ref = confirmation.provider_order_ref.clone();
    match api.verify_payment(confirmation).await {
        Ok(result) => Ok(HttpResponse::Ok().json(result)),
        Err(e @ OrderGatewayError::SignatureMismatch) => {
            let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded)
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            warn!("🚨️ Signature mismatch on payment confirmation for [{provider_order_ref}] from peer {peer}");
            Err(e.into())
        },
        Err(e) => Err(e.into()),
    }
}

// -------------------------------------------   Order queries  ------------------------------------------------
/// The authenticated customer's orders, newest first. Admins see every order on the platform.
#[get("/orders")]
pub async fn my_orders(auth: AuthInfo, api: web::Data<QueryApi>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET orders for [{}]", auth.customer_id);
    let orders = if auth.is_admin() {
        api.all_orders().await?
    } else {
        api.orders_for_customer(&auth.customer_id).await?
    };
    Ok(HttpResponse::Ok().json(orders))
}

/// A single order with its line items. Customers may only read their own orders.
#[get("/orders/{order_id}")]
pub async fn order_by_id(
    auth: AuthInfo,
    path: web::Path<String>,
    api: web::Data<QueryApi>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let result = api
        .order_with_items(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id}")))?;
    if !auth.is_admin() && result.order.customer_id != auth.customer_id {
        debug!("💻️ Customer [{}] tried to read order {} belonging to someone else", auth.customer_id, order_id);
        return Err(ServerError::InsufficientPermissions("You may only view your own orders".to_string()));
    }
    Ok(HttpResponse::Ok().json(result))
}
