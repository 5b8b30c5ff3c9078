use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use bazaar_order_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    traits::OfflineProvider,
    OrderFlowApi,
    OrderQueryApi,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    routes::{create_order, health, my_orders, order_by_id, verify_payment, OrderApi},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    // No hooks are wired by default; deployments register mail/webhook subscribers here.
    let handlers = EventHandlers::new(16, EventHooks::default());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    start_expiry_worker(order_api(&config, db.clone(), producers.clone()), config.sweep_interval);
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Build a fully wired order flow API from the server configuration.
pub fn order_api(config: &ServerConfig, db: SqliteDatabase, producers: EventProducers) -> OrderApi {
    OrderFlowApi::new(
        db,
        OfflineProvider::new(config.provider.ref_prefix.clone()),
        config.provider.hmac_secret.clone(),
        config.pending_order_timeout,
        producers,
    )
}

/// Register the APIs and routes on a service config. Shared between the real server and the endpoint tests, so the
/// tests exercise exactly the wiring production uses.
pub fn configure_services(
    cfg: &mut web::ServiceConfig,
    config: &ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) {
    let orders_api = order_api(config, db.clone(), producers);
    let query_api = OrderQueryApi::new(db);
    let options = ServerOptions::from_config(config);
    cfg.app_data(web::Data::new(orders_api))
        .app_data(web::Data::new(query_api))
        .app_data(web::Data::new(options))
        .service(health)
        .service(create_order)
        .service(verify_payment)
        .service(my_orders)
        .service(order_by_id);
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let config = config.clone();
        let db = db.clone();
        let producers = producers.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bzr::access_log"))
            .configure(|cfg| configure_services(cfg, &config, db, producers))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
