//! # Bazaar Order Server
//!
//! This crate hosts the HTTP surface of the Bazaar order backend. It is responsible for:
//! * Accepting order placement requests and driving the engine's all-or-nothing stock reservation.
//! * Receiving signed payment confirmations from the provider and applying them idempotently.
//! * Running the background expiry worker that cancels unpaid orders and restores their stock.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `GET /health`: liveness check.
//! * `POST /orders`: place an order for the authenticated customer.
//! * `POST /payments/verify`: apply a signed payment confirmation.
//! * `GET /orders`: the caller's orders (all orders for admins).
//! * `GET /orders/{order_id}`: a single order with its line items.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
