//! Trait seams for the order engine.
//!
//! [`OrderGatewayDatabase`] defines the mutating order/stock flow a storage backend must support,
//! [`OrderManagement`] the read-only queries, and [`PaymentProvider`] the boundary to the external payment gateway.
//! The SQLite backend in [`crate::sqlite`] implements the first two; any real gateway client implements the third.
mod data_objects;
mod order_gateway_database;
mod order_management;
mod payment_provider;

pub use data_objects::{VerifiedPayment, VerifyOutcome};
pub use order_gateway_database::{OrderGatewayDatabase, OrderGatewayError};
pub use order_management::OrderManagement;
pub use payment_provider::{OfflineProvider, PaymentProvider, ProviderCheckout, ProviderError};
