//! Bazaar Order Engine
//!
//! The Bazaar Order Engine is the inventory reservation and payment reconciliation core of the Bazaar commerce
//! platform. This library contains the correctness-critical logic; it is provider-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`OrderFlowApi`] and [`OrderQueryApi`]). This provides the public-facing functionality:
//!    placing orders with all-or-nothing stock holds, verifying signed payment confirmations idempotently, and
//!    sweeping expired unpaid orders back to a terminal state. Backends implement the traits in [`mod@traits`] to
//!    drive these flows.
//! 3. A set of events that can be subscribed to ([`mod@events`]). These are emitted when orders are paid or
//!    annulled, so that downstream concerns (mail, webhooks, analytics) can hook in without touching the core flow.
mod api;
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{order_objects, OrderFlowApi, OrderQueryApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
