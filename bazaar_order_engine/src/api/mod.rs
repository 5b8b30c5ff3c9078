mod order_flow_api;
mod order_query_api;
pub mod order_objects;

pub use order_flow_api::OrderFlowApi;
pub use order_query_api::OrderQueryApi;
