//! Identity extraction.
//!
//! Authentication and role management are owned by the perimeter auth service, which verifies the caller and injects
//! two trusted headers on every request it forwards:
//!
//! * `x-bzr-customer-id` — the opaque customer id.
//! * `x-bzr-role` — `customer` or `admin`.
//!
//! This module only reads those headers back out. Requests that reach us without them are rejected with 401; that
//! indicates a misconfigured perimeter, not a user error.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use bazaar_order_engine::db_types::Role;

use crate::errors::ServerError;

pub const CUSTOMER_ID_HEADER: &str = "x-bzr-customer-id";
pub const ROLE_HEADER: &str = "x-bzr-role";

#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub customer_id: String,
    pub role: Role,
}

impl AuthInfo {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for AuthInfo {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_auth(req))
    }
}

fn extract_auth(req: &HttpRequest) -> Result<AuthInfo, ServerError> {
    let customer_id = header_value(req, CUSTOMER_ID_HEADER)?;
    if customer_id.is_empty() {
        return Err(ServerError::Unauthenticated(format!("{CUSTOMER_ID_HEADER} header is empty")));
    }
    let role = header_value(req, ROLE_HEADER)?
        .parse::<Role>()
        .map_err(|e| ServerError::Unauthenticated(e.to_string()))?;
    Ok(AuthInfo { customer_id, role })
}

fn header_value(req: &HttpRequest, name: &str) -> Result<String, ServerError> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| ServerError::Unauthenticated(format!("{name} header is missing")))
}
