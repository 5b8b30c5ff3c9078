//! # Payment confirmation signature format
//!
//! When the payment provider completes a checkout, it calls back with the checkout reference, a payment reference,
//! and a signature. We cannot act on the references alone, because anyone who has seen (or guessed) a checkout
//! reference could confirm the order without paying for it.
//!
//! The provider therefore signs the callback with the shared webhook secret. The signed payload is the two
//! references joined with a pipe:
//!
//! ```text
//!     {provider_order_ref}|{provider_payment_ref}
//! ```
//!
//! The signature is the lowercase hex encoding of `HMAC-SHA256(secret, payload)`. Verification decodes the supplied
//! hex and compares MACs in constant time ([`hmac::Mac::verify_slice`]), so the comparison itself cannot be used as
//! a timing oracle. A failed check is a security event, not a routine validation error.

use bzr_common::Secret;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
#[error("Invalid payment signature: {0}")]
pub struct SignatureError(String);

/// An asynchronous payment confirmation as delivered by the provider's webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub provider_order_ref: String,
    pub provider_payment_ref: String,
    pub signature: String,
}

impl PaymentConfirmation {
    pub fn new<S1, S2, S3>(provider_order_ref: S1, provider_payment_ref: S2, signature: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            provider_order_ref: provider_order_ref.into(),
            provider_payment_ref: provider_payment_ref.into(),
            signature: signature.into(),
        }
    }

    /// The exact byte string the provider signs.
    pub fn signed_payload(&self) -> String {
        format!("{}|{}", self.provider_order_ref, self.provider_payment_ref)
    }

    /// Check the supplied signature against the shared secret.
    ///
    /// The MAC comparison is constant-time. State is never touched here; callers decide what a failure means.
    pub fn verify(&self, secret: &Secret<String>) -> Result<(), SignatureError> {
        let supplied = hex::decode(self.signature.trim())
            .map_err(|e| SignatureError(format!("signature is not valid hex. {e}")))?;
        let mut mac = hmac_for(secret);
        mac.update(self.signed_payload().as_bytes());
        mac.verify_slice(&supplied).map_err(|_| SignatureError("signature does not match the payload".into()))
    }
}

/// Produce the signature the provider would attach to a confirmation for the given references. Used by tooling and
/// tests; a real provider computes this on their side.
pub fn sign_confirmation(provider_order_ref: &str, provider_payment_ref: &str, secret: &Secret<String>) -> String {
    hmac_hex(secret, &format!("{provider_order_ref}|{provider_payment_ref}"))
}

fn hmac_for(secret: &Secret<String>) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.reveal().as_bytes()).expect("HMAC can take a key of any size")
}

fn hmac_hex(secret: &Secret<String>, payload: &str) -> String {
    let mut mac = hmac_for(secret);
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
