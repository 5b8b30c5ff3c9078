use thiserror::Error;

use crate::db_types::Order;

#[derive(Debug, Clone, Error)]
#[error("Payment provider error: {0}")]
pub struct ProviderError(pub String);

/// The provider's half of a checkout handoff. The reference is what later ties the asynchronous payment confirmation
/// back to our order.
#[derive(Debug, Clone)]
pub struct ProviderCheckout {
    pub provider_order_ref: String,
}

/// The order-creation boundary to the external payment provider.
///
/// Only this call-out is modelled; the confirmation leg arrives as a signed callback and is handled by
/// [`crate::helpers::PaymentConfirmation`]. A real gateway client (Razorpay, Stripe, ...) implements this trait;
/// everything else in the engine is provider-agnostic.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider: Send + Sync {
    async fn create_provider_order(&self, order: &Order) -> Result<ProviderCheckout, ProviderError>;
}

/// A provider that mints checkout references locally instead of calling out to a gateway.
///
/// Used in development and test deployments, and as the default when no gateway is configured. The references it
/// generates are accepted by the verification flow like any other, as long as callbacks are signed with the shared
/// secret.
#[derive(Debug, Clone)]
pub struct OfflineProvider {
    prefix: String,
}

impl OfflineProvider {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl PaymentProvider for OfflineProvider {
    async fn create_provider_order(&self, _order: &Order) -> Result<ProviderCheckout, ProviderError> {
        let provider_order_ref = format!("{}_{:016x}", self.prefix, rand::random::<u64>());
        Ok(ProviderCheckout { provider_order_ref })
    }
}
