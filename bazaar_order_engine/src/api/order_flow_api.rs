use std::fmt::Debug;

use bzr_common::Secret;
use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    api::order_objects::{NewOrderRequest, PlacedOrder},
    db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentMethod},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    helpers::PaymentConfirmation,
    traits::{OrderGatewayDatabase, OrderGatewayError, PaymentProvider, VerifiedPayment, VerifyOutcome},
};

/// `OrderFlowApi` is the primary API for placing orders and reconciling their payments.
///
/// It owns the three correctness-critical flows:
/// * **Placement** — price the line items, hold stock all-or-nothing, persist the order, and hand off to the payment
///   provider (cash-on-delivery orders confirm immediately and skip the handoff).
/// * **Verification** — check the provider's callback signature against the shared secret and apply the confirmation
///   idempotently.
/// * **Reconciliation** — sweep orders whose payment deadline lapsed, cancelling them and restoring their stock.
pub struct OrderFlowApi<B, P> {
    db: B,
    provider: P,
    hmac_secret: Secret<String>,
    pending_timeout: Duration,
    producers: EventProducers,
}

impl<B, P> Debug for OrderFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, P> OrderFlowApi<B, P> {
    pub fn new(
        db: B,
        provider: P,
        hmac_secret: Secret<String>,
        pending_timeout: Duration,
        producers: EventProducers,
    ) -> Self {
        Self { db, provider, hmac_secret, pending_timeout, producers }
    }
}

impl<B, P> OrderFlowApi<B, P>
where
    B: OrderGatewayDatabase,
    P: PaymentProvider,
{
    /// Place a new order.
    ///
    /// Stock for every line item is held atomically: either all decrements apply, or none do and the failure is
    /// returned. Provider orders are born `Pending`/`Created` with a payment deadline; if the provider handoff
    /// fails after stock was held, the order is cancelled and the stock released before the error is surfaced.
    pub async fn process_new_order(&self, req: NewOrderRequest) -> Result<PlacedOrder, OrderGatewayError> {
        if req.items.is_empty() {
            return Err(OrderGatewayError::EmptyOrder);
        }
        if let Some(item) = req.items.iter().find(|i| i.quantity <= 0) {
            return Err(OrderGatewayError::InvalidQuantity(item.quantity));
        }
        let payment_method = req.payment_method;
        let priced = self.db.price_line_items(&req.items).await?;
        let mut order = NewOrder::new(req.customer_id, payment_method, req.address, priced);
        if payment_method == PaymentMethod::Provider {
            order = order.with_expiry(Utc::now() + self.pending_timeout);
        }
        let (order, ticket) = self.db.place_order(order).await?;
        debug!(
            "🔄️📦️ Order {} created with {} line items, total {}",
            order.order_id,
            ticket.holds.len(),
            order.total_amount
        );
        if payment_method == PaymentMethod::CashOnDelivery {
            info!("🔄️📦️ Cash-on-delivery order {} confirmed immediately", order.order_id);
            let items = self.db.fetch_line_items(&order).await?;
            return Ok(PlacedOrder { order, items, provider_order_ref: None });
        }
        match self.provider.create_provider_order(&order).await {
            Ok(checkout) => {
                let order = self.db.attach_provider_ref(&order.order_id, &checkout.provider_order_ref).await?;
                let items = self.db.fetch_line_items(&order).await?;
                info!("🔄️📦️ Order {} handed off to provider as [{}]", order.order_id, checkout.provider_order_ref);
                Ok(PlacedOrder { order, items, provider_order_ref: Some(checkout.provider_order_ref) })
            },
            Err(e) => {
                warn!(
                    "🔄️📦️ Provider could not create a checkout for order {}: {e}. Cancelling the order and \
                     releasing its stock.",
                    order.order_id
                );
                if let Some(cancelled) = self.db.cancel_unpaid_order(&order.order_id).await? {
                    self.call_order_annulled_hook(&cancelled).await;
                }
                Err(OrderGatewayError::ProviderUnavailable(e.to_string()))
            },
        }
    }

    /// Apply an asynchronous payment confirmation from the provider.
    ///
    /// The signature is checked first, in constant time, against the shared webhook secret; a mismatch leaves all
    /// state untouched and is logged as a security event by the caller-facing layer. A valid confirmation is applied
    /// at most once: duplicates return the existing order with [`VerifyOutcome::AlreadyPaid`], and confirmations
    /// that lost the race against the expiry sweep return [`VerifyOutcome::OrderClosed`] without changing anything.
    pub async fn verify_payment(&self, confirmation: PaymentConfirmation) -> Result<VerifiedPayment, OrderGatewayError> {
        if let Err(e) = confirmation.verify(&self.hmac_secret) {
            warn!(
                "🔐️ Payment confirmation for [{}] failed signature verification: {e}",
                confirmation.provider_order_ref
            );
            return Err(OrderGatewayError::SignatureMismatch);
        }
        let result = self.db.confirm_paid_order(&confirmation).await?;
        match result.outcome {
            VerifyOutcome::Applied => {
                info!(
                    "🔄️💰️ Order {} confirmed as paid by [{}]",
                    result.order.order_id, confirmation.provider_payment_ref
                );
                self.call_order_paid_hook(&result.order).await;
            },
            VerifyOutcome::AlreadyPaid => {
                debug!("🔄️💰️ Duplicate confirmation for order {} ignored", result.order.order_id);
            },
            VerifyOutcome::OrderClosed => {
                warn!(
                    "🔄️💰️ Confirmation for [{}] arrived after order {} was cancelled. No state was changed; the \
                     payment needs manual reconciliation.",
                    confirmation.provider_order_ref, result.order.order_id
                );
            },
        }
        Ok(result)
    }

    /// Cancel an order that is still awaiting payment, releasing its reservation.
    ///
    /// Orders that have already reached a terminal state are left untouched and the attempt is rejected.
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, OrderGatewayError> {
        match self.db.cancel_unpaid_order(order_id).await? {
            Some(order) => {
                info!("🔄️❌️ Order {} cancelled and its reservation released", order.order_id);
                self.call_order_annulled_hook(&order).await;
                Ok(order)
            },
            None => {
                let order = self
                    .db
                    .fetch_order_by_order_id(order_id)
                    .await?
                    .ok_or_else(|| OrderGatewayError::OrderNotFound(order_id.clone()))?;
                Err(OrderGatewayError::InvalidStateTransition {
                    order_id: order_id.clone(),
                    from: order.order_status,
                    to: OrderStatusType::Cancelled,
                })
            },
        }
    }

    /// Cancel every order whose payment deadline has lapsed while still unpaid. Safe to run at any frequency and
    /// from any number of instances: each order's transition is guarded, so a sweep racing a concurrent
    /// [`Self::verify_payment`] (or another sweep) simply no-ops on the orders it loses.
    pub async fn expire_old_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>, OrderGatewayError> {
        let cancelled = self.db.expire_old_orders(now).await?;
        for order in &cancelled {
            self.call_order_annulled_hook(order).await;
        }
        Ok(cancelled)
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            trace!("🔄️📬️ Notifying order paid hook subscribers");
            emitter.publish_event(OrderPaidEvent::new(order.clone())).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            trace!("🔄️📬️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
