use crate::db_types::{Order, OrderStatusType, PaymentStatusType};

/// Published when a payment confirmation is applied and the order reaches `Confirmed`/`Paid`.
#[derive(Debug, Clone)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Published when an order is cancelled, whether by the expiry sweep or an explicit cancellation, after its
/// reservation has been released.
#[derive(Debug, Clone)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.order_status;
        let payment_status = order.payment_status;
        Self { order, status, payment_status }
    }
}
