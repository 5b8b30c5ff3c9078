use std::{cmp::Ordering, fmt::Display, str::FromStr};

use bzr_common::Money;
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        -------------------------------------------------------
/// The public identifier of an order, as handed out to customers and the payment provider. Distinct from the internal
/// database row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Mint a fresh order id. Uniqueness is enforced by the database; collisions on 64 random bits are not a
    /// practical concern at commerce volumes.
    pub fn random() -> Self {
        Self(format!("ord-{:016x}", rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------        StockKey        ------------------------------------------------------
/// Identifies a single stock unit: a product, or one variant of a product.
///
/// The ordering (product id first, then variant id with `None` sorting first) is load-bearing: multi-item holds apply
/// their decrements in ascending `StockKey` order so that two concurrent holds can never acquire row locks in
/// opposite orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: i64,
    pub variant_id: Option<i64>,
}

impl StockKey {
    pub fn product(product_id: i64) -> Self {
        Self { product_id, variant_id: None }
    }

    pub fn variant(product_id: i64, variant_id: i64) -> Self {
        Self { product_id, variant_id: Some(variant_id) }
    }

    /// The variant column value used in the stock ledger, where slot 0 is the product-level pool.
    pub fn variant_slot(&self) -> i64 {
        self.variant_id.unwrap_or(0)
    }
}

impl Ord for StockKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.product_id, self.variant_slot()).cmp(&(other.product_id, other.variant_slot()))
    }
}

impl PartialOrd for StockKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.variant_id {
            Some(v) => write!(f, "p{}/v{v}", self.product_id),
            None => write!(f, "p{}", self.product_id),
        }
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order exists and is waiting for payment to complete.
    Pending,
    /// Payment has completed (or the order is cash-on-delivery). Terminal for this subsystem.
    Confirmed,
    /// Fulfilment states, owned by the excluded catalog-management surface.
    Shipped,
    Delivered,
    /// The order was cancelled and its reservation released. Terminal.
    Cancelled,
}

impl OrderStatusType {
    /// No transition out of these states is defined inside this subsystem.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Confirmed | OrderStatusType::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Confirmed => write!(f, "Confirmed"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------  PaymentStatusType    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatusType {
    /// A provider checkout exists but no confirmation has arrived yet.
    Created,
    /// Payment will be collected out of band (cash on delivery).
    Pending,
    /// The provider confirmed payment in full.
    Paid,
    /// Payment never completed; the order was cancelled.
    Failed,
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatusType::Created => write!(f, "Created"),
            PaymentStatusType::Pending => write!(f, "Pending"),
            PaymentStatusType::Paid => write!(f, "Paid"),
            PaymentStatusType::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Created");
            PaymentStatusType::Created
        })
    }
}

//--------------------------------------     PaymentMethod     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Checkout through the external payment provider, settled by signed callback.
    Provider,
    /// Cash on delivery. Confirmed immediately; payment stays pending until the courier settles.
    CashOnDelivery,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Provider => write!(f, "Provider"),
            PaymentMethod::CashOnDelivery => write!(f, "CashOnDelivery"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Provider" => Ok(Self::Provider),
            "CashOnDelivery" => Ok(Self::CashOnDelivery),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment method: {value}. But this conversion cannot fail. Defaulting to Provider");
            PaymentMethod::Provider
        })
    }
}

//--------------------------------------         Role          -------------------------------------------------------
/// The caller's role, as asserted by the perimeter auth service. Verification of identity is out of scope here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------    ShippingAddress    -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub mobile: String,
    pub state: String,
    pub city: String,
    pub pincode: String,
    pub full_address: String,
}

//--------------------------------------    LineItemRequest    -------------------------------------------------------
/// A single line of an incoming order, before any price has been attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: i64,
    #[serde(default)]
    pub variant_id: Option<i64>,
    pub quantity: i64,
}

impl LineItemRequest {
    pub fn stock_key(&self) -> StockKey {
        StockKey { product_id: self.product_id, variant_id: self.variant_id }
    }
}

//--------------------------------------    PricedLineItem     -------------------------------------------------------
/// A line item with its resolved unit price. Once the order is persisted these values are immutable, so a later
/// catalog price change can never alter what an existing order owes or releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLineItem {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl PricedLineItem {
    pub fn stock_key(&self) -> StockKey {
        StockKey { product_id: self.product_id, variant_id: self.variant_id }
    }
}

//--------------------------------------        LineItem       -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

//--------------------------------------         Order         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub total_amount: Money,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub order_status: OrderStatusType,
    pub payment_status: PaymentStatusType,
    pub provider_order_ref: Option<String>,
    pub provider_payment_ref: Option<String>,
    pub provider_signature: Option<String>,
    pub address: Json<ShippingAddress>,
    /// Deadline after which an unpaid provider order is swept into `Cancelled`. NULL once paid, and for
    /// cash-on-delivery orders.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       -------------------------------------------------------
/// A fully priced order, ready to be held against stock and persisted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: String,
    pub payment_method: PaymentMethod,
    pub address: ShippingAddress,
    pub items: Vec<PricedLineItem>,
    pub total_amount: Money,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewOrder {
    pub fn new(
        customer_id: String,
        payment_method: PaymentMethod,
        address: ShippingAddress,
        items: Vec<PricedLineItem>,
    ) -> Self {
        let total_amount = items.iter().map(|i| i.line_total).sum();
        Self {
            order_id: OrderId::random(),
            customer_id,
            payment_method,
            address,
            items,
            total_amount,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// The state the order is born in. Cash-on-delivery orders skip the payment leg entirely and confirm
    /// immediately, with payment collected by the courier.
    pub fn initial_statuses(&self) -> (OrderStatusType, PaymentStatusType) {
        match self.payment_method {
            PaymentMethod::Provider => (OrderStatusType::Pending, PaymentStatusType::Created),
            PaymentMethod::CashOnDelivery => (OrderStatusType::Confirmed, PaymentStatusType::Pending),
        }
    }
}

//--------------------------------------      StockHold        -------------------------------------------------------
/// One stock adjustment applied on behalf of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockHold {
    pub key: StockKey,
    pub quantity: i64,
}

//--------------------------------------   ReservationTicket   -------------------------------------------------------
/// The set of stock adjustments applied for one order. The ticket is also persisted in the `reservations` table so
/// that the expiry sweep can release exactly what was held, even after a process restart or a later catalog change.
#[derive(Debug, Clone)]
pub struct ReservationTicket {
    pub order_id: OrderId,
    pub holds: Vec<StockHold>,
}

impl ReservationTicket {
    pub fn for_items(order_id: OrderId, items: &[PricedLineItem]) -> Self {
        let holds = items.iter().map(|i| StockHold { key: i.stock_key(), quantity: i.quantity }).collect();
        Self { order_id, holds }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stock_keys_sort_by_product_then_variant() {
        let mut keys = vec![StockKey::variant(2, 1), StockKey::product(1), StockKey::variant(1, 7), StockKey::product(2)];
        keys.sort();
        assert_eq!(
            keys,
            vec![StockKey::product(1), StockKey::variant(1, 7), StockKey::product(2), StockKey::variant(2, 1)]
        );
    }

    #[test]
    fn order_status_round_trip() {
        for s in ["Pending", "Confirmed", "Shipped", "Delivered", "Cancelled"] {
            let status: OrderStatusType = s.parse().unwrap();
            assert_eq!(status.to_string(), s);
        }
        assert!("Unknown".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatusType::Confirmed.is_terminal());
        assert!(OrderStatusType::Cancelled.is_terminal());
        assert!(!OrderStatusType::Pending.is_terminal());
    }

    #[test]
    fn order_ids_are_prefixed() {
        let id = OrderId::random();
        assert!(id.as_str().starts_with("ord-"));
        assert_eq!(id.as_str().len(), 20);
    }
}
