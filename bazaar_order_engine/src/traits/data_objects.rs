use serde::Serialize;

use crate::db_types::Order;

/// What applying a payment confirmation actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// First delivery of the confirmation; the order moved to `Confirmed`/`Paid`.
    Applied,
    /// A duplicate of a confirmation that was already applied. Nothing changed.
    AlreadyPaid,
    /// The order was cancelled before the confirmation arrived. Nothing changed; the payment needs manual follow-up.
    OrderClosed,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
    pub order: Order,
    pub outcome: VerifyOutcome,
}

impl VerifiedPayment {
    pub fn applied(&self) -> bool {
        self.outcome == VerifyOutcome::Applied
    }
}
