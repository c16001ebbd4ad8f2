use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payments::repo_types::{Payment, PaymentKind, PaymentStatus};
use crate::timefmt::format_timestamp;

#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub id: i64,
    pub user_id: i64,
    pub rental_id: Option<i64>,
    pub kind: PaymentKind,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub external_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Payment> for PaymentView {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            rental_id: p.rental_id,
            kind: p.kind,
            amount: p.amount,
            status: p.status,
            external_id: p.external_id,
            created_at: format_timestamp(p.created_at),
            updated_at: format_timestamp(p.updated_at),
        }
    }
}

/// Status callback sent by the payment provider.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub external_id: String,
    pub status: String,
}
