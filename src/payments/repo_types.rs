use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Rental,
    Topup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Maps a terminal provider status. Case-insensitive; anything else,
    /// including `PENDING`, is not a settlement and maps to `None`.
    pub fn from_provider(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PAID" | "SETTLED" => Some(PaymentStatus::Paid),
            "FAILED" | "EXPIRED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub rental_id: Option<i64>,
    pub kind: PaymentKind,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub external_id: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Result of applying a provider status update.
#[derive(Debug, Clone)]
pub struct WebhookOutcome {
    pub payment: Payment,
    /// False when the payment was already settled and left untouched.
    pub changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_statuses() {
        assert_eq!(PaymentStatus::from_provider("PAID"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::from_provider("settled"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::from_provider("Expired"), Some(PaymentStatus::Failed));
        assert_eq!(PaymentStatus::from_provider("FAILED"), Some(PaymentStatus::Failed));
        assert_eq!(PaymentStatus::from_provider("refunded"), None);
        assert_eq!(PaymentStatus::from_provider("PENDING"), None);
    }
}
