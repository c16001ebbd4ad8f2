use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::PgStore;
use crate::payments::repo_types::{Payment, PaymentKind, PaymentStatus, WebhookOutcome};

#[async_trait]
pub trait PaymentRepo: Send + Sync {
    /// Records a pending top-up awaiting provider confirmation.
    async fn create_topup(&self, user_id: i64, amount: Decimal) -> anyhow::Result<Payment>;
    /// Newest first.
    async fn list_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Payment>>;
    async fn find_for_user(&self, user_id: i64, id: i64) -> anyhow::Result<Option<Payment>>;
    /// Settles a pending payment. A paid top-up credits the owner's deposit
    /// atomically. `None` when `external_id` is unknown.
    async fn apply_provider_status(
        &self,
        external_id: &str,
        status: PaymentStatus,
    ) -> anyhow::Result<Option<WebhookOutcome>>;
}

pub(crate) const PAYMENT_COLUMNS: &str =
    "id, user_id, rental_id, kind, amount, status, external_id, created_at, updated_at";

pub fn new_external_id(kind: PaymentKind) -> String {
    let prefix = match kind {
        PaymentKind::Rental => "rental",
        PaymentKind::Topup => "topup",
    };
    format!("{prefix}-{}", Uuid::new_v4())
}

#[async_trait]
impl PaymentRepo for PgStore {
    async fn create_topup(&self, user_id: i64, amount: Decimal) -> anyhow::Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (user_id, kind, amount, status, external_id)
            VALUES ($1, 'topup', $2, 'pending', $3)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(amount)
        .bind(new_external_id(PaymentKind::Topup))
        .fetch_one(&self.db)
        .await
        .context("insert topup payment")?;
        Ok(payment)
    }

    async fn list_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
              FROM payments
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list payments by user")?;
        Ok(rows)
    }

    async fn find_for_user(&self, user_id: i64, id: i64) -> anyhow::Result<Option<Payment>> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get payment")?;
        Ok(row)
    }

    async fn apply_provider_status(
        &self,
        external_id: &str,
        status: PaymentStatus,
    ) -> anyhow::Result<Option<WebhookOutcome>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let Some(current) = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE external_id = $1 FOR UPDATE"
        ))
        .bind(external_id)
        .fetch_optional(&mut *tx)
        .await
        .context("lock payment")?
        else {
            return Ok(None);
        };

        if current.status != PaymentStatus::Pending || status == PaymentStatus::Pending {
            tx.commit().await.context("commit tx")?;
            return Ok(Some(WebhookOutcome {
                payment: current,
                changed: false,
            }));
        }

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
               SET status = $2, updated_at = now()
             WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(current.id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await
        .context("update payment status")?;

        if payment.status == PaymentStatus::Paid && payment.kind == PaymentKind::Topup {
            sqlx::query(
                r#"
                UPDATE users
                   SET deposit_amount = deposit_amount + $2, updated_at = now()
                 WHERE id = $1
                "#,
            )
            .bind(payment.user_id)
            .bind(payment.amount)
            .execute(&mut *tx)
            .await
            .context("credit deposit")?;
        }

        tx.commit().await.context("commit tx")?;
        Ok(Some(WebhookOutcome {
            payment,
            changed: true,
        }))
    }
}
