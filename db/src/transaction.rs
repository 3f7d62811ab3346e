use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{dtos::transaction::TransactionCreateRequest, models::transaction::Transaction};

pub async fn insert_transaction<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: TransactionCreateRequest,
) -> Res<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions
            (customer_id, stripe_payment_id, amount, currency, status,
             plan_name, plan_period, description, receipt_email, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(data.customer_id)
    .bind(data.stripe_payment_id)
    .bind(data.amount)
    .bind(data.currency)
    .bind(data.status)
    .bind(data.plan_name)
    .bind(data.plan_period)
    .bind(data.description)
    .bind(data.receipt_email)
    .bind(data.metadata)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Records whether the confirmation email and SMS were delivered for a
/// transaction, after the senders have run.
pub async fn set_notification_flags<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    transaction_id: Uuid,
    email_sent: bool,
    sms_sent: bool,
) -> Res<()> {
    sqlx::query(
        r#"
        UPDATE transactions
        SET email_sent = $2, sms_sent = $3, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(transaction_id)
    .bind(email_sent)
    .bind(sms_sent)
    .execute(executor)
    .await?;
    Ok(())
}
