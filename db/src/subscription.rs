use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::{
    dtos::subscription::SubscriptionUpsertRequest,
    models::subscription::{Subscription, SubscriptionStatus},
};

/// Insert-or-update keyed by the Stripe subscription id, overwriting all
/// mutable fields with the provider's current state.
pub async fn upsert_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: SubscriptionUpsertRequest,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions
            (customer_id, stripe_subscription_id, plan_name, plan_price, status,
             current_period_start, current_period_end, canceled_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (stripe_subscription_id) DO UPDATE SET
            customer_id = excluded.customer_id,
            plan_name = excluded.plan_name,
            plan_price = excluded.plan_price,
            status = excluded.status,
            current_period_start = excluded.current_period_start,
            current_period_end = excluded.current_period_end,
            canceled_at = excluded.canceled_at,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(data.customer_id)
    .bind(data.stripe_subscription_id)
    .bind(data.plan_name)
    .bind(data.plan_price)
    .bind(data.status)
    .bind(data.current_period_start)
    .bind(data.current_period_end)
    .bind(data.canceled_at)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Marks a subscription CANCELED and stamps the cancellation time. A miss
/// (no matching row) affects zero rows and is not an error.
pub async fn cancel_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    stripe_subscription_id: &str,
    canceled_at: DateTime<Utc>,
) -> Res<u64> {
    sqlx::query(
        r#"
        UPDATE subscriptions
        SET status = $2, canceled_at = $3, updated_at = now()
        WHERE stripe_subscription_id = $1
        "#,
    )
    .bind(stripe_subscription_id)
    .bind(SubscriptionStatus::Canceled.as_str())
    .bind(canceled_at)
    .execute(executor)
    .await
    .map(|r| r.rows_affected())
    .map_err(AppError::from)
}

pub async fn mark_subscription_past_due<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    stripe_subscription_id: &str,
) -> Res<u64> {
    sqlx::query(
        r#"
        UPDATE subscriptions
        SET status = $2, updated_at = now()
        WHERE stripe_subscription_id = $1
        "#,
    )
    .bind(stripe_subscription_id)
    .bind(SubscriptionStatus::PastDue.as_str())
    .execute(executor)
    .await
    .map(|r| r.rows_affected())
    .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use super::*;
    use crate::{
        customer::upsert_customer, dtos::customer::CustomerUpsertRequest, models::customer::Customer,
    };

    async fn seed_customer(pool: &PgPool) -> Customer {
        upsert_customer(
            pool,
            CustomerUpsertRequest {
                stripe_id: "cus_sub_1".to_string(),
                email: "grace@example.com".to_string(),
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                phone: String::new(),
                address: String::new(),
                city: String::new(),
                state: String::new(),
                zip_code: String::new(),
            },
        )
        .await
        .unwrap()
    }

    fn professional_plan(customer_id: Uuid, stripe_subscription_id: &str) -> SubscriptionUpsertRequest {
        SubscriptionUpsertRequest {
            customer_id,
            stripe_subscription_id: stripe_subscription_id.to_string(),
            plan_name: "Professional".to_string(),
            plan_price: 199.0,
            status: SubscriptionStatus::Active.as_str().to_string(),
            current_period_start: None,
            current_period_end: None,
            canceled_at: None,
        }
    }

    async fn fetch(pool: &PgPool, stripe_subscription_id: &str) -> Subscription {
        sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE stripe_subscription_id = $1",
        )
        .bind(stripe_subscription_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn cancel_without_a_matching_row_is_a_no_op(pool: PgPool) {
        let updated = cancel_subscription(&pool, "sub_missing", Utc::now())
            .await
            .unwrap();
        assert_eq!(updated, 0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    async fn cancel_stamps_the_matching_row(pool: PgPool) {
        let customer = seed_customer(&pool).await;
        upsert_subscription(&pool, professional_plan(customer.id, "sub_1"))
            .await
            .unwrap();

        let canceled_at = Utc::now();
        let updated = cancel_subscription(&pool, "sub_1", canceled_at)
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let row = fetch(&pool, "sub_1").await;
        assert_eq!(row.status, SubscriptionStatus::Canceled.as_str());
        assert!(row.canceled_at.is_some());
    }

    #[sqlx::test]
    async fn mark_past_due_changes_only_the_status(pool: PgPool) {
        let customer = seed_customer(&pool).await;
        upsert_subscription(&pool, professional_plan(customer.id, "sub_1"))
            .await
            .unwrap();

        let updated = mark_subscription_past_due(&pool, "sub_1").await.unwrap();
        assert_eq!(updated, 1);

        let row = fetch(&pool, "sub_1").await;
        assert_eq!(row.status, SubscriptionStatus::PastDue.as_str());
        assert_eq!(row.plan_name, "Professional");
        assert!(row.canceled_at.is_none());
    }

    #[sqlx::test]
    async fn upsert_overwrites_the_existing_row(pool: PgPool) {
        let customer = seed_customer(&pool).await;
        upsert_subscription(&pool, professional_plan(customer.id, "sub_1"))
            .await
            .unwrap();

        let mut updated = professional_plan(customer.id, "sub_1");
        updated.status = SubscriptionStatus::PastDue.as_str().to_string();
        updated.plan_price = 299.0;
        upsert_subscription(&pool, updated).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let row = fetch(&pool, "sub_1").await;
        assert_eq!(row.status, SubscriptionStatus::PastDue.as_str());
        assert_eq!(row.plan_price, 299.0);
    }
}
