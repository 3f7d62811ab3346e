use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::{dtos::customer::CustomerUpsertRequest, models::customer::Customer};

pub async fn get_customer_by_email<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email: &str,
) -> Res<Option<Customer>> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_customer_by_stripe_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    stripe_id: &str,
) -> Res<Option<Customer>> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE stripe_id = $1")
        .bind(stripe_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Insert-or-update in one statement, keyed by email. On conflict, only
/// non-empty incoming fields overwrite the stored row; address fields are
/// kept from the first purchase.
pub async fn upsert_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: CustomerUpsertRequest,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (stripe_id, email, first_name, last_name, phone, address, city, state, zip_code)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (email) DO UPDATE SET
            stripe_id = excluded.stripe_id,
            first_name = COALESCE(NULLIF(excluded.first_name, ''), customers.first_name),
            last_name = COALESCE(NULLIF(excluded.last_name, ''), customers.last_name),
            phone = COALESCE(NULLIF(excluded.phone, ''), customers.phone),
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(data.stripe_id)
    .bind(data.email)
    .bind(data.first_name)
    .bind(data.last_name)
    .bind(data.phone)
    .bind(data.address)
    .bind(data.city)
    .bind(data.state)
    .bind(data.zip_code)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;

    fn intake(stripe_id: &str, email: &str) -> CustomerUpsertRequest {
        CustomerUpsertRequest {
            stripe_id: stripe_id.to_string(),
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: "+15558675309".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
        }
    }

    #[sqlx::test]
    async fn first_purchase_inserts_a_full_row(pool: PgPool) {
        let created = upsert_customer(&pool, intake("cus_1", "ada@example.com"))
            .await
            .unwrap();
        assert_eq!(created.stripe_id, "cus_1");
        assert_eq!(created.email, "ada@example.com");
        assert_eq!(created.first_name, "Ada");

        let fetched = get_customer_by_email(&pool, "ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[sqlx::test]
    async fn repeat_purchase_keeps_stored_fields_when_incoming_are_empty(pool: PgPool) {
        upsert_customer(&pool, intake("cus_1", "ada@example.com"))
            .await
            .unwrap();

        let repeat = CustomerUpsertRequest {
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            ..intake("cus_2", "ada@example.com")
        };
        upsert_customer(&pool, repeat).await.unwrap();

        let row = get_customer_by_email(&pool, "ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.stripe_id, "cus_2");
        assert_eq!(row.first_name, "Ada");
        assert_eq!(row.last_name, "Lovelace");
        assert_eq!(row.phone, "+15558675309");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    async fn repeat_purchase_overwrites_with_non_empty_fields(pool: PgPool) {
        upsert_customer(&pool, intake("cus_1", "ada@example.com"))
            .await
            .unwrap();

        let repeat = CustomerUpsertRequest {
            first_name: "Augusta".to_string(),
            phone: "+15550000000".to_string(),
            ..intake("cus_1", "ada@example.com")
        };
        upsert_customer(&pool, repeat).await.unwrap();

        let row = get_customer_by_email(&pool, "ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.first_name, "Augusta");
        assert_eq!(row.last_name, "Lovelace");
        assert_eq!(row.phone, "+15550000000");
    }
}
