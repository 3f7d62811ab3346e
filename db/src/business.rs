use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::{dtos::business::BusinessCreateRequest, models::business::Business};

pub async fn insert_business<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: BusinessCreateRequest,
) -> Res<Business> {
    sqlx::query_as::<_, Business>(
        r#"
        INSERT INTO businesses (customer_id, business_name, website, industry, business_size, project_goals, timeline)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(data.customer_id)
    .bind(data.business_name)
    .bind(data.website)
    .bind(data.industry)
    .bind(data.business_size)
    .bind(data.project_goals)
    .bind(data.timeline)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}
