use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub business_name: String,
    pub website: Option<String>,
    pub industry: String,
    pub business_size: String,
    pub project_goals: String,
    pub timeline: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
