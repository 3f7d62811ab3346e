use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only record of a single successful payment, either the initial
/// checkout or a recurring invoice.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub stripe_payment_id: String,
    /// Amount in whole currency units (Stripe reports minor units).
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub plan_name: String,
    pub plan_period: String,
    pub description: String,
    pub receipt_email: String,
    pub metadata: Option<serde_json::Value>,
    pub email_sent: bool,
    pub sms_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const TRANSACTION_STATUS_SUCCEEDED: &str = "SUCCEEDED";
