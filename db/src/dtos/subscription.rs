use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Write request for the subscription upsert, keyed by the Stripe
/// subscription id. All mutable fields are overwritten with the provider's
/// current state, not merged.
pub struct SubscriptionUpsertRequest {
    pub customer_id: Uuid,
    pub stripe_subscription_id: String,
    pub plan_name: String,
    pub plan_price: f64,
    pub status: String,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}
