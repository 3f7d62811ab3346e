use uuid::Uuid;

pub struct TransactionCreateRequest {
    pub customer_id: Uuid,
    pub stripe_payment_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub plan_name: String,
    pub plan_period: String,
    pub description: String,
    pub receipt_email: String,
    pub metadata: Option<serde_json::Value>,
}
