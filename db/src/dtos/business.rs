use uuid::Uuid;

pub struct BusinessCreateRequest {
    pub customer_id: Uuid,
    pub business_name: String,
    pub website: Option<String>,
    pub industry: String,
    pub business_size: String,
    pub project_goals: String,
    pub timeline: String,
}
