use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Checkout intake payload from the pricing page.
///
/// `metadata` carries the intake-form fields verbatim into the Stripe
/// session (customer_first_name, customer_last_name, customer_phone,
/// customer_business, customer_website, plan_name, plan_period); the
/// webhook reconciler reads them back when the session completes.
#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub price_id: Option<String>,
    pub email: Option<String>,
    pub customer_id: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}
