use std::sync::Arc;

use actix_web::{Responder, post, web};
use common::{env_config::Config, error::Res, http::Success, stripe};

use crate::{
    dtos::checkout::{CheckoutRequest, CheckoutResponse},
    services,
};

/// Creates a Stripe-hosted checkout session for one of the configured plans.
///
/// # Input
/// - `price_id`: Required. Must be one of the configured plan prices.
/// - `email`: Optional. Pre-fills the checkout page.
/// - `customer_id`: Optional. Reuses an existing Stripe customer.
/// - `metadata`: Optional. Intake-form fields, echoed back by the webhook.
///
/// # Output
/// - Success: `{ session_id, url }` where `url` is the hosted payment page
///   to redirect the browser to.
/// - Error: 400 for a missing/unknown price or malformed customer id,
///   500 when Stripe rejects the session.
#[post("/create-checkout-session")]
async fn post_create_checkout_session(
    req: web::Json<CheckoutRequest>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let client = stripe::create_client(&config.stripe_secret_key);

    let session =
        services::checkout::create_checkout_session(&client, &config, req.into_inner()).await?;

    Success::ok(CheckoutResponse {
        session_id: session.id.to_string(),
        url: session.url.unwrap_or_default(),
    })
}
