use std::sync::Arc;

use actix_web::{Responder, post, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    stripe,
};
use sqlx::PgPool;

use crate::services;

/// Receives Stripe webhook events and reconciles them into the database.
///
/// Not called by the frontend: Stripe's servers deliver events here
/// (configure the URL under Developers → Webhooks and set
/// `STRIPE_WEBHOOK_SECRET` to the endpoint's signing secret).
///
/// # Input
/// - `payload`: Raw request body, verified against the `stripe-signature`
///   header before anything is processed.
///
/// # Output
/// - Success: `{"received": true}` — also for event types we don't handle,
///   so Stripe does not retry them.
/// - Error: 400 for a missing or invalid signature, 500 when a handler
///   fails (Stripe's retry policy is the recovery mechanism).
#[post("/stripe")]
async fn post_stripe_webhook(
    payload: String,
    req: actix_web::HttpRequest,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let signature = match req.headers().get("stripe-signature") {
        Some(signature) => signature.to_str().unwrap_or(""),
        None => return Err(AppError::BadRequest("Stripe signature missing".to_string())),
    };

    let event =
        services::webhook::construct_event(&payload, signature, &config.stripe_webhook_secret)?;

    let client = stripe::create_client(&config.stripe_secret_key);
    services::webhook::process_event(&client, &pool, &config, event).await?;

    Success::ok(serde_json::json!({ "received": true }))
}
