use chrono::{DateTime, Utc};
use common::{
    env_config::Config,
    error::{AppError, Res},
};
use db::{
    dtos::{
        business::BusinessCreateRequest, customer::CustomerUpsertRequest,
        subscription::SubscriptionUpsertRequest, transaction::TransactionCreateRequest,
    },
    models::{subscription::SubscriptionStatus, transaction::TRANSACTION_STATUS_SUCCEEDED},
};
use serde_json::json;
use sqlx::PgPool;
use stripe::{
    Charge, CheckoutSession, Client, Event, EventObject, EventType, Invoice, Subscription, Webhook,
};

/// Creates an event for the webhook based on the request payload and signature.
/// Requires the webhook signing secret.
pub fn construct_event(payload: &str, signature: &str, webhook_secret: &str) -> Res<Event> {
    match Webhook::construct_event(payload, signature, webhook_secret) {
        Ok(event) => Ok(event),
        Err(e) => {
            log::error!("Webhook signature verification failed: {}", e);
            Err(AppError::BadRequest(format!("Webhook Error: {}", e)))
        }
    }
}

/// Dispatches one verified webhook event to its handler.
///
/// Unrecognized event types are logged and acknowledged as a no-op so
/// Stripe does not retry them; handler errors bubble up as 500 and Stripe's
/// own retry policy is the sole recovery mechanism.
pub async fn process_event(
    client: &Client,
    pool: &PgPool,
    config: &Config,
    event: Event,
) -> Res<()> {
    log::info!("Processing webhook event: {}", event.type_);

    match event.type_ {
        EventType::CheckoutSessionCompleted => {
            if let EventObject::CheckoutSession(session) = event.data.object {
                handle_checkout_completed(client, pool, config, session).await?;
            }
        }
        EventType::CustomerSubscriptionCreated | EventType::CustomerSubscriptionUpdated => {
            if let EventObject::Subscription(subscription) = event.data.object {
                handle_subscription_update(pool, subscription).await?;
            }
        }
        EventType::CustomerSubscriptionDeleted => {
            if let EventObject::Subscription(subscription) = event.data.object {
                handle_subscription_canceled(pool, subscription).await?;
            }
        }
        EventType::InvoicePaymentSucceeded => {
            if let EventObject::Invoice(invoice) = event.data.object {
                handle_invoice_paid(pool, invoice).await?;
            }
        }
        EventType::InvoicePaymentFailed => {
            if let EventObject::Invoice(invoice) = event.data.object {
                handle_payment_failed(pool, invoice).await?;
            }
        }
        other => {
            log::info!("Unhandled event type: {}", other);
        }
    }

    Ok(())
}

/// Initial purchase: materialize the customer (and business, if named on
/// the intake form), record the transaction, then attempt confirmations.
async fn handle_checkout_completed(
    client: &Client,
    pool: &PgPool,
    config: &Config,
    session: CheckoutSession,
) -> Res<()> {
    log::info!("Processing checkout.session.completed: {}", session.id);

    // The webhook payload is partial; re-fetch with the pieces we need.
    let full = CheckoutSession::retrieve(
        client,
        &session.id,
        &["customer", "line_items", "payment_intent"],
    )
    .await?;

    let Some(customer) = full.customer.as_ref().and_then(|c| c.as_object()) else {
        log::error!("No customer found for session: {}", session.id);
        return Ok(());
    };
    let payment_intent = full.payment_intent.as_ref().and_then(|pi| pi.as_object());
    let line_item = full.line_items.as_ref().and_then(|items| items.data.first());
    let details = full.customer_details.as_ref();

    // Intake-form fields from our checkout metadata, falling back to what
    // Stripe collected on the hosted page.
    let metadata = session.metadata.clone().unwrap_or_default();
    let email = customer
        .email
        .clone()
        .or_else(|| details.and_then(|d| d.email.clone()))
        .unwrap_or_default();
    let phone = metadata
        .get("customer_phone")
        .cloned()
        .or_else(|| details.and_then(|d| d.phone.clone()))
        .unwrap_or_default();
    let first_name = metadata
        .get("customer_first_name")
        .cloned()
        .unwrap_or_default();
    let last_name = metadata
        .get("customer_last_name")
        .cloned()
        .unwrap_or_default();
    let business_name = metadata
        .get("customer_business")
        .cloned()
        .unwrap_or_default();
    let website = metadata
        .get("customer_website")
        .cloned()
        .unwrap_or_default();
    let address = details.and_then(|d| d.address.as_ref());

    let plan_name = metadata
        .get("plan_name")
        .cloned()
        .or_else(|| line_item.map(|item| item.description.clone()))
        .unwrap_or_else(|| "Unknown Plan".to_string());
    let plan_period = metadata
        .get("plan_period")
        .cloned()
        .unwrap_or_else(|| "one-time".to_string());
    let amount = amount_from_minor_units(full.amount_total.unwrap_or(0));
    let amount_display = format!("${:.2}", amount);
    let currency = full
        .currency
        .map(|c| c.to_string())
        .unwrap_or_else(|| "usd".to_string());

    // Money records commit or roll back together; notifications run after.
    let mut tx = pool.begin().await?;

    let db_customer = db::customer::upsert_customer(
        &mut *tx,
        CustomerUpsertRequest {
            stripe_id: customer.id.to_string(),
            email: email.clone(),
            first_name: first_name.clone(),
            last_name,
            phone: phone.clone(),
            address: address.and_then(|a| a.line1.clone()).unwrap_or_default(),
            city: address.and_then(|a| a.city.clone()).unwrap_or_default(),
            state: address.and_then(|a| a.state.clone()).unwrap_or_default(),
            zip_code: address
                .and_then(|a| a.postal_code.clone())
                .unwrap_or_default(),
        },
    )
    .await?;
    log::info!("Upserted customer: {}", db_customer.id);

    // A customer can buy for more than one business; one record per purchase.
    if !business_name.is_empty() {
        let business = db::business::insert_business(
            &mut *tx,
            BusinessCreateRequest {
                customer_id: db_customer.id,
                business_name,
                website: (!website.is_empty()).then_some(website),
                industry: "other".to_string(),
                business_size: "small".to_string(),
                project_goals: format!("{} plan purchase", plan_name),
                timeline: "asap".to_string(),
            },
        )
        .await?;
        log::info!(
            "Created business {} for customer {}",
            business.id,
            db_customer.id
        );
    }

    let transaction = db::transaction::insert_transaction(
        &mut *tx,
        TransactionCreateRequest {
            customer_id: db_customer.id,
            stripe_payment_id: payment_intent
                .map(|pi| pi.id.to_string())
                .unwrap_or_else(|| session.id.to_string()),
            amount,
            currency,
            status: TRANSACTION_STATUS_SUCCEEDED.to_string(),
            plan_name: plan_name.clone(),
            plan_period: plan_period.clone(),
            description: format!("{} - {}", plan_name, plan_period),
            receipt_email: email.clone(),
            metadata: Some(json!({
                "session_id": session.id.to_string(),
                "customer_id": customer.id.to_string(),
            })),
        },
    )
    .await?;

    tx.commit().await?;
    log::info!("Created transaction: {}", transaction.id);

    let receipt_url = match payment_intent.and_then(|pi| pi.latest_charge.as_ref()) {
        Some(charge) => {
            Charge::retrieve(client, &charge.id(), &[])
                .await?
                .receipt_url
        }
        None => None,
    };

    let display_name = if first_name.is_empty() {
        "Valued Customer"
    } else {
        first_name.as_str()
    };
    let http = reqwest::Client::new();
    let email_sent = notify::email::send_confirmation_email(
        &http,
        &config.sendgrid,
        &email,
        display_name,
        &plan_name,
        &amount_display,
        receipt_url.as_deref(),
    )
    .await;
    let sms_sent = if phone.is_empty() {
        false
    } else {
        notify::sms::send_confirmation_sms(
            &http,
            &config.twilio,
            &phone,
            display_name,
            &plan_name,
            &amount_display,
        )
        .await
    };

    db::transaction::set_notification_flags(pool, transaction.id, email_sent, sms_sent).await?;
    log::info!("Notifications sent - Email: {}, SMS: {}", email_sent, sms_sent);

    Ok(())
}

/// Mirrors the provider's current subscription state into the local row,
/// keyed by the Stripe subscription id.
async fn handle_subscription_update(pool: &PgPool, subscription: Subscription) -> Res<()> {
    log::info!("Processing subscription update: {}", subscription.id);

    let customer_id = subscription.customer.id();
    let Some(customer) = db::customer::get_customer_by_stripe_id(pool, customer_id.as_str()).await?
    else {
        log::warn!("Customer not found for subscription: {}", subscription.id);
        return Ok(());
    };

    let price = subscription
        .items
        .data
        .first()
        .and_then(|item| item.price.as_ref());
    let plan_name = price
        .and_then(|p| p.nickname.clone())
        .unwrap_or_else(|| "Subscription".to_string());
    let plan_price = amount_from_minor_units(price.and_then(|p| p.unit_amount).unwrap_or(0));
    let status = map_subscription_status(&subscription.status.to_string());

    let row = db::subscription::upsert_subscription(
        pool,
        SubscriptionUpsertRequest {
            customer_id: customer.id,
            stripe_subscription_id: subscription.id.to_string(),
            plan_name,
            plan_price,
            status: status.as_str().to_string(),
            current_period_start: DateTime::from_timestamp(subscription.current_period_start, 0),
            current_period_end: DateTime::from_timestamp(subscription.current_period_end, 0),
            canceled_at: subscription
                .canceled_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        },
    )
    .await?;
    log::info!("Upserted subscription {} for customer {}", row.id, customer.id);

    Ok(())
}

async fn handle_subscription_canceled(pool: &PgPool, subscription: Subscription) -> Res<()> {
    log::info!("Processing subscription cancellation: {}", subscription.id);

    // Zero rows affected is fine: nothing local to cancel.
    db::subscription::cancel_subscription(pool, subscription.id.as_str(), Utc::now()).await?;
    Ok(())
}

/// Recurring billing only. The initial invoice of a checkout is already
/// covered by checkout.session.completed.
async fn handle_invoice_paid(pool: &PgPool, invoice: Invoice) -> Res<()> {
    log::info!("Processing invoice payment: {}", invoice.id);

    let Some(subscription_id) = invoice.subscription.as_ref().map(|s| s.id()) else {
        return Ok(());
    };
    let Some(customer_id) = invoice.customer.as_ref().map(|c| c.id()) else {
        return Ok(());
    };
    let Some(customer) =
        db::customer::get_customer_by_stripe_id(pool, customer_id.as_str()).await?
    else {
        return Ok(());
    };

    let line_description = invoice
        .lines
        .as_ref()
        .and_then(|lines| lines.data.first())
        .and_then(|line| line.description.clone())
        .unwrap_or_else(|| "Subscription".to_string());
    let payment_id = invoice
        .payment_intent
        .as_ref()
        .map(|pi| pi.id().to_string())
        .unwrap_or_else(|| invoice.id.to_string());

    let transaction = db::transaction::insert_transaction(
        pool,
        TransactionCreateRequest {
            customer_id: customer.id,
            stripe_payment_id: payment_id,
            amount: amount_from_minor_units(invoice.amount_paid.unwrap_or(0)),
            currency: invoice
                .currency
                .map(|c| c.to_string())
                .unwrap_or_else(|| "usd".to_string()),
            status: TRANSACTION_STATUS_SUCCEEDED.to_string(),
            plan_name: line_description.clone(),
            plan_period: "recurring".to_string(),
            description: format!("Recurring payment - {}", line_description),
            receipt_email: customer.email,
            metadata: None,
        },
    )
    .await?;
    log::info!(
        "Created transaction {} for subscription {}",
        transaction.id,
        subscription_id
    );

    Ok(())
}

async fn handle_payment_failed(pool: &PgPool, invoice: Invoice) -> Res<()> {
    log::info!("Processing failed payment: {}", invoice.id);

    let Some(customer_id) = invoice.customer.as_ref().map(|c| c.id()) else {
        return Ok(());
    };
    if db::customer::get_customer_by_stripe_id(pool, customer_id.as_str())
        .await?
        .is_none()
    {
        return Ok(());
    }

    if let Some(subscription) = invoice.subscription.as_ref() {
        let subscription_id = subscription.id();
        let updated =
            db::subscription::mark_subscription_past_due(pool, subscription_id.as_str()).await?;
        if updated > 0 {
            log::info!("Marked subscription {} past due", subscription_id);
        }
    }

    Ok(())
}

/// Stripe reports minor units (cents); we store whole currency units.
pub(crate) fn amount_from_minor_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Maps a Stripe subscription status string to the local enum. An unmapped
/// status is loudly defaulted to ACTIVE pending a dedicated unknown state.
pub(crate) fn map_subscription_status(status: &str) -> SubscriptionStatus {
    match status {
        "active" => SubscriptionStatus::Active,
        "past_due" => SubscriptionStatus::PastDue,
        "canceled" => SubscriptionStatus::Canceled,
        "unpaid" => SubscriptionStatus::Unpaid,
        "trialing" => SubscriptionStatus::Trialing,
        "paused" => SubscriptionStatus::Paused,
        other => {
            log::warn!(
                "Unmapped Stripe subscription status {:?}, defaulting to ACTIVE",
                other
            );
            SubscriptionStatus::Active
        }
    }
}
