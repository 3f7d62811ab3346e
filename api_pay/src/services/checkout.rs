use std::collections::HashMap;

use common::{
    env_config::Config,
    error::{AppError, Res},
};
use stripe::{
    CheckoutSession, CheckoutSessionBillingAddressCollection, CheckoutSessionCustomerCreation,
    CheckoutSessionMode, Client, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionPaymentMethodTypes, CreateCheckoutSessionPhoneNumberCollection,
    CustomerId,
};

use crate::dtos::checkout::CheckoutRequest;

/// A purchase is a subscription when the intake form's plan period mentions
/// a monthly cadence; everything else is a one-time payment.
pub(crate) fn is_subscription_purchase(metadata: &HashMap<String, String>) -> bool {
    metadata
        .get("plan_period")
        .is_some_and(|period| period.contains("month"))
}

/// Validates the requested plan price against the configured allow-list and
/// creates a hosted checkout session for it.
///
/// One-time mode asks Stripe to always create a customer record so the
/// webhook can key reconciliation on a stable customer id; subscription
/// mode must omit that flag (Stripe rejects it) and creates the customer
/// implicitly.
pub async fn create_checkout_session(
    client: &Client,
    config: &Config,
    req: CheckoutRequest,
) -> Res<CheckoutSession> {
    let price_id = match req.price_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => return Err(AppError::BadRequest("Price ID is required".to_string())),
    };
    if !config.plan_prices.contains(price_id) {
        return Err(AppError::BadRequest("Invalid price ID".to_string()));
    }

    let metadata = req.metadata.unwrap_or_default();
    let subscription = is_subscription_purchase(&metadata);

    let success_url = format!(
        "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
        config.app_base_url
    );
    let cancel_url = format!("{}/#pricing", config.app_base_url);

    let mut params = CreateCheckoutSession {
        mode: Some(if subscription {
            CheckoutSessionMode::Subscription
        } else {
            CheckoutSessionMode::Payment
        }),
        payment_method_types: Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]),
        line_items: Some(vec![CreateCheckoutSessionLineItems {
            price: Some(price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]),
        success_url: Some(success_url.as_str()),
        cancel_url: Some(cancel_url.as_str()),
        metadata: Some(metadata),
        billing_address_collection: Some(CheckoutSessionBillingAddressCollection::Required),
        phone_number_collection: Some(CreateCheckoutSessionPhoneNumberCollection { enabled: true }),
        customer_creation: (!subscription).then_some(CheckoutSessionCustomerCreation::Always),
        ..Default::default()
    };

    if let Some(email) = req.email.as_deref() {
        params.customer_email = Some(email);
    }
    if let Some(customer_id) = req.customer_id.as_deref() {
        let id = customer_id
            .parse::<CustomerId>()
            .map_err(|e| AppError::BadRequest(format!("Invalid customer ID: {}", e)))?;
        params.customer = Some(id);
    }

    CheckoutSession::create(client, params)
        .await
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::env_config::{PlanPrices, SendgridConfig, TwilioConfig};

    fn metadata(period: &str) -> HashMap<String, String> {
        HashMap::from([("plan_period".to_string(), period.to_string())])
    }

    fn test_config() -> Config {
        Config {
            environment: "development".to_string(),
            database_url: "postgresql://localhost/betterweb".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            num_workers: 1,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            console_logging_enabled: false,
            app_base_url: "http://localhost:3000".to_string(),
            stripe_secret_key: "sk_test_123".to_string(),
            stripe_webhook_secret: "whsec_123".to_string(),
            plan_prices: PlanPrices {
                starter: "price_starter".to_string(),
                professional: "price_professional".to_string(),
                enterprise: "price_enterprise".to_string(),
            },
            sendgrid: SendgridConfig {
                api_key: String::new(),
                from_email: "support@betterweb.pro".to_string(),
                from_name: "BetterWeb Support".to_string(),
            },
            twilio: TwilioConfig {
                account_sid: String::new(),
                auth_token: String::new(),
                phone_number: String::new(),
            },
        }
    }

    #[test]
    fn monthly_period_selects_subscription_mode() {
        assert!(is_subscription_purchase(&metadata("monthly")));
        assert!(is_subscription_purchase(&metadata("month")));
        assert!(is_subscription_purchase(&metadata("per month")));
    }

    #[test]
    fn other_periods_select_payment_mode() {
        assert!(!is_subscription_purchase(&metadata("one-time")));
        assert!(!is_subscription_purchase(&metadata("yearly")));
        assert!(!is_subscription_purchase(&HashMap::new()));
    }

    #[tokio::test]
    async fn missing_price_is_rejected_before_stripe() {
        let client = Client::new("sk_test_123");
        let req = CheckoutRequest {
            price_id: None,
            email: None,
            customer_id: None,
            metadata: None,
        };
        let err = create_checkout_session(&client, &test_config(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Price ID is required"));
    }

    #[tokio::test]
    async fn unknown_price_is_rejected_before_stripe() {
        let client = Client::new("sk_test_123");
        let req = CheckoutRequest {
            price_id: Some("price_unknown".to_string()),
            email: None,
            customer_id: None,
            metadata: None,
        };
        let err = create_checkout_session(&client, &test_config(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid price ID"));
    }

    #[tokio::test]
    async fn malformed_customer_id_is_rejected() {
        let client = Client::new("sk_test_123");
        let req = CheckoutRequest {
            price_id: Some("price_starter".to_string()),
            email: None,
            customer_id: Some("not-a-customer-id".to_string()),
            metadata: None,
        };
        let err = create_checkout_session(&client, &test_config(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
