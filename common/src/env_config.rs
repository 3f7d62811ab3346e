use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds everything needed to run the service: database connection,
/// server bind parameters, CORS settings, logging preferences, the Stripe
/// keys and plan-price allow-list, and the notification provider
/// credentials.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Public base URL of the site, used for checkout redirect URLs.
    pub app_base_url: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// The configured Stripe price ids, one per plan.
    pub plan_prices: PlanPrices,
    /// SendGrid credentials for confirmation emails.
    pub sendgrid: SendgridConfig,
    /// Twilio credentials for confirmation SMS.
    pub twilio: TwilioConfig,
}

#[derive(Clone, Debug)]
/// The fixed allow-list of purchasable Stripe prices.
///
/// Checkout sessions may only be created for one of these three ids;
/// anything else is rejected before Stripe is contacted.
pub struct PlanPrices {
    pub starter: String,
    pub professional: String,
    pub enterprise: String,
}

impl PlanPrices {
    pub fn contains(&self, price_id: &str) -> bool {
        !price_id.is_empty()
            && (price_id == self.starter
                || price_id == self.professional
                || price_id == self.enterprise)
    }
}

#[derive(Clone, Debug)]
pub struct SendgridConfig {
    /// SendGrid API key. Empty means email sending is disabled.
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Clone, Debug)]
pub struct TwilioConfig {
    /// Twilio account SID. Empty means SMS sending is disabled.
    pub account_sid: String,
    pub auth_token: String,
    /// The sending phone number, in E.164 format.
    pub phone_number: String,
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty()
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// Required:
    /// - `ENVIRONMENT`: "development" or "production"
    /// - `DATABASE_URL`: Connection string for the database
    /// - `STRIPE_SECRET_KEY`: Stripe API secret key
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `APP_BASE_URL`: Public site URL for checkout redirects (default: "http://localhost:3000")
    /// - `STRIPE_WEBHOOK_SECRET`, `STRIPE_PRICE_*`: empty when unset
    /// - `SENDGRID_*` / `TWILIO_*`: empty means the sender is disabled
    ///
    /// # Panics
    ///
    /// Panics if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY")
                .expect("STRIPE_SECRET_KEY must be set"),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            plan_prices: PlanPrices {
                starter: env::var("STRIPE_PRICE_STARTER").unwrap_or_default(),
                professional: env::var("STRIPE_PRICE_PROFESSIONAL").unwrap_or_default(),
                enterprise: env::var("STRIPE_PRICE_ENTERPRISE").unwrap_or_default(),
            },
            sendgrid: SendgridConfig {
                api_key: env::var("SENDGRID_API_KEY").unwrap_or_default(),
                from_email: env::var("SENDGRID_FROM_EMAIL")
                    .unwrap_or_else(|_| "support@betterweb.pro".to_string()),
                from_name: env::var("SENDGRID_FROM_NAME")
                    .unwrap_or_else(|_| "BetterWeb Support".to_string()),
            },
            twilio: TwilioConfig {
                account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
                auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
                phone_number: env::var("TWILIO_PHONE_NUMBER").unwrap_or_default(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plans() -> PlanPrices {
        PlanPrices {
            starter: "price_starter".to_string(),
            professional: "price_professional".to_string(),
            enterprise: "price_enterprise".to_string(),
        }
    }

    #[test]
    fn allow_list_accepts_configured_prices() {
        let plans = plans();
        assert!(plans.contains("price_starter"));
        assert!(plans.contains("price_professional"));
        assert!(plans.contains("price_enterprise"));
    }

    #[test]
    fn allow_list_rejects_unknown_and_empty() {
        let plans = plans();
        assert!(!plans.contains("price_other"));
        assert!(!plans.contains(""));
    }

    #[test]
    fn empty_configured_price_never_matches_empty_input() {
        let plans = PlanPrices {
            starter: String::new(),
            professional: "price_professional".to_string(),
            enterprise: "price_enterprise".to_string(),
        };
        assert!(!plans.contains(""));
    }
}
