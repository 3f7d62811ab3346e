use common::env_config::TwilioConfig;

/// Normalizes a raw phone number to a single international-prefixed digit
/// string: non-digits dropped, a `1` country code prepended to bare
/// 10-digit numbers, then a leading `+`.
pub fn normalize_phone(raw: &str) -> String {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if !digits.starts_with('1') && digits.len() == 10 {
        digits.insert(0, '1');
    }
    format!("+{}", digits)
}

/// Sends one SMS through Twilio. Same fire-and-forget contract as the email
/// sender: failures degrade to a logged `false`, and missing credentials
/// disable sending entirely.
pub async fn send_sms(http: &reqwest::Client, config: &TwilioConfig, to: &str, body: &str) -> bool {
    if !config.is_configured() {
        log::warn!("Twilio not configured, skipping SMS");
        return false;
    }

    if config.phone_number.is_empty() {
        log::warn!("TWILIO_PHONE_NUMBER not configured, skipping SMS");
        return false;
    }

    let to = normalize_phone(to);
    let url = format!(
        "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
        config.account_sid
    );
    let params = [
        ("To", to.as_str()),
        ("From", config.phone_number.as_str()),
        ("Body", body),
    ];

    let result = http
        .post(&url)
        .basic_auth(&config.account_sid, Some(&config.auth_token))
        .form(&params)
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            log::info!("SMS sent successfully to {}", to);
            true
        }
        Ok(response) => {
            log::error!(
                "Failed to send SMS to {}: Twilio answered {}",
                to,
                response.status()
            );
            false
        }
        Err(e) => {
            log::error!("Failed to send SMS to {}: {}", to, e);
            false
        }
    }
}

/// Renders and sends the payment-confirmation text message.
pub async fn send_confirmation_sms(
    http: &reqwest::Client,
    config: &TwilioConfig,
    phone: &str,
    customer_name: &str,
    plan_name: &str,
    amount: &str,
) -> bool {
    let message = render_confirmation_sms(customer_name, plan_name, amount);
    send_sms(http, config, phone, &message).await
}

fn render_confirmation_sms(customer_name: &str, plan_name: &str, amount: &str) -> String {
    format!(
        "Hi {}! Your BetterWeb {} plan purchase of {} is confirmed. \
         Our team will contact you within 24 hours to start your project. \
         Questions? Reply to this text or email support@betterweb.pro",
        customer_name, plan_name, amount
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::env_config::TwilioConfig;

    #[test]
    fn normalize_strips_formatting() {
        assert_eq!(normalize_phone("(555) 867-5309"), "+15558675309");
    }

    #[test]
    fn normalize_keeps_existing_country_code() {
        assert_eq!(normalize_phone("+1 555 867 5309"), "+15558675309");
        assert_eq!(normalize_phone("15558675309"), "+15558675309");
    }

    #[test]
    fn normalize_does_not_prefix_non_us_length() {
        assert_eq!(normalize_phone("44 20 7946 0958"), "+442079460958");
    }

    #[test]
    fn confirmation_message_names_plan_and_amount() {
        let message = render_confirmation_sms("Ada", "Professional", "$199.00");
        assert!(message.contains("Hi Ada!"));
        assert!(message.contains("Professional plan purchase of $199.00"));
    }

    #[tokio::test]
    async fn send_sms_is_disabled_without_credentials() {
        let config = TwilioConfig {
            account_sid: String::new(),
            auth_token: String::new(),
            phone_number: String::new(),
        };
        let http = reqwest::Client::new();
        assert!(!send_sms(&http, &config, "5558675309", "hello").await);
    }
}
