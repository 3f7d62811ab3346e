use chrono::{Datelike, Utc};
use common::env_config::SendgridConfig;
use serde_json::json;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Sends one transactional email through SendGrid. Fire-and-forget: any
/// failure is logged and reported as `false`, never as an error. Returns
/// `false` without calling out when no API key is configured.
pub async fn send_email(
    http: &reqwest::Client,
    config: &SendgridConfig,
    to: &str,
    subject: &str,
    html: &str,
) -> bool {
    if config.api_key.is_empty() {
        log::warn!("SENDGRID_API_KEY not configured, skipping email");
        return false;
    }

    let body = json!({
        "personalizations": [{ "to": [{ "email": to }] }],
        "from": { "email": config.from_email, "name": config.from_name },
        "subject": subject,
        "content": [
            { "type": "text/plain", "value": strip_tags(html) },
            { "type": "text/html", "value": html },
        ],
    });

    let result = http
        .post(SENDGRID_SEND_URL)
        .bearer_auth(&config.api_key)
        .json(&body)
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            log::info!("Email sent successfully to {}", to);
            true
        }
        Ok(response) => {
            log::error!(
                "Failed to send email to {}: SendGrid answered {}",
                to,
                response.status()
            );
            false
        }
        Err(e) => {
            log::error!("Failed to send email to {}: {}", to, e);
            false
        }
    }
}

/// Renders and sends the payment-confirmation email. `amount` is already
/// formatted for display (e.g. "$199.00").
pub async fn send_confirmation_email(
    http: &reqwest::Client,
    config: &SendgridConfig,
    email: &str,
    customer_name: &str,
    plan_name: &str,
    amount: &str,
    receipt_url: Option<&str>,
) -> bool {
    let html = render_confirmation_html(customer_name, plan_name, amount, receipt_url);
    let subject = format!("Payment Confirmed - {} Plan", plan_name);
    send_email(http, config, email, &subject, &html).await
}

fn render_confirmation_html(
    customer_name: &str,
    plan_name: &str,
    amount: &str,
    receipt_url: Option<&str>,
) -> String {
    let receipt_block = match receipt_url {
        Some(url) => format!(
            r#"<a href="{}" style="display: inline-block; background: linear-gradient(135deg, #00d4ff 0%, #00ff88 100%); color: #050510; text-decoration: none; padding: 14px 32px; border-radius: 8px; font-weight: 600; font-size: 16px;">View Receipt</a>"#,
            url
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background-color: #050510;">
  <div style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <div style="text-align: center; margin-bottom: 40px;">
      <h1 style="color: #00d4ff; font-size: 28px; margin: 0;">BetterWeb</h1>
    </div>
    <div style="background: linear-gradient(135deg, rgba(255,255,255,0.05) 0%, rgba(255,255,255,0.02) 100%); border: 1px solid rgba(255,255,255,0.1); border-radius: 16px; padding: 40px;">
      <h2 style="color: #ffffff; font-size: 24px; margin: 0 0 20px 0;">Payment Confirmed! &#127881;</h2>
      <p style="color: #a0a0b0; font-size: 16px; line-height: 1.6; margin: 0 0 20px 0;">Hi {customer_name},</p>
      <p style="color: #a0a0b0; font-size: 16px; line-height: 1.6; margin: 0 0 30px 0;">Thank you for your purchase! Your {plan_name} plan is now active.</p>
      <div style="background: rgba(0, 212, 255, 0.1); border-radius: 12px; padding: 20px; margin-bottom: 30px;">
        <h3 style="color: #00d4ff; font-size: 14px; text-transform: uppercase; letter-spacing: 1px; margin: 0 0 15px 0;">Order Summary</h3>
        <div style="display: flex; justify-content: space-between; margin-bottom: 10px;">
          <span style="color: #a0a0b0;">Plan</span>
          <span style="color: #ffffff; font-weight: 600;">{plan_name}</span>
        </div>
        <div style="display: flex; justify-content: space-between;">
          <span style="color: #a0a0b0;">Amount</span>
          <span style="color: #00ff88; font-weight: 600;">{amount}</span>
        </div>
      </div>
      {receipt_block}
      <p style="color: #a0a0b0; font-size: 14px; line-height: 1.6; margin: 30px 0 0 0;">Our team will reach out to you within 24 hours to begin your project. If you have any questions, reply to this email.</p>
    </div>
    <div style="text-align: center; margin-top: 40px;">
      <p style="color: #606070; font-size: 12px; margin: 0;">&copy; {year} BetterWeb. All rights reserved.</p>
    </div>
  </div>
</body>
</html>"#,
        customer_name = customer_name,
        plan_name = plan_name,
        amount = amount,
        receipt_block = receipt_block,
        year = Utc::now().year(),
    )
}

/// Crude tag stripper for the plain-text alternative part.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::env_config::SendgridConfig;

    #[test]
    fn confirmation_html_contains_order_details() {
        let html = render_confirmation_html("Ada", "Professional", "$199.00", None);
        assert!(html.contains("Hi Ada,"));
        assert!(html.contains("Your Professional plan is now active."));
        assert!(html.contains("$199.00"));
        assert!(!html.contains("View Receipt"));
    }

    #[test]
    fn confirmation_html_links_receipt_when_present() {
        let html = render_confirmation_html(
            "Ada",
            "Starter",
            "$0.00",
            Some("https://pay.stripe.com/receipts/abc"),
        );
        assert!(html.contains(r#"href="https://pay.stripe.com/receipts/abc""#));
        assert!(html.contains("View Receipt"));
    }

    #[test]
    fn strip_tags_keeps_text_only() {
        assert_eq!(strip_tags("<p>Hi <b>Ada</b>,</p>"), "Hi Ada,");
    }

    #[tokio::test]
    async fn send_email_is_disabled_without_api_key() {
        let config = SendgridConfig {
            api_key: String::new(),
            from_email: "support@betterweb.pro".to_string(),
            from_name: "BetterWeb Support".to_string(),
        };
        let http = reqwest::Client::new();
        assert!(!send_email(&http, &config, "a@b.c", "subject", "<p>hi</p>").await);
    }
}
