use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct Recipient<'a> {
    #[serde(rename = "Email")]
    email: &'a str,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    #[serde(rename = "FromEmail")]
    from_email: &'a str,
    #[serde(rename = "FromName")]
    from_name: &'a str,
    #[serde(rename = "Subject")]
    subject: &'a str,
    #[serde(rename = "Text-part")]
    text_part: &'a str,
    #[serde(rename = "Html-part")]
    html_part: &'a str,
    #[serde(rename = "Recipients")]
    recipients: Vec<Recipient<'a>>,
}

/// Client for the transactional email HTTP API.
///
/// Without MAIL_API_KEY the service runs in disabled mode: sends are
/// logged and skipped, so local development needs no mail account.
#[derive(Clone)]
pub struct EmailService {
    http_client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    sender_email: String,
    sender_name: String,
}

impl EmailService {
    pub fn from_env() -> Self {
        let api_url = std::env::var("MAIL_API_URL")
            .unwrap_or_else(|_| "https://api.mailjet.com/v3/send".to_string());
        let api_key = std::env::var("MAIL_API_KEY").ok();
        let sender_email = std::env::var("MAIL_SENDER_EMAIL")
            .unwrap_or_else(|_| "no-reply@wallet-service.local".to_string());
        let sender_name =
            std::env::var("MAIL_SENDER_NAME").unwrap_or_else(|_| "Wallet".to_string());

        if api_key.is_none() {
            log::warn!("⚠️  MAIL_API_KEY not set - email dispatch is disabled");
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build email HTTP client");

        Self {
            http_client,
            api_url,
            api_key,
            sender_email,
            sender_name,
        }
    }

    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), String> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                log::debug!("📧 Email dispatch disabled, skipping send to {}", to);
                return Ok(());
            }
        };

        let body = SendEmailRequest {
            from_email: &self.sender_email,
            from_name: &self.sender_name,
            subject,
            text_part: text_content,
            html_part: html_content,
            recipients: vec![Recipient { email: to }],
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Email request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Email API returned {}", response.status()));
        }

        log::info!("📧 Email sent successfully to: {}", to);
        Ok(())
    }

    /// Fire-and-forget send off the request path. Failures are logged,
    /// never surfaced to the caller.
    pub fn spawn_send(&self, to: String, subject: String, html: String, text: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_email(&to, &subject, &html, &text).await {
                log::error!("❌ Failed to send email to {}: {}", to, e);
            }
        });
    }

    pub fn send_recharge_email(&self, to: &str, amount: f64, cashback: i64) {
        let subject = "Recharge Successful".to_string();
        let html = recharge_email_html(amount, cashback);
        let text = recharge_email_text(amount, cashback);
        self.spawn_send(to.to_string(), subject, html, text);
    }

    /// Notifies both parties of a completed transfer.
    pub fn send_transfer_emails(
        &self,
        sender_email: &str,
        sender_username: &str,
        receiver_email: &str,
        receiver_username: &str,
        amount: f64,
    ) {
        let subject = "Transfer Notification".to_string();

        self.spawn_send(
            receiver_email.to_string(),
            subject.clone(),
            transfer_received_html(sender_username, amount),
            format!("You have received ₹{} from {}.", amount, sender_username),
        );

        self.spawn_send(
            sender_email.to_string(),
            subject,
            transfer_sent_html(receiver_username, amount),
            format!("You have sent ₹{} to {}.", amount, receiver_username),
        );
    }
}

const EMAIL_STYLE: &str = "body { font-family: Arial, sans-serif; padding: 20px; } \
    .container { max-width: 600px; margin: auto; background: #ffffff; padding: 20px; \
    border-radius: 8px; } h1 { color: #4A90E2; } p { font-size: 16px; line-height: 1.5; } \
    strong { color: #333; }";

fn wrap_email(title: &str, body: &str) -> String {
    format!(
        "<html><head><style>{}</style></head><body><div class='container'>\
         <h1>{}</h1>{}<p>Thank you for using our service!</p>\
         </div></body></html>",
        EMAIL_STYLE, title, body
    )
}

pub fn recharge_email_html(amount: f64, cashback: i64) -> String {
    let mut body = format!(
        "<p>Your wallet has been recharged with <strong>₹{}</strong>.</p>",
        amount
    );
    if cashback > 0 {
        body.push_str(&format!(
            "<p>You have earned a cashback of <strong>₹{}</strong>.</p>",
            cashback
        ));
    }
    wrap_email("Your Wallet Has Been Recharged!", &body)
}

fn recharge_email_text(amount: f64, cashback: i64) -> String {
    if cashback > 0 {
        format!(
            "Your wallet has been recharged with ₹{}. You have earned a cashback of ₹{}.",
            amount, cashback
        )
    } else {
        format!("Your wallet has been recharged with ₹{}.", amount)
    }
}

pub fn transfer_received_html(from_username: &str, amount: f64) -> String {
    wrap_email(
        "Transfer Received!",
        &format!(
            "<p>You have received <strong>₹{}</strong> from <strong>{}</strong>.</p>",
            amount, from_username
        ),
    )
}

pub fn transfer_sent_html(to_username: &str, amount: f64) -> String {
    wrap_email(
        "Transfer Sent!",
        &format!(
            "<p>You have sent <strong>₹{}</strong> to <strong>{}</strong>.</p>",
            amount, to_username
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recharge_email_mentions_cashback_only_when_earned() {
        let with_cashback = recharge_email_html(100.0, 7);
        assert!(with_cashback.contains("₹100"));
        assert!(with_cashback.contains("cashback"));
        assert!(with_cashback.contains("₹7"));

        let without_cashback = recharge_email_html(100.0, 0);
        assert!(!without_cashback.contains("cashback"));
    }

    #[test]
    fn transfer_emails_name_the_counterparty() {
        let received = transfer_received_html("alice", 50.0);
        assert!(received.contains("alice"));
        assert!(received.contains("Transfer Received"));

        let sent = transfer_sent_html("bob", 50.0);
        assert!(sent.contains("bob"));
        assert!(sent.contains("Transfer Sent"));
    }

    #[tokio::test]
    async fn disabled_mailer_skips_sends() {
        // No MAIL_API_KEY configured in the test environment
        let mailer = EmailService {
            http_client: reqwest::Client::new(),
            api_url: "http://localhost:0".to_string(),
            api_key: None,
            sender_email: "no-reply@test".to_string(),
            sender_name: "Wallet".to_string(),
        };

        let result = mailer.send_email("a@b.com", "subj", "<p>hi</p>", "hi").await;
        assert!(result.is_ok());
    }
}
