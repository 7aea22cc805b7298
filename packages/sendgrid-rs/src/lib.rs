// Thin client for the SendGrid v3 mail-send API.
//
// Only the pieces the server needs: single transactional sends with an
// HTML part and a plain-text part. Event webhooks are ingested by the
// server directly and need no client support here.

pub mod models;

use anyhow::Result;
use reqwest::Client;
use tracing::{debug, error};

pub use crate::models::{Content, EmailAddress, MailSendRequest, Personalization};

const MAIL_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Clone)]
pub struct SendGridOptions {
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
}

/// An outgoing email, already rendered.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[derive(Debug, Clone)]
pub struct SendGridService {
    client: Client,
    options: SendGridOptions,
}

impl SendGridService {
    pub fn new(options: SendGridOptions) -> Self {
        Self {
            client: Client::new(),
            options,
        }
    }

    /// Send a single email. Returns the provider message id when SendGrid
    /// includes one in the response headers.
    pub async fn send(&self, email: &OutboundEmail) -> Result<Option<String>> {
        let to = match &email.to_name {
            Some(name) => EmailAddress::with_name(&email.to_email, name),
            None => EmailAddress::new(&email.to_email),
        };

        let request = MailSendRequest {
            personalizations: vec![Personalization {
                to: vec![to],
                subject: None,
            }],
            from: EmailAddress::with_name(
                &self.options.from_email,
                &self.options.from_name,
            ),
            subject: email.subject.clone(),
            content: vec![
                Content {
                    content_type: "text/plain".to_string(),
                    value: email.text_body.clone(),
                },
                Content {
                    content_type: "text/html".to_string(),
                    value: email.html_body.clone(),
                },
            ],
        };

        debug!(to = %email.to_email, subject = %email.subject, "Sending email via SendGrid");

        let response = self
            .client
            .post(MAIL_SEND_URL)
            .bearer_auth(&self.options.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %message_body, "SendGrid mail send failed");
            anyhow::bail!("SendGrid API error {}: {}", status, message_body);
        }

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(message_id)
    }
}
