use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";
// Expo rejects batches larger than this
const EXPO_BATCH_LIMIT: usize = 100;

/// Expo push notification client for the companion mobile app.
pub struct ExpoClient {
    client: Client,
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExpoMessage {
    to: String,
    title: String,
    body: String,
    data: serde_json::Value,
    sound: String,
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    data: Vec<ExpoTicket>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    #[allow(dead_code)]
    message: Option<String>,
}

impl ExpoClient {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            access_token,
        }
    }

    /// Send the same notification to a batch of push tokens, split into
    /// requests of at most 100 tokens (the Expo per-request limit).
    /// Ticket errors are logged, not propagated.
    pub async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        info!(count = tokens.len(), "Sending Expo push notifications");

        for chunk in tokens.chunks(EXPO_BATCH_LIMIT) {
            self.send_chunk(chunk, title, body, &data).await?;
        }

        Ok(())
    }

    async fn send_chunk(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<()> {
        let messages: Vec<ExpoMessage> = tokens
            .iter()
            .map(|token| ExpoMessage {
                to: token.clone(),
                title: title.to_string(),
                body: body.to_string(),
                data: data.clone(),
                sound: "default".to_string(),
            })
            .collect();

        let mut request = self.client.post(EXPO_PUSH_URL).json(&messages);
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            error!(%status, %body, "Expo push failed");
            anyhow::bail!("Expo push API error {}: {}", status, body);
        }

        let expo_response: ExpoResponse = response.json().await?;
        let errors = expo_response
            .data
            .iter()
            .filter(|t| t.status == "error")
            .count();
        if errors > 0 {
            error!(errors, total = expo_response.data.len(), "Expo tickets failed");
        }

        Ok(())
    }
}
