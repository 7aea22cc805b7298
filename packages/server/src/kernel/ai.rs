// AI implementation using OpenAI.
//
// Business logic (what to prompt for) lives in the domain layers; this is
// the infrastructure client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::providers::openai;

/// Completion capabilities the domain layers depend on. Implemented by the
/// OpenAI client in production and by stubs in tests.
#[async_trait]
pub trait Ai: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// A completion expected to be a single JSON value. Markdown code
    /// fences around the JSON are stripped before returning.
    async fn complete_json(&self, prompt: &str) -> Result<String>;
}

/// OpenAI implementation of AI capabilities
#[derive(Clone)]
pub struct OpenAIClient {
    client: openai::Client,
}

impl OpenAIClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: openai::Client::new(api_key),
        }
    }
}

#[async_trait]
impl Ai for OpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(prompt_length = prompt.len(), "Calling OpenAI API");

        let agent = self
            .client
            .agent(openai::GPT_4O)
            .preamble("You are an assistant for a music promotion team.")
            .max_tokens(4096)
            .build();

        let response = agent
            .prompt(prompt)
            .await
            .context("Failed to call OpenAI API")?;

        tracing::debug!(response_length = response.len(), "OpenAI API response received");
        Ok(response)
    }

    async fn complete_json(&self, prompt: &str) -> Result<String> {
        let response = self.complete(prompt).await?;
        Ok(strip_code_fences(&response).to_string())
    }
}

/// Models wrap JSON answers in ```json fences often enough that we strip
/// them unconditionally.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_complete() {
        let api_key = std::env::var("OPENAI_API_KEY")
            .expect("OPENAI_API_KEY must be set for integration tests");

        let client = OpenAIClient::new(&api_key);

        let response = client
            .complete("Say 'Hello, World!' and nothing else.")
            .await
            .expect("AI completion should succeed");

        assert!(response.contains("Hello"));
    }
}
