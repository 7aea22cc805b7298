use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub openai_api_key: String,
    pub sendgrid_api_key: String,
    pub sendgrid_from_email: String,
    pub sendgrid_from_name: String,
    pub expo_access_token: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "encore".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            sendgrid_api_key: env::var("SENDGRID_API_KEY")
                .context("SENDGRID_API_KEY must be set")?,
            sendgrid_from_email: env::var("SENDGRID_FROM_EMAIL")
                .context("SENDGRID_FROM_EMAIL must be set")?,
            sendgrid_from_name: env::var("SENDGRID_FROM_NAME")
                .unwrap_or_else(|_| "Encore".to_string()),
            expo_access_token: env::var("EXPO_ACCESS_TOKEN").ok(),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
        })
    }
}
