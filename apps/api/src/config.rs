use anyhow::{Context, Result};

const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_IMAGE_API_URL: &str = "https://clipdrop-api.co/text-to-image/v1";

/// Application configuration loaded from environment variables.
/// Resolved once at startup; no module reads the environment after this.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    /// Empty when the image-synthesis provider is not configured; the image
    /// generation endpoint then reports a failure envelope instead of panicking.
    pub image_api_key: String,
    pub image_api_url: String,
    pub media_cloud_name: String,
    pub media_api_key: String,
    pub media_api_secret: String,
    pub identity_base_url: String,
    pub identity_api_key: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string()),
            image_api_key: std::env::var("IMAGE_API_KEY").unwrap_or_default(),
            image_api_url: std::env::var("IMAGE_API_URL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_API_URL.to_string()),
            media_cloud_name: require_env("MEDIA_CLOUD_NAME")?,
            media_api_key: require_env("MEDIA_API_KEY")?,
            media_api_secret: require_env("MEDIA_API_SECRET")?,
            identity_base_url: require_env("IDENTITY_BASE_URL")?,
            identity_api_key: require_env("IDENTITY_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
