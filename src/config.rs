use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Production REST endpoint of the gateway
pub const DEFAULT_API_BASE_URL: &str = "https://rest-api.pay.nl";

/// Upper bound for `max_retries`; backoff doubles per attempt (2^9 s at the cap)
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Credentials and HTTP settings for the gateway dispatcher
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// API token sent as the basic auth password
    pub api_token: String,
    /// `AT-xxxx-xxxx` token code; when absent the literal user `token` is used
    pub token_code: Option<String>,
    /// `SL-xxxx-xxxx` service id for operations that need one
    pub service_id: Option<String>,
    /// Base URL without the version segment
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for rate limited and server-side failures
    pub max_retries: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            token_code: None,
            service_id: None,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from `PAYNL_*` environment variables
    pub fn from_env() -> Result<Self> {
        let config = GatewayConfig {
            api_token: env::var("PAYNL_API_TOKEN").context("PAYNL_API_TOKEN not set")?,
            token_code: optional_var("PAYNL_TOKEN_CODE"),
            service_id: optional_var("PAYNL_SERVICE_ID"),
            base_url: env::var("PAYNL_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            timeout_secs: env::var("PAYNL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("PAYNL_TIMEOUT_SECS must be a valid number")?,
            max_retries: env::var("PAYNL_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("PAYNL_MAX_RETRIES must be a valid number")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration before a dispatcher is built from it
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(anyhow!("PAYNL_API_TOKEN cannot be empty"));
        }

        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(anyhow!("PAYNL_API_BASE_URL cannot be empty"));
        }
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(anyhow!(
                "PAYNL_API_BASE_URL must be an http(s) URL, got {}",
                self.base_url
            ));
        }

        if self.timeout_secs == 0 {
            return Err(anyhow!("PAYNL_TIMEOUT_SECS must be greater than 0"));
        }

        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(anyhow!(
                "PAYNL_MAX_RETRIES must be at most {}, got {}",
                MAX_RETRIES_LIMIT,
                self.max_retries
            ));
        }

        Ok(())
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
