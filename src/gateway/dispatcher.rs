//! HTTP dispatcher for the Pay.nl REST API
//!
//! Sends operations as form posts to `{base_url}/v{version}/{Endpoint}/json`
//! with HTTP basic authentication, retrying rate limited and server-side
//! failures with exponential backoff.

use crate::config::{GatewayConfig, MAX_RETRIES_LIMIT};
use crate::error::TransportError;
use crate::gateway::traits::Dispatcher;
use crate::gateway::types::FieldMap;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// `Dispatcher` backed by a `reqwest` client
pub struct ReqwestDispatcher {
    config: GatewayConfig,
    client: Client,
}

impl ReqwestDispatcher {
    /// Create a new dispatcher; `max_retries` above the limit is clamped
    pub fn new(mut config: GatewayConfig) -> Result<Self, TransportError> {
        if config.max_retries > MAX_RETRIES_LIMIT {
            warn!(
                "max_retries={} exceeds limit, clamping to {}",
                config.max_retries, MAX_RETRIES_LIMIT
            );
            config.max_retries = MAX_RETRIES_LIMIT;
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("paynl-refund/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Gateway dispatcher initialized: base_url={}, timeout={}s, max_retries={}",
            config.base_url, config.timeout_secs, config.max_retries
        );

        Ok(Self { config, client })
    }

    /// Create dispatcher from environment variables
    pub fn from_env() -> Result<Self, TransportError> {
        let config = GatewayConfig::from_env().map_err(|e| TransportError::config(e.to_string()))?;
        Self::new(config)
    }

    fn url(&self, endpoint: &str, version: u32) -> String {
        format!(
            "{}/v{}/{}/json",
            self.config.base_url.trim_end_matches('/'),
            version,
            capitalize_resource(endpoint)
        )
    }

    fn credentials(&self, endpoint: &str) -> Result<(String, String), TransportError> {
        if self.config.api_token.trim().is_empty() {
            return Err(TransportError::missing_api_token(endpoint));
        }
        let user = self
            .config
            .token_code
            .clone()
            .unwrap_or_else(|| "token".to_string());
        Ok((user, self.config.api_token.clone()))
    }
}

#[async_trait]
impl Dispatcher for ReqwestDispatcher {
    async fn dispatch(
        &self,
        endpoint: &str,
        version: u32,
        fields: FieldMap,
        requires_api_token: bool,
    ) -> Result<Value, TransportError> {
        let credentials = if requires_api_token {
            Some(self.credentials(endpoint)?)
        } else {
            None
        };
        let url = self.url(endpoint, version);
        let form = encode_form(&fields);

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            let mut request = self.client.post(&url).form(&form);
            if let Some((user, token)) = &credentials {
                request = request.basic_auth(user, Some(token));
            }

            debug!("POST {} (attempt {})", url, attempt + 1);
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let err = TransportError::from(e);
                    if err.is_retryable() && attempt < self.config.max_retries {
                        let backoff = 2_u64.pow(attempt);
                        warn!(
                            "Request error, retrying after {} seconds (attempt {}): {}",
                            backoff,
                            attempt + 1,
                            err
                        );
                        last_error = Some(err);
                        tokio::time::sleep(Duration::from_secs(backoff)).await;
                        continue;
                    }
                    error!("Gateway request to {} failed: {}", url, err);
                    return Err(err);
                }
            };

            let status = response.status();
            let body = response.text().await.map_err(TransportError::from)?;

            if status.is_success() {
                return Ok(decode_body(body));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt < self.config.max_retries {
                    let backoff = 2_u64.pow(attempt);
                    warn!(
                        "Rate limited, retrying after {} seconds (attempt {})",
                        backoff,
                        attempt + 1
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    continue;
                }
                return Err(TransportError::RateLimited {
                    attempts: attempt + 1,
                });
            }

            if status.is_server_error() && attempt < self.config.max_retries {
                let backoff = 2_u64.pow(attempt);
                warn!(
                    "Server error {}, retrying after {} seconds (attempt {})",
                    status,
                    backoff,
                    attempt + 1
                );
                last_error = Some(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                continue;
            }

            // Only a request.result envelope is the gateway's own verdict
            if status.is_client_error() {
                if let Some(value) = enveloped_body(&body) {
                    debug!("HTTP {} with request envelope, handing to interpreter", status);
                    return Ok(value);
                }
            }

            error!("Gateway API error: HTTP {}: {}", status, body);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Err(last_error.unwrap_or_else(|| {
            TransportError::network(format!(
                "Request failed after {} retries",
                self.config.max_retries
            ))
        }))
    }

    fn service_id(&self) -> Option<&str> {
        self.config.service_id.as_deref()
    }
}

/// `transaction/refund` becomes `Transaction/refund`
fn capitalize_resource(endpoint: &str) -> String {
    let endpoint = endpoint.trim_matches('/');
    let mut chars = endpoint.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn enveloped_body(body: &str) -> Option<Value> {
    serde_json::from_str::<Value>(body)
        .ok()
        .filter(|value| value.get("request").is_some_and(|request| request.is_object()))
}

fn decode_body(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

/// Flatten a field map into form pairs using bracketed keys
/// (`products[0][productId]`). Nulls and empty collections produce no pairs.
pub fn encode_form(fields: &FieldMap) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in fields {
        flatten_into(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten_into(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push((key, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(number) => pairs.push((key, number.to_string())),
        Value::String(text) => pairs.push((key, text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(format!("{}[{}]", key, index), item, pairs);
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                flatten_into(format!("{}[{}]", key, name), item, pairs);
            }
        }
    }
}
