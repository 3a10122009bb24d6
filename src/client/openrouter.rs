//! OpenRouter chat-completions backend.

use super::{classify_failure, extract_error_text, ModelBackend, RemoteError, RemoteResult};
use crate::credentials::CredentialStore;
use crate::error_code::ErrorKind;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const REQUEST_ID_HEADER: &str = "x-luna-request-id";

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    pub temperature: f32,
    /// Honour `OPENROUTER_ENDPOINT__<MODEL>` overrides.
    pub endpoint_overrides: bool,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            temperature: 0.7,
            endpoint_overrides: true,
        }
    }
}

impl OpenRouterConfig {
    /// Defaults overlaid with `OPENROUTER_BASE_URL` and `LUNA_HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(url) = env::var("OPENROUTER_BASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            cfg.base_url = url;
        }
        if let Some(secs) = env::var("LUNA_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        cfg
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

pub struct OpenRouterClient {
    client: reqwest::Client,
    config: OpenRouterConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl OpenRouterClient {
    pub fn new(
        config: OpenRouterConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| {
                crate::Error::configuration_with_context(
                    format!("failed to build HTTP client: {e}"),
                    crate::ErrorContext::new().with_source("openrouter"),
                )
            })?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    pub fn from_env(credentials: Arc<dyn CredentialStore>) -> crate::Result<Self> {
        Self::new(OpenRouterConfig::from_env(), credentials)
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    /// Target URL for a model, honouring per-model env overrides.
    pub fn endpoint_for(&self, model_id: &str) -> String {
        if self.config.endpoint_overrides {
            let var = endpoint_override_var(model_id);
            if let Some(url) = env::var(&var)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
            {
                return url;
            }
        }
        self.config.base_url.clone()
    }

    async fn post(
        &self,
        model_id: &str,
        payload: &Value,
        timeout: Duration,
    ) -> RemoteResult<(u16, String)> {
        let Some(token) = self.credentials.token() else {
            return Err(RemoteError::new(
                ErrorKind::Auth,
                "OpenRouter API key is not configured",
            ));
        };

        let url = self.endpoint_for(model_id);
        let request_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, &request_id)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport_error)?;
        debug!(
            model = model_id,
            status,
            request_id = %request_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "openrouter response"
        );
        Ok((status, body))
    }
}

#[async_trait]
impl ModelBackend for OpenRouterClient {
    async fn invoke(&self, model_id: &str, prompt: &str, max_tokens: u32) -> RemoteResult<String> {
        let payload = json!({
            "model": model_id,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": max_tokens,
            "temperature": self.config.temperature,
        });
        let (status, body) = self
            .post(model_id, &payload, self.config.request_timeout)
            .await?;

        if (200..300).contains(&status) {
            let text = parse_completion(&body)?;
            if text.trim().is_empty() {
                return Err(RemoteError::empty_response().with_status(status));
            }
            return Ok(text);
        }

        let err = failure_from_response(status, &body);
        warn!(model = model_id, status, kind = %err.kind, "OpenRouter API error: {}", err.message);
        Err(err)
    }

    async fn probe(&self, model_id: &str) -> RemoteResult<()> {
        let payload = json!({
            "model": model_id,
            "messages": [{"role": "user", "content": "status ping"}],
            "max_tokens": 1,
            "temperature": 0.1,
        });
        let (status, body) = self
            .post(model_id, &payload, self.config.probe_timeout)
            .await?;
        if (200..300).contains(&status) {
            return Ok(());
        }
        Err(failure_from_response(status, &body))
    }
}

/// `OPENROUTER_ENDPOINT__` plus the model id with every non-alphanumeric char replaced by `_`.
pub fn endpoint_override_var(model_id: &str) -> String {
    let sanitized: String = model_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("OPENROUTER_ENDPOINT__{sanitized}")
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::new(ErrorKind::Timeout, format!("request timed out: {e}"))
    } else {
        RemoteError::new(ErrorKind::Unknown, format!("transport error: {e}"))
    }
}

fn failure_from_response(status: u16, body: &str) -> RemoteError {
    let text = extract_error_text(body);
    let kind = classify_failure(status, &text);
    let message = match kind {
        ErrorKind::Paused | ErrorKind::Transient if !text.is_empty() => text,
        ErrorKind::Paused => "endpoint paused".to_string(),
        ErrorKind::Transient => "endpoint loading".to_string(),
        ErrorKind::Auth => "authentication/authorization error".to_string(),
        ErrorKind::RateLimit => "rate limit exceeded".to_string(),
        ErrorKind::BadRequest if !text.is_empty() => format!("Bad Request: {text}"),
        ErrorKind::BadRequest => "Bad Request".to_string(),
        ErrorKind::NotFound => "model not found or endpoint removed".to_string(),
        _ if !text.is_empty() => format!("request failed ({status}): {text}"),
        _ => format!("request failed: {status}"),
    };
    RemoteError::new(kind, message).with_status(status)
}

/// Extract completion text from an OpenAI-style or HF-style success body.
fn parse_completion(body: &str) -> RemoteResult<String> {
    let json: Value = serde_json::from_str(body).map_err(|e| {
        RemoteError::new(
            ErrorKind::Unknown,
            format!("failed to parse response JSON: {e}"),
        )
    })?;

    if let Some(choice) = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
    {
        let content = choice
            .pointer("/message/content")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        return Ok(content.to_string());
    }

    if let Some(text) = json
        .as_array()
        .and_then(|a| a.first())
        .and_then(|v| v.get("generated_text"))
        .and_then(|v| v.as_str())
    {
        return Ok(text.to_string());
    }

    Err(RemoteError::new(
        ErrorKind::Unknown,
        "unexpected response format",
    ))
}
