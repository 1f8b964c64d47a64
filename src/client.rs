//! Authenticated HTTP transport shared by all adapters.

use std::collections::HashMap;
use std::time::Duration;

use log::debug;
use reqwest::Method;
use serde_json::Value;

use crate::auth::TokenCache;
use crate::config::{ApiConfig, AuthType};
use crate::resilience::{RetryConfig, RetryPolicy};

/// Credentials resolved for one request, after any token exchange.
enum ResolvedAuth {
    None,
    Bearer(String),
    ApiKey(String),
    Basic(String, Option<String>),
}

/// HTTP client bound to one remote system's base URL and auth scheme.
///
/// Failed calls are retried per the configured policy; non-2xx responses are
/// treated as failures and classified for retry like transport errors.
pub struct HttpClient {
    base_url: String,
    api: ApiConfig,
    http: reqwest::Client,
    retry_policy: RetryPolicy,
    token_cache: TokenCache,
}

impl HttpClient {
    pub fn new(api: &ApiConfig) -> anyhow::Result<Self> {
        Self::with_retry_config(api, RetryConfig::from_api_config(api))
    }

    /// Construct with an explicit retry configuration (used by tests and
    /// probes that want a smaller budget).
    pub fn with_retry_config(api: &ApiConfig, retry: RetryConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_millis(api.timeout_ms))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("erp-sync/0.1")
            .build()?;

        Ok(Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            api: api.clone(),
            http,
            retry_policy: RetryPolicy::new(retry),
            token_cache: TokenCache::new(),
        })
    }

    /// Establish credentials for this transport. OAuth2 performs the token
    /// exchange (and caches the result); every other scheme only checks the
    /// required fields exist.
    pub async fn authenticate(&self) -> anyhow::Result<()> {
        match self.api.auth_type {
            AuthType::OAuth2 => {
                self.token_cache.bearer_token(&self.api, &self.http).await?;
                Ok(())
            }
            _ => crate::auth::verify_credentials(&self.api),
        }
    }

    /// Resolve the auth material for a request, performing the OAuth2 token
    /// exchange when needed.
    async fn resolve_auth(&self) -> anyhow::Result<ResolvedAuth> {
        match self.api.auth_type {
            AuthType::None => Ok(ResolvedAuth::None),
            AuthType::Bearer => Ok(ResolvedAuth::Bearer(
                self.api
                    .api_key
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("Bearer auth requires apiKey"))?,
            )),
            AuthType::ApiKey => Ok(ResolvedAuth::ApiKey(
                self.api
                    .api_key
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("ApiKey auth requires apiKey"))?,
            )),
            AuthType::Basic => Ok(ResolvedAuth::Basic(
                self.api
                    .username
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("Basic auth requires username"))?,
                self.api.password.clone(),
            )),
            AuthType::OAuth2 => {
                let token = self.token_cache.bearer_token(&self.api, &self.http).await?;
                Ok(ResolvedAuth::Bearer(token))
            }
        }
    }

    /// Perform one authenticated call against `endpoint` (joined onto the
    /// base URL). The response body is parsed as JSON when the Content-Type
    /// says so, otherwise returned as a raw string value.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        extra_headers: Option<&HashMap<String, String>>,
    ) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let auth = self.resolve_auth().await?;
        let correlation_id = uuid::Uuid::new_v4().to_string();

        debug!("{} {} [{}]", method, url, correlation_id);

        let response = self
            .retry_policy
            .execute(|| {
                let mut request = self
                    .http
                    .request(method.clone(), &url)
                    .header("Content-Type", "application/json")
                    .header("X-Correlation-ID", &correlation_id);

                request = match &auth {
                    ResolvedAuth::None => request,
                    ResolvedAuth::Bearer(token) => request.bearer_auth(token),
                    ResolvedAuth::ApiKey(key) => request.header("X-API-Key", key),
                    ResolvedAuth::Basic(user, pass) => request.basic_auth(user, pass.as_deref()),
                };

                if let Some(headers) = extra_headers {
                    for (name, value) in headers {
                        request = request.header(name, value);
                    }
                }

                if let Some(body) = body {
                    if matches!(method, Method::POST | Method::PUT | Method::PATCH) {
                        request = request.json(body);
                    }
                }

                async move { request.send().await?.error_for_status() }
            })
            .await?;

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);

        let text = response.text().await.unwrap_or_default();
        if text.is_empty() {
            return Ok(Value::Null);
        }

        if is_json {
            Ok(serde_json::from_str(&text)?)
        } else {
            Ok(Value::String(text))
        }
    }

    pub async fn get(&self, endpoint: &str) -> anyhow::Result<Value> {
        self.request(Method::GET, endpoint, None, None).await
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> anyhow::Result<Value> {
        self.request(Method::POST, endpoint, Some(body), None).await
    }
}
