//! Authentication against remote ERP systems.
//!
//! Only OAuth2 performs a network round-trip (client-credentials exchange
//! against the configured token endpoint). Basic/Bearer/ApiKey authentication
//! is satisfied by the presence of the required credential fields; the first
//! real request proves them. That asymmetry is inherited behaviour.

use std::time::{Duration, SystemTime};

use log::{debug, info};
use tokio::sync::RwLock;

use crate::config::{ApiConfig, AuthType};

/// A cached OAuth2 access token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl TokenInfo {
    fn is_expired(&self) -> bool {
        self.expires_at
            .elapsed()
            .map(|elapsed| elapsed.as_secs() > 0)
            .unwrap_or(false)
    }
}

/// Adapter-instance-scoped OAuth2 token cache.
///
/// Re-authenticates transparently when a token is requested after expiry.
#[derive(Debug, Default)]
pub struct TokenCache {
    token: RwLock<Option<TokenInfo>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a valid access token, performing the client-credentials
    /// exchange when no unexpired token is cached.
    pub async fn bearer_token(&self, api: &ApiConfig, http: &reqwest::Client) -> anyhow::Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if !token.is_expired() {
                debug!("Using cached OAuth2 token");
                return Ok(token.access_token.clone());
            }
            debug!("Cached OAuth2 token expired, re-authenticating");
        }

        let token = request_token(api, http).await?;
        let access_token = token.access_token.clone();
        *self.token.write().await = Some(token);
        Ok(access_token)
    }

    /// Drop the cached token; the next request re-authenticates.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }
}

/// Perform the OAuth2 client-credentials exchange.
async fn request_token(api: &ApiConfig, http: &reqwest::Client) -> anyhow::Result<TokenInfo> {
    let token_url = api
        .token_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("OAuth2 configuration is missing tokenUrl"))?;
    let client_id = api
        .client_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("OAuth2 configuration is missing clientId"))?;
    let client_secret = api
        .client_secret
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("OAuth2 configuration is missing clientSecret"))?;

    info!("Requesting OAuth2 token from {}", token_url);

    let response = http
        .post(token_url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await?;

    debug!("Token request status: {}", response.status());

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        anyhow::bail!("OAuth2 token request failed: {}", error_text);
    }

    let token_data: serde_json::Value = response.json().await?;
    let access_token = token_data
        .get("access_token")
        .and_then(|t| t.as_str())
        .ok_or_else(|| anyhow::anyhow!("No access token in token endpoint response"))?;

    // Default to 1 hour when the endpoint omits expires_in.
    let expires_in = token_data
        .get("expires_in")
        .and_then(|e| e.as_u64())
        .unwrap_or(3600);

    Ok(TokenInfo {
        access_token: access_token.to_string(),
        expires_at: SystemTime::now() + Duration::from_secs(expires_in),
    })
}

/// Check that the credential fields required by the configured auth scheme
/// are present. No network activity.
pub fn verify_credentials(api: &ApiConfig) -> anyhow::Result<()> {
    match api.auth_type {
        AuthType::None => Ok(()),
        AuthType::Basic => {
            if api.username.is_none() || api.password.is_none() {
                anyhow::bail!("Basic auth requires username and password");
            }
            Ok(())
        }
        AuthType::Bearer | AuthType::ApiKey => {
            if api.api_key.is_none() {
                anyhow::bail!("{:?} auth requires apiKey", api.auth_type);
            }
            Ok(())
        }
        AuthType::OAuth2 => {
            if api.client_id.is_none() || api.client_secret.is_none() || api.token_url.is_none() {
                anyhow::bail!("OAuth2 auth requires clientId, clientSecret and tokenUrl");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_token_is_detected() {
        let expired = TokenInfo {
            access_token: "t".to_string(),
            expires_at: SystemTime::now() - Duration::from_secs(10),
        };
        assert!(expired.is_expired());

        let valid = TokenInfo {
            access_token: "t".to_string(),
            expires_at: SystemTime::now() + Duration::from_secs(3600),
        };
        assert!(!valid.is_expired());
    }

    #[test]
    fn credential_presence_checks_follow_auth_type() {
        let mut api = ApiConfig::default();
        assert!(verify_credentials(&api).is_ok());

        api.auth_type = AuthType::Basic;
        assert!(verify_credentials(&api).is_err());
        api.username = Some("user".to_string());
        api.password = Some("pass".to_string());
        assert!(verify_credentials(&api).is_ok());

        api.auth_type = AuthType::OAuth2;
        assert!(verify_credentials(&api).is_err());
        api.client_id = Some("id".to_string());
        api.client_secret = Some("secret".to_string());
        api.token_url = Some("https://auth.example.com/token".to_string());
        assert!(verify_credentials(&api).is_ok());
    }
}
