//! OAuth2 token provider for the Météo-France portal
//!
//! One provider instance is shared across all Météo-France clients so the
//! token is fetched once and reused until shortly before expiry.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Refresh this long before the reported expiry
const EXPIRY_BUFFER_SECS: i64 = 300;

/// Transient failures are retried this many times
const MAX_ATTEMPTS: u32 = 3;

/// Token endpoint errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// The portal rejected the client credentials
    #[error("Credentials rejected by token endpoint")]
    CredentialsRejected,

    /// Request to the token endpoint failed
    #[error("Token request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse the token response
    #[error("Token parse error: {0}")]
    ParseError(String),
}

/// Token endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// OAuth2 token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Connection timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_token_url() -> String {
    "https://portail-api.meteofrance.fr/token".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_BUFFER_SECS) > now
    }
}

/// Cached OAuth2 client-credentials token provider
#[derive(Debug)]
pub struct MeteoTokenProvider {
    client: Client,
    config: TokenConfig,
    client_id: String,
    client_secret: SecretString,
    cache: Mutex<Option<CachedToken>>,
}

impl MeteoTokenProvider {
    /// Create a provider for one set of portal credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(
        config: TokenConfig,
        client_id: String,
        client_secret: SecretString,
    ) -> Result<Self, TokenError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TokenError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            client_id,
            client_secret,
            cache: Mutex::new(None),
        })
    }

    /// Get a valid access token, from cache when possible
    ///
    /// Transient endpoint failures are retried with 1s/2s backoff;
    /// rejected credentials fail immediately.
    ///
    /// # Errors
    ///
    /// Fails when the endpoint keeps failing or rejects the credentials.
    pub async fn get_token(&self) -> Result<String, TokenError> {
        if let Some(cached) = self.cached() {
            debug!("using cached access token");
            return Ok(cached);
        }

        let mut delay_secs = 1u64;
        let mut attempt = 1u32;
        loop {
            match self.request_token().await {
                Ok(response) => {
                    let token = response.access_token.clone();
                    let expires_at = Utc::now() + Duration::seconds(response.expires_in);
                    *self.cache.lock() = Some(CachedToken {
                        token: response.access_token,
                        expires_at,
                    });
                    debug!(%expires_at, "fetched new access token");
                    return Ok(token);
                },
                Err(TokenError::CredentialsRejected) => {
                    return Err(TokenError::CredentialsRejected);
                },
                Err(error) if attempt < MAX_ATTEMPTS => {
                    warn!(%error, attempt, "token request failed, retrying");
                    tokio::time::sleep(std::time::Duration::from_secs(delay_secs)).await;
                    delay_secs *= 2;
                    attempt += 1;
                },
                Err(error) => return Err(error),
            }
        }
    }

    /// Drop the cached token so the next call re-authenticates
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }

    fn cached(&self) -> Option<String> {
        let cache = self.cache.lock();
        cache
            .as_ref()
            .filter(|t| t.is_fresh(Utc::now()))
            .map(|t| t.token.clone())
    }

    async fn request_token(&self) -> Result<TokenResponse, TokenError> {
        let basic = BASE64.encode(format!(
            "{}:{}",
            self.client_id,
            self.client_secret.expose_secret()
        ));

        let response = self
            .client
            .post(&self.config.token_url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {basic}"))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| TokenError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TokenError::CredentialsRejected);
        }
        if !status.is_success() {
            return Err(TokenError::RequestFailed(format!("HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| TokenError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider_for(server: &MockServer) -> MeteoTokenProvider {
        let config = TokenConfig {
            token_url: format!("{}/token", server.uri()),
            ..TokenConfig::default()
        };
        MeteoTokenProvider::new(
            config,
            "client-id".to_string(),
            "client-secret".to_string().into(),
        )
        .expect("provider creation should succeed")
    }

    fn token_body(token: &str, expires_in: i64) -> serde_json::Value {
        serde_json::json!({
            "access_token": token,
            "scope": "default",
            "token_type": "Bearer",
            "expires_in": expires_in
        })
    }

    #[test]
    fn config_defaults() {
        let config = TokenConfig::default();
        assert_eq!(config.token_url, "https://portail-api.meteofrance.fr/token");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn cached_token_freshness_respects_buffer() {
        let now = Utc::now();
        let fresh = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(EXPIRY_BUFFER_SECS + 60),
        };
        let stale = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(EXPIRY_BUFFER_SECS - 60),
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[tokio::test]
    async fn token_is_fetched_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header_exists("authorization"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc123", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let first = provider.get_token().await.expect("first fetch");
        let second = provider.get_token().await.expect("cached fetch");

        assert_eq!(first, "abc123");
        assert_eq!(second, "abc123");
    }

    #[tokio::test]
    async fn short_lived_token_is_not_reused() {
        let server = MockServer::start().await;
        // Expires inside the refresh buffer, so every call re-fetches
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("short", 60)))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        provider.get_token().await.expect("first fetch");
        provider.get_token().await.expect("second fetch");
    }

    #[tokio::test]
    async fn rejected_credentials_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let result = provider.get_token().await;
        assert!(matches!(result, Err(TokenError::CredentialsRejected)));
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("recovered", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let token = provider.get_token().await.expect("should recover");
        assert_eq!(token, "recovered");
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", 3600)))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        provider.get_token().await.expect("first fetch");
        provider.invalidate();
        provider.get_token().await.expect("refetch");
    }
}
