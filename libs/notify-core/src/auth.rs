//! OAuth2 access tokens for FCM HTTP v1
//!
//! `GoogleServiceAccountTokenProvider` implements the JWT-bearer grant: it signs
//! an RS256 assertion with the service account key, exchanges it at the token
//! endpoint and caches the resulting bearer token until shortly before expiry.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::TokenProviderConfig;
use crate::errors::{AuthError, PushError};
use crate::models::{CachedToken, JwtClaims, ServiceAccountKey};
use crate::transport::{HttpRequest, HttpTransport};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3500;

/// Source of OAuth2 bearer tokens for the FCM API
#[async_trait::async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Returns the bearer token, without the "Bearer " prefix
    async fn get_token(&self) -> Result<String, PushError>;
}

/// Google Service Account token provider
///
/// The cache lock is held across the whole check-then-refresh sequence, so
/// concurrent callers sharing one provider trigger at most one refresh.
pub struct GoogleServiceAccountTokenProvider {
    credentials: ServiceAccountKey,
    config: TokenProviderConfig,
    transport: Arc<dyn HttpTransport>,
    token_cache: Mutex<Option<CachedToken>>,
}

impl GoogleServiceAccountTokenProvider {
    /// Create a new token provider
    ///
    /// # Arguments
    /// * `credentials` - Service account with `client_email` and `private_key`
    /// * `config` - Token endpoint, scopes and cache leeway
    /// * `transport` - HTTP transport used for the token exchange
    pub fn new(
        credentials: ServiceAccountKey,
        config: TokenProviderConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, PushError> {
        credentials.validate()?;

        if config.token_uri.trim().is_empty() {
            return Err(PushError::Config("token_uri must not be empty".to_string()));
        }

        if config.scopes.iter().all(|scope| scope.trim().is_empty()) {
            return Err(PushError::Config(
                "at least one OAuth scope is required".to_string(),
            ));
        }

        Ok(Self {
            credentials,
            config,
            transport,
            token_cache: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &TokenProviderConfig {
        &self.config
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Drop the cached token so the next call mints a fresh one
    pub async fn invalidate(&self) {
        *self.token_cache.lock().await = None;
    }

    /// Build the signed RS256 assertion for the JWT-bearer grant
    ///
    /// The assertion always lives for one hour from `now`; this is unrelated to
    /// the `expires_in` of the access token it is exchanged for.
    pub fn build_assertion(&self, now: i64) -> Result<String, AuthError> {
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: self.config.scope_claim(),
            aud: self.config.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| AuthError::KeyParse(e.to_string()))?;

        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| AuthError::JwtEncode(e.to_string()))
    }

    async fn request_token(&self, now: i64) -> Result<CachedToken, AuthError> {
        let assertion = self.build_assertion(now)?;

        let form = format!(
            "grant_type={}&assertion={}",
            urlencoding::encode(JWT_BEARER_GRANT),
            urlencoding::encode(&assertion)
        );

        let request = HttpRequest::post(&self.config.token_uri)
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body(form);

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status;
        let decoded = serde_json::from_str::<Value>(&response.body).ok();

        if response.is_success() {
            let access_token = decoded
                .as_ref()
                .and_then(|v| v.get("access_token"))
                .and_then(Value::as_str);

            if let Some(access_token) = access_token {
                let expires_in = decoded
                    .as_ref()
                    .and_then(|v| v.get("expires_in"))
                    .and_then(parse_expires_in)
                    .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

                info!(expires_in, "Obtained Google OAuth access token");

                return Ok(CachedToken {
                    access_token: access_token.to_string(),
                    expires_at: now.saturating_add(expires_in),
                });
            }

            warn!(status, "Google OAuth token response has no access_token");
            return Err(AuthError::InvalidResponse {
                status,
                body: response.body,
            });
        }

        let field = |name: &str| {
            decoded
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let error = field("error");
        let description = field("error_description").filter(|d| !d.is_empty());

        warn!(
            status,
            error = ?error,
            error_description = ?description,
            "Google OAuth token request failed"
        );

        Err(AuthError::Rejected {
            status,
            error,
            description: description.unwrap_or(response.body),
        })
    }
}

#[async_trait::async_trait]
impl AccessTokenProvider for GoogleServiceAccountTokenProvider {
    async fn get_token(&self) -> Result<String, PushError> {
        let mut cache = self.token_cache.lock().await;
        let now = Utc::now().timestamp();

        if let Some(cached) = cache.as_ref() {
            if cached.is_valid(now, self.config.cache_leeway_secs) {
                debug!("Using cached Google OAuth access token");
                return Ok(cached.access_token.clone());
            }
        }

        match self.request_token(now).await {
            Ok(token) => {
                let access_token = token.access_token.clone();
                *cache = Some(token);
                Ok(access_token)
            }
            Err(e) => {
                error!(error = %e, "Google OAuth token request error");
                Err(e.into())
            }
        }
    }
}

fn parse_expires_in(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
