use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::PushError;
use crate::models::ServiceAccountKey;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const FCM_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
pub const DEFAULT_CACHE_LEEWAY_SECS: i64 = 30;
pub const DEFAULT_FCM_ENDPOINT: &str =
    "https://fcm.googleapis.com/v1/projects/{project_id}/messages:send";

/// OAuth2 token provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenProviderConfig {
    pub token_uri: String,
    pub scopes: Vec<String>,
    /// Seconds before expiry at which a cached token is considered stale
    pub cache_leeway_secs: i64,
}

impl Default for TokenProviderConfig {
    fn default() -> Self {
        Self {
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            scopes: vec![FCM_MESSAGING_SCOPE.to_string()],
            cache_leeway_secs: DEFAULT_CACHE_LEEWAY_SECS,
        }
    }
}

impl TokenProviderConfig {
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Replace the scopes with a single scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes = vec![scope.into()];
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache_leeway(mut self, seconds: i64) -> Self {
        self.cache_leeway_secs = seconds;
        self
    }

    /// Scopes as sent in the JWT `scope` claim
    pub fn scope_claim(&self) -> String {
        self.scopes.join(" ")
    }
}

/// FCM HTTP v1 client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcmClientConfig {
    pub project_id: String,
    /// Send endpoint; `{project_id}` is substituted. Defaults to the FCM v1 URL.
    pub endpoint: Option<String>,
    pub timeout: Option<Duration>,
}

impl FcmClientConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            endpoint: None,
            timeout: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), PushError> {
        if self.project_id.trim().is_empty() {
            return Err(PushError::Config(
                "FCM HTTP v1 client requires \"project_id\"".to_string(),
            ));
        }
        Ok(())
    }

    /// Fully resolved send URL
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .as_deref()
            .unwrap_or(DEFAULT_FCM_ENDPOINT)
            .replace("{project_id}", &self.project_id)
    }
}

/// Complete configuration for building an `FcmClient` from the environment
#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub credentials: ServiceAccountKey,
    pub client: FcmClientConfig,
    pub token: TokenProviderConfig,
}

impl FcmConfig {
    /// Load configuration from environment variables
    ///
    /// - `GOOGLE_APPLICATION_CREDENTIALS`: service account JSON file (required)
    /// - `FCM_PROJECT_ID`: defaults to the key's `project_id`
    /// - `FCM_ENDPOINT`, `FCM_TIMEOUT_SECS`
    /// - `FCM_TOKEN_URI`: defaults to the key's `token_uri`
    /// - `FCM_SCOPES`: space or comma separated
    /// - `FCM_TOKEN_CACHE_LEEWAY_SECS` (default: 30)
    pub fn from_env() -> Result<Self, PushError> {
        let credentials_path = env_var("GOOGLE_APPLICATION_CREDENTIALS").ok_or_else(|| {
            PushError::Config("GOOGLE_APPLICATION_CREDENTIALS is not set".to_string())
        })?;
        let credentials = ServiceAccountKey::from_file(&credentials_path)?;

        let project_id = env_var("FCM_PROJECT_ID")
            .or_else(|| credentials.project_id.clone())
            .ok_or_else(|| {
                PushError::Config(
                    "FCM_PROJECT_ID is not set and the service account has no project_id"
                        .to_string(),
                )
            })?;

        let mut client = FcmClientConfig::new(project_id);
        client.endpoint = env_var("FCM_ENDPOINT");
        client.timeout = env_var("FCM_TIMEOUT_SECS")
            .map(|v| parse_env::<u64>("FCM_TIMEOUT_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);

        let mut token = TokenProviderConfig::default();
        if let Some(uri) = env_var("FCM_TOKEN_URI").or_else(|| credentials.token_uri.clone()) {
            token.token_uri = uri;
        }
        if let Some(scopes) = env_var("FCM_SCOPES") {
            token.scopes = parse_scopes(&scopes);
            if token.scopes.is_empty() {
                return Err(PushError::Config(
                    "FCM_SCOPES does not contain any scope".to_string(),
                ));
            }
        }
        if let Some(leeway) = env_var("FCM_TOKEN_CACHE_LEEWAY_SECS") {
            token.cache_leeway_secs = parse_env("FCM_TOKEN_CACHE_LEEWAY_SECS", &leeway)?;
        }

        client.validate()?;

        Ok(FcmConfig {
            credentials,
            client,
            token,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, PushError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| PushError::Config(format!("Invalid {}: {}", name, e)))
}

/// Split a comma or whitespace separated scope list
pub fn parse_scopes(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
