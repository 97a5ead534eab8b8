use std::sync::Arc;

use tracing::{error, info, warn};

use crate::auth::{AccessTokenProvider, GoogleServiceAccountTokenProvider};
use crate::codec::{decode_response, encode_message};
use crate::config::{FcmClientConfig, FcmConfig, TokenProviderConfig};
use crate::errors::PushError;
use crate::models::{PushMessage, PushResult, PushTarget, ServiceAccountKey};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

/// A push backend that delivers one message per call
///
/// `send` never fails: every runtime problem is reported as a failed
/// `PushResult`.
#[async_trait::async_trait]
pub trait PushClient: Send + Sync {
    async fn send(&self, message: &PushMessage, target: &PushTarget) -> PushResult;
}

/// Firebase Cloud Messaging HTTP v1 client
///
/// Obtains a bearer token, posts the encoded message to the project's
/// `messages:send` endpoint and normalizes the response.
pub struct FcmClient {
    project_id: String,
    endpoint: String,
    timeout: Option<std::time::Duration>,
    token_provider: Arc<dyn AccessTokenProvider>,
    transport: Arc<dyn HttpTransport>,
}

impl FcmClient {
    /// Create new FCM client
    ///
    /// # Arguments
    /// * `config` - Project id, optional endpoint override and timeout
    /// * `token_provider` - Source of OAuth2 bearer tokens
    /// * `transport` - HTTP transport used for the send call
    pub fn new(
        config: FcmClientConfig,
        token_provider: Arc<dyn AccessTokenProvider>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, PushError> {
        config.validate()?;

        let endpoint = config.resolved_endpoint();

        info!(
            project_id = %config.project_id,
            endpoint = %endpoint,
            "Initialized FCM HTTP v1 client"
        );

        Ok(Self {
            project_id: config.project_id,
            endpoint,
            timeout: config.timeout,
            token_provider,
            transport,
        })
    }

    /// Create a client authenticated with a Google service account, sharing one
    /// `reqwest` transport between the token exchange and the send calls
    pub fn from_service_account(
        config: FcmClientConfig,
        credentials: ServiceAccountKey,
        token_config: TokenProviderConfig,
    ) -> Result<Self, PushError> {
        let transport: Arc<dyn HttpTransport> = match config.timeout {
            Some(timeout) => Arc::new(ReqwestTransport::with_timeout(timeout)?),
            None => Arc::new(ReqwestTransport::new()),
        };

        let token_provider =
            GoogleServiceAccountTokenProvider::new(credentials, token_config, transport.clone())?;

        Self::new(config, Arc::new(token_provider), transport)
    }

    /// Create a client from a loaded `FcmConfig` (see `FcmConfig::from_env`)
    pub fn from_config(config: FcmConfig) -> Result<Self, PushError> {
        Self::from_service_account(config.client, config.credentials, config.token)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask FCM to validate the message without delivering it
    pub async fn validate(&self, message: &PushMessage, target: &PushTarget) -> PushResult {
        self.dispatch(message, target, true).await
    }

    async fn dispatch(
        &self,
        message: &PushMessage,
        target: &PushTarget,
        validate_only: bool,
    ) -> PushResult {
        let access_token = match self.token_provider.get_token().await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "FCM v1 send aborted: no access token");
                return PushResult::exception(&e);
            }
        };

        let envelope = encode_message(message, target, validate_only);
        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(e) => {
                let e = PushError::Transport(format!("Failed to serialize FCM message: {}", e));
                error!(error = %e, "FCM v1 exception");
                return PushResult::exception(&e);
            }
        };

        let request = HttpRequest::post(&self.endpoint)
            .with_header("Authorization", format!("Bearer {}", access_token))
            .with_header("Content-Type", "application/json")
            .with_body(body)
            .with_timeout(self.timeout);

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "FCM v1 exception");
                return PushResult::exception(&e);
            }
        };

        let result = decode_response(response.status, &response.body);

        if result.success {
            info!(id = ?result.id, status = response.status, validate_only, "FCM v1 send OK");
        } else {
            warn!(
                status = response.status,
                error = ?result.error_code,
                message = ?result.error_message,
                "FCM v1 send FAILED"
            );
        }

        result
    }
}

#[async_trait::async_trait]
impl PushClient for FcmClient {
    async fn send(&self, message: &PushMessage, target: &PushTarget) -> PushResult {
        self.dispatch(message, target, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockTransport, RejectingTokenProvider, StaticTokenProvider};
    use serde_json::{json, Value};

    fn client(transport: Arc<MockTransport>) -> FcmClient {
        FcmClient::new(
            FcmClientConfig::new("test-project"),
            Arc::new(StaticTokenProvider("ya29.test")),
            transport,
        )
        .unwrap()
    }

    #[test]
    fn test_fcm_client_creation() {
        let client = client(Arc::new(MockTransport::new()));

        assert_eq!(client.project_id(), "test-project");
        assert_eq!(
            client.endpoint(),
            "https://fcm.googleapis.com/v1/projects/test-project/messages:send"
        );
    }

    #[test]
    fn test_missing_project_id_is_a_config_error() {
        let result = FcmClient::new(
            FcmClientConfig::new(""),
            Arc::new(StaticTokenProvider("ya29.test")),
            Arc::new(MockTransport::new()),
        );

        assert!(matches!(result, Err(PushError::Config(_))));
    }

    #[tokio::test]
    async fn test_send_success() {
        let transport = Arc::new(
            MockTransport::new().respond(200, r#"{"name":"projects/test-project/messages/0:1"}"#),
        );
        let client = client(transport.clone());

        let message = PushMessage::new("Hello", "World").with_data_entry("order_id", 123);
        let result = client.send(&message, &PushTarget::token("device-token")).await;

        assert!(result.success);
        assert_eq!(result.id.as_deref(), Some("projects/test-project/messages/0:1"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(
            request.url,
            "https://fcm.googleapis.com/v1/projects/test-project/messages:send"
        );
        assert_eq!(request.header("Authorization"), Some("Bearer ya29.test"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));

        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(
            body,
            json!({
                "message": {
                    "token": "device-token",
                    "notification": {"title": "Hello", "body": "World"},
                    "data": {"order_id": "123"}
                }
            })
        );
    }

    #[tokio::test]
    async fn test_send_provider_error_is_data() {
        let transport = Arc::new(MockTransport::new().respond(
            404,
            r#"{"error":{"code":404,"status":"NOT_FOUND","message":"Requested entity was not found."}}"#,
        ));
        let client = client(transport);

        let result = client
            .send(&PushMessage::new("t", "b"), &PushTarget::token("stale"))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("NOT_FOUND"));
        assert_eq!(
            result.error_message.as_deref(),
            Some("Requested entity was not found.")
        );
    }

    #[tokio::test]
    async fn test_token_failure_becomes_exception_result() {
        let transport = Arc::new(MockTransport::new());
        let client = FcmClient::new(
            FcmClientConfig::new("test-project"),
            Arc::new(RejectingTokenProvider),
            transport.clone(),
        )
        .unwrap();

        let result = client
            .send(&PushMessage::new("t", "b"), &PushTarget::topic("news"))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("EXCEPTION"));
        assert_eq!(
            result.error_message.as_deref(),
            Some("OAuth token error (HTTP 400): Invalid JWT Signature.")
        );
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_exception_result() {
        let transport = Arc::new(MockTransport::new().fail("connection reset by peer"));
        let client = client(transport);

        let result = client
            .send(&PushMessage::new("t", "b"), &PushTarget::token("abc"))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("EXCEPTION"));
        assert_eq!(
            result.error_message.as_deref(),
            Some("HTTP transport error: connection reset by peer")
        );
        assert_eq!(result.raw, None);
    }

    #[tokio::test]
    async fn test_endpoint_override_and_timeout() {
        let transport = Arc::new(MockTransport::new().respond(200, "{}"));
        let client = FcmClient::new(
            FcmClientConfig::new("p1")
                .with_endpoint("http://localhost:9099/v1/projects/{project_id}/messages:send")
                .with_timeout(std::time::Duration::from_secs(5)),
            Arc::new(StaticTokenProvider("ya29.test")),
            transport.clone(),
        )
        .unwrap();

        let result = client
            .send(&PushMessage::new("t", "b"), &PushTarget::token("abc"))
            .await;

        assert!(result.success);
        assert_eq!(result.id, None);
        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "http://localhost:9099/v1/projects/p1/messages:send"
        );
        assert_eq!(request.timeout, Some(std::time::Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_validate_sets_validate_only() {
        let transport = Arc::new(
            MockTransport::new().respond(200, r#"{"name":"projects/test-project/messages/fake"}"#),
        );
        let client = client(transport.clone());

        let result = client
            .validate(&PushMessage::new("t", "b"), &PushTarget::token("abc"))
            .await;

        assert!(result.success);
        let body: Value = serde_json::from_slice(&transport.requests()[0].body).unwrap();
        assert_eq!(body["validate_only"], true);
    }

    #[tokio::test]
    async fn test_client_usable_as_trait_object() {
        let transport = Arc::new(MockTransport::new().respond(500, "oops"));
        let client: Arc<dyn PushClient> = Arc::new(client(transport));

        let result = client
            .send(&PushMessage::new("t", "b"), &PushTarget::token("abc"))
            .await;

        assert_eq!(result.error_code.as_deref(), Some("HTTP_500"));
        assert_eq!(result.error_message.as_deref(), Some("oops"));
    }
}
