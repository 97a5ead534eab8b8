//! Test doubles shared by the unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::auth::AccessTokenProvider;
use crate::errors::{AuthError, PushError};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

pub const TEST_PRIVATE_KEY: &str = include_str!("../tests/fixtures/test_service_account.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../tests/fixtures/test_service_account.pub.pem");
pub const TEST_CLIENT_EMAIL: &str = "push-sender@test-project.iam.gserviceaccount.com";

/// Transport that replays queued responses and records every request
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, PushError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(PushError::Transport(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, PushError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PushError::Transport("no mock response queued".to_string())))
    }
}

/// Token provider that always returns the same token
pub struct StaticTokenProvider(pub &'static str);

#[async_trait::async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<String, PushError> {
        Ok(self.0.to_string())
    }
}

/// Token provider that always fails like a rejected grant
pub struct RejectingTokenProvider;

#[async_trait::async_trait]
impl AccessTokenProvider for RejectingTokenProvider {
    async fn get_token(&self) -> Result<String, PushError> {
        Err(AuthError::Rejected {
            status: 400,
            error: Some("invalid_grant".to_string()),
            description: "Invalid JWT Signature.".to_string(),
        }
        .into())
    }
}
