use thiserror::Error;

/// Push SDK error types
///
/// Runtime failures of a send never surface as `PushError`: `FcmClient::send`
/// folds them into a failed `PushResult`. These variants are returned by
/// construction, configuration loading and token acquisition.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("No registered client for: {0}")]
    UnknownClient(String),
}

/// OAuth2 token acquisition errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to parse private key: {0}")]
    KeyParse(String),

    #[error("Failed to encode JWT: {0}")]
    JwtEncode(String),

    #[error("Failed to get access token: {0}")]
    Request(String),

    #[error("Failed to parse token response (HTTP {status}): {body}")]
    InvalidResponse { status: u16, body: String },

    #[error("OAuth token error (HTTP {status}): {description}")]
    Rejected {
        status: u16,
        error: Option<String>,
        description: String,
    },
}

impl AuthError {
    /// HTTP status returned by the token endpoint, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::InvalidResponse { status, .. } | AuthError::Rejected { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<PushError> for String {
    fn from(err: PushError) -> Self {
        err.to_string()
    }
}
