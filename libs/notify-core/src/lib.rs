//! Notify Core
//!
//! Push notification SDK for Firebase Cloud Messaging's HTTP v1 API.
//!
//! It handles:
//! - OAuth2 access tokens from a Google service account (JWT-bearer grant)
//! - Token caching with refresh shortly before expiry
//! - FCM v1 message encoding with Android / APNs / Webpush overrides
//! - Response normalization into a uniform `PushResult`
//! - A keyed registry for applications running several push backends

pub mod auth;
pub mod builder;
pub mod client;
pub mod codec;
pub mod config;
pub mod errors;
pub mod models;
pub mod platform;
pub mod registry;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use auth::{AccessTokenProvider, GoogleServiceAccountTokenProvider};
pub use builder::PushMessageBuilder;
pub use client::{FcmClient, PushClient};
pub use config::{FcmClientConfig, FcmConfig, TokenProviderConfig};
pub use errors::{AuthError, PushError};
pub use models::{Platform, PushMessage, PushResult, PushTarget, ServiceAccountKey};
pub use platform::{AndroidOptions, ApnsOptions};
pub use registry::ClientRegistry;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
