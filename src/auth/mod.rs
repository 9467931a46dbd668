//! Authentication: backend auth calls and token refresh coordination
//!
//! # Architecture
//!
//! ```text
//! RefreshOnUnauthorized ─┐
//!                        ├──→ RefreshCoordinator ──→ TokenRefresher (RefreshEndpoint)
//! proactive refresh task ┘          │
//!                                   └──→ SessionContext (persist / clear)
//! ```
//!
//! Both refresh triggers share the one coordinator, so there is never more
//! than one refresh call in flight.

pub(crate) mod refresh;
mod service;

pub use refresh::{LoginRedirect, RefreshCoordinator, SESSION_EXPIRED_NOTICE};
pub use service::{AuthService, RefreshEndpoint};

use crate::http::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Login form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Tokens issued by login and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Body of the refresh call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

/// The logged-in account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub image_user: Option<String>,
}

/// Session-affecting backend calls
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthTokens, ClientError>;

    /// Server-side logout; callers treat failure as non-fatal
    async fn logout(&self) -> Result<(), ClientError>;

    async fn current_user(&self) -> Result<CurrentUser, ClientError>;

    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError>;

    async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), ClientError>;
}

/// The refresh network call, and nothing else
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, request: RefreshRequest) -> Result<AuthTokens, ClientError>;
}
