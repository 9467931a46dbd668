//! Backend auth endpoints

use super::{
    AuthApi, AuthTokens, ChangePasswordRequest, Credentials, CurrentUser, RefreshRequest,
    RegisterRequest, TokenRefresher,
};
use crate::api::endpoints;
use crate::http::{ApiClient, ClientError};
use async_trait::async_trait;

/// Auth calls over two pipelines:
/// - `client`: full chain (bearer + 401 refresh) for calls that need a live session
/// - `plain`: bearer only, for calls that must never trigger a refresh
///   (login, register, logout)
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
    plain: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient, plain: ApiClient) -> Self {
        Self { client, plain }
    }
}

#[async_trait]
impl AuthApi for AuthService {
    async fn login(&self, credentials: &Credentials) -> Result<AuthTokens, ClientError> {
        self.plain.post(endpoints::LOGIN, credentials).await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .plain
            .post(endpoints::LOGOUT, &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<CurrentUser, ClientError> {
        self.client.get(endpoints::CURRENT_USER).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError> {
        let _: serde_json::Value = self.plain.post(endpoints::REGISTER, request).await?;
        Ok(())
    }

    async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), ClientError> {
        let _: serde_json::Value = self.client.post(endpoints::CHANGE_PASSWORD, request).await?;
        Ok(())
    }
}

/// The refresh endpoint, reached without the 401 hook so a failing refresh
/// cannot recurse into another refresh
pub struct RefreshEndpoint {
    plain: ApiClient,
}

impl RefreshEndpoint {
    pub fn new(plain: ApiClient) -> Self {
        Self { plain }
    }
}

#[async_trait]
impl TokenRefresher for RefreshEndpoint {
    async fn refresh(&self, request: RefreshRequest) -> Result<AuthTokens, ClientError> {
        self.plain.post(endpoints::REFRESH_TOKEN, &request).await
    }
}
