//! Request middleware chain
//!
//! Each middleware is `(request, next) -> response`. `Next` carries the rest
//! of the chain and ends at the transport. Two middlewares implement the
//! session hooks:
//!
//! ```text
//! BearerAuth ──→ RefreshOnUnauthorized ──→ Transport
//!   attach token     401? refresh once,
//!                    replay with new token
//! ```

use super::{ApiRequest, ClientError, RawResponse, Transport};
use crate::auth::RefreshCoordinator;
use crate::session::TokenSource;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: ApiRequest, next: Next<'_>)
        -> Result<RawResponse, ClientError>;
}

/// The remainder of a middleware chain
#[derive(Clone, Copy)]
pub struct Next<'a> {
    transport: &'a dyn Transport,
    chain: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub fn new(transport: &'a dyn Transport, chain: &'a [Arc<dyn Middleware>]) -> Self {
        Self { transport, chain }
    }

    /// Run the remaining middlewares, then the transport
    pub async fn run(self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        match self.chain.split_first() {
            Some((head, tail)) => {
                head.handle(
                    request,
                    Next {
                        transport: self.transport,
                        chain: tail,
                    },
                )
                .await
            }
            None => self.transport.send(&request).await,
        }
    }
}

/// Outgoing hook: attach the current bearer token
pub struct BearerAuth {
    source: Arc<dyn TokenSource>,
}

impl BearerAuth {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Middleware for BearerAuth {
    async fn handle(
        &self,
        mut request: ApiRequest,
        next: Next<'_>,
    ) -> Result<RawResponse, ClientError> {
        if let Some(token) = self.source.token() {
            request.set_bearer(&token)?;
        }
        next.run(request).await
    }
}

/// Incoming hook: recover expired sessions through the refresh coordinator
///
/// Only a 401 on a request that has not been replayed yet, while the session
/// holds the "authenticated" marker, triggers a refresh. Every other response
/// passes through untouched, so a 401 before login reaches the caller as is.
pub struct RefreshOnUnauthorized {
    source: Arc<dyn TokenSource>,
    coordinator: Arc<RefreshCoordinator>,
}

impl RefreshOnUnauthorized {
    pub fn new(source: Arc<dyn TokenSource>, coordinator: Arc<RefreshCoordinator>) -> Self {
        Self {
            source,
            coordinator,
        }
    }
}

#[async_trait]
impl Middleware for RefreshOnUnauthorized {
    async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<RawResponse, ClientError> {
        let response = next.run(request.clone()).await?;

        if response.status != StatusCode::UNAUTHORIZED
            || request.retried
            || !self.source.is_authenticated()
        {
            return Ok(response);
        }

        // A slow response to a request sent before the last refresh: the token
        // it carried is already stale, so replay with the current one.
        let token = match self.source.token() {
            Some(current) if request.bearer() != Some(current.as_str()) => {
                tracing::debug!(path = %request.path, "401 for a rotated token, replaying");
                current
            }
            _ => {
                tracing::debug!(path = %request.path, "401 on authenticated request, refreshing token");
                self.coordinator.refresh().await?
            }
        };

        let mut replay = request;
        replay.retried = true;
        replay.set_bearer(&token)?;
        next.run(replay).await
    }
}
