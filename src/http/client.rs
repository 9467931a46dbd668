//! The configured request pipeline

use super::middleware::{Middleware, Next};
use super::{envelope, ApiRequest, ClientError, RawResponse, Transport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Transport plus an ordered middleware chain (outermost first)
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    chain: Vec<Arc<dyn Middleware>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            chain: Vec::new(),
        }
    }

    /// Append a middleware; it runs after every middleware added before it
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.chain.push(Arc::new(middleware));
        self
    }

    /// Run a request through the chain without decoding
    pub async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        Next::new(self.transport.as_ref(), &self.chain)
            .run(request)
            .await
    }

    /// Run a request and decode the envelope
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        envelope::decode(self.execute(request).await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    /// Delete endpoints answer with `null` or the removed entity; both are fine
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let _: serde_json::Value = self.send(ApiRequest::delete(path)).await?;
        Ok(())
    }
}
