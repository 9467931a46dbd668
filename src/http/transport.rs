//! Transport: the last link of the middleware chain

use super::{ApiRequest, ClientError, RawResponse, RequestBody};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;

/// Sends a fully prepared request and returns whatever status came back
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ClientError>;
}

/// reqwest-backed transport bound to one base URL
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// # Errors
    /// Returns an error if the underlying client cannot be built (TLS backend)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("lungora-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into();
        tracing::debug!(base_url = %base_url, ?timeout, "HTTP transport initialized");

        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Join a base URL and a relative path with exactly one slash between them
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ClientError> {
        let url = self.url_for(&request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Upload(upload) => {
                let part = reqwest::multipart::Part::bytes(upload.bytes.to_vec())
                    .file_name(upload.file_name.clone())
                    .mime_str(&upload.content_type)
                    .map_err(|e| ClientError::InvalidRequest(format!("Bad upload: {}", e)))?;
                builder.multipart(reqwest::multipart::Form::new().part(upload.field.clone(), part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(format!("Failed to read response: {}", e)))?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            retried = request.retried,
            "HTTP exchange"
        );

        Ok(RawResponse { status, body })
    }
}
