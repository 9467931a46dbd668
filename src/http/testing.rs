//! In-memory transport for tests

use super::{ApiRequest, ClientError, RawResponse, RequestBody, Transport};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = Box<dyn Fn(&ApiRequest) -> RawResponse + Send + Sync>;

/// One request as the fake server saw it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Recorded {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub retried: bool,
    /// JSON body, if the request had one
    pub body: Option<serde_json::Value>,
}

/// Answers every request with a closure, optionally after a per-path delay
pub(crate) struct FakeTransport {
    handler: Handler,
    delays: Mutex<HashMap<String, Duration>>,
    log: Mutex<Vec<Recorded>>,
}

impl FakeTransport {
    pub fn new(handler: impl Fn(&ApiRequest) -> RawResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            delays: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        })
    }

    /// Hold responses for `path` for `delay` (uses tokio's clock)
    pub fn delay(&self, path: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(path.to_string(), delay);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ClientError> {
        self.log.lock().unwrap().push(Recorded {
            method: request.method.clone(),
            path: request.path.clone(),
            bearer: request.bearer().map(str::to_string),
            retried: request.retried,
            body: match &request.body {
                RequestBody::Json(value) => Some(value.clone()),
                _ => None,
            },
        });

        let delay = self.delays.lock().unwrap().get(&request.path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok((self.handler)(request))
    }
}

/// Successful envelope around `result`
pub(crate) fn ok(result: serde_json::Value) -> RawResponse {
    RawResponse::new(
        StatusCode::OK,
        serde_json::json!({ "isSuccess": true, "result": result, "errors": [] }).to_string(),
    )
}

pub(crate) fn unauthorized() -> RawResponse {
    RawResponse::new(StatusCode::UNAUTHORIZED, "")
}

pub(crate) fn failure(status: StatusCode, message: &str) -> RawResponse {
    RawResponse::new(
        status,
        serde_json::json!({ "isSuccess": false, "result": null, "errors": [message] }).to_string(),
    )
}
