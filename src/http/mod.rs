//! HTTP client core
//!
//! A request travels through an explicit middleware chain and ends at a
//! `Transport`. Responses are decoded from the backend envelope exactly once,
//! in `envelope::decode`.

mod client;
mod envelope;
mod error;
pub mod middleware;
mod request;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ApiClient;
pub use envelope::{decode, Envelope};
pub use error::ClientError;
pub use middleware::{BearerAuth, Middleware, Next, RefreshOnUnauthorized};
pub use request::{ApiRequest, FileUpload, RawResponse, RequestBody};
pub use transport::{join_url, ReqwestTransport, Transport};
