//! Replayable request/response values
//!
//! Requests are plain data so the refresh hook can clone and resend them.
//! Upload bodies hold `Bytes`, which makes a replay a refcount bump.

use super::ClientError;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::Serialize;

/// A file sent as one part of a multipart form
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Form field name (the inference endpoint expects `image`)
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FileUpload {
    /// Guess the content type from the file extension
    pub fn image(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let content_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        };

        Self {
            field: "image".to_string(),
            file_name,
            content_type: content_type.to_string(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Upload(FileUpload),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the configured base URL
    pub path: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Set once the request has been replayed after a refresh
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidRequest(format!("Unserializable body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn upload(mut self, upload: FileUpload) -> Self {
        self.body = RequestBody::Upload(upload);
        self
    }

    /// Token currently carried in the Authorization header, if any
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// Set (or replace) the bearer credential
    pub fn set_bearer(&mut self, token: &str) -> Result<(), ClientError> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ClientError::InvalidRequest("Token is not a valid header value".into()))?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Raw HTTP outcome; any status code is a response, not an error
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_bearer_replaces_previous_token() {
        let mut request = ApiRequest::get("/api/Users");
        assert_eq!(request.bearer(), None);

        request.set_bearer("old").unwrap();
        request.set_bearer("new").unwrap();
        assert_eq!(request.bearer(), Some("new"));
        assert_eq!(request.headers.get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let mut request = ApiRequest::get("/api/Users");
        assert!(request.set_bearer("line\nbreak").is_err());
        assert_eq!(request.bearer(), None);
    }

    #[test]
    fn test_image_upload_content_type() {
        let upload = FileUpload::image("scan.PNG", vec![1u8, 2, 3]);
        assert_eq!(upload.field, "image");
        assert_eq!(upload.content_type, "image/png");

        let unknown = FileUpload::image("scan", Vec::<u8>::new());
        assert_eq!(unknown.content_type, "application/octet-stream");
    }
}
