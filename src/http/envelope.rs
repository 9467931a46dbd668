//! Backend response envelope
//!
//! Every endpoint answers `{ "isSuccess": bool, "result": T | null, "errors": [..] }`.
//! The envelope is decoded exactly once here, so callers only ever see
//! `Result<T, ClientError>`.

use super::{ClientError, RawResponse};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub is_success: bool,
    /// Missing and null both read as None
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Collapse into the success payload or an API error.
    ///
    /// A successful envelope with `result: null` still decodes when `T`
    /// accepts null (`()`, `Option<_>`), which is how delete endpoints answer.
    pub fn into_result(self, status: StatusCode) -> Result<T, ClientError> {
        if !self.is_success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                errors: self.errors,
            });
        }

        match self.result {
            Some(result) => Ok(result),
            None => serde_json::from_value(serde_json::Value::Null)
                .map_err(|_| ClientError::Decode("missing result in successful response".into())),
        }
    }
}

/// Turn a raw response into the typed payload
pub fn decode<T: DeserializeOwned>(response: RawResponse) -> Result<T, ClientError> {
    let status = response.status;

    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }

    if !status.is_success() {
        return Err(ClientError::Api {
            status: status.as_u16(),
            errors: error_messages(&response.body),
        });
    }

    let envelope: Envelope<T> = serde_json::from_slice(&response.body)
        .map_err(|e| ClientError::Decode(e.to_string()))?;
    envelope.into_result(status)
}

/// Best-effort extraction of error messages from a failure body
fn error_messages(body: &[u8]) -> Vec<String> {
    if let Ok(envelope) = serde_json::from_slice::<Envelope<serde_json::Value>>(body) {
        if !envelope.errors.is_empty() {
            return envelope.errors;
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![crate::util::truncate_utf8_safe(&text, 500).to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
    }

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse::new(
            StatusCode::from_u16(status).unwrap(),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_success_payload() {
        let items: Vec<Item> =
            decode(response(200, r#"{"isSuccess":true,"result":[{"id":1}],"errors":[]}"#))
                .unwrap();
        assert_eq!(items, vec![Item { id: 1 }]);
    }

    #[test]
    fn test_null_result_decodes_into_unit() {
        decode::<()>(response(200, r#"{"isSuccess":true,"result":null}"#)).unwrap();

        let missing: Result<Item, _> = decode(response(200, r#"{"isSuccess":true}"#));
        assert!(matches!(missing, Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_unsuccessful_envelope_with_ok_status() {
        let err = decode::<Item>(response(
            200,
            r#"{"isSuccess":false,"result":null,"errors":["Doctor not found"]}"#,
        ))
        .unwrap_err();
        assert_eq!(
            err,
            ClientError::Api {
                status: 200,
                errors: vec!["Doctor not found".to_string()]
            }
        );
    }

    #[test]
    fn test_error_status_keeps_server_messages() {
        let err = decode::<Item>(response(
            400,
            r#"{"isSuccess":false,"errors":["Name is required"]}"#,
        ))
        .unwrap_err();
        assert_eq!(err.messages(), vec!["Name is required".to_string()]);

        let plain = decode::<Item>(response(502, "Bad Gateway")).unwrap_err();
        assert_eq!(plain.messages(), vec!["Bad Gateway".to_string()]);
    }

    #[test]
    fn test_unauthorized_and_garbage() {
        assert_eq!(
            decode::<Item>(response(401, "")).unwrap_err(),
            ClientError::Unauthorized
        );
        assert!(matches!(
            decode::<Item>(response(200, "<html>")),
            Err(ClientError::Decode(_))
        ));
    }
}
