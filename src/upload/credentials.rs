//! Short-lived upload credentials issued by the STS endpoint.

use crate::error::WordPasteError;
use serde::Deserialize;
use std::fmt;

/// Temporary credentials for one upload attempt.
///
/// Never cached: every attempt fetches a fresh set, and a 403 triggers one
/// more fetch.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"***")
            .field("security_token", &"***")
            .finish()
    }
}

/// `{ "data": { ... } }` — anything else in the body is ignored.
#[derive(Debug, Deserialize)]
struct StsResponse {
    data: Option<Credentials>,
}

/// Parse an STS response body.
pub fn parse_sts_response(body: &str) -> Result<Credentials, WordPasteError> {
    let parsed: StsResponse =
        serde_json::from_str(body).map_err(|e| WordPasteError::Credential {
            reason: format!("malformed STS response: {e}"),
        })?;
    parsed.data.ok_or_else(|| WordPasteError::Credential {
        reason: "No STS data in response".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_object() {
        let body = r#"{"code":0,"data":{"accessKeyId":"STS.id","accessKeySecret":"sec","securityToken":"tok","expiration":"2030-01-01T00:00:00Z"}}"#;
        let creds = parse_sts_response(body).unwrap();
        assert_eq!(creds.access_key_id, "STS.id");
        assert_eq!(creds.access_key_secret, "sec");
        assert_eq!(creds.security_token, "tok");
    }

    #[test]
    fn missing_data_is_credential_error() {
        let err = parse_sts_response(r#"{"code":500}"#).unwrap_err();
        assert!(err.is_credential_error());
        let err = parse_sts_response(r#"{"data":null}"#).unwrap_err();
        assert!(err.is_credential_error());
    }

    #[test]
    fn missing_field_is_credential_error() {
        let err = parse_sts_response(r#"{"data":{"accessKeyId":"a"}}"#).unwrap_err();
        assert!(err.is_credential_error());
        assert!(parse_sts_response("not json").is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials {
            access_key_id: "id".into(),
            access_key_secret: "hunter2".into(),
            security_token: "tok".into(),
        };
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("tok"));
    }
}
