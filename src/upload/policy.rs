//! Signed POST policy for browser-style object uploads.
//!
//! The storage provider accepts an unauthenticated multipart POST as long as
//! it carries a policy document (what may be uploaded, until when) and an
//! HMAC-SHA1 signature of that document made with the temporary secret.
//!
//! ```text
//! policy    = base64(json{ expiration, conditions })
//! signature = base64(hmac_sha1(accessKeySecret, policy))
//! key       = <prefix>/<unix millis>.<mime subtype>
//! ```

use crate::config::UploadConfig;
use crate::error::WordPasteError;
use crate::upload::credentials::Credentials;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Form field names, in the order they are sent. The file part goes last.
pub const FIELD_KEY: &str = "key";
pub const FIELD_POLICY: &str = "policy";
pub const FIELD_ACCESS_KEY_ID: &str = "OSSAccessKeyId";
pub const FIELD_SIGNATURE: &str = "signature";
pub const FIELD_SECURITY_TOKEN: &str = "x-oss-security-token";
pub const FIELD_SUCCESS_STATUS: &str = "success_action_status";
pub const FIELD_FILE: &str = "file";

#[derive(Debug, Serialize)]
struct PolicyDocument {
    expiration: String,
    conditions: Vec<(&'static str, u64, u64)>,
}

/// A fully signed upload, ready for a transport to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUpload {
    /// Object key; the remote URL is `base_url/key`.
    pub key: String,
    /// Text fields, in send order.
    pub fields: Vec<(&'static str, String)>,
    pub file_name: String,
    pub mime_type: String,
    pub payload: Vec<u8>,
}

impl SignedUpload {
    /// Value of a text field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Base64 policy JSON expiring at `expiration`.
pub fn encode_policy(expiration: DateTime<Utc>, max_content_length: u64) -> Result<String, WordPasteError> {
    let doc = PolicyDocument {
        expiration: expiration.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        conditions: vec![("content-length-range", 0, max_content_length)],
    };
    let json = serde_json::to_string(&doc)
        .map_err(|e| WordPasteError::Internal(format!("policy serialisation: {e}")))?;
    Ok(STANDARD.encode(json))
}

/// Base64 HMAC-SHA1 of the encoded policy, keyed by the secret.
pub fn sign_policy(policy_b64: &str, access_key_secret: &str) -> Result<String, WordPasteError> {
    let mut mac = HmacSha1::new_from_slice(access_key_secret.as_bytes())
        .map_err(|e| WordPasteError::Internal(format!("HMAC key: {e}")))?;
    mac.update(policy_b64.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// File extension for a MIME type: the lower-cased subtype.
pub fn extension_for(mime_type: &str) -> String {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => subtype.to_ascii_lowercase(),
        _ => "bin".to_string(),
    }
}

/// `<prefix>/<unix millis>.<ext>`
pub fn object_key(prefix: &str, now: DateTime<Utc>, mime_type: &str) -> String {
    let name = format!("{}.{}", now.timestamp_millis(), extension_for(mime_type));
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}

/// Build the signed form for one upload at time `now`.
pub fn build_signed_upload(
    config: &UploadConfig,
    credentials: &Credentials,
    mime_type: &str,
    payload: Vec<u8>,
    now: DateTime<Utc>,
) -> Result<SignedUpload, WordPasteError> {
    let expiration = now + Duration::seconds(config.policy_ttl_secs);
    let policy = encode_policy(expiration, config.max_content_length)?;
    let signature = sign_policy(&policy, &credentials.access_key_secret)?;
    let key = object_key(&config.key_prefix, now, mime_type);
    let ext = extension_for(mime_type);

    Ok(SignedUpload {
        fields: vec![
            (FIELD_KEY, key.clone()),
            (FIELD_POLICY, policy),
            (FIELD_ACCESS_KEY_ID, credentials.access_key_id.clone()),
            (FIELD_SIGNATURE, signature),
            (FIELD_SECURITY_TOKEN, credentials.security_token.clone()),
            (FIELD_SUCCESS_STATUS, config.success_action_status.clone()),
        ],
        key,
        file_name: format!("image.{ext}"),
        mime_type: mime_type.to_string(),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> UploadConfig {
        UploadConfig::builder()
            .upload_endpoint("https://up.example.com")
            .base_url("https://cdn.example.com")
            .sts_endpoint("https://sts.example.com")
            .build()
            .unwrap()
    }

    fn creds() -> Credentials {
        Credentials {
            access_key_id: "STS.key".into(),
            access_key_secret: "secret".into(),
            security_token: "token".into(),
        }
    }

    #[test]
    fn hmac_sha1_matches_rfc2202_vector() {
        assert_eq!(
            sign_policy("what do ya want for nothing?", "Jefe").unwrap(),
            "7/zfauXrL6LSdBbV8YTfnCWafHk="
        );
    }

    #[test]
    fn policy_encoding_is_stable() {
        let exp = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let policy = encode_policy(exp, 1 << 30).unwrap();
        let json = String::from_utf8(STANDARD.decode(&policy).unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"expiration":"2024-01-01T01:00:00Z","conditions":[["content-length-range",0,1073741824]]}"#
        );
    }

    #[test]
    fn signed_upload_fields() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let up = build_signed_upload(&config(), &creds(), "image/PNG", b"img".to_vec(), now).unwrap();

        assert_eq!(up.key, format!("pc/course/dev/{}.png", now.timestamp_millis()));
        let names: Vec<_> = up.fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                FIELD_KEY,
                FIELD_POLICY,
                FIELD_ACCESS_KEY_ID,
                FIELD_SIGNATURE,
                FIELD_SECURITY_TOKEN,
                FIELD_SUCCESS_STATUS
            ]
        );
        assert_eq!(up.field(FIELD_ACCESS_KEY_ID), Some("STS.key"));
        assert_eq!(up.field(FIELD_SECURITY_TOKEN), Some("token"));
        assert_eq!(up.field(FIELD_SUCCESS_STATUS), Some("200"));
        assert_eq!(
            up.field(FIELD_POLICY),
            Some("eyJleHBpcmF0aW9uIjoiMjAyNC0wMS0wMVQwMTowMDowMFoiLCJjb25kaXRpb25zIjpbWyJjb250ZW50LWxlbmd0aC1yYW5nZSIsMCwxMDczNzQxODI0XV19")
        );
        assert_eq!(up.field(FIELD_SIGNATURE), Some("7Gp5Blv4Hjae/lxR+1GzzE9pYzA="));
        assert_eq!(up.file_name, "image.png");
        assert_eq!(up.payload, b"img");
    }

    #[test]
    fn extension_from_mime() {
        assert_eq!(extension_for("image/JPEG"), "jpeg");
        assert_eq!(extension_for("image/svg+xml"), "svg+xml");
        assert_eq!(extension_for("image/png; charset=x"), "png");
        assert_eq!(extension_for("garbage"), "bin");
    }

    #[test]
    fn key_without_prefix() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(object_key("", now, "image/gif"), "1700000000123.gif");
    }
}
