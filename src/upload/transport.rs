//! Network seam for the upload workflow.
//!
//! [`UploadTransport`] is the only place the upload code touches the
//! network. [`HttpTransport`] is the real implementation over `reqwest`;
//! tests substitute an in-memory one to script STS and storage responses.

use crate::config::UploadConfig;
use crate::error::WordPasteError;
use crate::upload::credentials::{parse_sts_response, Credentials};
use crate::upload::policy::{SignedUpload, FIELD_FILE};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

/// Status and body of a storage POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub body: String,
}

impl SubmitResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// GET fresh credentials from the STS endpoint.
    async fn fetch_credentials(&self) -> Result<Credentials, WordPasteError>;

    /// POST a signed upload. Any HTTP status is a successful response here;
    /// only failing to get one at all is an error.
    async fn submit(&self, upload: SignedUpload) -> Result<SubmitResponse, WordPasteError>;
}

/// `reqwest`-backed transport with per-call timeouts.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    sts_endpoint: String,
    upload_endpoint: String,
    credential_timeout_secs: u64,
    upload_timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(config: &UploadConfig) -> Result<Self, WordPasteError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| WordPasteError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Use a caller-built client (proxies, custom TLS roots).
    pub fn with_client(client: reqwest::Client, config: &UploadConfig) -> Self {
        Self {
            client,
            sts_endpoint: config.sts_endpoint.clone(),
            upload_endpoint: config.upload_endpoint.clone(),
            credential_timeout_secs: config.credential_timeout_secs,
            upload_timeout_secs: config.upload_timeout_secs,
        }
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn fetch_credentials(&self) -> Result<Credentials, WordPasteError> {
        let secs = self.credential_timeout_secs;
        let failed = |e: reqwest::Error| {
            if e.is_timeout() {
                WordPasteError::CredentialTimeout { secs }
            } else {
                WordPasteError::Credential {
                    reason: e.to_string(),
                }
            }
        };

        debug!("Fetching STS credentials from {}", self.sts_endpoint);
        let response = self
            .client
            .get(&self.sts_endpoint)
            .timeout(Duration::from_secs(secs))
            .send()
            .await
            .map_err(failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WordPasteError::Credential {
                reason: format!("STS endpoint returned HTTP {status}"),
            });
        }

        let body = response.text().await.map_err(failed)?;
        parse_sts_response(&body)
    }

    async fn submit(&self, upload: SignedUpload) -> Result<SubmitResponse, WordPasteError> {
        let secs = self.upload_timeout_secs;
        let failed = |e: reqwest::Error| {
            if e.is_timeout() {
                WordPasteError::UploadTimeout { secs }
            } else {
                WordPasteError::UploadFailed {
                    reason: e.to_string(),
                }
            }
        };

        let form = into_form(upload)?;
        let response = self
            .client
            .post(&self.upload_endpoint)
            .timeout(Duration::from_secs(secs))
            .multipart(form)
            .send()
            .await
            .map_err(failed)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(failed)?;
        debug!("Upload POST answered {}: {}", status, body);
        Ok(SubmitResponse { status, body })
    }
}

/// Text fields in order, then the file part.
fn into_form(upload: SignedUpload) -> Result<Form, WordPasteError> {
    let part = Part::bytes(upload.payload)
        .file_name(upload.file_name)
        .mime_str(&upload.mime_type)
        .map_err(|e| WordPasteError::InvalidDataUri {
            reason: format!("unusable MIME type '{}': {e}", upload.mime_type),
        })?;

    let form = upload
        .fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value));
    Ok(form.part(FIELD_FILE, part))
}
