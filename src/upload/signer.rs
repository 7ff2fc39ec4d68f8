//! Single-image upload with one credential refresh.
//!
//! STS credentials can expire between the fetch and the POST, or be revoked
//! early. Storage answers 403 in that case, so a 403 is retried exactly once
//! with freshly fetched credentials. Every other non-2xx status, and any
//! failure on the retry, is final for that image.

use crate::config::UploadConfig;
use crate::error::WordPasteError;
use crate::upload::credentials::Credentials;
use crate::upload::policy::{build_signed_upload, SignedUpload};
use crate::upload::transport::{HttpTransport, SubmitResponse, UploadTransport};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, warn};

const STATUS_FORBIDDEN: u16 = 403;

/// Signs and submits uploads through a transport.
///
/// Object keys are millisecond stamps; the signer never hands out the same
/// stamp twice, so two uploads in one millisecond get distinct keys.
#[derive(Debug)]
pub struct Signer<T: UploadTransport = HttpTransport> {
    transport: T,
    config: UploadConfig,
    last_stamp_ms: AtomicI64,
}

impl Signer<HttpTransport> {
    /// Signer over a real HTTP transport.
    pub fn from_config(config: UploadConfig) -> Result<Self, WordPasteError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: UploadTransport> Signer<T> {
    pub fn new(transport: T, config: UploadConfig) -> Self {
        Self {
            transport,
            config,
            last_stamp_ms: AtomicI64::new(i64::MIN),
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn fetch_credentials(&self) -> Result<Credentials, WordPasteError> {
        self.transport.fetch_credentials().await
    }

    /// Sign `payload` with `credentials` as of now.
    pub fn build_signed_upload(
        &self,
        credentials: &Credentials,
        mime_type: &str,
        payload: Vec<u8>,
    ) -> Result<SignedUpload, WordPasteError> {
        build_signed_upload(&self.config, credentials, mime_type, payload, self.next_stamp())
    }

    /// Now, bumped past the previous stamp if the clock hasn't moved.
    fn next_stamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let ms = now.timestamp_millis();
        let bump = |prev: i64| ms.max(prev.saturating_add(1));
        let stamp = self
            .last_stamp_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| Some(bump(prev)))
            .map_or(ms, bump);
        DateTime::from_timestamp_millis(stamp).unwrap_or(now)
    }

    pub async fn submit(&self, upload: SignedUpload) -> Result<SubmitResponse, WordPasteError> {
        self.transport.submit(upload).await
    }

    /// Upload one image and return its public URL.
    pub async fn upload(&self, mime_type: &str, payload: &[u8]) -> Result<String, WordPasteError> {
        let credentials = self.fetch_credentials().await?;
        let (mut key, mut response) = self.attempt(&credentials, mime_type, payload).await?;

        if response.status == STATUS_FORBIDDEN {
            warn!("Upload of {} got 403; refreshing credentials and retrying once", key);
            let credentials = self.fetch_credentials().await?;
            (key, response) = self.attempt(&credentials, mime_type, payload).await?;
        }

        if !response.is_success() {
            return Err(WordPasteError::UploadRejected {
                status: response.status,
                body: response.body,
            });
        }

        let url = self.config.object_url(&key);
        debug!("Uploaded {} bytes → {}", payload.len(), url);
        Ok(url)
    }

    async fn attempt(
        &self,
        credentials: &Credentials,
        mime_type: &str,
        payload: &[u8],
    ) -> Result<(String, SubmitResponse), WordPasteError> {
        let upload = self.build_signed_upload(credentials, mime_type, payload.to_vec())?;
        let key = upload.key.clone();
        let response = self.submit(upload).await?;
        Ok((key, response))
    }
}
