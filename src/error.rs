//! Error types for the wordpaste library.
//!
//! Two kinds of failure exist, and they are kept in separate types:
//!
//! * [`WordPasteError`] — **Fatal** for the call that returns it: a missing
//!   endpoint, a malformed STS response, a rejected upload. Returned as
//!   `Err(WordPasteError)`.
//!
//! * [`ResolveError`] and [`ImageFailure`] — **Non-fatal**: one image could not
//!   be inlined or uploaded, but the rest of the document is fine. The
//!   normaliser logs and skips; the upload batch records the failure in
//!   [`crate::upload::UploadOutcome`] and moves on to the next image.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the wordpaste library.
#[derive(Debug, Error)]
pub enum WordPasteError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// A required endpoint was not supplied in the environment.
    #[error("Required setting '{var}' is not set.\nExport it or pass the matching CLI flag.")]
    MissingConfig { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Credential errors ─────────────────────────────────────────────────
    /// The STS endpoint failed or returned a body without usable credentials.
    #[error("Failed to obtain upload credentials: {reason}")]
    Credential { reason: String },

    /// The STS request exceeded its timeout.
    #[error("Credential request timed out after {secs}s")]
    CredentialTimeout { secs: u64 },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// Object storage answered with a non-2xx status.
    #[error("Upload rejected [{status}]: {body}")]
    UploadRejected { status: u16, body: String },

    /// The multipart POST exceeded its timeout.
    #[error("Upload timed out after {secs}s")]
    UploadTimeout { secs: u64 },

    /// The multipart POST could not be sent at all.
    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    /// An embedded image could not be decoded into MIME type + bytes.
    #[error("Invalid data URI: {reason}")]
    InvalidDataUri { reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    #[error("Failed to read input '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WordPasteError {
    /// True for failures of the credential fetch, including its timeout.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            WordPasteError::Credential { .. } | WordPasteError::CredentialTimeout { .. }
        )
    }

    /// True for failures of the upload submission, including its timeout.
    pub fn is_upload_error(&self) -> bool {
        matches!(
            self,
            WordPasteError::UploadRejected { .. }
                | WordPasteError::UploadTimeout { .. }
                | WordPasteError::UploadFailed { .. }
        )
    }
}

/// Why an `<img src>` could not be turned into an embedded data URI.
///
/// Never surfaced to callers as an `Err`: the normaliser leaves the original
/// tag untouched and logs the reason at debug level.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The source points at a network resource, not a local file.
    #[error("'{src}' is not a local file reference")]
    Remote { src: String },

    /// The normalised path does not name a regular file.
    #[error("No file at '{path}'")]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Could not read '{path}': {detail}")]
    Unreadable { path: PathBuf, detail: String },
}

/// A single image that failed to upload during a batch.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("Image {index}: {detail}")]
pub struct ImageFailure {
    /// 1-based position of the image in the batch.
    pub index: usize,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_rejected_display() {
        let e = WordPasteError::UploadRejected {
            status: 500,
            body: "InternalError".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("InternalError"));
    }

    #[test]
    fn timeouts_fold_into_their_family() {
        assert!(WordPasteError::CredentialTimeout { secs: 10 }.is_credential_error());
        assert!(!WordPasteError::CredentialTimeout { secs: 10 }.is_upload_error());
        assert!(WordPasteError::UploadTimeout { secs: 30 }.is_upload_error());
        assert!(!WordPasteError::UploadTimeout { secs: 30 }.is_credential_error());
    }

    #[test]
    fn missing_config_names_variable() {
        let e = WordPasteError::MissingConfig {
            var: "STS_URL".into(),
        };
        assert!(e.to_string().contains("STS_URL"));
    }

    #[test]
    fn image_failure_display() {
        let f = ImageFailure {
            index: 2,
            detail: "Upload rejected [500]".into(),
        };
        assert_eq!(f.to_string(), "Image 2: Upload rejected [500]");
    }
}
