//! Batch upload of every embedded image in a document.
//!
//! Images are uploaded one at a time in first-occurrence order. Before each
//! one the cancellation token is checked; an upload already in flight is
//! allowed to finish. A failed image is recorded and skipped, never aborting
//! the batch. At the end every successfully uploaded data URI is replaced by
//! its remote URL, and the rest stay embedded.

use crate::error::{ImageFailure, WordPasteError};
use crate::pipeline::datauri::{replace_data_uris, unique_data_uris, DataUri};
use crate::progress::UploadProgressCallback;
use crate::upload::signer::Signer;
use crate::upload::transport::UploadTransport;
use serde::Serialize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Data URI → remote URL, for one batch.
pub type UploadRecord = HashMap<String, String>;

/// One image waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    /// 1-based position in the batch.
    pub index: usize,
    pub data_uri: String,
}

/// The images `document` would upload, in order.
pub fn plan_uploads(document: &str) -> Vec<UploadTask> {
    unique_data_uris(document)
        .into_iter()
        .enumerate()
        .map(|(i, data_uri)| UploadTask {
            index: i + 1,
            data_uri,
        })
        .collect()
}

/// Result of [`upload_all`].
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    /// The input document with uploaded images pointing at remote URLs.
    pub document: String,
    pub succeeded: usize,
    /// Unique embedded images found, attempted or not.
    pub total: usize,
    #[serde(skip)]
    pub record: UploadRecord,
    pub failures: Vec<ImageFailure>,
    /// True if the token stopped the batch before every image was tried.
    pub cancelled: bool,
}

impl UploadOutcome {
    /// `"Uploaded X of Y images successfully"`
    pub fn summary(&self) -> String {
        format!(
            "Uploaded {} of {} images successfully",
            self.succeeded, self.total
        )
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Upload every unique embedded image in `document`.
pub async fn upload_all<T: UploadTransport>(
    signer: &Signer<T>,
    document: &str,
    progress: &dyn UploadProgressCallback,
    cancel: &CancellationToken,
) -> UploadOutcome {
    let tasks = plan_uploads(document);
    let total = tasks.len();
    info!("Uploading {} embedded images", total);
    progress.on_batch_start(total);

    let mut record = UploadRecord::new();
    let mut failures = Vec::new();
    let mut cancelled = false;

    for task in tasks {
        if cancel.is_cancelled() {
            info!("Upload cancelled before image {}/{}", task.index, total);
            cancelled = true;
            break;
        }
        progress.on_image_start(task.index, total);

        match upload_one(signer, &task.data_uri).await {
            Ok(url) => {
                progress.on_image_uploaded(task.index, total, &url);
                record.insert(task.data_uri, url);
            }
            Err(e) => {
                warn!("Upload failed for image {}: {}", task.index, e);
                let detail = e.to_string();
                progress.on_image_failed(task.index, total, &detail);
                failures.push(ImageFailure {
                    index: task.index,
                    detail,
                });
            }
        }
        progress.on_progress(task.index, total, record.len());
    }

    let succeeded = record.len();
    let document = replace_data_uris(document, &record);
    info!("Uploaded {}/{} images", succeeded, total);
    progress.on_batch_complete(total, succeeded, cancelled);

    UploadOutcome {
        document,
        succeeded,
        total,
        record,
        failures,
        cancelled,
    }
}

async fn upload_one<T: UploadTransport>(
    signer: &Signer<T>,
    data_uri: &str,
) -> Result<String, WordPasteError> {
    let image = DataUri::parse(data_uri)?;
    signer.upload(&image.mime_type, &image.payload).await
}

/// Blocking wrapper around [`upload_all`].
///
/// Creates a current-thread tokio runtime internally; do not call from
/// inside an async context.
pub fn upload_all_sync<T: UploadTransport>(
    signer: &Signer<T>,
    document: &str,
    progress: &dyn UploadProgressCallback,
    cancel: &CancellationToken,
) -> Result<UploadOutcome, WordPasteError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| WordPasteError::Internal(format!("Failed to create tokio runtime: {e}")))?;
    Ok(runtime.block_on(upload_all(signer, document, progress, cancel)))
}
