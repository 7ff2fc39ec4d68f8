//! Progress-callback trait for upload batch events.
//!
//! Pass an implementation of [`UploadProgressCallback`] to
//! [`crate::upload::upload_all`] to receive an event after every image. The
//! batch runs strictly in order, so events arrive in index order and the
//! running success count never goes backwards.
//!
//! # Example
//!
//! ```rust
//! use wordpaste::UploadProgressCallback;
//!
//! struct Printer;
//!
//! impl UploadProgressCallback for Printer {
//!     fn on_progress(&self, index: usize, total: usize, succeeded: usize) {
//!         eprintln!("Uploading image {index}/{total} ({succeeded} succeeded)");
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by the upload batch as it works through the images.
///
/// All methods have no-op defaults so callers only override what they need.
pub trait UploadProgressCallback: Send + Sync {
    /// Called once before the first image, with the number of unique images.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before image `index` (1-based) is uploaded.
    fn on_image_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when image `index` has been uploaded to `url`.
    fn on_image_uploaded(&self, index: usize, total: usize, url: &str) {
        let _ = (index, total, url);
    }

    /// Called when image `index` failed; the batch continues.
    fn on_image_failed(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called after every attempt, successful or not.
    ///
    /// # Arguments
    /// * `index`     — 1-based position of the image just attempted
    /// * `total`     — number of unique images in the batch
    /// * `succeeded` — successful uploads so far, including this one
    fn on_progress(&self, index: usize, total: usize, succeeded: usize) {
        let _ = (index, total, succeeded);
    }

    /// Called once at the end, including after a cancellation.
    fn on_batch_complete(&self, total: usize, succeeded: usize, cancelled: bool) {
        let _ = (total, succeeded, cancelled);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl UploadProgressCallback for NoopProgressCallback {}

/// Shared handle to a progress callback.
pub type ProgressCallback = Arc<dyn UploadProgressCallback>;
