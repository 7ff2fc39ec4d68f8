//! # wordpaste
//!
//! Clean up word-processor clipboard HTML, edit it as text or as rendered
//! HTML, and move its embedded images to object storage.
//!
//! ## Why this crate?
//!
//! HTML copied out of Word points its images at temporary files on the local
//! disk. Pasted anywhere else, those images are gone. This crate embeds them
//! as data URIs straight away, shows the document as readable placeholder
//! text (`[Image omitted #1]`) next to the rendered view, and finally uploads
//! the images through a signed POST so the HTML carries short public URLs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! clipboard HTML
//!  │
//!  ├─ 1. Normalise  file:// and bare paths → data: URIs
//!  ├─ 2. Encode     <img> → [Image omitted #N] + ordered image list
//!  ├─ 3. Edit       Synchronizer keeps text and rendered views consistent
//!  ├─ 4. Upload     STS credentials → signed multipart POST (retry on 403)
//!  └─ 5. Rewrite    data: URIs → remote URLs, fed back to the Synchronizer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wordpaste::{upload_all, ClipboardPayload, NoopProgressCallback, Signer,
//!                 Synchronizer, UploadConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut sync = Synchronizer::default();
//!     sync.paste(&ClipboardPayload::html(std::fs::read_to_string("clip.html")?));
//!     println!("{}", sync.source());
//!
//!     let signer = Signer::from_config(UploadConfig::from_env()?)?;
//!     let outcome = upload_all(&signer, sync.canonical(), &NoopProgressCallback,
//!                              &CancellationToken::new()).await;
//!     sync.on_upload_completed(outcome.document.clone());
//!     eprintln!("{}", outcome.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `wordpaste` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod sync;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{UploadConfig, UploadConfigBuilder};
pub use error::{ImageFailure, ResolveError, WordPasteError};
pub use pipeline::normalize::{normalize, remote_image_urls, Normalizer};
pub use pipeline::placeholder::{decode, encode, encode_with, placeholder_spans, Encoded, ImageList};
pub use progress::{NoopProgressCallback, ProgressCallback, UploadProgressCallback};
pub use sync::{ClipboardPayload, Edit, NullSink, Outcome, SyncState, Synchronizer, View, ViewSink};
pub use upload::{upload_all, upload_all_sync, Signer, UploadOutcome, UploadTransport};
