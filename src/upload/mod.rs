//! Offloading embedded images to object storage.
//!
//! ```text
//! document ──▶ batch ──▶ signer ──▶ policy (sign) ──▶ transport (POST)
//!                           │                              ▲
//!                           └──▶ credentials (STS GET) ────┘
//! ```
//!
//! 1. [`credentials`] — STS response parsing
//! 2. [`policy`]      — policy document, HMAC-SHA1 signature, object key
//! 3. [`transport`]   — the network seam; `reqwest` in production
//! 4. [`signer`]      — one image, with a single retry on 403
//! 5. [`batch`]       — every image in a document, with progress and cancellation

pub mod batch;
pub mod credentials;
pub mod policy;
pub mod signer;
pub mod transport;

pub use batch::{plan_uploads, upload_all, upload_all_sync, UploadOutcome, UploadRecord, UploadTask};
pub use credentials::Credentials;
pub use policy::SignedUpload;
pub use signer::Signer;
pub use transport::{HttpTransport, SubmitResponse, UploadTransport};
