//! Document transformation stages.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! clipboard HTML ──▶ normalize ──▶ placeholder::encode ──▶ (text, images)
//!                    (file → data:)          ▲                   │
//!                                            └── decode ◀────────┘
//! ```
//!
//! 1. [`scan`]        — locate `<img>` elements and their `src` values by position
//! 2. [`paths`]       — rule table turning `src` values into filesystem paths
//! 3. [`normalize`]   — embed resolvable local images as data URIs
//! 4. [`placeholder`] — swap images for `[Image omitted #N]` tokens and back
//! 5. [`datauri`]     — find and decode embedded images ahead of upload

pub mod datauri;
pub mod normalize;
pub mod paths;
pub mod placeholder;
pub mod scan;
