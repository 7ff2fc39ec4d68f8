//! Placeholder codec: HTML ⇄ plain text with numbered image markers.
//!
//! Embedded images make clipboard HTML unreadable as text: a single photo is
//! hundreds of kilobytes of base64. [`encode`] swaps each `<img>` element for
//! a short `[Image omitted #N]` token on a line of its own and keeps the
//! original tags in an [`ImageList`]; [`decode`] puts them back.
//!
//! Decoding is deliberately forgiving because the placeholder text is
//! user-edited: tokens may be duplicated, deleted, reordered or renumbered
//! to an index that no longer exists. Unknown indices decode to nothing.

use crate::pipeline::normalize::Normalizer;
use crate::pipeline::scan;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Matches one placeholder token; group 1 is the 1-based label.
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[Image omitted #([0-9]+)\]").unwrap());

/// Ordered raw `<img>` tags. Index `i` backs placeholder label `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageList(Vec<String>);

impl ImageList {
    pub fn new(tags: Vec<String>) -> Self {
        Self(tags)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tag for a 1-based placeholder label.
    pub fn by_label(&self, label: usize) -> Option<&str> {
        label
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for ImageList {
    fn from(tags: Vec<String>) -> Self {
        Self(tags)
    }
}

/// Result of [`encode`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoded {
    /// Input HTML with local images embedded; the new canonical document.
    pub inlined_html: String,
    /// `inlined_html` with every `<img>` replaced by a token.
    pub placeholder_text: String,
    /// The replaced tags, in document order.
    pub images: ImageList,
}

/// The token text for a 1-based label.
pub fn placeholder_token(label: usize) -> String {
    format!("[Image omitted #{label}]")
}

/// Encode with a default [`Normalizer`].
pub fn encode(html: &str) -> Encoded {
    encode_with(&Normalizer::new(), html)
}

/// Normalise `html`, then replace each `<img>` with the next token.
///
/// A newline is added before a token unless it already starts a line, and
/// after it unless it already ends one, so re-encoding decoded output does
/// not keep growing blank lines.
pub fn encode_with(normalizer: &Normalizer, html: &str) -> Encoded {
    let inlined_html = normalizer.normalize(html);
    let tags = scan::find_img_tags(&inlined_html);

    let mut text = String::with_capacity(inlined_html.len().min(64 * 1024));
    let mut images = Vec::with_capacity(tags.len());
    let mut last = 0;

    for (i, range) in tags.iter().enumerate() {
        text.push_str(&inlined_html[last..range.start]);
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&placeholder_token(i + 1));
        let next = inlined_html[range.end..].chars().next();
        if matches!(next, Some(c) if c != '\n') {
            text.push('\n');
        }
        images.push(inlined_html[range.clone()].to_string());
        last = range.end;
    }
    text.push_str(&inlined_html[last..]);

    Encoded {
        inlined_html,
        placeholder_text: text,
        images: ImageList(images),
    }
}

/// Rebuild HTML from placeholder text and the image list.
///
/// Never fails: a token whose label is zero, too large, or unparsable is
/// replaced by the empty string.
pub fn decode(placeholder_text: &str, images: &ImageList) -> String {
    let mut out = String::with_capacity(placeholder_text.len());
    let mut last = 0;

    for caps in TOKEN.captures_iter(placeholder_text) {
        let (whole, label) = match (caps.get(0), caps.get(1)) {
            (Some(w), Some(l)) => (w, l),
            _ => continue,
        };
        out.push_str(&placeholder_text[last..whole.start()]);
        let tag = label
            .as_str()
            .parse::<usize>()
            .ok()
            .and_then(|n| images.by_label(n))
            .unwrap_or("");
        out.push_str(tag);
        last = whole.end();
    }

    out.push_str(&placeholder_text[last..]);
    out
}

/// Byte ranges of every token in `text`, for highlighting.
pub fn placeholder_spans(text: &str) -> Vec<Range<usize>> {
    TOKEN.find_iter(text).map(|m| m.range()).collect()
}

/// Labels of the tokens in `text`, in order of appearance.
pub fn placeholder_labels(text: &str) -> Vec<usize> {
    TOKEN
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect()
}
