//! Dual-view synchronisation between placeholder text and rendered HTML.
//!
//! Two editable projections show the same document: SOURCE (placeholder
//! text, see [`crate::pipeline::placeholder`]) and PREVIEW (rendered HTML).
//! Whichever one the user edits is the authority for that edit; the other is
//! re-derived and pushed out through a [`ViewSink`].
//!
//! Pushing derived content into an editor widget usually makes the widget
//! report an edit of its own. [`Synchronizer`] is in [`SyncState::Deriving`]
//! while it publishes, and any edit arriving in that state is dropped, so a
//! derivation never triggers a second derivation.

use crate::pipeline::normalize::Normalizer;
use crate::pipeline::placeholder::{decode, encode_with, ImageList};
use thiserror::Error;
use tracing::{debug, warn};

/// Whether a derivation is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Deriving,
}

/// The two editable projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Placeholder text.
    Source,
    /// Rendered HTML.
    Preview,
}

/// A change notification delivered to the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// The user changed the placeholder text.
    Source(String),
    /// The user changed the rendered view; carries its full HTML.
    Preview(String),
    /// An upload batch produced a new canonical document.
    UploadCompleted(String),
    /// New content arrived from the clipboard.
    Pasted(String),
}

/// What [`Synchronizer::handle`] did with an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Views were re-derived and published.
    Applied,
    /// A derivation was already running; the edit was dropped.
    Ignored,
    /// Publishing failed; the previous consistent state was kept.
    Failed,
}

/// A projection refused derived content.
#[derive(Debug, Clone, Error)]
#[error("Failed to publish {view:?} view: {reason}")]
pub struct PublishError {
    pub view: View,
    pub reason: String,
}

/// Receiver of derived views, usually the editor widgets.
pub trait ViewSink {
    /// Show `content` in `view`.
    ///
    /// If showing it makes the widget raise its own change notification,
    /// return that notification; the synchronizer feeds it back and drops it.
    fn publish(&mut self, view: View, content: &str) -> Result<Option<Edit>, PublishError>;
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ViewSink for NullSink {
    fn publish(&mut self, _view: View, _content: &str) -> Result<Option<Edit>, PublishError> {
        Ok(None)
    }
}

/// The two flavours a clipboard may offer for one paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub html: Option<String>,
    pub text: Option<String>,
}

impl ClipboardPayload {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            text: None,
        }
    }

    /// The HTML flavour if non-empty, else the text flavour if non-empty.
    pub fn preferred(&self) -> Option<&str> {
        [self.html.as_deref(), self.text.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

/// Owner of the canonical document and both projections.
#[derive(Debug)]
pub struct Synchronizer<S: ViewSink = NullSink> {
    normalizer: Normalizer,
    sink: S,
    state: SyncState,
    canonical: String,
    images: ImageList,
    source: String,
    preview: String,
}

impl Default for Synchronizer<NullSink> {
    fn default() -> Self {
        Self::new(NullSink)
    }
}

impl<S: ViewSink> Synchronizer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            normalizer: Normalizer::new(),
            sink,
            state: SyncState::Idle,
            canonical: String::new(),
            images: ImageList::default(),
            source: String::new(),
            preview: String::new(),
        }
    }

    /// Use `normalizer` when encoding pasted or edited HTML.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// The authoritative HTML, for "copy as HTML" and uploads.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn images(&self) -> &ImageList {
        &self.images
    }

    /// Current placeholder text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Current rendered HTML.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn on_source_edited(&mut self, text: impl Into<String>) -> Outcome {
        self.handle(Edit::Source(text.into()))
    }

    pub fn on_preview_edited(&mut self, html: impl Into<String>) -> Outcome {
        self.handle(Edit::Preview(html.into()))
    }

    pub fn on_upload_completed(&mut self, document: impl Into<String>) -> Outcome {
        self.handle(Edit::UploadCompleted(document.into()))
    }

    /// Replace the whole document with the preferred clipboard flavour.
    ///
    /// An empty clipboard is ignored.
    pub fn paste(&mut self, payload: &ClipboardPayload) -> Outcome {
        match payload.preferred() {
            Some(raw) => self.handle(Edit::Pasted(raw.to_string())),
            None => {
                debug!("Paste ignored: clipboard has neither HTML nor text");
                Outcome::Ignored
            }
        }
    }

    /// Apply one edit. Edits that arrive mid-derivation are dropped.
    pub fn handle(&mut self, edit: Edit) -> Outcome {
        if self.state == SyncState::Deriving {
            debug!("Dropping edit raised during derivation");
            return Outcome::Ignored;
        }

        self.state = SyncState::Deriving;
        let result = match edit {
            Edit::Source(text) => self.derive_preview(text),
            Edit::Preview(html) => self.derive_source(html),
            Edit::UploadCompleted(document) | Edit::Pasted(document) => {
                self.replace_document(document)
            }
        };
        self.state = SyncState::Idle;

        match result {
            Ok(()) => Outcome::Applied,
            Err(e) => {
                warn!("{}; keeping previous views", e);
                Outcome::Failed
            }
        }
    }

    /// SOURCE changed: rebuild PREVIEW from it with the current image list.
    fn derive_preview(&mut self, text: String) -> Result<(), PublishError> {
        let html = decode(&text, &self.images);
        self.publish(View::Preview, &html)?;
        self.canonical.clone_from(&html);
        self.preview = html;
        self.source = text;
        Ok(())
    }

    /// PREVIEW changed: re-encode it, replacing the image list.
    fn derive_source(&mut self, html: String) -> Result<(), PublishError> {
        let encoded = encode_with(&self.normalizer, &html);
        self.publish(View::Source, &encoded.placeholder_text)?;
        self.canonical = encoded.inlined_html;
        self.images = encoded.images;
        self.source = encoded.placeholder_text;
        self.preview = html;
        Ok(())
    }

    /// New canonical document: re-encode and publish both views.
    fn replace_document(&mut self, document: String) -> Result<(), PublishError> {
        let encoded = encode_with(&self.normalizer, &document);
        self.publish(View::Source, &encoded.placeholder_text)?;
        if let Err(e) = self.publish(View::Preview, &encoded.inlined_html) {
            // SOURCE already shows the new text; put the old text back.
            let previous = self.source.clone();
            if let Err(restore) = self.publish(View::Source, &previous) {
                warn!("{}; source view may be stale", restore);
            }
            return Err(e);
        }
        self.preview.clone_from(&encoded.inlined_html);
        self.canonical = encoded.inlined_html;
        self.images = encoded.images;
        self.source = encoded.placeholder_text;
        Ok(())
    }

    fn publish(&mut self, view: View, content: &str) -> Result<(), PublishError> {
        if let Some(echo) = self.sink.publish(view, content)? {
            // Always dropped: we are Deriving.
            self.handle(echo);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMG: &str = r#"<img src="data:image/png;base64,AAAA">"#;

    /// Records publishes and echoes each one back like an editor widget.
    #[derive(Default)]
    struct EchoSink {
        published: Vec<(View, String)>,
        fail_on: Option<View>,
    }

    impl ViewSink for EchoSink {
        fn publish(&mut self, view: View, content: &str) -> Result<Option<Edit>, PublishError> {
            if self.fail_on == Some(view) {
                return Err(PublishError {
                    view,
                    reason: "widget gone".into(),
                });
            }
            self.published.push((view, content.to_string()));
            Ok(Some(match view {
                View::Source => Edit::Source(content.to_string()),
                View::Preview => Edit::Preview(content.to_string()),
            }))
        }
    }

    fn pasted() -> Synchronizer<EchoSink> {
        let mut sync = Synchronizer::new(EchoSink::default());
        let outcome = sync.paste(&ClipboardPayload::html(format!("<p>a</p>{IMG}<p>b</p>")));
        assert_eq!(outcome, Outcome::Applied);
        sync
    }

    #[test]
    fn paste_publishes_both_views_once() {
        let sync = pasted();
        assert_eq!(sync.state(), SyncState::Idle);
        assert_eq!(sync.images().len(), 1);
        assert_eq!(sync.source(), "<p>a</p>\n[Image omitted #1]\n<p>b</p>");
        assert_eq!(sync.sink().published.len(), 2);
        assert_eq!(sync.sink().published[0].0, View::Source);
        assert_eq!(sync.sink().published[1].0, View::Preview);
    }

    #[test]
    fn source_edit_rebuilds_preview_and_keeps_images() {
        let mut sync = pasted();
        let before = sync.images().clone();
        let outcome = sync.on_source_edited("<p>x</p>[Image omitted #1][Image omitted #1]");
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(sync.images(), &before);
        assert_eq!(sync.preview(), format!("<p>x</p>{IMG}{IMG}"));
        assert_eq!(sync.canonical(), sync.preview());
        // One more publish, and its echo was dropped.
        assert_eq!(sync.sink().published.len(), 3);
    }

    #[test]
    fn preview_edit_reencodes() {
        let mut sync = pasted();
        let other = r#"<img src="data:image/gif;base64,R0lG">"#;
        let outcome = sync.on_preview_edited(format!("{other}<p>new</p>{IMG}"));
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(sync.images().len(), 2);
        assert_eq!(sync.images().by_label(1), Some(other));
        assert_eq!(
            sync.source(),
            "[Image omitted #1]\n<p>new</p>\n[Image omitted #2]"
        );
        assert_eq!(sync.sink().published.len(), 3);
        assert_eq!(sync.sink().published[2].0, View::Source);
    }

    #[test]
    fn settled_views_are_consistent() {
        let mut sync = pasted();
        sync.on_preview_edited(format!("<b>t</b>{IMG}"));
        assert_eq!(decode(sync.source(), sync.images()), format!("<b>t</b>\n{IMG}"));
        sync.on_source_edited("[Image omitted #1] tail");
        assert_eq!(decode(sync.source(), sync.images()), sync.preview());
    }

    #[test]
    fn edit_during_derivation_is_ignored() {
        let mut sync = pasted();
        sync.state = SyncState::Deriving;
        assert_eq!(sync.on_source_edited("ignored"), Outcome::Ignored);
        assert_ne!(sync.source(), "ignored");
    }

    #[test]
    fn publish_failure_keeps_previous_state() {
        let mut sync = pasted();
        let source = sync.source().to_string();
        let preview = sync.preview().to_string();
        sync.sink_mut().fail_on = Some(View::Preview);

        assert_eq!(sync.on_source_edited("changed"), Outcome::Failed);
        assert_eq!(sync.state(), SyncState::Idle);
        assert_eq!(sync.source(), source);
        assert_eq!(sync.preview(), preview);
    }

    #[test]
    fn upload_completed_replaces_document() {
        let mut sync = pasted();
        let outcome = sync.on_upload_completed(r#"<p>a</p><img src="https://cdn/x.png"><p>b</p>"#);
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(
            sync.canonical(),
            r#"<p>a</p><img src="https://cdn/x.png"><p>b</p>"#
        );
        assert_eq!(sync.images().by_label(1), Some(r#"<img src="https://cdn/x.png">"#));
    }

    #[test]
    fn failed_preview_restores_source_widget() {
        let mut sync = pasted();
        let source = sync.source().to_string();
        let images = sync.images().clone();
        sync.sink_mut().fail_on = Some(View::Preview);

        let outcome = sync.on_upload_completed(r#"<img src="https://cdn/b.png"><img src="https://cdn/c.png">"#);
        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(sync.source(), source);
        assert_eq!(sync.images(), &images);

        let (view, shown) = sync.sink().published.last().unwrap().clone();
        assert_eq!(view, View::Source);
        assert_eq!(shown, source);

        // The text on screen still decodes against the kept image list.
        sync.sink_mut().fail_on = None;
        assert_eq!(sync.on_source_edited(shown), Outcome::Applied);
        assert_eq!(sync.preview(), format!("<p>a</p>\n{IMG}\n<p>b</p>"));
    }

    #[test]
    fn empty_clipboard_is_ignored() {
        let mut sync = Synchronizer::default();
        let payload = ClipboardPayload {
            html: Some(String::new()),
            text: None,
        };
        assert_eq!(sync.paste(&payload), Outcome::Ignored);
    }

    #[test]
    fn text_flavour_used_without_html() {
        let mut sync = Synchronizer::default();
        let payload = ClipboardPayload {
            html: None,
            text: Some("plain words".into()),
        };
        assert_eq!(sync.paste(&payload), Outcome::Applied);
        assert_eq!(sync.source(), "plain words");
    }
}
