//! HTML normaliser: embed local images as `data:` URIs.
//!
//! Clipboard HTML from a word processor references images through temporary
//! files on the local disk. Those references are meaningless anywhere else,
//! so every `<img src>` that resolves to a readable file is rewritten to a
//! base64 data URI. Anything that does not resolve (remote URL, missing or
//! unreadable file) is left exactly as it was.

use crate::error::ResolveError;
use crate::pipeline::{paths, scan};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Inlines local image files into `<img src>` attributes.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    base_dir: Option<PathBuf>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative image paths against `dir` instead of the process
    /// working directory.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Rewrite every resolvable `<img src>` in `html` to a data URI.
    pub fn normalize(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut last = 0;

        for tag_range in scan::find_img_tags(html) {
            let tag = &html[tag_range.clone()];
            let value = match scan::find_attr(tag, "src") {
                Some(v) => v,
                None => continue,
            };
            let src = &tag[value.range.clone()];
            if is_data_uri(src) {
                continue;
            }

            match self.inline_source(src) {
                Ok(data_uri) => {
                    let value_start = tag_range.start + value.range.start;
                    let value_end = tag_range.start + value.range.end;
                    out.push_str(&html[last..value_start]);
                    if value.quote.is_none() {
                        // An unquoted value would swallow a trailing `/`.
                        out.push('"');
                        out.push_str(&data_uri);
                        out.push('"');
                    } else {
                        out.push_str(&data_uri);
                    }
                    last = value_end;
                }
                Err(e) => debug!("Leaving <img> untouched: {}", e),
            }
        }

        out.push_str(&html[last..]);
        out
    }

    /// Resolve one `src` value and encode the file it names.
    pub fn inline_source(&self, src: &str) -> Result<String, ResolveError> {
        let normalized = paths::normalize_source(src)?;
        let path = self.resolve_path(&normalized);

        if !path.is_file() {
            return Err(ResolveError::NotFound { path });
        }

        let bytes = std::fs::read(&path).map_err(|e| ResolveError::Unreadable {
            path: path.clone(),
            detail: e.to_string(),
        })?;

        let subtype = mime_subtype(&path);
        debug!(
            "Inlined {} ({} bytes, image/{})",
            path.display(),
            bytes.len(),
            subtype
        );
        Ok(format!("data:image/{};base64,{}", subtype, STANDARD.encode(&bytes)))
    }

    fn resolve_path(&self, normalized: &str) -> PathBuf {
        let path = PathBuf::from(normalized);
        match &self.base_dir {
            Some(base) if path.is_relative() && !looks_absolute(normalized) => base.join(path),
            _ => path,
        }
    }
}

/// Normalise with the default settings.
pub fn normalize(html: &str) -> String {
    Normalizer::new().normalize(html)
}

/// True if `src` already carries embedded data.
pub fn is_data_uri(src: &str) -> bool {
    src.get(..5)
        .is_some_and(|head| head.eq_ignore_ascii_case("data:"))
}

/// Drive-letter and UNC paths are absolute even on hosts that don't think so.
fn looks_absolute(path: &str) -> bool {
    paths::matching_rule(path) == Some("drive-letter") || path.starts_with("//")
}

/// MIME subtype for an image file, from its extension. Defaults to `png`.
pub fn mime_subtype(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "" => "png".to_string(),
        "jpg" | "jpe" => "jpeg".to_string(),
        "tif" => "tiff".to_string(),
        "svg" => "svg+xml".to_string(),
        "ico" => "x-icon".to_string(),
        _ => ext,
    }
}

/// Unique `http`/`https` image sources in `html`, in first-occurrence order.
///
/// These cannot be inlined; a display component may want to prefetch them.
pub fn remote_image_urls(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    scan::find_img_tags(html)
        .into_iter()
        .filter_map(|range| scan::src_value(&html[range]).map(str::to_string))
        .filter(|src| {
            let lower = src.to_ascii_lowercase();
            lower.starts_with("http://") || lower.starts_with("https://")
        })
        .filter(|src| seen.insert(src.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn inlines_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "clip_image001.png", b"\x89PNG fake");
        let html = format!(r#"<p><img width=10 src="file://{}"></p>"#, path.display());

        let out = normalize(&html);
        let expected = format!("data:image/png;base64,{}", STANDARD.encode(b"\x89PNG fake"));
        assert_eq!(out, format!(r#"<p><img width=10 src="{expected}"></p>"#));
    }

    #[test]
    fn leaves_missing_file_untouched() {
        let html = r#"<img src="file:///definitely/not/here.png">"#;
        assert_eq!(normalize(html), html);
    }

    #[test]
    fn leaves_data_and_remote_untouched() {
        let html = r#"<img src="data:image/gif;base64,R0lG"><img src="https://x/a.png">"#;
        assert_eq!(normalize(html), html);
    }

    #[test]
    fn relative_path_uses_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "pic.JPG", b"jpegdata");
        let out = Normalizer::new()
            .base_dir(dir.path())
            .normalize("<img src=pic.JPG>");
        assert_eq!(
            out,
            format!(r#"<img src="data:image/jpeg;base64,{}">"#, STANDARD.encode(b"jpegdata"))
        );
    }

    #[test]
    fn percent_encoded_bare_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a b.gif", b"GIF89a");
        let src = path.display().to_string().replace(' ', "%20");
        let out = normalize(&format!("<img src='{src}'>"));
        assert!(out.starts_with("<img src='data:image/gif;base64,"), "{out}");
        assert!(out.ends_with("'>"));
    }

    #[test]
    fn inline_source_reports_reason() {
        let n = Normalizer::new();
        assert!(matches!(
            n.inline_source("http://example.com/a.png"),
            Err(ResolveError::Remote { .. })
        ));
        assert!(matches!(
            n.inline_source("/no/such/file.png"),
            Err(ResolveError::NotFound { .. })
        ));
    }

    #[test]
    fn subtype_mapping() {
        assert_eq!(mime_subtype(Path::new("a.PNG")), "png");
        assert_eq!(mime_subtype(Path::new("a.jpg")), "jpeg");
        assert_eq!(mime_subtype(Path::new("a.svg")), "svg+xml");
        assert_eq!(mime_subtype(Path::new("noext")), "png");
        assert_eq!(mime_subtype(Path::new("a.webp")), "webp");
    }

    #[test]
    fn remote_urls_unique_in_order() {
        let html = r#"<img src="https://b/2.png"><img src="data:image/png;base64,AA"><img src="http://a/1.png"><img src="https://b/2.png">"#;
        assert_eq!(
            remote_image_urls(html),
            vec!["https://b/2.png".to_string(), "http://a/1.png".to_string()]
        );
    }
}
