//! Embedded image data URIs: find them, decode them, swap them out.

use crate::error::WordPasteError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};

/// A base64 image data URI, ending at the first quote, whitespace or `)`.
/// Scheme and MIME type are case-insensitive, like the normaliser's check.
static DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)data:image/[^;"'\s]+;base64,[^"'\s)>]+"#).unwrap()
});

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Full MIME type, e.g. `image/png`.
    pub mime_type: String,
    pub payload: Vec<u8>,
}

impl DataUri {
    /// Split `data:<mime>;base64,<payload>` and decode the payload.
    pub fn parse(uri: &str) -> Result<Self, WordPasteError> {
        let invalid = |reason: &str| WordPasteError::InvalidDataUri {
            reason: reason.to_string(),
        };

        let (header, b64) = uri.split_once(',').ok_or_else(|| invalid("missing ','"))?;
        let header = header
            .get(..5)
            .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
            .map(|_| &header[5..])
            .ok_or_else(|| invalid("missing 'data:' prefix"))?;
        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default().trim();
        if !mime_type.contains('/') {
            return Err(invalid("missing MIME type"));
        }
        if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
            return Err(invalid("payload is not base64"));
        }

        let payload = STANDARD
            .decode(b64.trim())
            .map_err(|e| invalid(&format!("bad base64: {e}")))?;

        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            payload,
        })
    }
}

/// Unique data URIs in `html`, in first-occurrence order.
pub fn unique_data_uris(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    DATA_URI
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|uri| seen.insert(*uri))
        .map(str::to_string)
        .collect()
}

/// Replace every mapped data URI with its remote URL in one pass.
///
/// Unmapped URIs stay embedded.
pub fn replace_data_uris(html: &str, urls: &HashMap<String, String>) -> String {
    if urls.is_empty() {
        return html.to_string();
    }
    DATA_URI
        .replace_all(html, |caps: &Captures| {
            let uri = &caps[0];
            urls.get(uri).cloned().unwrap_or_else(|| uri.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_png() {
        let d = DataUri::parse("data:image/PNG;base64,aGVsbG8=").unwrap();
        assert_eq!(d.mime_type, "image/png");
        assert_eq!(d.payload, b"hello");
    }

    #[test]
    fn parse_rejects_malformed() {
        for uri in [
            "data:image/png;base64",
            "image/png;base64,AAAA",
            "data:;base64,AAAA",
            "data:image/png,AAAA",
            "data:image/png;base64,@@@",
        ] {
            assert!(DataUri::parse(uri).is_err(), "{uri}");
        }
    }

    #[test]
    fn unique_preserves_first_occurrence_order() {
        let html = r#"<img src="data:image/png;base64,BB"><img src='data:image/gif;base64,AA'><img src="data:image/png;base64,BB">"#;
        assert_eq!(
            unique_data_uris(html),
            vec![
                "data:image/png;base64,BB".to_string(),
                "data:image/gif;base64,AA".to_string()
            ]
        );
    }

    #[test]
    fn uppercase_scheme_is_found_and_parsed() {
        let html = r#"<img src="DATA:Image/PNG;BASE64,aGk="><p>x</p>"#;
        let found = unique_data_uris(html);
        assert_eq!(found, vec!["DATA:Image/PNG;BASE64,aGk=".to_string()]);
        assert!(crate::pipeline::normalize::is_data_uri(&found[0]));

        let d = DataUri::parse(&found[0]).unwrap();
        assert_eq!(d.mime_type, "image/png");
        assert_eq!(d.payload, b"hi");

        let map = HashMap::from([(found[0].clone(), "https://cdn/y.png".to_string())]);
        assert_eq!(
            replace_data_uris(html, &map),
            r#"<img src="https://cdn/y.png"><p>x</p>"#
        );
    }

    #[test]
    fn replace_only_mapped() {
        let html = r#"<img src="data:image/png;base64,AA"><img src="data:image/png;base64,AAB">"#;
        let mut map = HashMap::new();
        map.insert(
            "data:image/png;base64,AA".to_string(),
            "https://cdn/x.png".to_string(),
        );
        assert_eq!(
            replace_data_uris(html, &map),
            r#"<img src="https://cdn/x.png"><img src="data:image/png;base64,AAB">"#
        );
    }
}
