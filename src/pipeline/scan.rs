//! Positional scanner for `<img>` elements.
//!
//! Locates element boundaries by walking the markup byte by byte, tracking
//! quoted attribute values so a `>` inside `alt="a > b"` does not end the tag.
//! Only well-formed `<img ...>` elements have defined results; anything else
//! is skipped or cut short without error.
//!
//! All delimiters are ASCII, so every offset returned here falls on a UTF-8
//! character boundary and can be used to slice the input directly.

use std::ops::Range;

/// Byte range of one attribute value inside a tag, excluding quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrValue {
    pub range: Range<usize>,
    pub quote: Option<u8>,
}

/// Byte ranges of every `<img ...>` element in `html`, in document order.
///
/// The tag name match is ASCII case-insensitive and must be followed by
/// whitespace, `/` or `>` so `<image>` or `<imgx>` are not picked up. An
/// unterminated trailing tag is ignored.
pub fn find_img_tags(html: &str) -> Vec<Range<usize>> {
    let bytes = html.as_bytes();
    let mut tags = Vec::new();
    let mut i = 0;

    while let Some(offset) = bytes[i..].iter().position(|&b| b == b'<') {
        let start = i + offset;
        if !is_img_open(bytes, start) {
            i = start + 1;
            continue;
        }
        match tag_end(bytes, start + 4) {
            Some(end) => {
                tags.push(start..end);
                i = end;
            }
            None => break,
        }
    }

    tags
}

fn is_img_open(bytes: &[u8], start: usize) -> bool {
    let name = match bytes.get(start + 1..start + 4) {
        Some(name) => name,
        None => return false,
    };
    if !name.eq_ignore_ascii_case(b"img") {
        return false;
    }
    matches!(bytes.get(start + 4), Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>')
}

/// Offset one past the closing `>`, honouring quoted values.
fn tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, &b) in bytes[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(from + offset + 1),
            None => {}
        }
    }
    None
}

/// Locate the value of attribute `name` inside a single tag string.
///
/// `tag` must start with `<` followed by the element name. Attribute names
/// compare ASCII case-insensitively. Valueless attributes never match.
pub fn find_attr(tag: &str, name: &str) -> Option<AttrValue> {
    let bytes = tag.as_bytes();
    let mut i = bytes
        .iter()
        .position(|b| b.is_ascii_whitespace() || *b == b'/' || *b == b'>')?;

    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] == b'>' {
            return None;
        }

        let name_start = i;
        while i < bytes.len() && !matches!(bytes[i], b'=' | b'>' | b'/') && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let attr_name = &bytes[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match bytes.get(i) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let start = i + 1;
                let end = bytes[start..]
                    .iter()
                    .position(|&b| b == q)
                    .map_or(bytes.len(), |p| start + p);
                i = (end + 1).min(bytes.len());
                AttrValue {
                    range: start..end,
                    quote: Some(q),
                }
            }
            _ => {
                let start = i;
                while i < bytes.len() && bytes[i] != b'>' && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                AttrValue {
                    range: start..i,
                    quote: None,
                }
            }
        };

        if attr_name.eq_ignore_ascii_case(name.as_bytes()) {
            return Some(value);
        }
    }
}

/// Value of `src` in a tag, if present.
pub fn src_value(tag: &str) -> Option<&str> {
    find_attr(tag, "src").map(|v| &tag[v.range])
}
