//! Path normalisation for `<img src>` values.
//!
//! Word and the platform clipboard hand us image references in several
//! shapes: `file:///C:/…`, `file://C:/…`, `file:////Users/…`, bare
//! `C:\Users\…` paths, or percent-encoded POSIX paths. Rather than branching
//! on the running platform, every shape is described by one entry of
//! [`PATH_RULES`], keyed by a pattern over the decoded path. The first rule
//! whose pattern matches rewrites the path; paths no rule matches are used
//! as they are.
//!
//! ## Policy
//!
//! 1. `file:` URLs: the scheme is removed, then the authority (if the URL has
//!    one) is split off. Authority and path are percent-decoded separately.
//!    The rule table runs over the path alone. Afterwards an empty or
//!    `localhost` authority is dropped, a drive-letter authority (`C:`) is
//!    prepended to the path, and any other host becomes a UNC prefix
//!    (`//host/path`).
//! 2. Any other value with a URL scheme of two or more letters (`http:`,
//!    `cid:`, …) is not local and is rejected.
//! 3. Everything else is a bare path: percent-decoded, then the rule table
//!    runs over it.

use crate::error::ResolveError;
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

/// One rewrite step applied by a [`PathRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// Remove every leading `/`.
    StripLeadingSlashes,
    /// Replace a run of leading `/` with a single one.
    CollapseLeadingSlashes,
    /// Turn every `\` into `/`.
    ForwardSlashes,
}

impl Rewrite {
    fn apply(self, path: &str) -> String {
        match self {
            Rewrite::StripLeadingSlashes => path.trim_start_matches('/').to_string(),
            Rewrite::CollapseLeadingSlashes => format!("/{}", path.trim_start_matches('/')),
            Rewrite::ForwardSlashes => path.replace('\\', "/"),
        }
    }
}

/// A path shape and the rewrites that normalise it.
#[derive(Debug)]
pub struct PathRule {
    pub name: &'static str,
    pub shape: Regex,
    pub rewrites: &'static [Rewrite],
}

/// The normalisation table, checked in order.
pub static PATH_RULES: Lazy<Vec<PathRule>> = Lazy::new(|| {
    vec![
        PathRule {
            // `/C:/Users/…` — URL path carrying a drive letter.
            name: "slash-before-drive",
            shape: Regex::new(r"^/+[A-Za-z]:(?:[/\\]|$)").unwrap(),
            rewrites: &[Rewrite::StripLeadingSlashes, Rewrite::ForwardSlashes],
        },
        PathRule {
            // `C:\Users\…` or `C:/Users/…`
            name: "drive-letter",
            shape: Regex::new(r"^[A-Za-z]:(?:[/\\]|$)").unwrap(),
            rewrites: &[Rewrite::ForwardSlashes],
        },
        PathRule {
            // `//Users/…` — extra slashes from `file:////Users/…`.
            name: "repeated-root",
            shape: Regex::new(r"^/{2,}[^/]").unwrap(),
            rewrites: &[Rewrite::CollapseLeadingSlashes],
        },
    ]
});

static URL_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:").unwrap());
static DRIVE_AUTHORITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][:|]$").unwrap());

/// Name of the first rule matching `path`, if any.
pub fn matching_rule(path: &str) -> Option<&'static str> {
    PATH_RULES
        .iter()
        .find(|rule| rule.shape.is_match(path))
        .map(|rule| rule.name)
}

/// Run `path` through the rule table.
pub fn apply_rules(path: &str) -> String {
    match PATH_RULES.iter().find(|rule| rule.shape.is_match(path)) {
        Some(rule) => rule
            .rewrites
            .iter()
            .fold(path.to_string(), |p, rewrite| rewrite.apply(&p)),
        None => path.to_string(),
    }
}

/// Turn a raw `src` value into a filesystem path string.
pub fn normalize_source(src: &str) -> Result<String, ResolveError> {
    let src = src.trim();

    if let Some(rest) = strip_prefix_ignore_case(src, "file:") {
        return Ok(normalize_file_url(rest));
    }

    if URL_SCHEME.is_match(src) {
        return Err(ResolveError::Remote {
            src: src.to_string(),
        });
    }

    Ok(apply_rules(&decode(src)))
}

/// `rest` is everything after `file:`.
fn normalize_file_url(rest: &str) -> String {
    let (authority, path) = match rest.strip_prefix("//") {
        Some(after) => match after.find('/') {
            Some(slash) => (&after[..slash], &after[slash..]),
            None => (after, ""),
        },
        None => ("", rest),
    };

    // Query and fragment are never part of a file name.
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let authority = decode(authority);
    let path = apply_rules(&decode(path));

    if authority.is_empty() || authority.eq_ignore_ascii_case("localhost") {
        path
    } else if DRIVE_AUTHORITY.is_match(&authority) {
        format!("{}:{}", &authority[..1], path)
    } else {
        format!("//{authority}{path}")
    }
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_classifies_shapes() {
        assert_eq!(matching_rule("/C:/Users/a.png"), Some("slash-before-drive"));
        assert_eq!(matching_rule("///d:\\x.png"), Some("slash-before-drive"));
        assert_eq!(matching_rule("C:\\Users\\a.png"), Some("drive-letter"));
        assert_eq!(matching_rule("c:/a.png"), Some("drive-letter"));
        assert_eq!(matching_rule("//Users/a.png"), Some("repeated-root"));
        assert_eq!(matching_rule("/Users/a.png"), None);
        assert_eq!(matching_rule("images/a.png"), None);
    }

    #[test]
    fn rules_rewrite_paths() {
        assert_eq!(apply_rules("/C:/Users/a.png"), "C:/Users/a.png");
        assert_eq!(apply_rules("C:\\Users\\me\\a.png"), "C:/Users/me/a.png");
        assert_eq!(apply_rules("////Users/a.png"), "/Users/a.png");
        assert_eq!(apply_rules("/tmp/a.png"), "/tmp/a.png");
    }

    #[test]
    fn file_url_with_empty_authority() {
        assert_eq!(
            normalize_source("file:///C:/Users/me/clip%20image001.png").unwrap(),
            "C:/Users/me/clip image001.png"
        );
        assert_eq!(
            normalize_source("file:///tmp/msohtmlclip1/01/clip_image002.jpg").unwrap(),
            "/tmp/msohtmlclip1/01/clip_image002.jpg"
        );
    }

    #[test]
    fn file_url_with_four_slashes() {
        assert_eq!(
            normalize_source("file:////Users/me/Library/clip.png").unwrap(),
            "/Users/me/Library/clip.png"
        );
    }

    #[test]
    fn file_url_with_drive_authority() {
        assert_eq!(normalize_source("file://C:/dir/a.png").unwrap(), "C:/dir/a.png");
        assert_eq!(normalize_source("FILE://d|/a.png").unwrap(), "d:/a.png");
    }

    #[test]
    fn file_url_with_localhost_and_host() {
        assert_eq!(normalize_source("file://localhost/etc/a.png").unwrap(), "/etc/a.png");
        assert_eq!(
            normalize_source("file://server/share/a.png").unwrap(),
            "//server/share/a.png"
        );
    }

    #[test]
    fn bare_paths() {
        assert_eq!(
            normalize_source("C:%5CUsers%5Cme%5Ca.png").unwrap(),
            "C:/Users/me/a.png"
        );
        assert_eq!(normalize_source("/tmp/a%20b.png").unwrap(), "/tmp/a b.png");
        assert_eq!(normalize_source("rel/a.png").unwrap(), "rel/a.png");
    }

    #[test]
    fn remote_sources_are_rejected() {
        for src in ["http://x/a.png", "https://x/a.png", "cid:image001.png@01D"] {
            assert!(
                matches!(normalize_source(src), Err(ResolveError::Remote { .. })),
                "{src}"
            );
        }
    }
}
