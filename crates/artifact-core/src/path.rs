//! Storage path helpers.
//!
//! A storage path is a caller-chosen key made of `/`-separated segments,
//! e.g. `proj1/scans/result.yml`. These helpers check that a path names a
//! leaf blob, encode segments so no transport can split or merge them, and
//! enumerate the ancestor collections a WebDAV origin needs before it
//! accepts a write.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::ArtifactError;
use crate::Result;

/// Characters a URL parser would treat as structure inside a path segment.
///
/// `%` is left alone: callers may already percent-encode their keys, and
/// only the encoded slash needs protecting (see [`escape_encoded_slashes`]).
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Reject paths that cannot name a blob.
///
/// A valid path is non-empty, does not end with `/`, and contains no `.` or
/// `..` segments, literal or percent-encoded (`%2e%2e` is `..` to a URL
/// parser).
pub fn validate(path: &str) -> Result<()> {
    let invalid = |reason: &str| ArtifactError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim_matches('/').is_empty() {
        return Err(invalid("path is empty"));
    }
    if path.ends_with('/') {
        return Err(invalid("path names a collection, not a blob"));
    }
    if path.split('/').any(is_dot_segment) {
        return Err(invalid("relative segments are not allowed"));
    }
    Ok(())
}

/// Escape literal `%2F` sequences so they survive as part of one segment.
///
/// `a%2Fb/c` becomes `a%252Fb/c`: the origin decodes `%25` back to `%`, so
/// the stored segment is the literal text `a%2Fb` instead of two segments.
/// The case of the hex digit is preserved.
pub fn escape_encoded_slashes(path: &str) -> String {
    path.replace("%2F", "%252F").replace("%2f", "%252f")
}

/// Percent-encode each segment of `path` for use in a URL path.
///
/// Segment boundaries are exactly the `/` characters of `path`: `?`, `#`
/// and `\` are encoded so the URL parser cannot start a query, a fragment,
/// or a new segment, and encoded slashes are escaped as well.
///
/// ```
/// use artifact_core::path::encode_path;
///
/// assert_eq!(encode_path("proj/a#1"), "proj/a%231");
/// assert_eq!(encode_path("pkg%2Fname/v?1"), "pkg%252Fname/v%3F1");
/// ```
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            utf8_percent_encode(&escape_encoded_slashes(segment), SEGMENT).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Ancestor collections of `path`, shortest first, each with a trailing `/`.
///
/// The leaf segment is excluded and empty segments are skipped:
///
/// ```
/// use artifact_core::path::parent_collections;
///
/// assert_eq!(
///     parent_collections("a/b/c/file.txt"),
///     vec!["a/", "a/b/", "a/b/c/"],
/// );
/// assert!(parent_collections("file.txt").is_empty());
/// ```
pub fn parent_collections(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((_leaf, ancestors)) = segments.split_last() else {
        return Vec::new();
    };

    let mut collections = Vec::with_capacity(ancestors.len());
    let mut prefix = String::new();
    for segment in ancestors {
        prefix.push_str(segment);
        prefix.push('/');
        collections.push(prefix.clone());
    }
    collections
}

/// True for `.` and `..`, including their `%2e` spellings.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}
