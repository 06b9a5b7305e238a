//! Destination filename hint from a URL path.

use url::Url;

/// Last non-empty path segment of a URL, as a default destination filename.
///
/// Returns `None` when the URL does not parse, has no usable path, or the
/// last segment is a directory-like `.`/`..`.
pub fn default_filename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}
