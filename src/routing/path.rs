//! Path segment extraction and canonicalization.
//!
//! # Design Decisions
//! - Purely lexical on `/`: no percent-decoding, no interpretation
//! - Remainders always start with `/` so segmenting can be repeated safely
//! - `canonical_path` follows the usual slash-path cleaning rules

use super::request::Request;

const SEPARATOR: char = '/';

/// Split off the first segment of `path`.
///
/// Leading and trailing separators are ignored; a path without a leading
/// separator is treated as rooted. The remainder is `/` when nothing is left.
///
/// ```
/// use rest_mount::routing::path::unshift;
///
/// assert_eq!(unshift("/42/books/7"), ("42", "/books/7".to_string()));
/// assert_eq!(unshift("//42/"), ("42", "/".to_string()));
/// assert_eq!(unshift(""), ("", "/".to_string()));
/// ```
pub fn unshift(path: &str) -> (&str, String) {
    let trimmed = path.trim_matches(SEPARATOR);
    match trimmed.split_once(SEPARATOR) {
        Some((first, rest)) => (first, format!("/{rest}")),
        None => (trimmed, "/".to_string()),
    }
}

/// Unshift the first segment from a request path.
///
/// Returns the derived request (same method, headers, body and context,
/// remaining path) together with the consumed segment.
pub fn unshift_request(request: Request) -> (Request, String) {
    let (id, remainder) = unshift(request.path());
    let id = id.to_string();
    (request.with_path(remainder), id)
}

/// The first non-empty segment of `path`, or `""` for the root.
pub fn first_segment(path: &str) -> &str {
    path.split(SEPARATOR)
        .find(|part| !part.is_empty())
        .unwrap_or("")
}

/// Returns true when `path` has no non-empty segment.
pub fn is_root(path: &str) -> bool {
    first_segment(path).is_empty()
}

/// Canonical form of a URL path.
///
/// Eliminates `.` and `..` elements and repeated separators, always returns a
/// leading `/`, and keeps a trailing `/` when the input had one (unless the
/// result is the root itself).
pub fn canonical_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut stack: Vec<&str> = Vec::new();
    for part in path.split(SEPARATOR) {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            _ => stack.push(part),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for part in &stack {
        cleaned.push(SEPARATOR);
        cleaned.push_str(part);
    }
    if cleaned.is_empty() {
        return "/".to_string();
    }
    if path.ends_with(SEPARATOR) {
        cleaned.push(SEPARATOR);
    }
    cleaned
}
