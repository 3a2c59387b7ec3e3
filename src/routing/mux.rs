//! Custom-pattern sub-router.
//!
//! # Responsibilities
//! - Register arbitrary path patterns beyond the five standard actions
//! - Answer "does any pattern start with this segment" in O(1)
//! - Pick the most specific pattern for a path
//!
//! # Matching Rules
//! - Patterns and paths are compared in canonical form
//! - A pattern without a trailing `/` matches only that exact path
//! - A pattern with a trailing `/` matches the whole subtree below it
//! - Exact matches win, then the longest subtree pattern
//! - `/` is the catch-all root pattern and is tracked by its own flag

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::action::{Action, BoxAction};
use super::path::{canonical_path, first_segment};
use super::request::{self, Request, Response};

/// Registration side of a request multiplexer.
pub trait Multiplexer {
    fn handle(&mut self, pattern: &str, action: BoxAction);
}

/// Pattern registry with prefix and root bookkeeping.
#[derive(Clone, Default)]
pub struct Mux {
    patterns: HashMap<String, BoxAction>,
    /// Subtree patterns, longest first.
    subtrees: Vec<String>,
    prefixes: HashSet<String>,
    has_root: bool,
}

impl Mux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `pattern`, replacing an identical pattern.
    pub fn handle(&mut self, pattern: &str, action: BoxAction) {
        let pattern = canonical_path(pattern);

        if pattern == "/" {
            self.has_root = true;
        } else {
            self.prefixes.insert(first_segment(&pattern).to_string());
        }

        if pattern.ends_with('/') && !self.subtrees.contains(&pattern) {
            self.subtrees.push(pattern.clone());
            self.subtrees.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        }

        tracing::trace!(pattern = %pattern, "Registered sub-router pattern");
        self.patterns.insert(pattern, action);
    }

    /// True when a registered pattern starts with the first segment of `path`.
    pub fn has_prefix(&self, path: &str) -> bool {
        self.prefixes.contains(first_segment(path))
    }

    /// True when the catch-all `/` pattern is registered.
    pub fn has_root(&self) -> bool {
        self.has_root
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Most specific pattern matching `path`, with its action.
    pub fn lookup(&self, path: &str) -> Option<(&str, &BoxAction)> {
        self.lookup_canonical(&canonical_path(path))
    }

    /// Invoke the action registered for the request path, or `on_miss` when
    /// no pattern matches.
    ///
    /// The matched action receives the request with its path in canonical
    /// form.
    pub fn serve<F>(&self, request: Request, on_miss: F) -> Response
    where
        F: FnOnce(Request) -> Response,
    {
        let path = canonical_path(request.path());
        match self.lookup_canonical(&path) {
            Some((pattern, action)) => {
                tracing::trace!(pattern = %pattern, path = %path, "Sub-router pattern matched");
                action.call(request.with_path(path))
            }
            None => on_miss(request),
        }
    }

    fn lookup_canonical(&self, path: &str) -> Option<(&str, &BoxAction)> {
        if let Some((pattern, action)) = self.patterns.get_key_value(path) {
            return Some((pattern.as_str(), action));
        }
        self.subtrees
            .iter()
            .find(|pattern| path.starts_with(pattern.as_str()))
            .and_then(|pattern| self.patterns.get_key_value(pattern))
            .map(|(pattern, action)| (pattern.as_str(), action))
    }
}

impl Multiplexer for Mux {
    fn handle(&mut self, pattern: &str, action: BoxAction) {
        Mux::handle(self, pattern, action);
    }
}

/// A mux used on its own answers unmatched paths with the generic 404.
impl Action for Mux {
    fn call(&self, request: Request) -> Response {
        self.serve(request, |_| request::not_found())
    }
}

impl fmt::Debug for Mux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut patterns: Vec<_> = self.patterns.keys().collect();
        patterns.sort();
        f.debug_struct("Mux")
            .field("patterns", &patterns)
            .field("has_root", &self.has_root)
            .finish()
    }
}
