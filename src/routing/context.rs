//! Per-request context side-channel.
//!
//! A `Context` is an immutable chain of typed key/value entries. Adding a
//! value returns a new context that shares every existing entry, so values
//! are only ever appended and cloning is a reference-count bump.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed key for a context value.
///
/// Two keys address the same slot when both the name and the value type
/// match.
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextKey").field(&self.name).finish()
    }
}

struct Entry {
    name: &'static str,
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<Entry>>,
}

/// Append-only key/value bag carried by a request.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Entry>>,
    len: usize,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new context with `value` stored under `key`.
    ///
    /// A later value shadows an earlier one stored under the same key; the
    /// earlier entry stays in the chain.
    pub fn with_value<T>(&self, key: &ContextKey<T>, value: T) -> Context
    where
        T: Any + Send + Sync,
    {
        Context {
            head: Some(Arc::new(Entry {
                name: key.name,
                value: Box::new(value),
                parent: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Most recent value stored under `key`.
    pub fn get<T>(&self, key: &ContextKey<T>) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.entries()
            .filter(|entry| entry.name == key.name)
            .find_map(|entry| entry.value.downcast_ref::<T>())
    }

    pub fn contains<T>(&self, key: &ContextKey<T>) -> bool
    where
        T: Any + Send + Sync,
    {
        self.get(key).is_some()
    }

    /// Number of entries, shadowed ones included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Key names in insertion order.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries().map(|entry| entry.name).collect();
        names.reverse();
        names
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        std::iter::successors(self.head.as_deref(), |entry| entry.parent.as_deref())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("keys", &self.keys()).finish()
    }
}
