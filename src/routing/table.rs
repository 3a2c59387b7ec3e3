//! Method → action lookup table.

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;

use super::action::BoxAction;

/// Maps HTTP methods to actions.
///
/// Methods match exactly (case-sensitive token). Registering a method twice
/// keeps only the latest action.
#[derive(Clone, Default)]
pub struct OperationTable {
    actions: HashMap<Method, BoxAction>,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` for `method`, replacing any previous registration.
    pub fn set(&mut self, method: Method, action: BoxAction) {
        self.actions.insert(method, action);
    }

    pub fn lookup(&self, method: &Method) -> Option<&BoxAction> {
        self.actions.get(method)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for OperationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.actions.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("OperationTable")
            .field("methods", &methods)
            .finish()
    }
}
