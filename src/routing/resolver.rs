//! Resource resolution contract.
//!
//! # Responsibilities
//! - Validate the resource identifier consumed from the path
//! - Look the resource up (database, cache, ...)
//! - Store whatever downstream actions need into the request context
//!
//! # Outcomes
//! - `Err(_)`: hard stop, the request is answered with an internal error
//! - `Ok(Resolution::NotFound)`: soft stop, the request is answered with not-found
//! - `Ok(Resolution::Found(ctx))`: `ctx` replaces the request context

use tower::BoxError;

use super::context::{Context, ContextKey};

/// Result of a successful resolver call.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The resource exists; carries the context for downstream processing.
    Found(Context),
    /// The resource does not exist or must not be revealed to the requester.
    NotFound,
}

/// Resolves a resource identifier and enriches the request context.
pub trait ResourceResolver: Send + Sync {
    fn resolve(&self, ctx: Context, resource_id: &str) -> Result<Resolution, BoxError>;
}

impl<F> ResourceResolver for F
where
    F: Fn(Context, &str) -> Result<Resolution, BoxError> + Send + Sync,
{
    fn resolve(&self, ctx: Context, resource_id: &str) -> Result<Resolution, BoxError> {
        self(ctx, resource_id)
    }
}

/// Resolver that accepts any non-empty identifier and stores it in the
/// context under its key.
#[derive(Debug, Clone, Copy)]
pub struct IdResolver {
    key: ContextKey<String>,
}

impl IdResolver {
    pub const fn new(key: ContextKey<String>) -> Self {
        Self { key }
    }

    pub fn key(&self) -> ContextKey<String> {
        self.key
    }

    /// The identifier stored by this resolver, if any.
    pub fn resource_id<'a>(&self, ctx: &'a Context) -> Option<&'a str> {
        ctx.get(&self.key).map(String::as_str)
    }
}

impl ResourceResolver for IdResolver {
    fn resolve(&self, ctx: Context, resource_id: &str) -> Result<Resolution, BoxError> {
        if resource_id.is_empty() {
            return Ok(Resolution::NotFound);
        }
        Ok(Resolution::Found(ctx.with_value(&self.key, resource_id.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK_ID: ContextKey<String> = ContextKey::new("book_id");

    #[test]
    fn test_id_resolver_stores_id() {
        let resolver = IdResolver::new(BOOK_ID);
        match resolver.resolve(Context::new(), "42").unwrap() {
            Resolution::Found(ctx) => {
                assert_eq!(resolver.resource_id(&ctx), Some("42"));
                assert_eq!(ctx.get(&resolver.key()).map(String::as_str), Some("42"));
            }
            Resolution::NotFound => panic!("expected resource to be found"),
        }
    }

    #[test]
    fn test_id_resolver_rejects_empty_id() {
        let resolver = IdResolver::new(BOOK_ID);
        assert!(matches!(
            resolver.resolve(Context::new(), "").unwrap(),
            Resolution::NotFound
        ));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |ctx: Context, id: &str| -> Result<Resolution, BoxError> {
            if id == "boom" {
                return Err("lookup failed".into());
            }
            Ok(Resolution::Found(ctx))
        };
        assert!(resolver.resolve(Context::new(), "boom").is_err());
        assert!(matches!(
            resolver.resolve(Context::new(), "1").unwrap(),
            Resolution::Found(_)
        ));
    }
}
