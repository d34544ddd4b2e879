//! Handler dependencies.
//!
//! An opaque bag of services (clients, tracers, settings) built by startup
//! code and handed by reference to every middleware and handler. The router
//! passes it through untouched.

use axum::http::Extensions;

/// Typed service bag shared by all requests.
///
/// Services that need synchronization must provide it themselves; the bag
/// only hands out shared references.
#[derive(Debug, Default)]
pub struct HandlerDependencies {
    services: Extensions,
}

impl HandlerDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, returning the previous one of the same type.
    pub fn insert<T>(&mut self, service: T) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.services.insert(service)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<T>(mut self, service: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.services.insert(service);
        self
    }

    /// Look up a service by type.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.services.get::<T>()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct TableName(String);

    #[test]
    fn test_typed_lookup() {
        let deps = HandlerDependencies::new()
            .with(TableName("users".into()))
            .with(Arc::new(5u32));

        assert_eq!(deps.get::<TableName>(), Some(&TableName("users".into())));
        assert_eq!(deps.get::<Arc<u32>>().map(|v| **v), Some(5));
        assert!(deps.get::<String>().is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut deps = HandlerDependencies::new();
        assert!(deps.is_empty());
        assert!(deps.insert(1u8).is_none());
        assert_eq!(deps.insert(2u8), Some(1));
    }
}
