//! Host table: token allocator plus object registry.

use crate::error::RegistryError;
use crate::registry::{HostValue, ObjectRegistry};
use crate::token::{Token, TokenAllocator};

#[derive(Debug, Default)]
pub struct HostTable {
    allocator: TokenAllocator,
    registry: ObjectRegistry,
}

impl HostTable {
    pub fn new() -> Self {
        Self {
            allocator: TokenAllocator::new(),
            registry: ObjectRegistry::new(),
        }
    }

    /// Register a host value under a freshly allocated token.
    pub fn register(&self, value: HostValue) -> Result<Token, RegistryError> {
        let token = self.allocator.allocate();
        if let Err(err) = self.registry.insert(token, value) {
            self.allocator.release(token);
            return Err(err);
        }
        tracing::trace!(%token, "host value registered");
        Ok(token)
    }

    pub fn resolve(&self, token: Token) -> Option<HostValue> {
        self.registry.lookup(token)
    }

    /// Drop the entry and release its token.
    ///
    /// Only the call that actually removes the entry releases the token, so
    /// racing or repeated calls never release twice.
    pub fn release(&self, token: Token) -> Option<HostValue> {
        let removed = self.registry.remove(token)?;
        self.allocator.release(token);
        Some(removed)
    }

    /// Number of registered host values.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Number of tokens handed out and not yet released.
    pub fn live_tokens(&self) -> usize {
        self.allocator.live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_register_resolve_release() {
        let table = HostTable::new();
        let token = table.register(Arc::new(42i64)).unwrap();

        let value = table.resolve(token).unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&42));
        assert_eq!(table.len(), 1);
        assert_eq!(table.live_tokens(), 1);

        assert!(table.release(token).is_some());
        assert!(table.resolve(token).is_none());
        assert_eq!(table.live_tokens(), 0);
    }

    #[test]
    fn test_double_release_releases_once() {
        let table = HostTable::new();
        let keep = table.register(Arc::new("keep")).unwrap();
        let token = table.register(Arc::new("drop")).unwrap();

        assert!(table.release(token).is_some());
        assert!(table.release(token).is_none());

        assert_eq!(table.len(), 1);
        assert_eq!(table.live_tokens(), 1);
        assert!(table.resolve(keep).is_some());
    }

    #[test]
    fn test_register_distinct_tokens() {
        let table = HostTable::new();
        let a = table.register(Arc::new(1u8)).unwrap();
        let b = table.register(Arc::new(1u8)).unwrap();
        assert_ne!(a, b);
    }
}
