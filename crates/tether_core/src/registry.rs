//! Object registry
//!
//! Maps tokens to host values. Every operation takes the single registry
//! lock for the map operation only; the lock is never held while engine code
//! (and therefore a host callback) can run.

use crate::error::RegistryError;
use crate::token::Token;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Any value the host hands to the engine.
pub type HostValue = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct ObjectRegistry {
    entries: Mutex<HashMap<Token, HostValue>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    // Map operations cannot panic halfway, so a poisoned lock still guards a
    // consistent map.
    fn entries(&self) -> MutexGuard<'_, HashMap<Token, HostValue>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` under a fresh `token`. The existing entry wins on a duplicate.
    pub fn insert(&self, token: Token, value: HostValue) -> Result<(), RegistryError> {
        let mut entries = self.entries();
        if entries.contains_key(&token) {
            return Err(RegistryError::DuplicateToken { token });
        }
        entries.insert(token, value);
        Ok(())
    }

    pub fn lookup(&self, token: Token) -> Option<HostValue> {
        self.entries().get(&token).cloned()
    }

    /// Remove the entry if present. Absent tokens are a no-op.
    pub fn remove(&self, token: Token) -> Option<HostValue> {
        self.entries().remove(&token)
    }

    pub fn contains(&self, token: Token) -> bool {
        self.entries().contains_key(&token)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("len", &self.len())
            .finish()
    }
}
