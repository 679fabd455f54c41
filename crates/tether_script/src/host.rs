//! Host functions and call suites

use crate::frame::CallFrame;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type HostFn = dyn for<'a, 'js> Fn(&mut CallFrame<'a, 'js>) -> i32 + Send + Sync;

/// A host callback the engine can invoke through the shared trampoline.
///
/// The return value follows the result-code convention: `0` for no return
/// value, `N > 0` when `N` values were pushed, negative to raise an error
/// category (see [`crate::ffi::ErrorKind`]).
#[derive(Clone)]
pub struct HostFunction(Arc<HostFn>);

impl HostFunction {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a, 'js> Fn(&mut CallFrame<'a, 'js>) -> i32 + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, frame: &mut CallFrame<'_, '_>) -> i32 {
        (self.0)(frame)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostFunction")
    }
}

/// What the registry holds for a function wrapper.
#[derive(Debug)]
pub(crate) struct FunctionRecord {
    pub(crate) function: HostFunction,
}

/// Named host functions injected into a script as one environment object.
#[derive(Debug, Clone, Default)]
pub struct CallSuite {
    methods: HashMap<String, HostFunction>,
}

impl CallSuite {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Builder form of [`CallSuite::insert`].
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: for<'a, 'js> Fn(&mut CallFrame<'a, 'js>) -> i32 + Send + Sync + 'static,
    {
        self.insert(name, HostFunction::new(f));
        self
    }

    /// Add or replace a method; returns the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, function: HostFunction) -> Option<HostFunction> {
        self.methods.insert(name.into(), function)
    }

    pub fn get(&self, name: &str) -> Option<&HostFunction> {
        self.methods.get(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostFunction)> {
        self.methods.iter().map(|(name, f)| (name.as_str(), f))
    }
}
