//! Tether Core
//!
//! The host-side half of the object lifetime bridge:
//! - Identity tokens (unique, never reused map keys)
//! - The object registry (token -> host value, one global lock)
//! - The host table tying both together

pub mod error;
pub mod registry;
pub mod table;
pub mod token;

pub use error::RegistryError;
pub use registry::{HostValue, ObjectRegistry};
pub use table::HostTable;
pub use token::{Token, TokenAllocator};

/// Bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
