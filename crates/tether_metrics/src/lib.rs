//! Tether Metrics - bridge activity counters
//!
//! Named counters for wraps, trampoline dispatches and finalizations that
//! completely vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use tether_metrics::Counter;
//!
//! let mut counter = Counter::new();
//! counter.increment("wrap.object", 1);
//! println!("objects wrapped: {}", counter.get("wrap.object"));
//! ```
//!
//! Without the `metrics` feature, `Counter` is a zero-sized stub whose
//! reads always return zero.

#[cfg(feature = "metrics")]
mod counter;

#[cfg(feature = "metrics")]
pub use counter::Counter;

/// Whether counters are actually recorded in this build.
pub const ENABLED: bool = cfg!(feature = "metrics");

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &str, _value: usize) {}
    pub fn get(&self, _name: &str) -> usize { 0 }
    pub fn iter(&self) -> impl Iterator<Item = (&String, &usize)> { std::iter::empty() }
}
