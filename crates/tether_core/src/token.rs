//! Identity tokens
//!
//! A token is the only thing the script engine ever sees of a host value.
//! It is stored inside engine objects as a plain number, so it must survive
//! the round trip through an IEEE double unchanged.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Largest integer an engine number represents exactly (2^53 - 1).
pub const MAX_TOKEN_BITS: u64 = (1 << 53) - 1;

/// Unique, stable key for one registration.
///
/// Format: non-zero counter value in `1..=MAX_TOKEN_BITS`.
/// Tokens are never reused, so a released token cannot alias a later one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(NonZeroU64);

impl Token {
    /// Raw counter value.
    #[inline]
    pub fn to_bits(self) -> u64 {
        self.0.get()
    }

    /// Rebuild a token from its raw value; `None` for zero or out-of-range bits.
    pub fn from_bits(bits: u64) -> Option<Self> {
        if bits > MAX_TOKEN_BITS {
            return None;
        }
        NonZeroU64::new(bits).map(Self)
    }

    /// Engine-side representation.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0.get() as f64
    }

    /// Parse a number read back from the engine.
    ///
    /// Anything that is not an exact positive integer in range is rejected,
    /// so a property overwritten by script can never resolve to a live entry
    /// by accident of rounding.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value.fract() != 0.0 || value < 1.0 {
            return None;
        }
        if value > MAX_TOKEN_BITS as f64 {
            return None;
        }
        Self::from_bits(value as u64)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh tokens and tracks how many are live.
#[derive(Debug)]
pub struct TokenAllocator {
    next: AtomicU64,
    live: AtomicUsize,
}

impl TokenAllocator {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            live: AtomicUsize::new(0),
        }
    }

    /// Allocate a token distinct from every token this allocator ever produced.
    pub fn allocate(&self) -> Token {
        let bits = self.next.fetch_add(1, Ordering::Relaxed);
        assert!(bits <= MAX_TOKEN_BITS, "token space exhausted");
        self.live.fetch_add(1, Ordering::Relaxed);
        // bits starts at 1 and only grows
        Token(NonZeroU64::new(bits).unwrap_or(NonZeroU64::MIN))
    }

    /// Give a token back. Callers release each token at most once.
    pub fn release(&self, token: Token) {
        let prev = self.live.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(prev > 0, "released {token} with no live tokens");
        tracing::trace!(%token, "token released");
    }

    /// Number of allocated, unreleased tokens.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_pairwise_distinct() {
        let allocator = TokenAllocator::new();
        let tokens: HashSet<Token> = (0..1000).map(|_| allocator.allocate()).collect();
        assert_eq!(tokens.len(), 1000);
        assert_eq!(allocator.live(), 1000);
    }

    #[test]
    fn test_release_does_not_recycle() {
        let allocator = TokenAllocator::new();
        let first = allocator.allocate();
        allocator.release(first);
        let second = allocator.allocate();
        assert_ne!(first, second);
        assert_eq!(allocator.live(), 1);
    }

    #[test]
    fn test_f64_round_trip() {
        let allocator = TokenAllocator::new();
        let token = allocator.allocate();
        assert_eq!(Token::from_f64(token.to_f64()), Some(token));
    }

    #[test]
    fn test_from_f64_rejects_non_tokens() {
        assert_eq!(Token::from_f64(0.0), None);
        assert_eq!(Token::from_f64(-3.0), None);
        assert_eq!(Token::from_f64(1.5), None);
        assert_eq!(Token::from_f64(f64::NAN), None);
        assert_eq!(Token::from_f64(f64::INFINITY), None);
        assert_eq!(Token::from_f64(2f64.powi(60)), None);
        assert_eq!(Token::from_f64(7.0).map(Token::to_bits), Some(7));
    }

    #[test]
    fn test_from_bits_bounds() {
        assert_eq!(Token::from_bits(0), None);
        assert_eq!(Token::from_bits(MAX_TOKEN_BITS + 1), None);
        assert!(Token::from_bits(MAX_TOKEN_BITS).is_some());
    }
}
