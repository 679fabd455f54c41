use crate::token::Token;
use thiserror::Error;

/// Errors raised by the object registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("token {token} is already registered")]
    DuplicateToken { token: Token },
}
