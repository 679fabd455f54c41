//! Fatal engine errors
//!
//! An engine that reports an unrecoverable condition is left in an unspecified
//! state, so the policy is to log and terminate the process. A handler may be
//! registered once per process to observe the error first (flush logs, write
//! a crash report); returning from it does not prevent termination.

use crate::ffi::ErrorKind;
use once_cell::sync::OnceCell;
use std::fmt;

/// Observer run before the process aborts.
pub type FatalHandler = fn(&FatalError);

static HANDLER: OnceCell<FatalHandler> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
    pub code: i32,
    pub message: String,
}

impl FatalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code: kind.code(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script engine fatal: [{}] {}", self.code, self.message)
    }
}

impl std::error::Error for FatalError {}

/// Register the process-wide fatal handler. Returns `false` if one is already set.
pub fn set_handler(handler: FatalHandler) -> bool {
    HANDLER.set(handler).is_ok()
}

/// Log `error`, run the registered handler and abort.
pub fn fatal(error: FatalError) -> ! {
    tracing::error!(code = error.code, "{error}");
    if let Some(handler) = HANDLER.get() {
        handler(&error);
    }
    eprintln!("{error}");
    std::process::abort()
}

/// Abort on engine errors that leave the engine unusable; others pass through.
pub(crate) fn escalate(error: &rquickjs::Error) {
    if matches!(error, rquickjs::Error::Allocation) {
        fatal(FatalError::new(ErrorKind::Alloc, "engine allocation failed"));
    }
}

/// Turn `fatal` into a panic for the rest of this test process.
#[cfg(test)]
pub(crate) fn unwind_on_fatal() {
    fn unwind(error: &FatalError) {
        panic!("{error}");
    }
    set_handler(unwind);
}
