use crate::fatal;
use std::path::PathBuf;
use tether_core::RegistryError;
use thiserror::Error;

/// Errors surfaced to host callers of the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The script failed to compile or threw while being evaluated.
    #[error("script evaluation failed: {0}")]
    Eval(String),

    /// The evaluated entry point threw, or a host function raised an error code.
    #[error("script call failed: {0}")]
    Call(String),

    #[error("script did not evaluate to a function (got {found})")]
    NotCallable { found: String },

    #[error("script engine error: {0}")]
    Engine(#[source] rquickjs::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("script result is not representable as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in '{path}': {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// Every engine error reaching the host passes through here, so an allocation
// failure aborts no matter which call reported it.
impl From<rquickjs::Error> for BridgeError {
    fn from(error: rquickjs::Error) -> Self {
        fatal::escalate(&error);
        BridgeError::Engine(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn test_engine_errors_stay_recoverable() {
        let err = BridgeError::from(rquickjs::Error::Unknown);
        assert!(matches!(err, BridgeError::Engine(rquickjs::Error::Unknown)));
    }

    #[test]
    fn test_allocation_failure_takes_fatal_path() {
        fatal::unwind_on_fatal();
        let outcome = panic::catch_unwind(|| BridgeError::from(rquickjs::Error::Allocation));
        let payload = outcome.unwrap_err();
        let message = payload.downcast_ref::<String>().cloned().unwrap_or_default();
        assert!(message.contains("[53]"), "{message}");
    }
}
