//! Tether Scripting Bridge
//!
//! Exposes Rust functions and values to JavaScript running in QuickJS, and
//! keeps wrapped values alive exactly as long as the engine can reach them.
//!
//! ## Architecture
//!
//! - **Trampoline:** every wrapped host function is invoked through one native
//!   entry point, which resolves the callee's token.
//! - **Finalizers:** every wrapper is a native class instance holding its token
//!   out of reach of scripts; collecting it releases the token from the host
//!   table.
//! - **Call suites:** `Bridge::eval_with_suite` evaluates a script to a function
//!   and calls it with an object of named host functions.
//!
//! ```ignore
//! use tether_script::{Bridge, CallSuite};
//!
//! let suite = CallSuite::new().with("add", |frame| {
//!     let sum = frame.get_number(0).unwrap_or(0.0) + frame.get_number(1).unwrap_or(0.0);
//!     frame.return_value(sum)
//! });
//! let bridge = Bridge::new()?;
//! let five = bridge.eval_with_suite("(function (env) { return env.add(2, 3); })", &suite)?;
//! ```

pub mod error;
pub mod fatal;
pub mod ffi;
pub mod frame;
pub mod host;
pub mod runtime;
pub mod settings;
mod wrap;

pub use error::BridgeError;
pub use ffi::ErrorKind;
pub use frame::CallFrame;
pub use host::{CallSuite, HostFunction};
pub use runtime::{Bridge, Scope};
pub use settings::BridgeSettings;
pub use tether_core::{HostValue, Token};
pub use wrap::PANIC_SENTINEL;

pub use rquickjs;
