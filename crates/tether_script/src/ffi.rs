//! FFI layer between Rust and scripts
//!
//! The numeric result-code convention host functions use to report errors,
//! and raising those errors as scripted exceptions.

use rquickjs::{Ctx, Function, Value};

/// Error categories a host function can raise by returning a negative code.
///
/// Codes follow the engine's historical numbering; a host function returns
/// the negated code (see [`ErrorKind::return_code`]).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unimplemented,
    Unsupported,
    Internal,
    Alloc,
    Assertion,
    Api,
    Uncaught,
    Error,
    Eval,
    Range,
    Reference,
    Syntax,
    Type,
    Uri,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 14] = [
        ErrorKind::Unimplemented,
        ErrorKind::Unsupported,
        ErrorKind::Internal,
        ErrorKind::Alloc,
        ErrorKind::Assertion,
        ErrorKind::Api,
        ErrorKind::Uncaught,
        ErrorKind::Error,
        ErrorKind::Eval,
        ErrorKind::Range,
        ErrorKind::Reference,
        ErrorKind::Syntax,
        ErrorKind::Type,
        ErrorKind::Uri,
    ];

    pub const fn code(self) -> i32 {
        match self {
            ErrorKind::Unimplemented => 50,
            ErrorKind::Unsupported => 51,
            ErrorKind::Internal => 52,
            ErrorKind::Alloc => 53,
            ErrorKind::Assertion => 54,
            ErrorKind::Api => 55,
            ErrorKind::Uncaught => 56,
            ErrorKind::Error => 100,
            ErrorKind::Eval => 101,
            ErrorKind::Range => 102,
            ErrorKind::Reference => 103,
            ErrorKind::Syntax => 104,
            ErrorKind::Type => 105,
            ErrorKind::Uri => 106,
        }
    }

    /// Value a host function returns to raise this category.
    pub const fn return_code(self) -> i32 {
        -self.code()
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Category selected by a host function's result; `None` for success codes.
    ///
    /// Unknown negative codes map to a plain `Error`.
    pub fn from_return_code(ret: i32) -> Option<Self> {
        if ret >= 0 {
            return None;
        }
        Some(ret.checked_neg().and_then(Self::from_code).unwrap_or(ErrorKind::Error))
    }

    /// Global constructor used to build the scripted exception.
    pub const fn constructor(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::Eval => "EvalError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Uri => "URIError",
            _ => "InternalError",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ErrorKind::Unimplemented => "unimplemented",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Internal => "internal",
            ErrorKind::Alloc => "alloc",
            ErrorKind::Assertion => "assertion",
            ErrorKind::Api => "api",
            ErrorKind::Uncaught => "uncaught",
            ErrorKind::Error => "error",
            ErrorKind::Eval => "eval",
            ErrorKind::Range => "range",
            ErrorKind::Reference => "reference",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Type => "type",
            ErrorKind::Uri => "uri",
        }
    }
}

pub const RET_UNIMPLEMENTED_ERROR: i32 = ErrorKind::Unimplemented.return_code();
pub const RET_UNSUPPORTED_ERROR: i32 = ErrorKind::Unsupported.return_code();
pub const RET_INTERNAL_ERROR: i32 = ErrorKind::Internal.return_code();
pub const RET_ALLOC_ERROR: i32 = ErrorKind::Alloc.return_code();
pub const RET_ASSERTION_ERROR: i32 = ErrorKind::Assertion.return_code();
pub const RET_API_ERROR: i32 = ErrorKind::Api.return_code();
pub const RET_UNCAUGHT_ERROR: i32 = ErrorKind::Uncaught.return_code();
pub const RET_ERROR: i32 = ErrorKind::Error.return_code();
pub const RET_EVAL_ERROR: i32 = ErrorKind::Eval.return_code();
pub const RET_RANGE_ERROR: i32 = ErrorKind::Range.return_code();
pub const RET_REFERENCE_ERROR: i32 = ErrorKind::Reference.return_code();
pub const RET_SYNTAX_ERROR: i32 = ErrorKind::Syntax.return_code();
pub const RET_TYPE_ERROR: i32 = ErrorKind::Type.return_code();
pub const RET_URI_ERROR: i32 = ErrorKind::Uri.return_code();

/// Raise `kind` as a scripted exception; returns the error to propagate.
pub(crate) fn throw(ctx: &Ctx<'_>, kind: ErrorKind, message: &str) -> rquickjs::Error {
    let globals = ctx.globals();
    let constructor = globals
        .get::<_, Function>(kind.constructor())
        .or_else(|_| globals.get::<_, Function>("Error"));
    match constructor.and_then(|ctor| ctor.call::<_, Value>((message,))) {
        Ok(error) => ctx.throw(error),
        Err(err) => err,
    }
}
