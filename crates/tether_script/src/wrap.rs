//! Wrapping host functions and objects for the engine
//!
//! ## Architecture
//!
//! - **Native handles:** every wrapper is an instance of an engine class whose
//!   opaque data is a [`HandleSlot`]. The token lives only in that slot, so
//!   scripts can neither see, delete nor forge it.
//! - **One trampoline:** function wrappers belong to a callable class whose
//!   call hook is the single [`Trampoline`]. It reads the token from the callee
//!   it was invoked on and dispatches through the host table.
//! - **Finalizers:** when the engine collects a wrapper it drops the slot, and
//!   the slot's `Drop` releases the token.
//! - **Lock discipline:** the host table lock is only ever taken for a map
//!   operation. Records are cloned out before any host code runs.

use crate::error::BridgeError;
use crate::ffi::{self, ErrorKind};
use crate::frame::CallFrame;
use crate::host::{FunctionRecord, HostFunction};
use rquickjs::class::{ClassId, JsClass, Readable, Trace, Tracer};
use rquickjs::function::{Constructor, Params, StaticJsFn, StaticJsFunction};
use rquickjs::{Class, Ctx, Function, Object, Value};
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tether_core::{HostTable, HostValue, Token};
use tether_metrics::Counter;

/// Message of the exception thrown in place of a host panic.
pub const PANIC_SENTINEL: &str = "host function panicked";

type PanicPayload = Box<dyn Any + Send + 'static>;

/// State shared by a bridge and every handle it created.
pub(crate) struct Shared {
    pub(crate) table: HostTable,
    pending_panic: Mutex<Option<PanicPayload>>,
    counter: Mutex<Counter>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            table: HostTable::new(),
            pending_panic: Mutex::new(None),
            counter: Mutex::new(Counter::new()),
        }
    }

    pub(crate) fn count(&self, name: &str) {
        lock(&self.counter).increment(name, 1);
    }

    pub(crate) fn counter_value(&self, name: &str) -> usize {
        lock(&self.counter).get(name)
    }

    /// Snapshot of every counter, sorted by name.
    pub(crate) fn counters(&self) -> Vec<(String, usize)> {
        let mut counters: Vec<_> = lock(&self.counter)
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        counters.sort();
        counters
    }

    // Only the first panic of a call chain is kept; later ones are usually
    // consequences of it.
    fn park_panic(&self, payload: PanicPayload) {
        let mut pending = lock(&self.pending_panic);
        if pending.is_none() {
            *pending = Some(payload);
        }
    }

    pub(crate) fn take_panic(&self) -> Option<PanicPayload> {
        lock(&self.pending_panic).take()
    }

    /// Release `token` if it is still registered. Safe to call repeatedly.
    pub(crate) fn finalize_token(&self, token: Token) -> bool {
        if self.table.release(token).is_some() {
            self.count("finalize");
            tracing::trace!(%token, "wrapper finalized");
            true
        } else {
            false
        }
    }
}

/// Native data behind a wrapper. Dropping it finalizes the wrapper.
pub(crate) struct HandleSlot {
    token: Token,
    shared: Arc<Shared>,
    released: Cell<bool>,
}

impl HandleSlot {
    fn new(token: Token, shared: &Arc<Shared>) -> Self {
        Self {
            token,
            shared: Arc::clone(shared),
            released: Cell::new(false),
        }
    }

    /// Token, unless the finalizer already ran for this wrapper.
    fn live_token(&self) -> Option<Token> {
        (!self.released.get()).then_some(self.token)
    }

    fn resolve(&self) -> Option<HostValue> {
        self.shared.table.resolve(self.live_token()?)
    }

    /// Finalizer body; `false` if this wrapper was already finalized.
    fn release(&self) -> bool {
        if self.released.replace(true) {
            return false;
        }
        self.shared.finalize_token(self.token);
        true
    }
}

impl Drop for HandleSlot {
    fn drop(&mut self) {
        self.release();
    }
}

/// Class of wrapped host functions; calling an instance enters the trampoline.
pub(crate) struct FunctionHandle {
    slot: HandleSlot,
}

/// Class of wrapped host objects.
pub(crate) struct ObjectHandle {
    slot: HandleSlot,
}

impl<'js> Trace<'js> for FunctionHandle {
    fn trace<'a>(&self, _tracer: Tracer<'a, 'js>) {}
}

impl<'js> Trace<'js> for ObjectHandle {
    fn trace<'a>(&self, _tracer: Tracer<'a, 'js>) {}
}

impl<'js> JsClass<'js> for FunctionHandle {
    const NAME: &'static str = "HostFunction";

    type Mutable = Readable;

    fn class_id() -> &'static ClassId {
        static ID: ClassId = ClassId::new();
        &ID
    }

    // Function.prototype, so call/apply/bind work on wrappers.
    fn prototype(ctx: &Ctx<'js>) -> rquickjs::Result<Option<Object<'js>>> {
        Ok(Some(Function::prototype(ctx.clone())))
    }

    fn constructor(_ctx: &Ctx<'js>) -> rquickjs::Result<Option<Constructor<'js>>> {
        Ok(None)
    }

    fn function() -> Option<StaticJsFn> {
        Some(StaticJsFn::new::<Trampoline>())
    }
}

impl<'js> JsClass<'js> for ObjectHandle {
    const NAME: &'static str = "HostObject";

    type Mutable = Readable;

    fn class_id() -> &'static ClassId {
        static ID: ClassId = ClassId::new();
        &ID
    }

    fn prototype(ctx: &Ctx<'js>) -> rquickjs::Result<Option<Object<'js>>> {
        Object::new(ctx.clone()).map(Some)
    }

    fn constructor(_ctx: &Ctx<'js>) -> rquickjs::Result<Option<Constructor<'js>>> {
        Ok(None)
    }
}

/// Register both wrapper classes with a fresh context.
pub(crate) fn install(ctx: &Ctx<'_>) -> rquickjs::Result<()> {
    Class::<FunctionHandle>::register(ctx)?;
    Class::<ObjectHandle>::register(ctx)
}

/// The shared trampoline behind every function wrapper.
struct Trampoline;

impl StaticJsFunction for Trampoline {
    fn call<'a, 'js>(params: Params<'a, 'js>) -> rquickjs::Result<Value<'js>> {
        let ctx = params.ctx().clone();
        let callee = params.function();
        let Some(handle) = callee.as_object().and_then(Class::<FunctionHandle>::from_object) else {
            tracing::warn!("trampoline entered from a foreign callee");
            return Err(ffi::throw(&ctx, ErrorKind::Type, "not a host function"));
        };
        let (shared, function) = {
            let handle = handle.try_borrow()?;
            (Arc::clone(&handle.slot.shared), resolve_function(&handle.slot))
        };
        let Some(function) = function else {
            shared.count("trampoline.reject");
            tracing::warn!("trampoline called without a resolvable host function");
            return Err(ffi::throw(&ctx, ErrorKind::Type, "not a host function"));
        };
        let args = (0..params.len()).filter_map(|index| params.arg(index)).collect();
        dispatch(&shared, ctx, &function, params.this(), args)
    }
}

fn resolve_function(slot: &HandleSlot) -> Option<HostFunction> {
    let record = slot.resolve()?.downcast::<FunctionRecord>().ok()?;
    Some(record.function.clone())
}

/// Run a resolved host function, keeping panics on this side of the engine.
fn dispatch<'js>(
    shared: &Arc<Shared>,
    ctx: Ctx<'js>,
    function: &HostFunction,
    this: Value<'js>,
    args: Vec<Value<'js>>,
) -> rquickjs::Result<Value<'js>> {
    shared.count("trampoline.call");

    let mut frame = CallFrame::new(ctx.clone(), shared, this, args);
    match panic::catch_unwind(AssertUnwindSafe(|| function.call(&mut frame))) {
        Ok(code) => frame.complete(code),
        Err(payload) => {
            shared.count("host.panic");
            tracing::error!("host function panicked; unwinding deferred to the host side");
            shared.park_panic(payload);
            Err(ffi::throw(&ctx, ErrorKind::Internal, PANIC_SENTINEL))
        }
    }
}

/// Wrap a host function as an engine callable backed by the shared trampoline.
pub(crate) fn wrap_function<'js>(
    ctx: &Ctx<'js>,
    shared: &Arc<Shared>,
    function: HostFunction,
) -> Result<Function<'js>, BridgeError> {
    let record: HostValue = Arc::new(FunctionRecord { function });
    let token = shared.table.register(record)?;
    // On failure the slot is dropped with the error, releasing the entry.
    let handle = Class::instance(ctx.clone(), FunctionHandle {
        slot: HandleSlot::new(token, shared),
    })?;
    let callee = Function::from_value(handle.into_value())?;
    shared.count("wrap.function");
    tracing::trace!(%token, "host function wrapped");
    Ok(callee)
}

/// Wrap a host value in an engine object with a finalizer.
pub(crate) fn wrap_object<'js>(
    ctx: &Ctx<'js>,
    shared: &Arc<Shared>,
    value: HostValue,
) -> Result<Object<'js>, BridgeError> {
    let token = shared.table.register(value)?;
    let handle = Class::instance(ctx.clone(), ObjectHandle {
        slot: HandleSlot::new(token, shared),
    })?;
    shared.count("wrap.object");
    tracing::trace!(%token, "host object wrapped");
    Ok(handle.into_inner())
}

/// Host value behind a wrapped object; `None` for anything else or a stale token.
pub(crate) fn host_object(value: &Value<'_>) -> Option<HostValue> {
    let handle = Class::<ObjectHandle>::from_object(value.as_object()?)?;
    let handle = handle.try_borrow().ok()?;
    handle.slot.resolve()
}

/// Run `f` on the slot of a wrapper of either kind.
fn with_slot<R>(object: &Object<'_>, f: impl FnOnce(&HandleSlot) -> R) -> Option<R> {
    if let Some(handle) = Class::<ObjectHandle>::from_object(object) {
        let handle = handle.try_borrow().ok()?;
        return Some(f(&handle.slot));
    }
    let handle = Class::<FunctionHandle>::from_object(object)?;
    let handle = handle.try_borrow().ok()?;
    Some(f(&handle.slot))
}

/// Token carried by a wrapper, whichever kind it is.
pub(crate) fn wrapper_token(object: &Object<'_>) -> Option<Token> {
    with_slot(object, |slot| slot.token)
}

/// Finalizer entry point.
///
/// Returns `0` after cleanup, or the type-mismatch code without touching the
/// table when `object` is not a wrapper or was already finalized.
pub(crate) fn finalize(object: &Object<'_>) -> i32 {
    match with_slot(object, HandleSlot::release) {
        Some(true) => 0,
        _ => {
            tracing::warn!("finalizer ran on an object without a live host token");
            ffi::RET_TYPE_ERROR
        }
    }
}
