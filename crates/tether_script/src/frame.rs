//! Call frame handed to host functions
//!
//! A stack-shaped view of one trampoline invocation: arguments are read by
//! index, return values are pushed, and the host function reports how many
//! it pushed through its result code.

use crate::error::BridgeError;
use crate::ffi::ErrorKind;
use crate::host::HostFunction;
use crate::wrap::{self, Shared};
use rquickjs::{Ctx, IntoJs, Value};
use std::any::Any;
use std::sync::Arc;
use tether_core::HostValue;

pub struct CallFrame<'a, 'js> {
    ctx: Ctx<'js>,
    shared: &'a Arc<Shared>,
    this: Value<'js>,
    args: Vec<Value<'js>>,
    returns: Vec<Value<'js>>,
    failure: Option<String>,
}

impl<'a, 'js> CallFrame<'a, 'js> {
    pub(crate) fn new(
        ctx: Ctx<'js>,
        shared: &'a Arc<Shared>,
        this: Value<'js>,
        args: Vec<Value<'js>>,
    ) -> Self {
        Self {
            ctx,
            shared,
            this,
            args,
            returns: Vec::new(),
            failure: None,
        }
    }

    /// Raw engine context, for conversions the frame does not cover.
    pub fn ctx(&self) -> &Ctx<'js> {
        &self.ctx
    }

    pub fn this(&self) -> &Value<'js> {
        &self.this
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Argument at `index`; missing arguments read as `undefined`.
    pub fn arg(&self, index: usize) -> Value<'js> {
        self.args
            .get(index)
            .cloned()
            .unwrap_or_else(|| Value::new_undefined(self.ctx.clone()))
    }

    pub fn get_number(&self, index: usize) -> Option<f64> {
        self.args.get(index)?.as_number()
    }

    pub fn get_bool(&self, index: usize) -> Option<bool> {
        self.args.get(index)?.as_bool()
    }

    pub fn get_string(&self, index: usize) -> Option<String> {
        self.args.get(index)?.as_string()?.to_string().ok()
    }

    /// Host value behind the wrapped object passed at `index`.
    pub fn get_host_object(&self, index: usize) -> Option<HostValue> {
        wrap::host_object(self.args.get(index)?)
    }

    pub fn get_host_object_as<T: Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
        self.get_host_object(index)?.downcast::<T>().ok()
    }

    pub fn push<V: IntoJs<'js>>(&mut self, value: V) -> rquickjs::Result<()> {
        let value = value.into_js(&self.ctx)?;
        self.returns.push(value);
        Ok(())
    }

    /// Push one value and produce the matching result code.
    pub fn return_value<V: IntoJs<'js>>(&mut self, value: V) -> i32 {
        match self.push(value) {
            Ok(()) => 1,
            Err(err) => self.fail(ErrorKind::Internal, &err.to_string()),
        }
    }

    /// Wrap a host value and push the wrapper.
    pub fn push_host_object<T: Any + Send + Sync>(&mut self, value: T) -> Result<(), BridgeError> {
        let object = wrap::wrap_object(&self.ctx, self.shared, Arc::new(value))?;
        self.returns.push(object.into_value());
        Ok(())
    }

    /// Wrap a host function and push the callable.
    pub fn push_host_function(&mut self, function: HostFunction) -> Result<(), BridgeError> {
        let callee = wrap::wrap_function(&self.ctx, self.shared, function)?;
        self.returns.push(callee.into_value());
        Ok(())
    }

    /// Record a message for the error raised by the returned code.
    pub fn fail(&mut self, kind: ErrorKind, message: &str) -> i32 {
        self.failure = Some(message.to_string());
        kind.return_code()
    }

    pub fn pushed(&self) -> usize {
        self.returns.len()
    }

    /// Turn the host function's result code into the call's completion.
    pub(crate) fn complete(mut self, code: i32) -> rquickjs::Result<Value<'js>> {
        if let Some(kind) = ErrorKind::from_return_code(code) {
            let message = self
                .failure
                .take()
                .unwrap_or_else(|| format!("host function raised {} error ({code})", kind.name()));
            return Err(crate::ffi::throw(&self.ctx, kind, &message));
        }

        let wanted = code as usize;
        if wanted == 0 {
            return Ok(Value::new_undefined(self.ctx.clone()));
        }
        if wanted > self.returns.len() {
            let message = format!(
                "host function reported {wanted} return values but pushed {}",
                self.returns.len()
            );
            return Err(crate::ffi::throw(&self.ctx, ErrorKind::Api, &message));
        }
        // The call result is the top of the return stack.
        Ok(self
            .returns
            .pop()
            .unwrap_or_else(|| Value::new_undefined(self.ctx.clone())))
    }
}
