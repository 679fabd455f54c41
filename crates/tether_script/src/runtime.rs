//! Script runtime management
//!
//! A [`Bridge`] owns one engine runtime and context plus the host table that
//! keeps wrapped host values alive while the engine can still reach them.

use crate::error::BridgeError;
use crate::fatal;
use crate::host::{CallSuite, HostFunction};
use crate::settings::BridgeSettings;
use crate::wrap::{self, Shared};
use rquickjs::convert::Coerced;
use rquickjs::{Context, Ctx, Function, IntoJs, Object, Runtime, Value};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use tether_core::HostValue;

/// Script execution context with the host object bridge installed.
pub struct Bridge {
    context: Context,
    runtime: Runtime,
    shared: Arc<Shared>,
    settings: BridgeSettings,
}

impl Bridge {
    pub fn new() -> Result<Self, BridgeError> {
        Self::with_settings(BridgeSettings::default())
    }

    pub fn with_settings(settings: BridgeSettings) -> Result<Self, BridgeError> {
        let runtime = Runtime::new()?;
        let engine = &settings.engine;
        if let Some(limit) = engine.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(threshold) = engine.gc_threshold {
            runtime.set_gc_threshold(threshold);
        }
        if let Some(size) = engine.max_stack_size {
            runtime.set_max_stack_size(size);
        }
        let context = Context::full(&runtime)?;

        let shared = Arc::new(Shared::new());
        context.with(|ctx| wrap::install(&ctx))?;
        tracing::debug!(?settings, "script bridge ready");

        Ok(Self {
            context,
            runtime,
            shared,
            settings,
        })
    }

    /// Run `f` inside the engine context.
    ///
    /// If a host function panicked during `f`, the panic resumes here once the
    /// engine has been left.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: for<'js> FnOnce(Scope<'js>) -> R,
    {
        let result = self
            .context
            .with(|ctx| f(Scope::new(ctx, Arc::clone(&self.shared), self.settings.script.strict)));
        self.resume_host_panic();
        result
    }

    /// Evaluate `source` to a function and call it with `suite` as its environment.
    pub fn eval_with_suite(
        &self,
        source: &str,
        suite: &CallSuite,
    ) -> Result<serde_json::Value, BridgeError> {
        self.with(|scope| {
            let result = scope.eval_with_suite(source, suite)?;
            scope.to_json(&result)
        })
    }

    pub fn execute(&self, source: &str) -> Result<(), BridgeError> {
        self.with(|scope| scope.eval(source).map(|_| ()))
    }

    pub fn execute_file(&self, path: &Path) -> Result<(), BridgeError> {
        let source = std::fs::read_to_string(path).map_err(|source| BridgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.execute(&source)
    }

    /// Call a global function by name with no arguments.
    pub fn call_function(&self, name: &str) -> Result<serde_json::Value, BridgeError> {
        self.with(|scope| {
            let function: Function = scope.ctx().globals().get(name)?;
            let result = function
                .call::<_, Value>(())
                .map_err(|err| BridgeError::Call(scope.render(err)))?;
            scope.to_json(&result)
        })
    }

    /// Force a full collection pass, running finalizers of unreachable wrappers.
    pub fn run_gc(&self) {
        self.runtime.run_gc();
    }

    /// Number of host values the engine can currently reach.
    pub fn live_handles(&self) -> usize {
        self.shared.table.len()
    }

    /// Bridge activity counter (always zero without the `metrics` feature).
    pub fn counter(&self, name: &str) -> usize {
        self.shared.counter_value(name)
    }

    /// Every recorded counter, sorted by name (empty without `metrics`).
    pub fn counters(&self) -> Vec<(String, usize)> {
        self.shared.counters()
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    fn resume_host_panic(&self) {
        if let Some(payload) = self.shared.take_panic() {
            std::panic::resume_unwind(payload);
        }
    }
}

/// Bridge operations bound to one entry into the engine context.
pub struct Scope<'js> {
    ctx: Ctx<'js>,
    shared: Arc<Shared>,
    strict: bool,
}

impl<'js> Scope<'js> {
    fn new(ctx: Ctx<'js>, shared: Arc<Shared>, strict: bool) -> Self {
        Self { ctx, shared, strict }
    }

    /// Raw engine context for primitive pushes and reads.
    pub fn ctx(&self) -> &Ctx<'js> {
        &self.ctx
    }

    pub fn wrap_function(&self, function: HostFunction) -> Result<Function<'js>, BridgeError> {
        wrap::wrap_function(&self.ctx, &self.shared, function)
    }

    pub fn wrap_object<T: Any + Send + Sync>(&self, value: T) -> Result<Object<'js>, BridgeError> {
        self.wrap_host_value(Arc::new(value))
    }

    pub fn wrap_host_value(&self, value: HostValue) -> Result<Object<'js>, BridgeError> {
        wrap::wrap_object(&self.ctx, &self.shared, value)
    }

    pub fn get_object(&self, value: &Value<'js>) -> Option<HostValue> {
        wrap::host_object(value)
    }

    pub fn get_object_as<T: Any + Send + Sync>(&self, value: &Value<'js>) -> Option<Arc<T>> {
        self.get_object(value)?.downcast::<T>().ok()
    }

    /// Run the finalizer entry point on a wrapper by hand.
    ///
    /// Returns `0` on cleanup, the type-mismatch code otherwise.
    pub fn finalize(&self, object: &Object<'js>) -> i32 {
        wrap::finalize(object)
    }

    pub fn set_global<V: IntoJs<'js>>(&self, name: &str, value: V) -> Result<(), BridgeError> {
        self.ctx.globals().set(name, value)?;
        Ok(())
    }

    pub fn eval(&self, source: &str) -> Result<Value<'js>, BridgeError> {
        self.ctx
            .eval::<Value, _>(self.prepare(source))
            .map_err(|err| BridgeError::Eval(self.render(err)))
    }

    pub fn eval_with_suite(&self, source: &str, suite: &CallSuite) -> Result<Value<'js>, BridgeError> {
        let entry = self.eval(source)?;
        let Some(entry) = entry.as_function() else {
            return Err(BridgeError::NotCallable {
                found: format!("{:?}", entry.type_of()),
            });
        };

        let env = Object::new(self.ctx.clone())?;
        for (name, function) in suite.iter() {
            env.set(name, self.wrap_function(function.clone())?)?;
        }

        tracing::debug!(methods = suite.len(), "calling script entry point");
        entry
            .call::<_, Value>((env,))
            .map_err(|err| BridgeError::Call(self.render(err)))
    }

    /// Host-side copy of a script value; `undefined` and functions become `null`.
    pub fn to_json(&self, value: &Value<'js>) -> Result<serde_json::Value, BridgeError> {
        let text = self
            .ctx
            .json_stringify(value.clone())
            .map_err(|err| BridgeError::Call(self.render(err)))?;
        match text {
            Some(text) => Ok(serde_json::from_str(&text.to_string()?)?),
            None => Ok(serde_json::Value::Null),
        }
    }

    fn prepare(&self, source: &str) -> String {
        if self.strict {
            format!("\"use strict\";\n{source}")
        } else {
            source.to_string()
        }
    }

    /// Render an engine error for the host, consuming any pending exception.
    fn render(&self, err: rquickjs::Error) -> String {
        match err {
            rquickjs::Error::Exception => describe(&self.ctx.catch()),
            other => {
                fatal::escalate(&other);
                other.to_string()
            }
        }
    }
}

fn describe(thrown: &Value<'_>) -> String {
    thrown
        .get::<Coerced<String>>()
        .map(|text| text.0)
        .unwrap_or_else(|_| String::from("<unprintable exception>"))
}
