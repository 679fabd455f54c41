//! Tether Runtime
//!
//! Runs a script against the host bridge:
//!
//! ```text
//! tether <script.js> [settings.json]
//! ```
//!
//! The script must evaluate to a function; it is called with an environment
//! exposing `print`, `log` and `now`, and its JSON result is printed.

use anyhow::{bail, Context as _, Result};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tether_script::rquickjs::convert::Coerced;
use tether_script::{Bridge, BridgeSettings, CallFrame, CallSuite, ErrorKind};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args_os().skip(1);
    let Some(script) = args.next().map(PathBuf::from) else {
        bail!("usage: tether <script.js> [settings.json]");
    };
    let settings = match args.next().map(PathBuf::from) {
        Some(path) => BridgeSettings::load(&path)?,
        None => BridgeSettings::default(),
    };

    tracing::info!("Tether v{}", tether_core::VERSION);
    let source = std::fs::read_to_string(&script)
        .with_context(|| format!("could not read {}", script.display()))?;

    let bridge = Bridge::with_settings(settings)?;
    let result = bridge.eval_with_suite(&source, &host_suite())?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    bridge.run_gc();
    tracing::info!(live = bridge.live_handles(), "script finished");
    for (name, value) in bridge.counters() {
        tracing::debug!(counter = %name, value, "bridge activity");
    }
    Ok(())
}

fn host_suite() -> CallSuite {
    CallSuite::new()
        .with("print", |frame| {
            println!("{}", joined_args(frame, 0));
            0
        })
        .with("log", |frame| {
            let Some(level) = frame.get_string(0) else {
                return frame.fail(ErrorKind::Type, "log expects a level name first");
            };
            let message = joined_args(frame, 1);
            match level.as_str() {
                "error" => tracing::error!(target: "script", "{message}"),
                "warn" => tracing::warn!(target: "script", "{message}"),
                "info" => tracing::info!(target: "script", "{message}"),
                "debug" => tracing::debug!(target: "script", "{message}"),
                "trace" => tracing::trace!(target: "script", "{message}"),
                other => return frame.fail(ErrorKind::Range, &format!("unknown log level '{other}'")),
            }
            0
        })
        .with("now", |frame| {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
                .unwrap_or(0.0);
            frame.return_value(millis)
        })
}

fn joined_args(frame: &CallFrame<'_, '_>, from: usize) -> String {
    (from..frame.arg_count())
        .map(|index| {
            frame
                .arg(index)
                .get::<Coerced<String>>()
                .map(|text| text.0)
                .unwrap_or_else(|_| String::from("<unprintable>"))
        })
        .collect::<Vec<_>>()
        .join(" ")
}
