//! Diagnostic sink for the router.
//!
//! The router never lets a failing predicate, handler, cleanup or listener escape a
//! dispatch cycle. Those failures are reported here instead.
//!
//! ## Macro Overview
//!
//! | Macro | Condition | WASM | Non-WASM |
//! |-------|-----------|------|----------|
//! | `debug_log!` | `debug-hooks` + `debug_assertions` | `console.debug` | `tracing::debug!` |
//! | `warn_log!` | always | `console.warn` | `tracing::warn!` |
//! | `error_log!` | always | `console.error` | `tracing::error!` |
//!
//! Native events are emitted under the `reinhardt_spa` target, so a subscriber can
//! filter them with `RUST_LOG=reinhardt_spa=warn`.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Logs a debug message (requires `debug-hooks` feature + `debug_assertions`)
#[cfg(all(debug_assertions, feature = "debug-hooks", target_arch = "wasm32"))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		web_sys::console::debug_1(&format!("[reinhardt-spa] {}", format!($($arg)*)).into());
	}};
}

/// Logs a debug message (requires `debug-hooks` feature + `debug_assertions`)
#[cfg(all(debug_assertions, feature = "debug-hooks", not(target_arch = "wasm32")))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		tracing::debug!(target: "reinhardt_spa", $($arg)*);
	}};
}

/// No-op debug_log when conditions are not met
#[cfg(not(all(debug_assertions, feature = "debug-hooks")))]
macro_rules! debug_log {
	($($arg:tt)*) => {{}};
}

/// Logs a warning message
#[cfg(target_arch = "wasm32")]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		web_sys::console::warn_1(&format!("[reinhardt-spa] {}", format!($($arg)*)).into());
	}};
}

/// Logs a warning message
#[cfg(not(target_arch = "wasm32"))]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		tracing::warn!(target: "reinhardt_spa", $($arg)*);
	}};
}

/// Logs an error message
#[cfg(target_arch = "wasm32")]
macro_rules! error_log {
	($($arg:tt)*) => {{
		web_sys::console::error_1(&format!("[reinhardt-spa] {}", format!($($arg)*)).into());
	}};
}

/// Logs an error message
#[cfg(not(target_arch = "wasm32"))]
macro_rules! error_log {
	($($arg:tt)*) => {{
		tracing::error!(target: "reinhardt_spa", $($arg)*);
	}};
}

pub(crate) use {debug_log, error_log, warn_log};

/// The kind of user-supplied callback a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallbackKind {
	Predicate,
	Handler,
	Cleanup,
	Listener,
}

impl fmt::Display for CallbackKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Predicate => "predicate",
			Self::Handler => "handler",
			Self::Cleanup => "cleanup",
			Self::Listener => "listener",
		})
	}
}

/// Reports a failed callback to the diagnostic sink.
pub(crate) fn report(kind: CallbackKind, href: Option<&str>, message: &str) {
	match href {
		Some(href) => error_log!("{} error at {}: {}", kind, href, message),
		None => error_log!("{} error: {}", kind, message),
	}
}

/// Runs `f`, catching a panic and reporting it instead of unwinding further.
///
/// Returns `None` when `f` panicked.
pub(crate) fn isolate<T>(
	kind: CallbackKind,
	href: Option<&str>,
	f: impl FnOnce() -> T,
) -> Option<T> {
	match panic::catch_unwind(AssertUnwindSafe(f)) {
		Ok(value) => Some(value),
		Err(payload) => {
			report(kind, href, &panic_message(payload.as_ref()));
			None
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&'static str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"non-string panic payload".to_string()
	}
}
