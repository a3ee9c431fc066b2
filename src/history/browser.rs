//! `window.history` interception for wasm32 targets.

use super::{NativeEvent, NavigationPrimitives, Notify, PrimitiveKind};
use crate::error::{Result, SpaError};
use js_sys::{Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{History, Window};

type JsResult = std::result::Result<JsValue, JsValue>;
type PrimitiveClosure = Closure<dyn Fn(JsValue, JsValue, JsValue) -> JsResult>;

/// Keeps a JS-visible closure alive while it is installed.
pub enum BrowserHook {
	/// Wrapper installed as `history.pushState` or `history.replaceState`.
	Primitive(PrimitiveClosure),
	/// Listener registered on `window`.
	Listener(Closure<dyn Fn()>),
}

impl std::fmt::Debug for BrowserHook {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Primitive(_) => f.write_str("BrowserHook::Primitive"),
			Self::Listener(_) => f.write_str("BrowserHook::Listener"),
		}
	}
}

/// The current window's navigation surface.
#[derive(Debug, Clone)]
pub struct BrowserHistory {
	window: Window,
	history: History,
}

impl BrowserHistory {
	/// Binds to the global `window`.
	///
	/// # Errors
	///
	/// Returns [`SpaError::Navigation`] outside a browsing context.
	pub fn new() -> Result<Self> {
		let window =
			web_sys::window().ok_or_else(|| SpaError::Navigation("no global window".to_string()))?;
		let history = window
			.history()
			.map_err(|err| SpaError::Navigation(js_error_message(&err)))?;
		Ok(Self { window, history })
	}

	/// The bound `History` object.
	pub fn history(&self) -> &History {
		&self.history
	}
}

fn js_error_message(value: &JsValue) -> String {
	value
		.as_string()
		.or_else(|| {
			value
				.dyn_ref::<js_sys::Error>()
				.map(|err| String::from(err.message()))
		})
		.unwrap_or_else(|| format!("{value:?}"))
}

impl NavigationPrimitives for BrowserHistory {
	type Primitive = Function;
	type Hook = BrowserHook;

	fn current_href(&self) -> Result<String> {
		self.window
			.location()
			.href()
			.map_err(|err| SpaError::Location(js_error_message(&err)))
	}

	fn primitive(&self, kind: PrimitiveKind) -> Result<Function> {
		let value = Reflect::get(&self.history, &JsValue::from_str(kind.name()))
			.map_err(|err| SpaError::Navigation(js_error_message(&err)))?;
		value
			.dyn_into::<Function>()
			.map_err(|_| SpaError::Navigation(format!("history.{} is not a function", kind.name())))
	}

	fn set_primitive(&self, kind: PrimitiveKind, primitive: &Function) -> Result<()> {
		Reflect::set(&self.history, &JsValue::from_str(kind.name()), primitive)
			.map_err(|err| SpaError::Navigation(js_error_message(&err)))?;
		Ok(())
	}

	fn wrap_primitive(
		&self,
		_kind: PrimitiveKind,
		original: Function,
		notify: Notify,
	) -> (Function, BrowserHook) {
		let this: JsValue = self.history.clone().into();
		let closure: PrimitiveClosure =
			Closure::new(move |state: JsValue, unused: JsValue, url: JsValue| -> JsResult {
				let ret = original.call3(&this, &state, &unused, &url)?;
				notify();
				Ok(ret)
			});
		let wrapper = closure.as_ref().unchecked_ref::<Function>().clone();
		(wrapper, BrowserHook::Primitive(closure))
	}

	fn listen(&self, event: NativeEvent, notify: Notify) -> Result<BrowserHook> {
		let closure: Closure<dyn Fn()> = Closure::new(move || notify());
		self.window
			.add_event_listener_with_callback(event.name(), closure.as_ref().unchecked_ref())
			.map_err(|err| SpaError::Navigation(js_error_message(&err)))?;
		Ok(BrowserHook::Listener(closure))
	}

	fn unlisten(&self, event: NativeEvent, hook: BrowserHook) -> Result<()> {
		let BrowserHook::Listener(closure) = hook else {
			return Ok(());
		};
		self.window
			.remove_event_listener_with_callback(event.name(), closure.as_ref().unchecked_ref())
			.map_err(|err| SpaError::Navigation(js_error_message(&err)))
	}
}
