//! Navigation change detection.
//!
//! The browser offers no event for programmatic URL changes, so the two history
//! mutation primitives (`pushState`, `replaceState`) are replaced by wrappers that
//! call the original and then signal a change. Together with the native `popstate`
//! and `hashchange` events this funnels every kind of navigation into one
//! notification callback.
//!
//! The platform surface is abstracted behind [`NavigationPrimitives`]:
//!
//! - [`BrowserHistory`] patches `window.history` (wasm32 only)
//! - [`MemoryHistory`] keeps an in-process history stack for native targets and tests
//!
//! [`HistoryInterceptor`] holds the saved originals while interception is active
//! and restores exactly those values when it is removed.

#[cfg(target_arch = "wasm32")]
mod browser;
mod memory;

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserHistory, BrowserHook};
pub use memory::{MemoryHistory, MemoryHook, MemoryPrimitive};

use crate::error::Result;
use crate::logging::{error_log, warn_log};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Callback signalling that the URL may have changed.
pub type Notify = Rc<dyn Fn()>;

/// A programmatic history mutation primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
	/// `history.pushState`
	PushState,
	/// `history.replaceState`
	ReplaceState,
}

impl PrimitiveKind {
	/// Both primitives, in patch order.
	pub const ALL: [Self; 2] = [Self::PushState, Self::ReplaceState];

	/// The property name on the `History` object.
	pub fn name(self) -> &'static str {
		match self {
			Self::PushState => "pushState",
			Self::ReplaceState => "replaceState",
		}
	}
}

/// A native navigation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEvent {
	/// History traversal (back/forward, fragment navigation).
	PopState,
	/// Fragment change.
	HashChange,
}

impl NativeEvent {
	/// The DOM event type.
	pub fn name(self) -> &'static str {
		match self {
			Self::PopState => "popstate",
			Self::HashChange => "hashchange",
		}
	}
}

/// Access to the platform's navigation surface.
///
/// Implementations only move values in and out of the platform; the wrapping
/// policy (call original, then notify) and the bookkeeping live in
/// [`HistoryInterceptor`].
pub trait NavigationPrimitives {
	/// A mutation primitive as stored on the platform.
	type Primitive: Clone;
	/// Keeps an installed wrapper or event listener alive until it is removed.
	type Hook;

	/// The current absolute href.
	///
	/// # Errors
	///
	/// Returns [`SpaError::Location`](crate::SpaError::Location) if the location
	/// is unavailable.
	fn current_href(&self) -> Result<String>;

	/// Reads the currently installed primitive.
	fn primitive(&self, kind: PrimitiveKind) -> Result<Self::Primitive>;

	/// Installs `primitive` in place of the current one.
	fn set_primitive(&self, kind: PrimitiveKind, primitive: &Self::Primitive) -> Result<()>;

	/// Builds a wrapper that invokes `original`, then `notify`, and returns the
	/// original's result unmodified. A failing original does not notify.
	fn wrap_primitive(
		&self,
		kind: PrimitiveKind,
		original: Self::Primitive,
		notify: Notify,
	) -> (Self::Primitive, Self::Hook);

	/// Subscribes `notify` to a native event.
	fn listen(&self, event: NativeEvent, notify: Notify) -> Result<Self::Hook>;

	/// Removes a listener installed by [`listen`](Self::listen).
	fn unlisten(&self, event: NativeEvent, hook: Self::Hook) -> Result<()>;
}

struct Patched<P: NavigationPrimitives> {
	kind: PrimitiveKind,
	original: P::Primitive,
	// Dropped only after the original has been reinstalled.
	_wrapper: P::Hook,
}

struct Interception<P: NavigationPrimitives> {
	patched: Vec<Patched<P>>,
	listeners: Vec<(NativeEvent, P::Hook)>,
}

/// Reversible interception of a navigation surface.
///
/// Dropping the interceptor removes the interception.
pub struct HistoryInterceptor<P: NavigationPrimitives> {
	primitives: P,
	saved: RefCell<Option<Interception<P>>>,
}

impl<P: NavigationPrimitives> fmt::Debug for HistoryInterceptor<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HistoryInterceptor")
			.field("enabled", &self.is_enabled())
			.finish()
	}
}

impl<P: NavigationPrimitives> HistoryInterceptor<P> {
	/// Wraps a navigation surface without intercepting it yet.
	pub fn new(primitives: P) -> Self {
		Self {
			primitives,
			saved: RefCell::new(None),
		}
	}

	/// The wrapped navigation surface.
	pub fn primitives(&self) -> &P {
		&self.primitives
	}

	/// Returns `true` while originals are saved.
	pub fn is_enabled(&self) -> bool {
		self.saved.borrow().is_some()
	}

	/// Installs the wrappers and event listeners. No-op if already enabled.
	///
	/// Platform failures are logged; whatever could be installed stays installed
	/// and is removed again by [`disable`](Self::disable).
	pub fn enable(&self, notify: Notify, events: &[NativeEvent]) {
		if self.is_enabled() {
			return;
		}

		let mut interception = Interception {
			patched: Vec::with_capacity(PrimitiveKind::ALL.len()),
			listeners: Vec::with_capacity(events.len()),
		};

		for kind in PrimitiveKind::ALL {
			let original = match self.primitives.primitive(kind) {
				Ok(original) => original,
				Err(err) => {
					error_log!("cannot read history.{}: {}", kind.name(), err);
					continue;
				}
			};
			let (wrapper, hook) =
				self.primitives
					.wrap_primitive(kind, original.clone(), Rc::clone(&notify));
			if let Err(err) = self.primitives.set_primitive(kind, &wrapper) {
				error_log!("cannot patch history.{}: {}", kind.name(), err);
				continue;
			}
			interception.patched.push(Patched {
				kind,
				original,
				_wrapper: hook,
			});
		}

		for &event in events {
			match self.primitives.listen(event, Rc::clone(&notify)) {
				Ok(hook) => interception.listeners.push((event, hook)),
				Err(err) => warn_log!("cannot listen for {}: {}", event.name(), err),
			}
		}

		*self.saved.borrow_mut() = Some(interception);
	}

	/// Restores the saved originals and removes the listeners. No-op if not enabled.
	pub fn disable(&self) {
		let Some(interception) = self.saved.borrow_mut().take() else {
			return;
		};

		for patched in interception.patched {
			if let Err(err) = self.primitives.set_primitive(patched.kind, &patched.original) {
				error_log!("cannot restore history.{}: {}", patched.kind.name(), err);
			}
		}

		for (event, hook) in interception.listeners {
			if let Err(err) = self.primitives.unlisten(event, hook) {
				warn_log!("cannot remove {} listener: {}", event.name(), err);
			}
		}
	}
}

impl<P: NavigationPrimitives> Drop for HistoryInterceptor<P> {
	fn drop(&mut self) {
		self.disable();
	}
}
