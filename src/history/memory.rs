//! In-process navigation surface.
//!
//! [`MemoryHistory`] behaves like a browser tab's session history: `push_state`
//! and `replace_state` go through replaceable primitives (so they can be
//! intercepted), traversal fires `popstate`, and fragment navigation fires
//! `popstate` followed by `hashchange`. Relative URLs are resolved against the
//! current entry.

use super::{NativeEvent, NavigationPrimitives, Notify, PrimitiveKind};
use crate::error::{Result, SpaError};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use url::Url;

/// A history mutation primitive: receives the target URL (absolute or relative).
pub type MemoryPrimitive = Rc<dyn Fn(&str) -> Result<()>>;

/// Hook type of [`MemoryHistory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryHook {
	/// An installed primitive wrapper.
	Wrapper,
	/// A native event listener with its registration id.
	Listener(u64),
}

struct MemoryListener {
	id: u64,
	event: NativeEvent,
	notify: Notify,
}

struct MemoryState {
	entries: Vec<Url>,
	index: usize,
	push_state: MemoryPrimitive,
	replace_state: MemoryPrimitive,
	listeners: Vec<MemoryListener>,
	next_listener_id: u64,
}

impl MemoryState {
	fn current(&self) -> &Url {
		&self.entries[self.index]
	}

	fn resolve(&self, url: &str) -> Result<Url> {
		self.current()
			.join(url)
			.map_err(|source| SpaError::url_parse(url, source))
	}

	fn push(&mut self, url: Url) {
		self.entries.truncate(self.index + 1);
		self.entries.push(url);
		self.index = self.entries.len() - 1;
	}

	fn notifiers(&self, event: NativeEvent) -> Vec<Notify> {
		self.listeners
			.iter()
			.filter(|l| l.event == event)
			.map(|l| Rc::clone(&l.notify))
			.collect()
	}
}

/// In-memory session history.
///
/// Cloning yields another handle to the same history.
#[derive(Clone)]
pub struct MemoryHistory {
	state: Rc<RefCell<MemoryState>>,
}

impl fmt::Debug for MemoryHistory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("MemoryHistory")
			.field("href", &state.current().as_str())
			.field("index", &state.index)
			.field("entries", &state.entries.len())
			.field("listeners", &state.listeners.len())
			.finish()
	}
}

impl MemoryHistory {
	/// Creates a history whose single entry is `initial_href`.
	///
	/// # Errors
	///
	/// Returns [`SpaError::UrlParse`] if `initial_href` is not an absolute URL.
	pub fn new(initial_href: &str) -> Result<Self> {
		let initial =
			Url::parse(initial_href).map_err(|source| SpaError::url_parse(initial_href, source))?;
		let state = Rc::new_cyclic(|weak: &Weak<RefCell<MemoryState>>| {
			RefCell::new(MemoryState {
				entries: vec![initial],
				index: 0,
				push_state: native_primitive(weak.clone(), PrimitiveKind::PushState),
				replace_state: native_primitive(weak.clone(), PrimitiveKind::ReplaceState),
				listeners: Vec::new(),
				next_listener_id: 0,
			})
		});
		Ok(Self { state })
	}

	/// The current href.
	pub fn href(&self) -> String {
		self.state.borrow().current().to_string()
	}

	/// All entries, oldest first.
	pub fn entries(&self) -> Vec<String> {
		self.state
			.borrow()
			.entries
			.iter()
			.map(Url::to_string)
			.collect()
	}

	/// Position of the current entry.
	pub fn index(&self) -> usize {
		self.state.borrow().index
	}

	/// Calls the installed `pushState` primitive.
	///
	/// # Errors
	///
	/// Returns [`SpaError::UrlParse`] if `url` cannot be resolved.
	pub fn push_state(&self, url: &str) -> Result<()> {
		let primitive = Rc::clone(&self.state.borrow().push_state);
		primitive(url)
	}

	/// Calls the installed `replaceState` primitive.
	///
	/// # Errors
	///
	/// Returns [`SpaError::UrlParse`] if `url` cannot be resolved.
	pub fn replace_state(&self, url: &str) -> Result<()> {
		let primitive = Rc::clone(&self.state.borrow().replace_state);
		primitive(url)
	}

	/// Moves one entry back. Returns `false` at the start of the history.
	pub fn back(&self) -> bool {
		self.go(-1)
	}

	/// Moves one entry forward. Returns `false` at the end of the history.
	pub fn forward(&self) -> bool {
		self.go(1)
	}

	/// Moves `delta` entries, firing `popstate` (and `hashchange` when only the
	/// fragment differs). Returns `false` without navigating if the target is
	/// out of range or `delta` is zero.
	pub fn go(&self, delta: isize) -> bool {
		let (fragment_only, popstate, hashchange) = {
			let mut state = self.state.borrow_mut();
			let Some(target) = state.index.checked_add_signed(delta) else {
				return false;
			};
			if delta == 0 || target >= state.entries.len() {
				return false;
			}
			let from = state.current().clone();
			state.index = target;
			let fragment_only = differs_only_in_fragment(&from, state.current());
			(
				fragment_only,
				state.notifiers(NativeEvent::PopState),
				state.notifiers(NativeEvent::HashChange),
			)
		};
		fire(&popstate);
		if fragment_only {
			fire(&hashchange);
		}
		true
	}

	/// Navigates to a fragment of the current document, like assigning
	/// `location.hash`. Setting the current fragment again does nothing.
	pub fn set_hash(&self, fragment: &str) {
		let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
		let (popstate, hashchange) = {
			let mut state = self.state.borrow_mut();
			let mut next = state.current().clone();
			next.set_fragment(Some(fragment));
			if next == *state.current() {
				return;
			}
			state.push(next);
			(
				state.notifiers(NativeEvent::PopState),
				state.notifiers(NativeEvent::HashChange),
			)
		};
		fire(&popstate);
		fire(&hashchange);
	}

	/// Number of listeners subscribed to `event`.
	pub fn listener_count(&self, event: NativeEvent) -> usize {
		self.state
			.borrow()
			.listeners
			.iter()
			.filter(|l| l.event == event)
			.count()
	}
}

fn fire(notifiers: &[Notify]) {
	for notify in notifiers {
		notify();
	}
}

fn differs_only_in_fragment(a: &Url, b: &Url) -> bool {
	a != b && a[..url::Position::AfterQuery] == b[..url::Position::AfterQuery]
}

fn native_primitive(state: Weak<RefCell<MemoryState>>, kind: PrimitiveKind) -> MemoryPrimitive {
	Rc::new(move |url: &str| {
		let state = state
			.upgrade()
			.ok_or_else(|| SpaError::Navigation("history has been dropped".to_string()))?;
		let mut state = state.borrow_mut();
		let next = state.resolve(url)?;
		match kind {
			PrimitiveKind::PushState => state.push(next),
			PrimitiveKind::ReplaceState => {
				let index = state.index;
				state.entries[index] = next;
			}
		}
		Ok(())
	})
}

impl NavigationPrimitives for MemoryHistory {
	type Primitive = MemoryPrimitive;
	type Hook = MemoryHook;

	fn current_href(&self) -> Result<String> {
		Ok(self.href())
	}

	fn primitive(&self, kind: PrimitiveKind) -> Result<MemoryPrimitive> {
		let state = self.state.borrow();
		Ok(match kind {
			PrimitiveKind::PushState => Rc::clone(&state.push_state),
			PrimitiveKind::ReplaceState => Rc::clone(&state.replace_state),
		})
	}

	fn set_primitive(&self, kind: PrimitiveKind, primitive: &MemoryPrimitive) -> Result<()> {
		let mut state = self.state.borrow_mut();
		let slot = match kind {
			PrimitiveKind::PushState => &mut state.push_state,
			PrimitiveKind::ReplaceState => &mut state.replace_state,
		};
		*slot = Rc::clone(primitive);
		Ok(())
	}

	fn wrap_primitive(
		&self,
		_kind: PrimitiveKind,
		original: MemoryPrimitive,
		notify: Notify,
	) -> (MemoryPrimitive, MemoryHook) {
		let wrapper: MemoryPrimitive = Rc::new(move |url: &str| {
			let ret = original(url)?;
			notify();
			Ok(ret)
		});
		(wrapper, MemoryHook::Wrapper)
	}

	fn listen(&self, event: NativeEvent, notify: Notify) -> Result<MemoryHook> {
		let mut state = self.state.borrow_mut();
		let id = state.next_listener_id;
		state.next_listener_id += 1;
		state.listeners.push(MemoryListener { id, event, notify });
		Ok(MemoryHook::Listener(id))
	}

	fn unlisten(&self, _event: NativeEvent, hook: MemoryHook) -> Result<()> {
		if let MemoryHook::Listener(id) = hook {
			self.state.borrow_mut().listeners.retain(|l| l.id != id);
		}
		Ok(())
	}
}
