//! Fan-out notification for "the URL may have changed".
//!
//! [`ChangeNotifier`] knows nothing about routing; the router's dispatch loop is
//! simply its default subscriber.

use crate::logging::{CallbackKind, isolate};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A zero-argument change listener.
pub type Listener = Rc<dyn Fn()>;

type Listeners = Rc<RefCell<Vec<Listener>>>;

/// Subscription registry invoked on every navigation signal.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
	listeners: Listeners,
}

impl fmt::Debug for ChangeNotifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChangeNotifier")
			.field("listeners", &self.len())
			.finish()
	}
}

impl ChangeNotifier {
	/// Creates a notifier without subscribers.
	pub fn new() -> Self {
		Self::default()
	}

	/// Subscribes a closure.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn() + 'static,
	{
		self.subscribe_listener(Rc::new(listener))
	}

	/// Subscribes a shared listener. Subscribing the same `Rc` twice keeps a
	/// single entry.
	pub fn subscribe_listener(&self, listener: Listener) -> Subscription {
		{
			let mut listeners = self.listeners.borrow_mut();
			if !listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
				listeners.push(Rc::clone(&listener));
			}
		}
		Subscription {
			listeners: Rc::downgrade(&self.listeners),
			listener,
		}
	}

	/// Invokes every current subscriber.
	///
	/// A listener removed by an earlier listener during the same notification is
	/// skipped. A panicking listener is logged and does not stop the others.
	/// Returns the number of listeners invoked.
	pub fn notify(&self) -> usize {
		let snapshot: Vec<Listener> = self.listeners.borrow().clone();
		let mut invoked = 0;
		for listener in &snapshot {
			if !self.contains(listener) {
				continue;
			}
			invoked += 1;
			isolate(CallbackKind::Listener, None, || listener());
		}
		invoked
	}

	/// A callback that notifies this registry for as long as it exists.
	///
	/// The callback holds only a weak reference, so installing it into the
	/// navigation surface does not keep the registry alive.
	pub fn emitter(&self) -> Rc<dyn Fn()> {
		let listeners = Rc::downgrade(&self.listeners);
		Rc::new(move || {
			if let Some(listeners) = listeners.upgrade() {
				ChangeNotifier { listeners }.notify();
			}
		})
	}

	/// Removes every subscription.
	pub fn clear(&self) {
		self.listeners.borrow_mut().clear();
	}

	/// Number of subscribers.
	pub fn len(&self) -> usize {
		self.listeners.borrow().len()
	}

	/// Returns `true` if nobody is subscribed.
	pub fn is_empty(&self) -> bool {
		self.listeners.borrow().is_empty()
	}

	fn contains(&self, listener: &Listener) -> bool {
		self.listeners
			.borrow()
			.iter()
			.any(|l| Rc::ptr_eq(l, listener))
	}
}

/// Handle returned by [`ChangeNotifier::subscribe`].
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
	listeners: Weak<RefCell<Vec<Listener>>>,
	listener: Listener,
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.is_active())
			.finish()
	}
}

impl Subscription {
	/// Removes exactly this subscription. Returns `false` if it was already gone.
	pub fn unsubscribe(&self) -> bool {
		let Some(listeners) = self.listeners.upgrade() else {
			return false;
		};
		let mut listeners = listeners.borrow_mut();
		let before = listeners.len();
		listeners.retain(|l| !Rc::ptr_eq(l, &self.listener));
		listeners.len() < before
	}

	/// Returns `true` while the listener is still registered.
	pub fn is_active(&self) -> bool {
		let Some(listeners) = self.listeners.upgrade() else {
			return false;
		};
		let active = listeners.borrow().iter().any(|l| Rc::ptr_eq(l, &self.listener));
		active
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;
	use std::cell::Cell;

	#[fixture]
	fn notifier() -> ChangeNotifier {
		ChangeNotifier::new()
	}

	fn counting(count: &Rc<Cell<u32>>) -> impl Fn() + 'static {
		let count = Rc::clone(count);
		move || count.set(count.get() + 1)
	}

	#[rstest]
	fn test_notify_invokes_all(notifier: ChangeNotifier) {
		let a = Rc::new(Cell::new(0));
		let b = Rc::new(Cell::new(0));
		notifier.subscribe(counting(&a));
		notifier.subscribe(counting(&b));

		assert_eq!(notifier.notify(), 2);
		assert_eq!((a.get(), b.get()), (1, 1));
	}

	#[rstest]
	fn test_unsubscribe_removes_only_that_listener(notifier: ChangeNotifier) {
		let a = Rc::new(Cell::new(0));
		let b = Rc::new(Cell::new(0));
		let sub_a = notifier.subscribe(counting(&a));
		notifier.subscribe(counting(&b));

		assert!(sub_a.unsubscribe());
		assert!(!sub_a.unsubscribe());
		assert!(!sub_a.is_active());

		notifier.notify();
		assert_eq!((a.get(), b.get()), (0, 1));
	}

	#[rstest]
	fn test_same_listener_is_stored_once(notifier: ChangeNotifier) {
		let count = Rc::new(Cell::new(0));
		let listener: Listener = Rc::new(counting(&count));
		let first = notifier.subscribe_listener(Rc::clone(&listener));
		let second = notifier.subscribe_listener(listener);

		assert_eq!(notifier.len(), 1);
		notifier.notify();
		assert_eq!(count.get(), 1);

		assert!(second.unsubscribe());
		assert!(!first.is_active());
	}

	#[rstest]
	fn test_panicking_listener_is_isolated(notifier: ChangeNotifier) {
		let before = Rc::new(Cell::new(0));
		let after = Rc::new(Cell::new(0));
		notifier.subscribe(counting(&before));
		notifier.subscribe(|| panic!("listener failed"));
		notifier.subscribe(counting(&after));

		assert_eq!(notifier.notify(), 3);
		assert_eq!((before.get(), after.get()), (1, 1));
	}

	#[rstest]
	fn test_listener_cleared_mid_notification_is_skipped(notifier: ChangeNotifier) {
		let count = Rc::new(Cell::new(0));
		let handle = notifier.clone();
		notifier.subscribe(move || handle.clear());
		notifier.subscribe(counting(&count));

		assert_eq!(notifier.notify(), 1);
		assert_eq!(count.get(), 0);
		assert!(notifier.is_empty());
	}

	#[rstest]
	fn test_emitter_notifies_while_alive() {
		let count = Rc::new(Cell::new(0));
		let notifier = ChangeNotifier::new();
		notifier.subscribe(counting(&count));
		let emit = notifier.emitter();

		emit();
		assert_eq!(count.get(), 1);

		drop(notifier);
		emit();
		assert_eq!(count.get(), 1);
	}

	#[rstest]
	fn test_unsubscribe_after_registry_dropped() {
		let notifier = ChangeNotifier::new();
		let sub = notifier.subscribe(|| {});
		drop(notifier);
		assert!(!sub.unsubscribe());
		assert!(!sub.is_active());
	}
}
