//! Teardown tracking for active route handlers.
//!
//! Every dispatch cycle collects the [`Cleanup`] actions produced by the handlers it
//! activates. They are flushed before the next cycle evaluates any route, and when
//! the router stops.

use crate::logging::{CallbackKind, isolate};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A no-argument action reversing a handler's activation effects.
///
/// Cloning is cheap and preserves identity: two clones of the same `Cleanup`
/// count as one entry in a [`CleanupTracker`].
#[derive(Clone)]
pub struct Cleanup {
	inner: Rc<dyn Fn()>,
}

impl Cleanup {
	/// Wraps a teardown closure.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn() + 'static,
	{
		Self { inner: Rc::new(f) }
	}

	/// Runs the teardown.
	pub fn call(&self) {
		(self.inner)()
	}

	/// Returns `true` if both values wrap the same closure.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for Cleanup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Cleanup")
			.field(&Rc::as_ptr(&self.inner).cast::<()>())
			.finish()
	}
}

/// Pending teardown actions, in registration order.
#[derive(Default)]
pub struct CleanupTracker {
	pending: RefCell<Vec<Cleanup>>,
}

impl fmt::Debug for CleanupTracker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CleanupTracker")
			.field("pending", &self.len())
			.finish()
	}
}

impl CleanupTracker {
	/// Creates an empty tracker.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a cleanup. Returns `false` if the same cleanup is already pending.
	pub fn register(&self, cleanup: Cleanup) -> bool {
		let mut pending = self.pending.borrow_mut();
		if pending.iter().any(|c| c.ptr_eq(&cleanup)) {
			return false;
		}
		pending.push(cleanup);
		true
	}

	/// Number of pending cleanups.
	pub fn len(&self) -> usize {
		self.pending.borrow().len()
	}

	/// Returns `true` if nothing is pending.
	pub fn is_empty(&self) -> bool {
		self.pending.borrow().is_empty()
	}

	/// Invokes every pending cleanup and empties the set.
	///
	/// The set is taken before the first invocation, so a cleanup registered while
	/// flushing is kept for the next flush. A panicking cleanup is logged and the
	/// remaining ones still run. Returns the number of cleanups attempted.
	pub fn flush(&self) -> usize {
		let pending = std::mem::take(&mut *self.pending.borrow_mut());
		for cleanup in &pending {
			isolate(CallbackKind::Cleanup, None, || cleanup.call());
		}
		pending.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;

	fn counter() -> (Rc<Cell<u32>>, Cleanup) {
		let count = Rc::new(Cell::new(0));
		let cleanup = Cleanup::new({
			let count = Rc::clone(&count);
			move || count.set(count.get() + 1)
		});
		(count, cleanup)
	}

	#[rstest]
	fn test_register_deduplicates_by_identity() {
		let tracker = CleanupTracker::new();
		let (_, cleanup) = counter();

		assert!(tracker.register(cleanup.clone()));
		assert!(!tracker.register(cleanup));
		assert_eq!(tracker.len(), 1);
	}

	#[rstest]
	fn test_distinct_closures_are_distinct_entries() {
		let tracker = CleanupTracker::new();
		tracker.register(Cleanup::new(|| {}));
		tracker.register(Cleanup::new(|| {}));
		assert_eq!(tracker.len(), 2);
	}

	#[rstest]
	fn test_flush_runs_each_once_and_empties() {
		let tracker = CleanupTracker::new();
		let (count, cleanup) = counter();
		tracker.register(cleanup.clone());
		tracker.register(cleanup);

		assert_eq!(tracker.flush(), 1);
		assert_eq!(count.get(), 1);
		assert!(tracker.is_empty());

		assert_eq!(tracker.flush(), 0);
		assert_eq!(count.get(), 1);
	}

	#[rstest]
	fn test_flush_continues_after_panic() {
		let tracker = CleanupTracker::new();
		let (first, first_cleanup) = counter();
		let (last, last_cleanup) = counter();

		tracker.register(first_cleanup);
		tracker.register(Cleanup::new(|| panic!("teardown failed")));
		tracker.register(last_cleanup);

		assert_eq!(tracker.flush(), 3);
		assert_eq!(first.get(), 1);
		assert_eq!(last.get(), 1);
		assert!(tracker.is_empty());
	}

	#[rstest]
	fn test_flush_preserves_registration_order() {
		let tracker = CleanupTracker::new();
		let order = Rc::new(RefCell::new(Vec::new()));
		for label in ["a", "b", "c"] {
			let order = Rc::clone(&order);
			tracker.register(Cleanup::new(move || order.borrow_mut().push(label)));
		}

		tracker.flush();
		assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
	}

	#[rstest]
	fn test_cleanup_registered_during_flush_waits_for_next_flush() {
		let tracker = Rc::new(CleanupTracker::new());
		let (count, late) = counter();
		tracker.register(Cleanup::new({
			let tracker = Rc::clone(&tracker);
			move || {
				tracker.register(late.clone());
			}
		}));

		tracker.flush();
		assert_eq!(count.get(), 0);
		assert_eq!(tracker.len(), 1);

		tracker.flush();
		assert_eq!(count.get(), 1);
	}
}
