//! Signal - Observable Value Cell
//!
//! A `Signal<T>` holds a value and the set of effects currently depending
//! on it. Reading inside an effect records the dependency; writing
//! notifies dependents, unless the new value is equal to the old one.
//!
//! Subscribers are pruned lazily: an effect whose owning scope has been
//! destroyed is simply skipped (and dropped) at the next notification.
//! Correctness never depends on explicit unsubscription.

use core::cell::RefCell;
use std::rc::Rc;

use crate::effect::Effect;
use crate::runtime::Runtime;

/// A reactive value cell. Cheap to clone; all clones share the value and
/// the subscriber set.
///
/// ## Example
///
/// ```
/// use lume_reactive::Runtime;
///
/// let rt = Runtime::new();
/// let count = rt.create_signal(0);
/// assert_eq!(count.get(), 0);
///
/// count.set(42);
/// assert_eq!(count.get(), 42);
///
/// count.update(|n| n + 1);
/// assert_eq!(count.get(), 43);
/// ```
pub struct Signal<T: 'static> {
	runtime: Runtime,
	value: Rc<RefCell<T>>,
	subscribers: Rc<RefCell<Vec<Effect>>>,
}

impl<T> Signal<T>
where
	T: Clone + PartialEq + 'static,
{
	/// Create a signal bound to the given runtime.
	pub fn new(runtime: &Runtime, value: T) -> Self {
		Self {
			runtime: runtime.clone(),
			value: Rc::new(RefCell::new(value)),
			subscribers: Rc::new(RefCell::new(Vec::new())),
		}
	}

	/// Read the current value, registering the running effect (if any,
	/// and if its scope is still live) as a subscriber.
	pub fn get(&self) -> T {
		if let Some(effect) = self.runtime.current_effect() {
			if !effect.scope().is_destroyed() {
				let mut subs = self.subscribers.borrow_mut();
				if !subs.iter().any(|e| Effect::ptr_eq(e, &effect)) {
					subs.push(effect);
				}
			}
		}
		self.get_untracked()
	}

	/// Read the current value without creating a dependency.
	pub fn get_untracked(&self) -> T {
		self.value.borrow().clone()
	}

	/// Write a new value and notify live subscribers.
	///
	/// Writing a value equal to the current one is a no-op: no subscriber
	/// is notified and nothing re-renders.
	pub fn set(&self, value: T) {
		if *self.value.borrow() == value {
			return;
		}
		*self.value.borrow_mut() = value;
		self.notify();
	}

	/// Write through an updater function receiving the previous value.
	/// Subject to the same equality short-circuit as [`Signal::set`].
	pub fn update(&self, f: impl FnOnce(&T) -> T) {
		let next = {
			let current = self.value.borrow();
			f(&current)
		};
		self.set(next);
	}

	fn notify(&self) {
		// Prune dead subscribers lazily; snapshot the live ones so the
		// borrow is released before any effect runs.
		let live: Vec<Effect> = {
			let mut subs = self.subscribers.borrow_mut();
			subs.retain(|e| !e.scope().is_destroyed());
			subs.clone()
		};
		for effect in live {
			self.runtime.schedule(&effect);
		}
	}

	/// Number of currently registered subscribers, including any not yet
	/// pruned. For tests.
	pub fn subscriber_count(&self) -> usize {
		self.subscribers.borrow().len()
	}
}

impl<T: 'static> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			runtime: self.runtime.clone(),
			value: Rc::clone(&self.value),
			subscribers: Rc::clone(&self.subscribers),
		}
	}
}

impl<T> core::fmt::Debug for Signal<T>
where
	T: core::fmt::Debug + 'static,
{
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Signal")
			.field("value", &self.value.borrow())
			.finish()
	}
}
