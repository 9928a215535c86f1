//! Memo - Derived, Cached Reads
//!
//! A `Memo<T>` is an internal [`Signal`] kept up to date by an [`Effect`]:
//! the computation runs once per upstream change, and every reader shares
//! the cached result instead of re-evaluating. Because the backing signal
//! short-circuits equal writes, downstream effects only re-run when the
//! derived value actually changes.

use core::cell::RefCell;
use std::rc::Rc;

use crate::runtime::Runtime;
use crate::signal::Signal;

/// A cached derived value.
///
/// ## Example
///
/// ```
/// use lume_reactive::{Runtime, Scope};
///
/// let rt = Runtime::new();
/// let scope = Scope::new();
/// let count = rt.create_signal(2);
///
/// let tracked = count.clone();
/// let doubled = rt.with_scope(&scope, || rt.create_memo(move || tracked.get() * 2));
/// assert_eq!(doubled.get(), 4);
///
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Memo<T: 'static> {
	slot: Rc<RefCell<Option<Signal<T>>>>,
}

impl<T> Memo<T>
where
	T: Clone + PartialEq + 'static,
{
	pub(crate) fn new<F>(runtime: &Runtime, f: F) -> Memo<T>
	where
		F: FnMut() -> T + 'static,
	{
		let slot: Rc<RefCell<Option<Signal<T>>>> = Rc::new(RefCell::new(None));
		let compute = Rc::new(RefCell::new(f));

		let effect_slot = slot.clone();
		let effect_compute = compute.clone();
		let rt = runtime.clone();
		runtime.create_effect(move || {
			let value = (effect_compute.borrow_mut())();
			// Clone the handle out before writing so the re-entrant
			// notification cannot collide with the slot borrow.
			let existing = effect_slot.borrow().clone();
			match existing {
				Some(signal) => signal.set(value),
				None => *effect_slot.borrow_mut() = Some(rt.create_signal(value)),
			}
			None::<fn()>
		});

		// If the effect was refused (no live ambient scope) the memo is
		// still readable: seed it once, untracked.
		if slot.borrow().is_none() {
			let value = (compute.borrow_mut())();
			*slot.borrow_mut() = Some(runtime.create_signal(value));
		}

		Memo { slot }
	}

	/// Read the cached value, registering the running effect (if any) as a
	/// subscriber of the backing signal.
	pub fn get(&self) -> T {
		self.slot
			.borrow()
			.as_ref()
			.expect("memo signal is seeded at construction")
			.get()
	}

	/// Read the cached value without creating a dependency.
	pub fn get_untracked(&self) -> T {
		self.slot
			.borrow()
			.as_ref()
			.expect("memo signal is seeded at construction")
			.get_untracked()
	}
}

impl<T: 'static> Clone for Memo<T> {
	fn clone(&self) -> Self {
		Self {
			slot: Rc::clone(&self.slot),
		}
	}
}
