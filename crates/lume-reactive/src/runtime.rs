//! Reactive Runtime
//!
//! The `Runtime` is the explicit reactive context: it carries the
//! current-effect stack (for dependency tracking), the current-scope stack
//! (for "nearest enclosing scope" semantics during compilation), and the
//! batch state that coalesces effect re-runs.
//!
//! Nothing here is global or thread-local; a `Runtime` is a cheap `Rc`
//! handle captured by every Signal and Effect it creates. Execution is
//! single-threaded, cooperative, and synchronous: signal writes run their
//! subscribers to completion before returning, and [`Runtime::batch`] is
//! synchronous deferral, not asynchronous scheduling.

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::effect::Effect;
use crate::memo::Memo;
use crate::scope::Scope;
use crate::signal::Signal;

/// The explicit reactive context threaded through the whole runtime.
///
/// ## Example
///
/// ```
/// use lume_reactive::{Runtime, Scope};
///
/// let rt = Runtime::new();
/// let scope = Scope::new();
/// let count = rt.create_signal(0);
///
/// let tracked = count.clone();
/// rt.batch(|| {
/// 	tracked.set(1);
/// 	tracked.set(2);
/// 	tracked.set(3);
/// });
/// assert_eq!(count.get_untracked(), 3);
/// ```
pub struct Runtime {
	inner: Rc<RuntimeInner>,
}

struct RuntimeInner {
	effect_stack: RefCell<Vec<Effect>>,
	scope_stack: RefCell<Vec<Scope>>,
	batch_depth: Cell<usize>,
	pending: RefCell<Vec<Effect>>,
}

impl Runtime {
	/// Create a fresh, empty reactive context.
	pub fn new() -> Self {
		Self {
			inner: Rc::new(RuntimeInner {
				effect_stack: RefCell::new(Vec::new()),
				scope_stack: RefCell::new(Vec::new()),
				batch_depth: Cell::new(0),
				pending: RefCell::new(Vec::new()),
			}),
		}
	}

	/// Create a reactive value cell.
	pub fn create_signal<T>(&self, value: T) -> Signal<T>
	where
		T: Clone + PartialEq + 'static,
	{
		Signal::new(self, value)
	}

	/// Create an effect owned by the current (ambient) scope.
	///
	/// The closure runs once immediately and again whenever a dependency
	/// changes; it may return a cleanup invoked before the next run. If
	/// there is no live ambient scope the effect is refused and the
	/// returned handle is inert.
	pub fn create_effect<F, C>(&self, f: F) -> Effect
	where
		F: FnMut() -> Option<C> + 'static,
		C: FnOnce() + 'static,
	{
		match self.current_scope() {
			Some(scope) => Effect::new(self, &scope, f),
			None => Effect::refused(self),
		}
	}

	/// Create an effect owned by an explicit scope.
	pub fn create_effect_in<F, C>(&self, scope: &Scope, f: F) -> Effect
	where
		F: FnMut() -> Option<C> + 'static,
		C: FnOnce() + 'static,
	{
		Effect::new(self, scope, f)
	}

	/// Create a derived, cached read: an internal signal kept up to date
	/// by an effect in the current scope.
	pub fn create_memo<T, F>(&self, f: F) -> Memo<T>
	where
		T: Clone + PartialEq + 'static,
		F: FnMut() -> T + 'static,
	{
		Memo::new(self, f)
	}

	/// Run `f` with the given scope as the ambient current scope.
	pub fn with_scope<R>(&self, scope: &Scope, f: impl FnOnce() -> R) -> R {
		self.inner.scope_stack.borrow_mut().push(scope.clone());
		let result = f();
		self.inner.scope_stack.borrow_mut().pop();
		result
	}

	/// The nearest enclosing scope, if any.
	pub fn current_scope(&self) -> Option<Scope> {
		self.inner.scope_stack.borrow().last().cloned()
	}

	/// Coalesce effect re-runs triggered inside `f`.
	///
	/// Signal writes inside the batch enqueue their subscribers into a
	/// pending set deduplicated by identity; when the outermost batch
	/// returns, each surviving effect runs exactly once, in the order it
	/// was first enqueued.
	pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
		self.inner.batch_depth.set(self.inner.batch_depth.get() + 1);
		let result = f();
		self.inner.batch_depth.set(self.inner.batch_depth.get() - 1);
		if self.inner.batch_depth.get() == 0 {
			self.flush();
		}
		result
	}

	/// The innermost currently running effect, if any.
	pub(crate) fn current_effect(&self) -> Option<Effect> {
		self.inner.effect_stack.borrow().last().cloned()
	}

	pub(crate) fn push_effect(&self, effect: Effect) {
		self.inner.effect_stack.borrow_mut().push(effect);
	}

	pub(crate) fn pop_effect(&self) {
		self.inner.effect_stack.borrow_mut().pop();
	}

	/// Run an effect now, or enqueue it (deduplicated) if a batch is open.
	pub(crate) fn schedule(&self, effect: &Effect) {
		if self.inner.batch_depth.get() > 0 {
			let mut pending = self.inner.pending.borrow_mut();
			if !pending.iter().any(|e| Effect::ptr_eq(e, effect)) {
				pending.push(effect.clone());
			}
		} else {
			effect.run();
		}
	}

	fn flush(&self) {
		let pending = std::mem::take(&mut *self.inner.pending.borrow_mut());
		for effect in pending {
			if !effect.scope().is_destroyed() {
				effect.run();
			}
		}
	}
}

impl Clone for Runtime {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_batch_coalesces_to_one_run() {
		let rt = Runtime::new();
		let scope = Scope::new();
		let signal = rt.create_signal(0);
		let runs = Rc::new(Cell::new(0));
		let seen = Rc::new(Cell::new(0));

		let runs_clone = runs.clone();
		let seen_clone = seen.clone();
		let tracked = signal.clone();
		rt.create_effect_in(&scope, move || {
			seen_clone.set(tracked.get());
			runs_clone.set(runs_clone.get() + 1);
			None::<fn()>
		});
		assert_eq!(runs.get(), 1);

		rt.batch(|| {
			signal.set(1);
			signal.set(2);
			signal.set(3);
		});
		assert_eq!(runs.get(), 2);
		assert_eq!(seen.get(), 3);
	}

	#[test]
	fn test_nested_batches_flush_once_at_outermost() {
		let rt = Runtime::new();
		let scope = Scope::new();
		let a = rt.create_signal(0);
		let b = rt.create_signal(0);
		let runs = Rc::new(Cell::new(0));

		let runs_clone = runs.clone();
		let ta = a.clone();
		let tb = b.clone();
		rt.create_effect_in(&scope, move || {
			let _ = ta.get() + tb.get();
			runs_clone.set(runs_clone.get() + 1);
			None::<fn()>
		});
		assert_eq!(runs.get(), 1);

		rt.batch(|| {
			a.set(1);
			rt.batch(|| {
				b.set(1);
			});
			// Inner batch closed but the outer one is still open; the
			// effect must not have run yet.
			assert_eq!(runs.get(), 1);
			a.set(2);
		});
		assert_eq!(runs.get(), 2);
	}

	#[test]
	fn test_batch_skips_effects_destroyed_during_batch() {
		let rt = Runtime::new();
		let scope = Scope::new();
		let signal = rt.create_signal(0);
		let runs = Rc::new(Cell::new(0));

		let runs_clone = runs.clone();
		let tracked = signal.clone();
		rt.create_effect_in(&scope, move || {
			let _ = tracked.get();
			runs_clone.set(runs_clone.get() + 1);
			None::<fn()>
		});

		rt.batch(|| {
			signal.set(1);
			scope.destroy();
		});
		assert_eq!(runs.get(), 1);
	}

	#[test]
	fn test_with_scope_nests_and_restores() {
		let rt = Runtime::new();
		let outer = Scope::new();
		let inner = outer.child();

		assert!(rt.current_scope().is_none());
		rt.with_scope(&outer, || {
			assert!(Scope::ptr_eq(&rt.current_scope().unwrap(), &outer));
			rt.with_scope(&inner, || {
				assert!(Scope::ptr_eq(&rt.current_scope().unwrap(), &inner));
			});
			assert!(Scope::ptr_eq(&rt.current_scope().unwrap(), &outer));
		});
		assert!(rt.current_scope().is_none());
	}

	#[test]
	fn test_create_effect_without_scope_is_refused() {
		let rt = Runtime::new();
		let runs = Rc::new(Cell::new(0));

		let runs_clone = runs.clone();
		rt.create_effect(move || {
			runs_clone.set(runs_clone.get() + 1);
			None::<fn()>
		});
		assert_eq!(runs.get(), 0);
	}
}
