//! Effect - Reactive Side Effects
//!
//! An `Effect` re-runs whenever any Signal it read during its last run
//! changes. Dependencies are tracked automatically: any `Signal::get`
//! inside the effect closure attributes itself to the currently running
//! effect via the [`Runtime`](crate::Runtime).
//!
//! Every effect is owned by a [`Scope`]: it never executes once its scope
//! is destroyed, and its lingering per-run cleanup is torn down when the
//! scope goes away.

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::runtime::Runtime;
use crate::scope::Scope;

pub(crate) type CleanupFn = Box<dyn FnOnce()>;
type EffectFn = Box<dyn FnMut() -> Option<CleanupFn>>;

/// A reactive computation owned by a [`Scope`].
///
/// Runs once immediately on creation (establishing its initial
/// dependencies), then again whenever a dependency Signal changes. The
/// closure may return a cleanup, which is invoked before the next run and
/// when the owning scope is destroyed.
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
/// rt.create_effect_in(&scope, move || {
/// 	let _ = tracked.get();
/// 	None::<fn()>
/// });
///
/// scope.destroy();
/// count.set(1); // no longer re-runs
/// ```
pub struct Effect {
	inner: Rc<EffectInner>,
}

struct EffectInner {
	runtime: Runtime,
	scope: Scope,
	func: RefCell<Option<EffectFn>>,
	cleanup: RefCell<Option<CleanupFn>>,
	running: Cell<bool>,
}

impl Effect {
	pub(crate) fn new<F, C>(runtime: &Runtime, scope: &Scope, mut f: F) -> Effect
	where
		F: FnMut() -> Option<C> + 'static,
		C: FnOnce() + 'static,
	{
		let func: EffectFn = Box::new(move || f().map(|c| Box::new(c) as CleanupFn));
		let effect = Effect {
			inner: Rc::new(EffectInner {
				runtime: runtime.clone(),
				scope: scope.clone(),
				func: RefCell::new(Some(func)),
				cleanup: RefCell::new(None),
				running: Cell::new(false),
			}),
		};
		if scope.is_destroyed() {
			// Refused: a destroyed region never runs new computations.
			effect.inner.func.borrow_mut().take();
			return effect;
		}
		// When the scope is destroyed, run the lingering per-run cleanup
		// and drop the closure so no orphaned listeners survive.
		let weak = Rc::downgrade(&effect.inner);
		scope.add(move || {
			if let Some(inner) = weak.upgrade() {
				if let Some(cleanup) = inner.cleanup.borrow_mut().take() {
					cleanup();
				}
				inner.func.borrow_mut().take();
			}
		});
		effect.run();
		effect
	}

	/// A permanently inert effect, returned when creation is refused
	/// because there is no live owning scope.
	pub(crate) fn refused(runtime: &Runtime) -> Effect {
		let scope = Scope::new();
		scope.destroy();
		Effect {
			inner: Rc::new(EffectInner {
				runtime: runtime.clone(),
				scope,
				func: RefCell::new(None),
				cleanup: RefCell::new(None),
				running: Cell::new(false),
			}),
		}
	}

	/// Execute the effect once.
	///
	/// No-op if the owning scope is destroyed or if this effect is already
	/// running (reads only register dependencies; they never re-trigger
	/// the same run inline).
	pub fn run(&self) {
		if self.inner.scope.is_destroyed() || self.inner.running.get() {
			return;
		}
		self.inner.running.set(true);
		if let Some(cleanup) = self.inner.cleanup.borrow_mut().take() {
			cleanup();
		}
		self.inner.runtime.push_effect(self.clone());
		// Take the closure out for the duration of the call so that a
		// scope destruction triggered from inside the run cannot collide
		// with the borrow.
		let func = self.inner.func.borrow_mut().take();
		let next_cleanup = match func {
			Some(mut f) => {
				let next = f();
				let mut slot = self.inner.func.borrow_mut();
				if slot.is_none() && !self.inner.scope.is_destroyed() {
					*slot = Some(f);
				}
				next
			}
			None => None,
		};
		self.inner.runtime.pop_effect();
		if let Some(cleanup) = next_cleanup {
			if self.inner.scope.is_destroyed() {
				cleanup();
			} else {
				*self.inner.cleanup.borrow_mut() = Some(cleanup);
			}
		}
		self.inner.running.set(false);
	}

	/// The scope that owns this effect.
	pub fn scope(&self) -> &Scope {
		&self.inner.scope
	}

	/// Stop this effect from ever re-running and release its cleanup.
	pub fn dispose(&self) {
		if let Some(cleanup) = self.inner.cleanup.borrow_mut().take() {
			cleanup();
		}
		self.inner.func.borrow_mut().take();
	}

	/// Identity comparison between effect handles.
	pub fn ptr_eq(a: &Effect, b: &Effect) -> bool {
		Rc::ptr_eq(&a.inner, &b.inner)
	}
}

impl Clone for Effect {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_effect_runs_immediately() {
		let rt = Runtime::new();
		let scope = Scope::new();
		let runs = Rc::new(Cell::new(0));

		let runs_clone = runs.clone();
		rt.create_effect_in(&scope, move || {
			runs_clone.set(runs_clone.get() + 1);
			None::<fn()>
		});

		assert_eq!(runs.get(), 1);
	}

	#[test]
	fn test_effect_reruns_on_signal_change() {
		let rt = Runtime::new();
		let scope = Scope::new();
		let signal = rt.create_signal(0);
		let values = Rc::new(RefCell::new(Vec::new()));

		let values_clone = values.clone();
		let tracked = signal.clone();
		rt.create_effect_in(&scope, move || {
			values_clone.borrow_mut().push(tracked.get());
			None::<fn()>
		});

		signal.set(10);
		signal.set(20);
		assert_eq!(*values.borrow(), vec![0, 10, 20]);
	}

	#[test]
	fn test_effect_refused_on_destroyed_scope() {
		let rt = Runtime::new();
		let scope = Scope::new();
		scope.destroy();
		let runs = Rc::new(Cell::new(0));

		let runs_clone = runs.clone();
		rt.create_effect_in(&scope, move || {
			runs_clone.set(runs_clone.get() + 1);
			None::<fn()>
		});

		assert_eq!(runs.get(), 0);
	}

	#[test]
	fn test_cleanup_runs_before_next_run_and_on_destroy() {
		let rt = Runtime::new();
		let scope = Scope::new();
		let signal = rt.create_signal(0);
		let log = Rc::new(RefCell::new(Vec::new()));

		let log_clone = log.clone();
		let tracked = signal.clone();
		rt.create_effect_in(&scope, move || {
			let value = tracked.get();
			log_clone.borrow_mut().push(format!("run {value}"));
			let log_inner = log_clone.clone();
			Some(move || log_inner.borrow_mut().push(format!("cleanup {value}")))
		});

		signal.set(1);
		scope.destroy();
		assert_eq!(
			*log.borrow(),
			vec!["run 0", "cleanup 0", "run 1", "cleanup 1"]
		);
	}

	#[test]
	fn test_destroyed_scope_stops_reruns() {
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

		assert_eq!(runs.get(), 1);
		scope.destroy();
		signal.set(5);
		assert_eq!(runs.get(), 1);
	}

	#[test]
	fn test_dispose_stops_reruns() {
		let rt = Runtime::new();
		let scope = Scope::new();
		let signal = rt.create_signal(0);
		let runs = Rc::new(Cell::new(0));

		let runs_clone = runs.clone();
		let tracked = signal.clone();
		let effect = rt.create_effect_in(&scope, move || {
			let _ = tracked.get();
			runs_clone.set(runs_clone.get() + 1);
			None::<fn()>
		});

		effect.dispose();
		signal.set(5);
		assert_eq!(runs.get(), 1);
	}

	#[test]
	fn test_write_inside_own_run_does_not_recurse() {
		let rt = Runtime::new();
		let scope = Scope::new();
		let signal = rt.create_signal(0);
		let runs = Rc::new(Cell::new(0));

		let runs_clone = runs.clone();
		let tracked = signal.clone();
		rt.create_effect_in(&scope, move || {
			let value = tracked.get();
			runs_clone.set(runs_clone.get() + 1);
			if value == 0 {
				tracked.set(1);
			}
			None::<fn()>
		});

		// The write during the run does not re-enter the same effect; at
		// most one execution proceeds at a time.
		assert_eq!(runs.get(), 1);
		assert_eq!(signal.get_untracked(), 1);
	}
}
