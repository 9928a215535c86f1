//! Scope - Disposal-Tree Lifecycle Management
//!
//! A `Scope` bundles everything that must be torn down when one region of a
//! rendered tree goes away: reactive subscriptions, event listeners, and
//! child component scopes. Destroying a scope cascades depth-first through
//! its children before running its own cleanups, so a single `destroy()`
//! call on a region reliably releases everything beneath it.

use core::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

/// A disposal-tree node owning cleanup callbacks and child scopes.
///
/// Scopes form a tree mirroring the rendered regions of the UI: the root
/// app, each loop item, each conditional branch, and each component
/// instance gets its own scope. The parent owns its children strongly;
/// children hold only a weak back-reference for detachment.
///
/// ## Cloning
///
/// `Scope` is a cheap handle; all clones refer to the same node.
pub struct Scope {
	inner: Rc<ScopeInner>,
}

struct ScopeInner {
	parent: Weak<ScopeInner>,
	children: RefCell<Vec<Scope>>,
	cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
	destroyed: Cell<bool>,
}

impl Scope {
	/// Create a root scope with no parent.
	pub fn new() -> Self {
		Self {
			inner: Rc::new(ScopeInner {
				parent: Weak::new(),
				children: RefCell::new(Vec::new()),
				cleanups: RefCell::new(Vec::new()),
				destroyed: Cell::new(false),
			}),
		}
	}

	/// Create a child scope owned by `self`.
	///
	/// A child created under an already-destroyed parent is dead on
	/// arrival: no new region may attach to a destroyed scope, so the
	/// child starts out destroyed and refuses cleanups and effects.
	pub fn child(&self) -> Scope {
		let child = Scope {
			inner: Rc::new(ScopeInner {
				parent: Rc::downgrade(&self.inner),
				children: RefCell::new(Vec::new()),
				cleanups: RefCell::new(Vec::new()),
				destroyed: Cell::new(self.inner.destroyed.get()),
			}),
		};
		if !self.inner.destroyed.get() {
			self.inner.children.borrow_mut().push(child.clone());
		}
		child
	}

	/// Register a teardown callback, run exactly once on destruction.
	///
	/// Silently rejected if the scope is already destroyed.
	pub fn add(&self, cleanup: impl FnOnce() + 'static) {
		if self.inner.destroyed.get() {
			return;
		}
		self.inner.cleanups.borrow_mut().push(Box::new(cleanup));
	}

	/// Whether this scope has been destroyed. Monotonic: never resets.
	pub fn is_destroyed(&self) -> bool {
		self.inner.destroyed.get()
	}

	/// The parent scope, if any and still alive.
	pub fn parent(&self) -> Option<Scope> {
		self.inner.parent.upgrade().map(|inner| Scope { inner })
	}

	/// Destroy this scope: children first (depth-first), then own cleanups
	/// in registration order. Idempotent.
	///
	/// A panicking cleanup is caught and logged so that one failing
	/// cleanup cannot block the others.
	pub fn destroy(&self) {
		if self.inner.destroyed.replace(true) {
			return;
		}
		let children = std::mem::take(&mut *self.inner.children.borrow_mut());
		for child in children {
			child.destroy();
		}
		let cleanups = std::mem::take(&mut *self.inner.cleanups.borrow_mut());
		for cleanup in cleanups {
			if catch_unwind(AssertUnwindSafe(cleanup)).is_err() {
				tracing::error!("scope cleanup panicked; running remaining cleanups");
			}
		}
		// Detach from the parent so toggled regions (v-if, v-for items)
		// do not accumulate dead records in the parent's child list.
		if let Some(parent) = self.inner.parent.upgrade() {
			parent
				.children
				.borrow_mut()
				.retain(|c| !Rc::ptr_eq(&c.inner, &self.inner));
		}
	}

	/// Identity comparison between scope handles.
	pub fn ptr_eq(a: &Scope, b: &Scope) -> bool {
		Rc::ptr_eq(&a.inner, &b.inner)
	}
}

impl Clone for Scope {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl Default for Scope {
	fn default() -> Self {
		Self::new()
	}
}
