//! Fine-grained reactive core for lume.
//!
//! The reactive system is a pull-based dependency graph in the style of
//! Solid.js and Leptos:
//!
//! 1. **Scope**: a disposal-tree node that owns cleanup callbacks and child
//!    scopes for one region of a rendered tree.
//! 2. **Signal**: an observable value cell; reading it inside an Effect
//!    records a dependency, writing it notifies dependents.
//! 3. **Effect**: a computation that re-runs whenever a Signal it read
//!    during its last run changes.
//! 4. **Runtime**: the explicit reactive context that threads the
//!    "current effect" and "current scope" through every call. There is no
//!    global mutable state; everything hangs off a cheaply clonable
//!    [`Runtime`] handle.
//!
//! ## Example
//!
//! ```
//! use lume_reactive::{Runtime, Scope};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let rt = Runtime::new();
//! let scope = Scope::new();
//! let count = rt.create_signal(0);
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! let tracked = count.clone();
//! rt.create_effect_in(&scope, move || {
//!     log.borrow_mut().push(tracked.get());
//!     None::<fn()>
//! });
//!
//! count.set(42);
//! assert_eq!(*seen.borrow(), vec![0, 42]);
//! ```

mod effect;
mod memo;
mod runtime;
mod scope;
mod signal;

pub use effect::Effect;
pub use memo::Memo;
pub use runtime::Runtime;
pub use scope::Scope;
pub use signal::Signal;
