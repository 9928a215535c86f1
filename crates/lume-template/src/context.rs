//! Evaluation context: the name bindings visible to an expression.

use std::collections::HashMap;
use std::rc::Rc;

use lume_reactive::Signal;

use crate::value::Value;

/// A callable bound in a context, e.g. an app method or an emit handler.
pub type ContextFn = Rc<dyn Fn(&[Value]) -> Value>;

/// One named binding. Signals are unwrapped transparently when read in
/// value position, which is how templates stay reactive without any
/// special syntax.
#[derive(Clone)]
pub enum Binding {
	Value(Value),
	Signal(Signal<Value>),
	Func(ContextFn),
}

/// An immutable map of name bindings.
///
/// Extension is by copy: [`Context::with`] returns a new context with one
/// extra binding, leaving the original untouched. Loop bodies and
/// component bodies build their contexts this way, so shadowing an outer
/// name never leaks back out.
#[derive(Clone, Default)]
pub struct Context {
	entries: HashMap<String, Binding>,
}

impl Context {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, name: impl Into<String>, binding: Binding) {
		self.entries.insert(name.into(), binding);
	}

	pub fn get(&self, name: &str) -> Option<&Binding> {
		self.entries.get(name)
	}

	/// A copy of this context with one additional (or shadowing) binding.
	pub fn with(&self, name: impl Into<String>, binding: Binding) -> Context {
		let mut extended = self.clone();
		extended.insert(name, binding);
		extended
	}
}
