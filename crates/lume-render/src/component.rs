//! Component definitions and the registry.
//!
//! A component is a parsed template plus declared props and an optional
//! setup function. Props arrive as signals kept in sync with the parent's
//! bound expressions; setup runs once per instance and contributes extra
//! bindings (state, methods) to the component's context. Communication
//! back to the parent goes through [`SetupContext::emit`].

use core::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lume_reactive::{Scope, Signal};
use lume_template::{Binding, ElementTemplate, Value, parse_template};

use crate::error::RenderError;

pub type SetupFn = Rc<dyn Fn(&Props, &SetupContext) -> Vec<(String, Binding)>>;

pub(crate) type EmitHandler = Rc<dyn Fn(&[Value])>;

/// A registered component: template, prop declarations, setup.
///
/// The template is parsed eagerly so a bad component fails at
/// registration, not at first render.
pub struct ComponentDef {
	pub(crate) template: Rc<ElementTemplate>,
	pub(crate) props: Vec<(String, Value)>,
	pub(crate) setup: Option<SetupFn>,
}

impl ComponentDef {
	pub fn new(template: &str) -> Result<Self, RenderError> {
		let template = parse_template(template)?;
		let structural = template
			.directives
			.iter()
			.any(|d| matches!(d, lume_template::Directive::If(_) | lume_template::Directive::For(_)));
		if structural {
			return Err(RenderError::RootStructuralDirective);
		}
		Ok(Self {
			template,
			props: Vec::new(),
			setup: None,
		})
	}

	/// Declare a prop with its default. Only declared props receive
	/// signals; undeclared `:attr` bindings on a component tag are ignored.
	pub fn prop(mut self, name: &str, default: Value) -> Self {
		self.props.push((name.to_string(), default));
		self
	}

	/// Per-instance initialization. Runs once, after prop signals exist
	/// and before the component template is compiled; the returned
	/// bindings are added to the component's context and may shadow props.
	pub fn setup(
		mut self,
		f: impl Fn(&Props, &SetupContext) -> Vec<(String, Binding)> + 'static,
	) -> Self {
		self.setup = Some(Rc::new(f));
		self
	}
}

/// The prop signals of one component instance.
pub struct Props {
	pub(crate) map: HashMap<String, Signal<Value>>,
}

impl Props {
	/// The backing signal of a declared prop.
	pub fn signal(&self, name: &str) -> Option<Signal<Value>> {
		self.map.get(name).cloned()
	}

	/// Read a prop's current value (tracked when inside an effect).
	/// Undeclared props read as null.
	pub fn get(&self, name: &str) -> Value {
		self.map.get(name).map(Signal::get).unwrap_or(Value::Null)
	}
}

/// Dispatches component events to the listeners the parent bound with
/// `@event` on the component tag. Emitting an event nobody listens to is
/// quietly dropped.
pub struct Emitter {
	handlers: Rc<HashMap<String, EmitHandler>>,
}

impl Emitter {
	pub(crate) fn new(handlers: HashMap<String, EmitHandler>) -> Self {
		Self {
			handlers: Rc::new(handlers),
		}
	}

	pub fn emit(&self, event: &str, args: &[Value]) {
		match self.handlers.get(event) {
			Some(handler) => handler(args),
			None => tracing::debug!(event, "emit with no listener"),
		}
	}
}

impl Clone for Emitter {
	fn clone(&self) -> Self {
		Self {
			handlers: Rc::clone(&self.handlers),
		}
	}
}

/// What setup gets besides the props: the instance scope and the emitter.
pub struct SetupContext {
	emitter: Emitter,
	scope: Scope,
}

impl SetupContext {
	pub(crate) fn new(emitter: Emitter, scope: Scope) -> Self {
		Self { emitter, scope }
	}

	pub fn emit(&self, event: &str, args: &[Value]) {
		self.emitter.emit(event, args);
	}

	pub fn emitter(&self) -> Emitter {
		self.emitter.clone()
	}

	/// The component instance's scope; cleanups added here run when the
	/// instance is torn down.
	pub fn scope(&self) -> &Scope {
		&self.scope
	}
}

/// Name-to-definition map consulted by the compiler for every tag.
///
/// Names are case-insensitive and stored lower-cased. Registering the
/// same name twice is an error rather than a silent override.
#[derive(Default)]
pub struct ComponentRegistry {
	defs: RefCell<HashMap<String, Rc<ComponentDef>>>,
}

impl ComponentRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, name: &str, def: ComponentDef) -> Result<(), RenderError> {
		let key = name.to_ascii_lowercase();
		let mut defs = self.defs.borrow_mut();
		if defs.contains_key(&key) {
			return Err(RenderError::DuplicateComponent(key));
		}
		defs.insert(key, Rc::new(def));
		Ok(())
	}

	pub fn contains(&self, name: &str) -> bool {
		self.defs.borrow().contains_key(&name.to_ascii_lowercase())
	}

	pub(crate) fn get(&self, tag: &str) -> Option<Rc<ComponentDef>> {
		self.defs.borrow().get(&tag.to_ascii_lowercase()).cloned()
	}
}
