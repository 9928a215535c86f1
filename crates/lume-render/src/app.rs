//! Application runtime: state, methods, mounting.
//!
//! An [`App`] ties a template to a mount target in a document. Data
//! entries become signals; method closures receive an [`AppState`] handle
//! (the moral equivalent of `this` in an options-style framework) plus
//! the invocation arguments, so they can read and write state directly.

use core::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lume_dom::{Document, Node};
use lume_reactive::{Runtime, Scope, Signal};
use lume_template::{
	Binding, Context, ElementTemplate, Value, parse_template,
};

use crate::compiler::Compiler;
use crate::component::ComponentRegistry;
use crate::error::RenderError;

pub type MethodFn = Rc<dyn Fn(&AppState, &[Value]) -> Value>;

/// Declarative app configuration: mount selector, template, reactive data
/// entries, and methods callable from the template.
pub struct AppOptions {
	el: String,
	template: String,
	data: Vec<(String, Value)>,
	methods: Vec<(String, MethodFn)>,
}

impl AppOptions {
	pub fn new(el: &str, template: &str) -> Self {
		Self {
			el: el.to_string(),
			template: template.to_string(),
			data: Vec::new(),
			methods: Vec::new(),
		}
	}

	/// Add a reactive data entry; it becomes a signal on the app.
	pub fn data(mut self, name: &str, value: Value) -> Self {
		self.data.push((name.to_string(), value));
		self
	}

	/// Add a method. Inside the closure, `state` reads and writes the
	/// app's data signals.
	pub fn method(
		mut self,
		name: &str,
		f: impl Fn(&AppState, &[Value]) -> Value + 'static,
	) -> Self {
		self.methods.push((name.to_string(), Rc::new(f)));
		self
	}
}

/// Handle to the app's data signals, passed to every method invocation.
pub struct AppState {
	runtime: Runtime,
	signals: Rc<HashMap<String, Signal<Value>>>,
}

impl AppState {
	/// Read a data entry (tracked when inside an effect). Unknown names
	/// read as null.
	pub fn get(&self, name: &str) -> Value {
		match self.signals.get(name) {
			Some(signal) => signal.get(),
			None => {
				tracing::warn!(name, "read of unknown app data entry");
				Value::Null
			}
		}
	}

	pub fn set(&self, name: &str, value: Value) {
		match self.signals.get(name) {
			Some(signal) => signal.set(value),
			None => tracing::warn!(name, "write to unknown app data entry ignored"),
		}
	}

	pub fn update(&self, name: &str, f: impl FnOnce(&Value) -> Value) {
		match self.signals.get(name) {
			Some(signal) => signal.update(f),
			None => tracing::warn!(name, "update of unknown app data entry ignored"),
		}
	}

	/// The backing signal of a data entry.
	pub fn signal(&self, name: &str) -> Option<Signal<Value>> {
		self.signals.get(name).cloned()
	}

	/// Coalesce several writes into one round of effect re-runs.
	pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
		self.runtime.batch(f)
	}
}

impl Clone for AppState {
	fn clone(&self) -> Self {
		Self {
			runtime: self.runtime.clone(),
			signals: Rc::clone(&self.signals),
		}
	}
}

/// A mounted (or mountable) application instance.
pub struct App {
	runtime: Runtime,
	document: Document,
	registry: Rc<ComponentRegistry>,
	host: Node,
	template: Rc<ElementTemplate>,
	ctx: Context,
	state: AppState,
	root: RefCell<Option<(Scope, Node)>>,
}

impl core::fmt::Debug for App {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("App").finish_non_exhaustive()
	}
}

impl App {
	/// Build an app. Fails if the mount selector matches nothing or the
	/// template does not parse; neither touches the document.
	pub fn new(
		runtime: &Runtime,
		document: &Document,
		registry: &Rc<ComponentRegistry>,
		options: AppOptions,
	) -> Result<App, RenderError> {
		let host = document
			.query_selector(&options.el)
			.ok_or_else(|| RenderError::MountTargetNotFound(options.el.clone()))?;
		let template = parse_template(&options.template)?;

		let mut signals = HashMap::new();
		for (name, value) in options.data {
			signals.insert(name, runtime.create_signal(value));
		}
		let state = AppState {
			runtime: runtime.clone(),
			signals: Rc::new(signals),
		};

		let mut ctx = Context::new();
		for (name, signal) in state.signals.iter() {
			ctx.insert(name.clone(), Binding::Signal(signal.clone()));
		}
		for (name, method) in options.methods {
			let method_state = state.clone();
			ctx.insert(
				name,
				Binding::Func(Rc::new(move |args: &[Value]| method(&method_state, args))),
			);
		}

		Ok(App {
			runtime: runtime.clone(),
			document: document.clone(),
			registry: Rc::clone(registry),
			host,
			template,
			ctx,
			state,
			root: RefCell::new(None),
		})
	}

	/// Compile the template and attach it to the host. Remounting first
	/// unmounts, then renders fresh under a brand-new root scope; data
	/// signals survive across remounts.
	pub fn mount(&self) -> Result<(), RenderError> {
		self.unmount();
		let scope = Scope::new();
		let compiler = Compiler::new(&self.runtime, &self.document, &self.registry);
		let node = self
			.runtime
			.with_scope(&scope, || compiler.compile(&self.template, &self.ctx, &scope));
		let node = match node {
			Ok(node) => node,
			Err(error) => {
				scope.destroy();
				return Err(error);
			}
		};
		self.host.append_child(&node);
		*self.root.borrow_mut() = Some((scope, node));
		Ok(())
	}

	/// Destroy the root scope (releasing every effect and listener) and
	/// remove the rendered tree. Idempotent.
	pub fn unmount(&self) {
		if let Some((scope, node)) = self.root.borrow_mut().take() {
			scope.destroy();
			node.remove();
		}
	}

	pub fn is_mounted(&self) -> bool {
		self.root.borrow().is_some()
	}

	/// The app's state handle, usable from outside the template too.
	pub fn state(&self) -> &AppState {
		&self.state
	}

	/// The rendered root node while mounted.
	pub fn root(&self) -> Option<Node> {
		self.root.borrow().as_ref().map(|(_, node)| node.clone())
	}
}

impl Drop for App {
	fn drop(&mut self) {
		self.unmount();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn host_document() -> Document {
		let document = Document::new();
		let div = document.create_element("div");
		div.set_attribute("id", "app");
		document.body().append_child(&div);
		document
	}

	fn counter_app(runtime: &Runtime, document: &Document) -> App {
		let registry = Rc::new(ComponentRegistry::new());
		let options = AppOptions::new(
			"#app",
			r#"<div><p>Count: {{ count }}</p><button @click="inc()">+1</button></div>"#,
		)
		.data("count", Value::from(0))
		.method("inc", |state, _args| {
			state.update("count", |n| Value::Number(n.as_number() + 1.0));
			Value::Null
		});
		App::new(runtime, document, &registry, options).unwrap()
	}

	#[test]
	fn test_mount_renders_and_methods_mutate() {
		let runtime = Runtime::new();
		let document = host_document();
		let app = counter_app(&runtime, &document);

		app.mount().unwrap();
		let root = app.root().unwrap();
		assert_eq!(root.text_content(), "Count: 0+1");

		let button = document.query_selector("button").unwrap();
		button.dispatch("click");
		button.dispatch("click");
		assert_eq!(root.text_content(), "Count: 2+1");
	}

	#[test]
	fn test_unmount_stops_updates_and_remount_is_fresh() {
		let runtime = Runtime::new();
		let document = host_document();
		let app = counter_app(&runtime, &document);

		app.mount().unwrap();
		let button = document.query_selector("button").unwrap();
		button.dispatch("click");

		app.unmount();
		assert!(!app.is_mounted());
		assert!(document.query_selector("button").is_none());

		// Dead listeners: clicking the detached button does nothing.
		button.dispatch("click");
		assert_eq!(app.state().get("count"), Value::Number(1.0));

		// Remount renders from the surviving data signals.
		app.mount().unwrap();
		assert_eq!(app.root().unwrap().text_content(), "Count: 1+1");
	}

	#[test]
	fn test_missing_mount_target() {
		let runtime = Runtime::new();
		let document = Document::new();
		let registry = Rc::new(ComponentRegistry::new());
		let options = AppOptions::new("#nowhere", "<div></div>");

		let err = App::new(&runtime, &document, &registry, options).unwrap_err();
		assert!(matches!(err, RenderError::MountTargetNotFound(_)));
	}

	#[test]
	fn test_bad_template_fails_at_construction() {
		let runtime = Runtime::new();
		let document = host_document();
		let registry = Rc::new(ComponentRegistry::new());
		let options = AppOptions::new("#app", "<div><span></div>");

		assert!(App::new(&runtime, &document, &registry, options).is_err());
	}

	#[test]
	fn test_batched_writes_render_once() {
		let runtime = Runtime::new();
		let document = host_document();
		let registry = Rc::new(ComponentRegistry::new());
		let options = AppOptions::new("#app", "<p>{{ a }}{{ b }}</p>")
			.data("a", Value::from(1))
			.data("b", Value::from(2));
		let app = App::new(&runtime, &document, &registry, options).unwrap();
		app.mount().unwrap();

		let state = app.state().clone();
		state.batch(|| {
			state.set("a", Value::from(8));
			state.set("b", Value::from(9));
		});
		assert_eq!(app.root().unwrap().text_content(), "89");
	}

	#[test]
	fn test_state_access_from_outside() {
		let runtime = Runtime::new();
		let document = host_document();
		let app = counter_app(&runtime, &document);
		app.mount().unwrap();

		app.state().set("count", Value::from(41));
		assert_eq!(app.root().unwrap().text_content(), "Count: 41+1");
		assert_eq!(app.state().get("missing"), Value::Null);
	}
}
