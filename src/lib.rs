//! # Lume
//!
//! A minimal reactive UI runtime: fine-grained signals, a disposal-scope
//! tree, and a declarative template compiler with Vue-style directives,
//! rendering into an in-memory document.
//!
//! Lume has no virtual tree and no diffing. Reading a signal inside an
//! effect records a dependency; writing it re-runs exactly the effects
//! that read it, each of which patches exactly one node property. Regions
//! created by `v-if`, `v-for`, and components own a scope in a disposal
//! tree, so tearing a region down releases every effect and listener
//! beneath it in one call.
//!
//! ## Quick Example
//!
//! ```
//! use lume::prelude::*;
//! use std::rc::Rc;
//!
//! let runtime = Runtime::new();
//! let document = Document::new();
//! let registry = Rc::new(ComponentRegistry::new());
//!
//! let host = document.create_element("div");
//! host.set_attribute("id", "app");
//! document.body().append_child(&host);
//!
//! let options = AppOptions::new(
//!     "#app",
//!     r#"<div><p>Count: {{ count }}</p><button @click="inc()">+1</button></div>"#,
//! )
//! .data("count", Value::from(0))
//! .method("inc", |state, _args| {
//!     state.update("count", |n| Value::Number(n.as_number() + 1.0));
//!     Value::Null
//! });
//!
//! let app = App::new(&runtime, &document, &registry, options).unwrap();
//! app.mount().unwrap();
//!
//! document.query_selector("button").unwrap().dispatch("click");
//! assert_eq!(app.root().unwrap().text_content(), "Count: 1+1");
//! ```

// Re-export the reactive core
pub use lume_reactive::{Effect, Memo, Runtime, Scope, Signal};

// Re-export the document tree
pub use lume_dom::{Document, Event, ListenerId, Node};

// Re-export templates and expressions
pub use lume_template::{
	BinaryOp, Binding, Context, ContextFn, Directive, ElementTemplate, EvalError, EventModifier,
	Expr, ForBinding, Resolved, TemplateError, TemplateNode, TextSegment, UnaryOp, Value,
	eval_or_null, evaluate, parse_expr, parse_template, resolve,
};

// Re-export the compiler and app runtime
pub use lume_render::{
	App, AppOptions, AppState, Compiler, ComponentDef, ComponentRegistry, Emitter, MethodFn,
	Props, RenderError, SetupContext, SetupFn,
};

/// Commonly used types, importable in one line.
pub mod prelude {
	pub use crate::{
		App, AppOptions, AppState, Binding, ComponentDef, ComponentRegistry, Context, Document,
		Node, Runtime, Scope, Signal, Value,
	};
}
