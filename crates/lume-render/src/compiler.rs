//! Template compiler: parsed templates to live document nodes.
//!
//! Compilation walks the template tree once, creating nodes and wiring
//! fine-grained effects as it goes. There is no virtual tree and no diff:
//! each dynamic binding (a text interpolation, a `:attr`, a `v-show`)
//! owns one effect that patches exactly one node property.
//!
//! Structural directives work through comment anchors. A `v-if` or
//! `v-for` leaves a comment node permanently in the tree and inserts its
//! rendered output next to it; tearing the region down destroys the
//! region's scope (releasing every effect and listener beneath it) and
//! removes the nodes, while the anchor stays put for the next toggle.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use lume_dom::{Document, Event, Node};
use lume_reactive::{Runtime, Scope};
use lume_template::{
	Binding, Context, Directive, ElementTemplate, EventModifier, Expr, ForBinding, Resolved,
	TemplateNode, TextSegment, Value, eval_or_null, resolve,
};

use crate::component::{ComponentDef, ComponentRegistry, EmitHandler, Emitter, Props, SetupContext};
use crate::error::RenderError;

/// Compiles parsed templates into reactive node trees.
pub struct Compiler {
	runtime: Runtime,
	document: Document,
	registry: Rc<ComponentRegistry>,
}

impl Compiler {
	pub fn new(runtime: &Runtime, document: &Document, registry: &Rc<ComponentRegistry>) -> Self {
		Self {
			runtime: runtime.clone(),
			document: document.clone(),
			registry: Rc::clone(registry),
		}
	}

	/// Compile a template root. Every effect and listener created beneath
	/// it is owned by `scope`; destroying the scope makes the returned
	/// tree inert.
	///
	/// The root element must be unconditional: `v-if`/`v-for` need a
	/// parent to anchor into, so they are rejected here.
	pub fn compile(
		&self,
		template: &Rc<ElementTemplate>,
		ctx: &Context,
		scope: &Scope,
	) -> Result<Node, RenderError> {
		let structural = template
			.directives
			.iter()
			.any(|d| matches!(d, Directive::If(_) | Directive::For(_)));
		if structural {
			return Err(RenderError::RootStructuralDirective);
		}
		self.build_node(template, ctx, scope)
	}

	/// Build a non-structural element: a component instance if the tag is
	/// registered, a plain element otherwise. Unregistered hyphenated
	/// tags are component references that fail fast.
	fn build_node(
		&self,
		template: &ElementTemplate,
		ctx: &Context,
		scope: &Scope,
	) -> Result<Node, RenderError> {
		if let Some(def) = self.registry.get(&template.tag) {
			return self.instantiate_component(&def, template, ctx, scope);
		}
		if template.tag.contains('-') {
			return Err(RenderError::UnknownComponent(template.tag.clone()));
		}
		self.build_element(template, ctx, scope)
	}

	fn build_element(
		&self,
		template: &ElementTemplate,
		ctx: &Context,
		scope: &Scope,
	) -> Result<Node, RenderError> {
		let node = self.document.create_element(&template.tag);
		for (name, value) in &template.attrs {
			node.set_attribute(name, value);
		}
		self.bind_directives(&node, template, ctx, scope);
		self.build_children(&node, &template.children, ctx, scope)?;
		Ok(node)
	}

	fn build_children(
		&self,
		parent: &Node,
		children: &[TemplateNode],
		ctx: &Context,
		scope: &Scope,
	) -> Result<(), RenderError> {
		for child in children {
			match child {
				TemplateNode::Text(segments) => self.bind_text(parent, segments, ctx, scope),
				TemplateNode::Element(el) => {
					// v-for outranks v-if on the same element.
					if let Some(binding) = find_for(el) {
						let anchor = self.document.create_comment("v-for");
						parent.append_child(&anchor);
						self.build_for(&anchor, el, binding, ctx, scope);
					} else if let Some(condition) = find_if(el) {
						let anchor = self.document.create_comment("v-if");
						parent.append_child(&anchor);
						self.build_if(&anchor, el, condition, ctx, scope);
					} else {
						let node = self.build_node(el, ctx, scope)?;
						parent.append_child(&node);
					}
				}
			}
		}
		Ok(())
	}

	fn bind_text(&self, parent: &Node, segments: &[TextSegment], ctx: &Context, scope: &Scope) {
		let node = self.document.create_text_node("");
		parent.append_child(&node);
		if segments
			.iter()
			.all(|s| matches!(s, TextSegment::Static(_)))
		{
			let text: String = segments
				.iter()
				.map(|s| match s {
					TextSegment::Static(t) => t.as_str(),
					TextSegment::Interp(_) => "",
				})
				.collect();
			node.set_text_content(&text);
			return;
		}
		let segments = segments.to_vec();
		let ctx = ctx.clone();
		self.runtime.create_effect_in(scope, move || {
			let mut out = String::new();
			for segment in &segments {
				match segment {
					TextSegment::Static(t) => out.push_str(t),
					TextSegment::Interp(expr) => {
						out.push_str(&eval_or_null(expr, &ctx).display_text());
					}
				}
			}
			node.set_text_content(&out);
			None::<fn()>
		});
	}

	fn bind_directives(&self, node: &Node, template: &ElementTemplate, ctx: &Context, scope: &Scope) {
		for directive in &template.directives {
			match directive {
				Directive::On {
					event,
					modifiers,
					handler,
				} => self.bind_event(node, event, modifiers, handler, ctx, scope),
				Directive::Bind { attr, expr } => self.bind_attr(node, attr, expr, ctx, scope),
				Directive::Show(expr) => self.bind_show(node, expr, ctx, scope),
				Directive::Text(expr) => self.bind_text_directive(node, expr, ctx, scope),
				Directive::Html(expr) => self.bind_html(node, expr, ctx, scope),
				Directive::Model(expr) => self.bind_model(node, expr, ctx, scope),
				// Structural directives are the caller's concern.
				Directive::If(_) | Directive::For(_) => {}
			}
		}
	}

	fn bind_event(
		&self,
		node: &Node,
		event: &str,
		modifiers: &[EventModifier],
		handler: &Expr,
		ctx: &Context,
		scope: &Scope,
	) {
		let Some(bound) = BoundHandler::bind(handler, ctx) else {
			tracing::warn!(event, "event handler does not resolve to a function, listener skipped");
			return;
		};
		let modifiers = modifiers.to_vec();
		let id = node.add_event_listener(event, move |event| {
			for modifier in &modifiers {
				match modifier {
					EventModifier::Stop => event.stop_propagation(),
					EventModifier::Prevent => event.prevent_default(),
				}
			}
			bound.invoke(&[event_payload(event)]);
		});
		let node = node.clone();
		scope.add(move || node.remove_event_listener(id));
	}

	fn bind_attr(&self, node: &Node, attr: &str, expr: &Expr, ctx: &Context, scope: &Scope) {
		let node = node.clone();
		let attr = attr.to_string();
		let expr = expr.clone();
		let ctx = ctx.clone();
		self.runtime.create_effect_in(scope, move || {
			let value = eval_or_null(&expr, &ctx);
			apply_bound_attr(&node, &attr, &value);
			None::<fn()>
		});
	}

	fn bind_show(&self, node: &Node, expr: &Expr, ctx: &Context, scope: &Scope) {
		let node = node.clone();
		let expr = expr.clone();
		let ctx = ctx.clone();
		self.runtime.create_effect_in(scope, move || {
			if eval_or_null(&expr, &ctx).truthy() {
				node.remove_style("display");
			} else {
				node.set_style("display", "none");
			}
			None::<fn()>
		});
	}

	fn bind_text_directive(&self, node: &Node, expr: &Expr, ctx: &Context, scope: &Scope) {
		let node = node.clone();
		let expr = expr.clone();
		let ctx = ctx.clone();
		self.runtime.create_effect_in(scope, move || {
			node.set_text_content(&eval_or_null(&expr, &ctx).display_text());
			None::<fn()>
		});
	}

	fn bind_html(&self, node: &Node, expr: &Expr, ctx: &Context, scope: &Scope) {
		let node = node.clone();
		let expr = expr.clone();
		let ctx = ctx.clone();
		self.runtime.create_effect_in(scope, move || {
			node.set_inner_markup(&eval_or_null(&expr, &ctx).display_text());
			None::<fn()>
		});
	}

	fn bind_model(&self, node: &Node, expr: &Expr, ctx: &Context, scope: &Scope) {
		let signal = match resolve(expr, ctx) {
			Ok(Resolved::Signal(signal)) => signal,
			_ => {
				tracing::warn!("v-model requires a signal binding, ignored");
				return;
			}
		};
		let kind = control_kind(node);

		let control = node.clone();
		let source = signal.clone();
		self.runtime.create_effect_in(scope, move || {
			let value = source.get();
			match kind {
				ControlKind::Checkbox => control.set_checked(value.truthy()),
				ControlKind::Radio => {
					let own = control.get_attribute("value").unwrap_or_default();
					control.set_checked(value.display_text() == own);
				}
				ControlKind::Text => control.set_value(&value.display_text()),
			}
			None::<fn()>
		});

		let control = node.clone();
		let id = node.add_event_listener("input", move |_| match kind {
			ControlKind::Checkbox => signal.set(Value::Bool(control.checked())),
			ControlKind::Radio => {
				if control.checked() {
					signal.set(Value::String(
						control.get_attribute("value").unwrap_or_default(),
					));
				}
			}
			ControlKind::Text => signal.set(Value::String(control.value())),
		});
		let node = node.clone();
		scope.add(move || node.remove_event_listener(id));
	}

	fn build_if(
		&self,
		anchor: &Node,
		template: &Rc<ElementTemplate>,
		condition: &Expr,
		ctx: &Context,
		scope: &Scope,
	) {
		let compiler = self.clone();
		let template = Rc::clone(template);
		let condition = condition.clone();
		let ctx = ctx.clone();
		let anchor = anchor.clone();
		let owner = scope.clone();
		let mut last: Option<bool> = None;
		let mut live: Option<(Scope, Node)> = None;
		self.runtime.create_effect_in(scope, move || {
			let truthy = eval_or_null(&condition, &ctx).truthy();
			// Latch on the boolean: a condition that changes value but not
			// truthiness must not rebuild the region.
			if last == Some(truthy) {
				return None::<fn()>;
			}
			last = Some(truthy);
			if let Some((region, node)) = live.take() {
				region.destroy();
				node.remove();
			}
			if truthy {
				let region = owner.child();
				match compiler.build_node(&template, &ctx, &region) {
					Ok(node) => {
						anchor.insert_after(&node);
						live = Some((region, node));
					}
					Err(error) => {
						region.destroy();
						tracing::error!(%error, "conditional region failed to render");
					}
				}
			}
			None::<fn()>
		});
	}

	/// List rendering is teardown-and-rebuild: on any change to the list
	/// value, every item region is destroyed and the whole list is built
	/// fresh. No keyed reconciliation.
	fn build_for(
		&self,
		anchor: &Node,
		template: &Rc<ElementTemplate>,
		binding: &ForBinding,
		ctx: &Context,
		scope: &Scope,
	) {
		let compiler = self.clone();
		let template = Rc::clone(template);
		let binding = binding.clone();
		let ctx = ctx.clone();
		let anchor = anchor.clone();
		let owner = scope.clone();
		let mut items: Vec<(Scope, Node)> = Vec::new();
		self.runtime.create_effect_in(scope, move || {
			let list = eval_or_null(&binding.list, &ctx);
			for (region, node) in items.drain(..) {
				region.destroy();
				node.remove();
			}
			let values = match list {
				Value::Array(values) => values,
				Value::Null => Vec::new(),
				other => {
					tracing::warn!(value = %other, "v-for expects an array, rendering nothing");
					Vec::new()
				}
			};
			for (index, item) in values.into_iter().enumerate() {
				let mut item_ctx = ctx.with(binding.item.as_str(), Binding::Value(item));
				if let Some(index_name) = &binding.index {
					item_ctx = item_ctx.with(
						index_name.as_str(),
						Binding::Value(Value::Number(index as f64)),
					);
				}
				let region = owner.child();
				match compiler.build_node(&template, &item_ctx, &region) {
					Ok(node) => {
						anchor.insert_before(&node);
						items.push((region, node));
					}
					Err(error) => {
						region.destroy();
						tracing::error!(%error, "loop item failed to render");
					}
				}
			}
			None::<fn()>
		});
	}

	fn instantiate_component(
		&self,
		def: &Rc<ComponentDef>,
		usage: &ElementTemplate,
		ctx: &Context,
		scope: &Scope,
	) -> Result<Node, RenderError> {
		let comp_scope = scope.child();

		// Declared props become signals, kept in sync with the parent's
		// bound expressions by effects in the component's scope.
		let mut prop_signals = HashMap::new();
		for (name, default) in &def.props {
			let signal = self.runtime.create_signal(default.clone());
			let bound = usage.directives.iter().find_map(|d| match d {
				Directive::Bind { attr, expr } if attr == name => Some(expr.clone()),
				_ => None,
			});
			if let Some(expr) = bound {
				let parent_ctx = ctx.clone();
				let sync = signal.clone();
				self.runtime.create_effect_in(&comp_scope, move || {
					sync.set(eval_or_null(&expr, &parent_ctx));
					None::<fn()>
				});
			}
			prop_signals.insert(name.clone(), signal);
		}
		let props = Props { map: prop_signals };

		// `@event` on the component tag becomes an emit listener, bound in
		// the parent's context.
		let mut handlers: HashMap<String, EmitHandler> = HashMap::new();
		for directive in &usage.directives {
			if let Directive::On { event, handler, .. } = directive {
				match BoundHandler::bind(handler, ctx) {
					Some(bound) => {
						handlers.insert(
							event.clone(),
							Rc::new(move |args: &[Value]| bound.invoke(args)) as EmitHandler,
						);
					}
					None => tracing::warn!(
						event = %event,
						"component event handler does not resolve to a function"
					),
				}
			}
		}
		let emitter = Emitter::new(handlers);

		// The component context is isolated: props plus setup bindings,
		// nothing from the parent leaks in.
		let mut comp_ctx = Context::new();
		for (name, signal) in &props.map {
			comp_ctx.insert(name.clone(), Binding::Signal(signal.clone()));
		}
		if let Some(setup) = &def.setup {
			let setup_ctx = SetupContext::new(emitter, comp_scope.clone());
			for (name, binding) in setup(&props, &setup_ctx) {
				comp_ctx.insert(name, binding);
			}
		}

		let node = match self.compile(&def.template, &comp_ctx, &comp_scope) {
			Ok(node) => node,
			Err(error) => {
				comp_scope.destroy();
				return Err(error);
			}
		};
		for (name, value) in &usage.attrs {
			node.set_attribute(name, value);
		}
		if !usage.children.is_empty() {
			tracing::debug!(tag = %usage.tag, "component children are ignored (no slots)");
		}
		Ok(node)
	}
}

impl Clone for Compiler {
	fn clone(&self) -> Self {
		Self {
			runtime: self.runtime.clone(),
			document: self.document.clone(),
			registry: Rc::clone(&self.registry),
		}
	}
}

fn find_for(template: &ElementTemplate) -> Option<&ForBinding> {
	template.directives.iter().find_map(|d| match d {
		Directive::For(binding) => Some(binding),
		_ => None,
	})
}

fn find_if(template: &ElementTemplate) -> Option<&Expr> {
	template.directives.iter().find_map(|d| match d {
		Directive::If(condition) => Some(condition),
		_ => None,
	})
}

/// A handler expression resolved once at bind time. A call form fixes its
/// argument expressions (re-evaluated per invocation); the dynamic payload
/// (event object or emit arguments) is appended after them.
struct BoundHandler {
	func: lume_template::ContextFn,
	fixed_args: Vec<Expr>,
	ctx: Context,
}

impl BoundHandler {
	fn bind(expr: &Expr, ctx: &Context) -> Option<BoundHandler> {
		let (callee, fixed_args) = match expr {
			Expr::Call(callee, args) => (callee.as_ref(), args.clone()),
			other => (other, Vec::new()),
		};
		match resolve(callee, ctx) {
			Ok(Resolved::Func(func)) => Some(BoundHandler {
				func,
				fixed_args,
				ctx: ctx.clone(),
			}),
			_ => None,
		}
	}

	fn invoke(&self, payload: &[Value]) {
		let mut values: Vec<Value> = self
			.fixed_args
			.iter()
			.map(|arg| eval_or_null(arg, &self.ctx))
			.collect();
		values.extend_from_slice(payload);
		(self.func)(&values);
	}
}

fn event_payload(event: &Event) -> Value {
	let mut map = BTreeMap::new();
	map.insert(
		"type".to_string(),
		Value::String(event.event_type().to_string()),
	);
	map.insert("value".to_string(), Value::String(event.target().value()));
	map.insert("checked".to_string(), Value::Bool(event.target().checked()));
	Value::Object(map)
}

#[derive(Clone, Copy)]
enum ControlKind {
	Checkbox,
	Radio,
	Text,
}

fn control_kind(node: &Node) -> ControlKind {
	match node.get_attribute("type").as_deref() {
		Some("checkbox") => ControlKind::Checkbox,
		Some("radio") => ControlKind::Radio,
		_ => ControlKind::Text,
	}
}

fn apply_bound_attr(node: &Node, attr: &str, value: &Value) {
	match attr {
		"class" => match value {
			Value::Null => node.remove_attribute("class"),
			Value::Array(items) => {
				let classes: Vec<String> = items
					.iter()
					.filter(|v| v.truthy())
					.map(Value::display_text)
					.collect();
				node.set_attribute("class", &classes.join(" "));
			}
			Value::Object(map) => {
				let classes: Vec<&str> = map
					.iter()
					.filter(|(_, v)| v.truthy())
					.map(|(k, _)| k.as_str())
					.collect();
				node.set_attribute("class", &classes.join(" "));
			}
			other => node.set_attribute("class", &other.display_text()),
		},
		"style" => match value {
			Value::Object(map) => {
				for (property, v) in map {
					match v {
						Value::Null => node.remove_style(property),
						_ => node.set_style(property, &v.display_text()),
					}
				}
			}
			Value::Null => {}
			_ => tracing::warn!(":style expects an object value, ignored"),
		},
		_ => match value {
			Value::Null | Value::Bool(false) => node.remove_attribute(attr),
			Value::Bool(true) => node.set_attribute(attr, ""),
			other => node.set_attribute(attr, &other.display_text()),
		},
	}
}
