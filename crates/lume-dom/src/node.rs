//! Document tree nodes.
//!
//! Three node kinds exist: elements, text, and comments. Comments double
//! as structural anchors: conditional and loop regions keep a comment in
//! the tree at all times and insert their rendered output next to it.
//!
//! Invalid tree operations (inserting relative to a detached node,
//! appending to a text node) are logged and ignored rather than panicking;
//! the tree is always left in a consistent state.

use core::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::event::Event;

/// Identifier returned by [`Node::add_event_listener`], used to detach the
/// listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

struct Listener {
	id: ListenerId,
	event: String,
	handler: Rc<dyn Fn(&Event)>,
}

pub(crate) enum NodeKind {
	Element(ElementData),
	Text(RefCell<String>),
	Comment(String),
}

pub(crate) struct ElementData {
	tag: String,
	attrs: RefCell<BTreeMap<String, String>>,
	styles: RefCell<BTreeMap<String, String>>,
	// Raw markup installed via `set_inner_markup`; mutually exclusive with
	// children.
	inner_markup: RefCell<Option<String>>,
	value: RefCell<String>,
	checked: Cell<bool>,
	listeners: RefCell<Vec<Listener>>,
	next_listener_id: Cell<u64>,
	children: RefCell<Vec<Node>>,
}

pub(crate) struct NodeData {
	kind: NodeKind,
	parent: RefCell<Weak<NodeData>>,
}

/// A handle to one node in the document tree. Cheap to clone; all clones
/// refer to the same node.
pub struct Node {
	inner: Rc<NodeData>,
}

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

impl Node {
	pub(crate) fn new_element(tag: &str) -> Node {
		Node {
			inner: Rc::new(NodeData {
				kind: NodeKind::Element(ElementData {
					tag: tag.to_ascii_lowercase(),
					attrs: RefCell::new(BTreeMap::new()),
					styles: RefCell::new(BTreeMap::new()),
					inner_markup: RefCell::new(None),
					value: RefCell::new(String::new()),
					checked: Cell::new(false),
					listeners: RefCell::new(Vec::new()),
					next_listener_id: Cell::new(0),
					children: RefCell::new(Vec::new()),
				}),
				parent: RefCell::new(Weak::new()),
			}),
		}
	}

	pub(crate) fn new_text(text: &str) -> Node {
		Node {
			inner: Rc::new(NodeData {
				kind: NodeKind::Text(RefCell::new(text.to_string())),
				parent: RefCell::new(Weak::new()),
			}),
		}
	}

	pub(crate) fn new_comment(text: &str) -> Node {
		Node {
			inner: Rc::new(NodeData {
				kind: NodeKind::Comment(text.to_string()),
				parent: RefCell::new(Weak::new()),
			}),
		}
	}

	/// The element tag name, lower-cased. `None` for text and comments.
	pub fn tag(&self) -> Option<&str> {
		match &self.inner.kind {
			NodeKind::Element(el) => Some(el.tag.as_str()),
			_ => None,
		}
	}

	pub fn is_element(&self) -> bool {
		matches!(self.inner.kind, NodeKind::Element(_))
	}

	pub fn is_text(&self) -> bool {
		matches!(self.inner.kind, NodeKind::Text(_))
	}

	pub fn is_comment(&self) -> bool {
		matches!(self.inner.kind, NodeKind::Comment(_))
	}

	pub fn set_attribute(&self, name: &str, value: &str) {
		if let NodeKind::Element(el) = &self.inner.kind {
			el.attrs
				.borrow_mut()
				.insert(name.to_string(), value.to_string());
		}
	}

	pub fn get_attribute(&self, name: &str) -> Option<String> {
		match &self.inner.kind {
			NodeKind::Element(el) => el.attrs.borrow().get(name).cloned(),
			_ => None,
		}
	}

	pub fn remove_attribute(&self, name: &str) {
		if let NodeKind::Element(el) = &self.inner.kind {
			el.attrs.borrow_mut().remove(name);
		}
	}

	pub fn set_style(&self, property: &str, value: &str) {
		if let NodeKind::Element(el) = &self.inner.kind {
			el.styles
				.borrow_mut()
				.insert(property.to_string(), value.to_string());
		}
	}

	pub fn remove_style(&self, property: &str) {
		if let NodeKind::Element(el) = &self.inner.kind {
			el.styles.borrow_mut().remove(property);
		}
	}

	pub fn get_style(&self, property: &str) -> Option<String> {
		match &self.inner.kind {
			NodeKind::Element(el) => el.styles.borrow().get(property).cloned(),
			_ => None,
		}
	}

	/// Replace the node's textual content.
	///
	/// On a text node this rewrites the text in place; on an element it
	/// drops all children (and any raw markup) and installs a single text
	/// child.
	pub fn set_text_content(&self, text: &str) {
		match &self.inner.kind {
			NodeKind::Text(content) => *content.borrow_mut() = text.to_string(),
			NodeKind::Element(el) => {
				let old = std::mem::take(&mut *el.children.borrow_mut());
				for child in old {
					*child.inner.parent.borrow_mut() = Weak::new();
				}
				*el.inner_markup.borrow_mut() = None;
				if !text.is_empty() {
					self.append_child(&Node::new_text(text));
				}
			}
			NodeKind::Comment(_) => {
				tracing::warn!("set_text_content on a comment node is ignored");
			}
		}
	}

	/// The concatenated text of this node and its descendants. Comments
	/// and raw markup contribute nothing.
	pub fn text_content(&self) -> String {
		match &self.inner.kind {
			NodeKind::Text(content) => content.borrow().clone(),
			NodeKind::Comment(_) => String::new(),
			NodeKind::Element(el) => {
				let mut out = String::new();
				for child in el.children.borrow().iter() {
					out.push_str(&child.text_content());
				}
				out
			}
		}
	}

	/// Install raw markup as this element's content, dropping any children.
	/// The markup is stored verbatim and reproduced by [`Node::to_html`];
	/// it is not parsed back into nodes.
	pub fn set_inner_markup(&self, markup: &str) {
		let NodeKind::Element(el) = &self.inner.kind else {
			tracing::warn!("set_inner_markup on a non-element node is ignored");
			return;
		};
		let old = std::mem::take(&mut *el.children.borrow_mut());
		for child in old {
			*child.inner.parent.borrow_mut() = Weak::new();
		}
		*el.inner_markup.borrow_mut() = Some(markup.to_string());
	}

	pub fn inner_markup(&self) -> Option<String> {
		match &self.inner.kind {
			NodeKind::Element(el) => el.inner_markup.borrow().clone(),
			_ => None,
		}
	}

	/// The current value of a form control.
	pub fn value(&self) -> String {
		match &self.inner.kind {
			NodeKind::Element(el) => el.value.borrow().clone(),
			_ => String::new(),
		}
	}

	pub fn set_value(&self, value: &str) {
		if let NodeKind::Element(el) = &self.inner.kind {
			*el.value.borrow_mut() = value.to_string();
		}
	}

	pub fn checked(&self) -> bool {
		match &self.inner.kind {
			NodeKind::Element(el) => el.checked.get(),
			_ => false,
		}
	}

	pub fn set_checked(&self, checked: bool) {
		if let NodeKind::Element(el) = &self.inner.kind {
			el.checked.set(checked);
		}
	}

	/// Register a handler for `event` on this element. Listeners fire in
	/// registration order; events bubble to ancestors afterwards.
	pub fn add_event_listener(
		&self,
		event: &str,
		handler: impl Fn(&Event) + 'static,
	) -> ListenerId {
		let NodeKind::Element(el) = &self.inner.kind else {
			tracing::warn!("add_event_listener on a non-element node is ignored");
			return ListenerId(u64::MAX);
		};
		let id = ListenerId(el.next_listener_id.get());
		el.next_listener_id.set(id.0 + 1);
		el.listeners.borrow_mut().push(Listener {
			id,
			event: event.to_string(),
			handler: Rc::new(handler),
		});
		id
	}

	pub fn remove_event_listener(&self, id: ListenerId) {
		if let NodeKind::Element(el) = &self.inner.kind {
			el.listeners.borrow_mut().retain(|l| l.id != id);
		}
	}

	/// Fire an event of the given type at this node and let it bubble up
	/// through the ancestor chain until [`Event::stop_propagation`] is
	/// called or the root is reached. Returns the event so callers can
	/// inspect `default_prevented`.
	pub fn dispatch(&self, event_type: &str) -> Event {
		let event = Event::new(event_type, self.clone());
		let mut current = Some(self.clone());
		while let Some(node) = current {
			// Snapshot the matching handlers so one of them may mutate the
			// listener list without poisoning the borrow.
			let handlers: Vec<Rc<dyn Fn(&Event)>> = match &node.inner.kind {
				NodeKind::Element(el) => el
					.listeners
					.borrow()
					.iter()
					.filter(|l| l.event == event_type)
					.map(|l| Rc::clone(&l.handler))
					.collect(),
				_ => Vec::new(),
			};
			for handler in handlers {
				handler(&event);
			}
			if event.propagation_stopped() {
				break;
			}
			current = node.parent();
		}
		event
	}

	pub fn parent(&self) -> Option<Node> {
		self.inner.parent.borrow().upgrade().map(|inner| Node { inner })
	}

	pub fn children(&self) -> Vec<Node> {
		match &self.inner.kind {
			NodeKind::Element(el) => el.children.borrow().clone(),
			_ => Vec::new(),
		}
	}

	fn detach(&self) {
		if let Some(parent) = self.parent() {
			if let NodeKind::Element(el) = &parent.inner.kind {
				el.children
					.borrow_mut()
					.retain(|c| !Rc::ptr_eq(&c.inner, &self.inner));
			}
		}
		*self.inner.parent.borrow_mut() = Weak::new();
	}

	/// Append `child` as the last child of this element, detaching it from
	/// any previous parent first.
	pub fn append_child(&self, child: &Node) {
		let NodeKind::Element(el) = &self.inner.kind else {
			tracing::warn!("append_child on a non-element node is ignored");
			return;
		};
		child.detach();
		*child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
		el.children.borrow_mut().push(child.clone());
	}

	/// Insert `node` as a sibling immediately before this node.
	pub fn insert_before(&self, node: &Node) {
		self.insert_sibling(node, 0);
	}

	/// Insert `node` as a sibling immediately after this node.
	pub fn insert_after(&self, node: &Node) {
		self.insert_sibling(node, 1);
	}

	fn insert_sibling(&self, node: &Node, offset: usize) {
		let Some(parent) = self.parent() else {
			tracing::warn!("sibling insert relative to a detached node is ignored");
			return;
		};
		node.detach();
		let NodeKind::Element(el) = &parent.inner.kind else {
			return;
		};
		let mut children = el.children.borrow_mut();
		let Some(index) = children
			.iter()
			.position(|c| Rc::ptr_eq(&c.inner, &self.inner))
		else {
			tracing::warn!("sibling insert anchor is no longer in its parent");
			return;
		};
		*node.inner.parent.borrow_mut() = Rc::downgrade(&parent.inner);
		children.insert(index + offset, node.clone());
	}

	/// Detach this node from its parent. No-op if already detached.
	pub fn remove(&self) {
		self.detach();
	}

	/// Copy this node. Attributes, styles, form-control state, and raw
	/// markup are copied; event listeners and the parent link are not.
	/// With `deep`, descendants are cloned recursively.
	pub fn clone_node(&self, deep: bool) -> Node {
		match &self.inner.kind {
			NodeKind::Text(content) => Node::new_text(&content.borrow()),
			NodeKind::Comment(text) => Node::new_comment(text),
			NodeKind::Element(el) => {
				let copy = Node::new_element(&el.tag);
				let NodeKind::Element(copy_el) = &copy.inner.kind else {
					unreachable!("new_element builds an element");
				};
				*copy_el.attrs.borrow_mut() = el.attrs.borrow().clone();
				*copy_el.styles.borrow_mut() = el.styles.borrow().clone();
				*copy_el.inner_markup.borrow_mut() = el.inner_markup.borrow().clone();
				*copy_el.value.borrow_mut() = el.value.borrow().clone();
				copy_el.checked.set(el.checked.get());
				if deep {
					for child in el.children.borrow().iter() {
						copy.append_child(&child.clone_node(true));
					}
				}
				copy
			}
		}
	}

	/// Swap this node out of the tree, putting `node` in its place.
	pub fn replace_with(&self, node: &Node) {
		let Some(parent) = self.parent() else {
			tracing::warn!("replace_with on a detached node is ignored");
			return;
		};
		node.detach();
		if let NodeKind::Element(el) = &parent.inner.kind {
			let mut children = el.children.borrow_mut();
			if let Some(index) = children
				.iter()
				.position(|c| Rc::ptr_eq(&c.inner, &self.inner))
			{
				*node.inner.parent.borrow_mut() = Rc::downgrade(&parent.inner);
				children[index] = node.clone();
			}
		}
		*self.inner.parent.borrow_mut() = Weak::new();
	}

	/// Serialize this node and its descendants to markup.
	pub fn to_html(&self) -> String {
		let mut out = String::new();
		self.write_html(&mut out);
		out
	}

	fn write_html(&self, out: &mut String) {
		match &self.inner.kind {
			NodeKind::Text(content) => out.push_str(&escape_text(&content.borrow())),
			NodeKind::Comment(text) => {
				out.push_str("<!--");
				out.push_str(text);
				out.push_str("-->");
			}
			NodeKind::Element(el) => {
				out.push('<');
				out.push_str(&el.tag);
				for (name, value) in el.attrs.borrow().iter() {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					out.push_str(&escape_attr(value));
					out.push('"');
				}
				let styles = el.styles.borrow();
				if !styles.is_empty() {
					out.push_str(" style=\"");
					for (i, (property, value)) in styles.iter().enumerate() {
						if i > 0 {
							out.push(' ');
						}
						out.push_str(property);
						out.push_str(": ");
						out.push_str(&escape_attr(value));
						out.push(';');
					}
					out.push('"');
				}
				out.push('>');
				if VOID_TAGS.contains(&el.tag.as_str()) {
					return;
				}
				if let Some(markup) = el.inner_markup.borrow().as_deref() {
					out.push_str(markup);
				} else {
					for child in el.children.borrow().iter() {
						child.write_html(out);
					}
				}
				out.push_str("</");
				out.push_str(&el.tag);
				out.push('>');
			}
		}
	}

	/// Identity comparison between node handles.
	pub fn ptr_eq(a: &Node, b: &Node) -> bool {
		Rc::ptr_eq(&a.inner, &b.inner)
	}
}

impl Clone for Node {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl core::fmt::Debug for Node {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match &self.inner.kind {
			NodeKind::Element(el) => write!(f, "Node::Element(<{}>)", el.tag),
			NodeKind::Text(content) => write!(f, "Node::Text({:?})", content.borrow()),
			NodeKind::Comment(text) => write!(f, "Node::Comment({text:?})"),
		}
	}
}

fn escape_text(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
	escape_text(value).replace('"', "&quot;")
}
