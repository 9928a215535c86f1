//! Document handle: node construction and lookup.

use std::rc::Rc;

use crate::node::Node;

/// An in-memory document. Owns a `<body>` element that serves as the root
/// for [`Document::query_selector`].
pub struct Document {
	inner: Rc<DocumentInner>,
}

struct DocumentInner {
	body: Node,
}

impl Document {
	pub fn new() -> Self {
		Self {
			inner: Rc::new(DocumentInner {
				body: Node::new_element("body"),
			}),
		}
	}

	pub fn body(&self) -> &Node {
		&self.inner.body
	}

	pub fn create_element(&self, tag: &str) -> Node {
		Node::new_element(tag)
	}

	pub fn create_text_node(&self, text: &str) -> Node {
		Node::new_text(text)
	}

	pub fn create_comment(&self, text: &str) -> Node {
		Node::new_comment(text)
	}

	/// Find the first element under `<body>` matching a simple selector:
	/// `#id`, `.class`, or a bare tag name. Depth-first document order.
	pub fn query_selector(&self, selector: &str) -> Option<Node> {
		find_match(&self.inner.body, selector)
	}
}

fn find_match(node: &Node, selector: &str) -> Option<Node> {
	if matches(node, selector) {
		return Some(node.clone());
	}
	for child in node.children() {
		if let Some(found) = find_match(&child, selector) {
			return Some(found);
		}
	}
	None
}

fn matches(node: &Node, selector: &str) -> bool {
	if !node.is_element() {
		return false;
	}
	if let Some(id) = selector.strip_prefix('#') {
		return node.get_attribute("id").is_some_and(|v| v == id);
	}
	if let Some(class) = selector.strip_prefix('.') {
		return node
			.get_attribute("class")
			.is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class));
	}
	node.tag()
		.is_some_and(|t| t == selector.to_ascii_lowercase())
}

impl Clone for Document {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_document() -> Document {
		let doc = Document::new();
		let app = doc.create_element("div");
		app.set_attribute("id", "app");
		let button = doc.create_element("button");
		button.set_attribute("class", "primary large");
		app.append_child(&button);
		doc.body().append_child(&app);
		doc
	}

	#[test]
	fn test_query_by_id() {
		let doc = sample_document();
		let found = doc.query_selector("#app").unwrap();
		assert_eq!(found.tag(), Some("div"));
	}

	#[test]
	fn test_query_by_class() {
		let doc = sample_document();
		let found = doc.query_selector(".large").unwrap();
		assert_eq!(found.tag(), Some("button"));
	}

	#[test]
	fn test_query_by_tag() {
		let doc = sample_document();
		assert!(doc.query_selector("button").is_some());
		assert!(doc.query_selector("nav").is_none());
	}

	#[test]
	fn test_query_misses_detached_nodes() {
		let doc = Document::new();
		let orphan = doc.create_element("div");
		orphan.set_attribute("id", "orphan");
		assert!(doc.query_selector("#orphan").is_none());
	}
}
