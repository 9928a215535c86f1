//! Template string parsing.
//!
//! Turns markup into a static tree of [`ElementTemplate`] and text nodes
//! with their `{{ ... }}` interpolations pre-parsed. Parsing happens once
//! per template (at component registration or app construction); rendering
//! walks the parsed tree, never the source string.
//!
//! The grammar is intentionally small: elements, attributes (quoted or
//! bare), self-closing tags, comments, and text. Anything resembling a
//! doctype, CDATA, or script content is out of scope.

use std::rc::Rc;

use crate::directive::{Directive, parse_directive};
use crate::error::TemplateError;
use crate::expr::{Expr, parse_expr};

/// One node of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
	Element(Rc<ElementTemplate>),
	Text(Vec<TextSegment>),
}

/// A parsed element: static attributes, directives, and children.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTemplate {
	pub tag: String,
	pub attrs: Vec<(String, String)>,
	pub directives: Vec<Directive>,
	pub children: Vec<TemplateNode>,
}

/// A run of literal text or one `{{ expr }}` interpolation.
#[derive(Debug, Clone, PartialEq)]
pub enum TextSegment {
	Static(String),
	Interp(Expr),
}

/// Elements that never have children or a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Parse a template into its root element.
///
/// The template must contain exactly one root element; leading whitespace
/// and comments are skipped, trailing content after the root is ignored.
pub fn parse_template(input: &str) -> Result<Rc<ElementTemplate>, TemplateError> {
	let mut cur = Cursor::new(input);
	cur.skip_whitespace_and_comments()?;
	if !cur.at_element_start() {
		return Err(TemplateError::EmptyTemplate);
	}
	let root = parse_element(&mut cur)?;
	Ok(Rc::new(root))
}

struct Cursor<'a> {
	src: &'a str,
	pos: usize,
}

impl<'a> Cursor<'a> {
	fn new(src: &'a str) -> Self {
		Self { src, pos: 0 }
	}

	fn rest(&self) -> &'a str {
		&self.src[self.pos..]
	}

	fn eat(&mut self, prefix: &str) -> bool {
		if self.rest().starts_with(prefix) {
			self.pos += prefix.len();
			true
		} else {
			false
		}
	}

	fn advance(&mut self, bytes: usize) {
		self.pos += bytes;
	}

	fn skip_whitespace(&mut self) {
		let rest = self.rest();
		self.pos += rest.len() - rest.trim_start().len();
	}

	fn skip_whitespace_and_comments(&mut self) -> Result<(), TemplateError> {
		loop {
			self.skip_whitespace();
			if self.rest().starts_with("<!--") {
				self.skip_comment()?;
			} else {
				return Ok(());
			}
		}
	}

	fn skip_comment(&mut self) -> Result<(), TemplateError> {
		match self.rest().find("-->") {
			Some(end) => {
				self.advance(end + 3);
				Ok(())
			}
			None => Err(TemplateError::UnexpectedEof("!--".to_string())),
		}
	}

	fn at_element_start(&self) -> bool {
		let mut chars = self.rest().chars();
		chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
	}

	fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
		let rest = self.rest();
		let end = rest
			.char_indices()
			.find(|(_, c)| !pred(*c))
			.map_or(rest.len(), |(i, _)| i);
		self.advance(end);
		&rest[..end]
	}

	fn take_until_char(&mut self, delim: char, context: &str) -> Result<&'a str, TemplateError> {
		let rest = self.rest();
		match rest.find(delim) {
			Some(end) => {
				self.advance(end);
				Ok(&rest[..end])
			}
			None => Err(TemplateError::UnexpectedEof(context.to_string())),
		}
	}
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '-'
}

fn parse_element(cur: &mut Cursor<'_>) -> Result<ElementTemplate, TemplateError> {
	cur.eat("<");
	let tag = cur.take_while(is_name_char).to_ascii_lowercase();

	let mut attrs = Vec::new();
	let mut directives = Vec::new();
	let mut self_closing = false;
	loop {
		cur.skip_whitespace();
		if cur.eat("/>") {
			self_closing = true;
			break;
		}
		if cur.eat(">") {
			break;
		}
		if cur.rest().is_empty() {
			return Err(TemplateError::UnexpectedEof(tag));
		}
		let name = cur
			.take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
			.to_string();
		if name.is_empty() {
			// Stray character (e.g. a lone '/'); step over it.
			cur.advance(1);
			continue;
		}
		cur.skip_whitespace();
		let value = if cur.eat("=") {
			cur.skip_whitespace();
			if cur.eat("\"") {
				let v = cur.take_until_char('"', &tag)?.to_string();
				cur.advance(1);
				v
			} else if cur.eat("'") {
				let v = cur.take_until_char('\'', &tag)?.to_string();
				cur.advance(1);
				v
			} else {
				cur.take_while(|c| !c.is_whitespace() && c != '>').to_string()
			}
		} else {
			String::new()
		};
		match parse_directive(&name, &value)? {
			Some(directive) => directives.push(directive),
			None => attrs.push((name, value)),
		}
	}

	let mut element = ElementTemplate {
		tag,
		attrs,
		directives,
		children: Vec::new(),
	};
	if self_closing || VOID_TAGS.contains(&element.tag.as_str()) {
		return Ok(element);
	}
	element.children = parse_children(cur, &element.tag)?;
	Ok(element)
}

fn parse_children(
	cur: &mut Cursor<'_>,
	parent_tag: &str,
) -> Result<Vec<TemplateNode>, TemplateError> {
	let mut children = Vec::new();
	loop {
		if cur.rest().is_empty() {
			return Err(TemplateError::UnexpectedEof(parent_tag.to_string()));
		}
		if cur.eat("</") {
			let found = cur.take_while(is_name_char).to_ascii_lowercase();
			cur.skip_whitespace();
			if !cur.eat(">") {
				return Err(TemplateError::UnexpectedEof(parent_tag.to_string()));
			}
			if found != parent_tag {
				return Err(TemplateError::MismatchedClosingTag {
					expected: parent_tag.to_string(),
					found,
				});
			}
			return Ok(children);
		}
		if cur.rest().starts_with("<!--") {
			cur.skip_comment()?;
			continue;
		}
		if cur.at_element_start() {
			let child = parse_element(cur)?;
			children.push(TemplateNode::Element(Rc::new(child)));
			continue;
		}
		let text = take_text_run(cur);
		if let Some(segments) = parse_text_segments(text)? {
			children.push(TemplateNode::Text(segments));
		}
	}
}

/// Consume text up to the next construct the child loop recognizes: a
/// closing tag, a comment, or an element start. A stray `<` that begins
/// none of these is ordinary text.
fn take_text_run<'a>(cur: &mut Cursor<'a>) -> &'a str {
	let rest = cur.rest();
	let mut end = rest.len();
	for (i, c) in rest.char_indices() {
		if i == 0 || c != '<' {
			continue;
		}
		let ahead = &rest[i..];
		if ahead.starts_with("</")
			|| ahead.starts_with("<!--")
			|| ahead
				.chars()
				.nth(1)
				.is_some_and(|c| c.is_ascii_alphabetic())
		{
			end = i;
			break;
		}
	}
	cur.advance(end);
	&rest[..end]
}

/// Split a text run into static and interpolated segments. Returns `None`
/// for whitespace-only text with no interpolations, which rendering drops.
fn parse_text_segments(text: &str) -> Result<Option<Vec<TextSegment>>, TemplateError> {
	let mut segments = Vec::new();
	let mut has_interp = false;
	let mut rest = text;
	while let Some(start) = rest.find("{{") {
		let leading = &rest[..start];
		if !leading.is_empty() {
			segments.push(TextSegment::Static(leading.to_string()));
		}
		let after = &rest[start + 2..];
		let Some(end) = after.find("}}") else {
			return Err(TemplateError::UnclosedInterpolation);
		};
		segments.push(TextSegment::Interp(parse_expr(&after[..end])?));
		has_interp = true;
		rest = &after[end + 2..];
	}
	if !rest.is_empty() {
		segments.push(TextSegment::Static(rest.to_string()));
	}
	if !has_interp && text.trim().is_empty() {
		return Ok(None);
	}
	Ok(Some(segments))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::directive::{Directive, EventModifier};
	use crate::value::Value;

	#[test]
	fn test_counter_template() {
		let root = parse_template(
			r#"<div><p>Count: {{ count }}</p><button @click="inc()">+1</button></div>"#,
		)
		.unwrap();
		assert_eq!(root.tag, "div");
		assert_eq!(root.children.len(), 2);

		let TemplateNode::Element(p) = &root.children[0] else {
			panic!("expected element");
		};
		assert_eq!(
			p.children,
			vec![TemplateNode::Text(vec![
				TextSegment::Static("Count: ".into()),
				TextSegment::Interp(Expr::Ident("count".into())),
			])]
		);

		let TemplateNode::Element(button) = &root.children[1] else {
			panic!("expected element");
		};
		match &button.directives[0] {
			Directive::On { event, modifiers, .. } => {
				assert_eq!(event, "click");
				assert!(modifiers.is_empty());
			}
			other => panic!("expected On, got {other:?}"),
		}
	}

	#[test]
	fn test_static_attrs_and_directives_are_separated() {
		let root =
			parse_template(r#"<div id="app" :title="label" v-show="open" class="box"></div>"#)
				.unwrap();
		assert_eq!(
			root.attrs,
			vec![
				("id".to_string(), "app".to_string()),
				("class".to_string(), "box".to_string()),
			]
		);
		assert_eq!(root.directives.len(), 2);
	}

	#[test]
	fn test_single_quoted_and_bare_attribute_values() {
		let root = parse_template("<div id='main' hidden data-x=5></div>").unwrap();
		assert_eq!(
			root.attrs,
			vec![
				("id".to_string(), "main".to_string()),
				("hidden".to_string(), String::new()),
				("data-x".to_string(), "5".to_string()),
			]
		);
	}

	#[test]
	fn test_whitespace_only_text_is_dropped() {
		let root = parse_template("<ul>\n\t<li>a</li>\n\t<li>b</li>\n</ul>").unwrap();
		assert_eq!(root.children.len(), 2);
	}

	#[test]
	fn test_comments_are_skipped() {
		let root =
			parse_template("<!-- header --><div><!-- inner --><span>x</span></div>").unwrap();
		assert_eq!(root.children.len(), 1);
	}

	#[test]
	fn test_void_and_self_closing_elements() {
		let root = parse_template(r#"<div><input type="text"><item-row/></div>"#).unwrap();
		assert_eq!(root.children.len(), 2);
		let TemplateNode::Element(input) = &root.children[0] else {
			panic!("expected element");
		};
		assert_eq!(input.tag, "input");
		let TemplateNode::Element(row) = &root.children[1] else {
			panic!("expected element");
		};
		assert_eq!(row.tag, "item-row");
	}

	#[test]
	fn test_mismatched_closing_tag() {
		let err = parse_template("<div><span></div></span>").unwrap_err();
		assert!(matches!(err, TemplateError::MismatchedClosingTag { .. }));
	}

	#[test]
	fn test_unclosed_element() {
		let err = parse_template("<div><span>x</span>").unwrap_err();
		assert!(matches!(err, TemplateError::UnexpectedEof(tag) if tag == "div"));
	}

	#[test]
	fn test_unclosed_interpolation() {
		let err = parse_template("<p>{{ count </p>").unwrap_err();
		assert!(matches!(err, TemplateError::UnclosedInterpolation));
	}

	#[test]
	fn test_empty_template() {
		assert!(matches!(
			parse_template("   "),
			Err(TemplateError::EmptyTemplate)
		));
		assert!(matches!(
			parse_template("just text"),
			Err(TemplateError::EmptyTemplate)
		));
	}

	#[test]
	fn test_trailing_content_after_root_is_ignored() {
		let root = parse_template("<div>a</div><div>b</div>").unwrap();
		assert_eq!(root.children.len(), 1);
	}

	#[test]
	fn test_stray_angle_bracket_is_text() {
		let root = parse_template("<p>1 < 2</p>").unwrap();
		assert_eq!(
			root.children,
			vec![TemplateNode::Text(vec![TextSegment::Static(
				"1 < 2".into()
			)])]
		);
	}

	#[test]
	fn test_bad_directive_expression_surfaces() {
		let err = parse_template(r#"<div v-if="1 +"></div>"#).unwrap_err();
		assert!(matches!(err, TemplateError::InvalidExpression(_)));
	}

	#[test]
	fn test_v_for_attribute_parses() {
		let root = parse_template(r#"<li v-for="(item, i) in items">{{ item }}</li>"#).unwrap();
		match &root.directives[0] {
			Directive::For(binding) => {
				assert_eq!(binding.item, "item");
				assert_eq!(binding.index.as_deref(), Some("i"));
			}
			other => panic!("expected For, got {other:?}"),
		}
	}

	#[test]
	fn test_event_modifier_attribute() {
		let root = parse_template(r#"<a @click.prevent="go()">x</a>"#).unwrap();
		match &root.directives[0] {
			Directive::On { modifiers, .. } => {
				assert_eq!(modifiers, &[EventModifier::Prevent]);
			}
			other => panic!("expected On, got {other:?}"),
		}
	}

	#[test]
	fn test_interpolation_with_literal() {
		let root = parse_template("<p>{{ 'hi' }}</p>").unwrap();
		assert_eq!(
			root.children,
			vec![TemplateNode::Text(vec![TextSegment::Interp(
				Expr::Literal(Value::String("hi".into()))
			)])]
		);
	}
}
