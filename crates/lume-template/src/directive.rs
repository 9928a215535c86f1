//! Directive attribute parsing.
//!
//! Attributes on template elements are classified during template parsing:
//! anything starting with `@`, `v-on:`, `:`, or `v-bind:`, plus the
//! reserved `v-*` names, becomes a [`Directive`]; everything else stays a
//! plain static attribute.

use nom::{
	IResult, Parser,
	branch::alt,
	bytes::complete::tag,
	character::complete::{multispace0, multispace1},
	combinator::map,
	sequence::{delimited, preceded, separated_pair},
};

use crate::error::TemplateError;
use crate::expr::{Expr, expression, identifier, parse_expr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventModifier {
	/// `.stop`: stop propagation before invoking the handler.
	Stop,
	/// `.prevent`: mark the event default-prevented before invoking.
	Prevent,
}

/// The loop head of `v-for`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForBinding {
	pub item: String,
	pub index: Option<String>,
	pub list: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
	/// `@click` / `v-on:click`, with optional `.stop` / `.prevent`.
	On {
		event: String,
		modifiers: Vec<EventModifier>,
		handler: Expr,
	},
	/// `:attr` / `v-bind:attr`.
	Bind { attr: String, expr: Expr },
	/// `v-show`: toggle `display: none` while keeping the node in place.
	Show(Expr),
	/// `v-text`: replace the element's text content.
	Text(Expr),
	/// `v-html`: install the value as raw markup.
	Html(Expr),
	/// `v-model`: two-way binding to a signal on a form control.
	Model(Expr),
	/// `v-if`: create and destroy the subtree on a condition.
	If(Expr),
	/// `v-for`: render the subtree once per list item.
	For(ForBinding),
}

/// Classify one attribute. `Ok(None)` means it is a plain static
/// attribute, not a directive.
pub fn parse_directive(name: &str, value: &str) -> Result<Option<Directive>, TemplateError> {
	if let Some(rest) = name.strip_prefix('@') {
		return parse_on(rest, value).map(Some);
	}
	if let Some(rest) = name.strip_prefix("v-on:") {
		return parse_on(rest, value).map(Some);
	}
	if let Some(attr) = name.strip_prefix(':') {
		return Ok(Some(Directive::Bind {
			attr: attr.to_string(),
			expr: parse_expr(value)?,
		}));
	}
	if let Some(attr) = name.strip_prefix("v-bind:") {
		return Ok(Some(Directive::Bind {
			attr: attr.to_string(),
			expr: parse_expr(value)?,
		}));
	}
	match name {
		"v-show" => Ok(Some(Directive::Show(parse_expr(value)?))),
		"v-text" => Ok(Some(Directive::Text(parse_expr(value)?))),
		"v-html" => Ok(Some(Directive::Html(parse_expr(value)?))),
		"v-model" => Ok(Some(Directive::Model(parse_expr(value)?))),
		"v-if" => Ok(Some(Directive::If(parse_expr(value)?))),
		"v-for" => Ok(Some(Directive::For(parse_for(value)?))),
		_ => Ok(None),
	}
}

fn parse_on(raw: &str, value: &str) -> Result<Directive, TemplateError> {
	let mut parts = raw.split('.');
	let event = parts.next().unwrap_or_default().to_string();
	if event.is_empty() {
		return Err(TemplateError::InvalidExpression(raw.to_string()));
	}
	let mut modifiers = Vec::new();
	for part in parts {
		match part {
			"stop" => modifiers.push(EventModifier::Stop),
			"prevent" => modifiers.push(EventModifier::Prevent),
			other => {
				tracing::warn!(modifier = other, event = %event, "unknown event modifier ignored");
			}
		}
	}
	Ok(Directive::On {
		event,
		modifiers,
		handler: parse_expr(value)?,
	})
}

/// Parse `item in list` or `(item, index) in list`.
pub fn parse_for(input: &str) -> Result<ForBinding, TemplateError> {
	match for_binding(input) {
		Ok(("", binding)) => Ok(binding),
		_ => Err(TemplateError::InvalidForBinding(input.to_string())),
	}
}

fn for_head(input: &str) -> IResult<&str, (String, Option<String>)> {
	alt((
		map(
			delimited(
				tag("("),
				separated_pair(ws(identifier), tag(","), ws(identifier)),
				tag(")"),
			),
			|(item, index)| (item.to_string(), Some(index.to_string())),
		),
		map(identifier, |item| (item.to_string(), None)),
	))
	.parse(input)
}

fn for_binding(input: &str) -> IResult<&str, ForBinding> {
	let (input, (item, index)) = preceded(multispace0, for_head).parse(input)?;
	// `in` must stand alone between the head and the list expression.
	let (input, _) = delimited(multispace1, tag("in"), multispace1).parse(input)?;
	let (input, list) = expression(input)?;
	let (input, _) = multispace0.parse(input)?;
	Ok((input, ForBinding { item, index, list }))
}

fn ws<'a, F>(
	inner: F,
) -> impl Parser<&'a str, Output = F::Output, Error = nom::error::Error<&'a str>>
where
	F: Parser<&'a str, Error = nom::error::Error<&'a str>>,
{
	delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::value::Value;

	#[test]
	fn test_plain_attribute_is_not_a_directive() {
		assert!(parse_directive("class", "big").unwrap().is_none());
		assert!(parse_directive("data-role", "nav").unwrap().is_none());
	}

	#[test]
	fn test_event_shorthand_and_longhand_agree() {
		let a = parse_directive("@click", "inc()").unwrap().unwrap();
		let b = parse_directive("v-on:click", "inc()").unwrap().unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn test_event_modifiers() {
		match parse_directive("@click.stop.prevent", "go").unwrap().unwrap() {
			Directive::On { event, modifiers, .. } => {
				assert_eq!(event, "click");
				assert_eq!(modifiers, vec![EventModifier::Stop, EventModifier::Prevent]);
			}
			other => panic!("expected On, got {other:?}"),
		}
	}

	#[test]
	fn test_unknown_modifier_is_ignored() {
		match parse_directive("@click.once", "go").unwrap().unwrap() {
			Directive::On { modifiers, .. } => assert!(modifiers.is_empty()),
			other => panic!("expected On, got {other:?}"),
		}
	}

	#[test]
	fn test_bind_shorthand_and_longhand_agree() {
		let a = parse_directive(":title", "label").unwrap().unwrap();
		let b = parse_directive("v-bind:title", "label").unwrap().unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn test_for_simple() {
		let binding = parse_for("item in items").unwrap();
		assert_eq!(binding.item, "item");
		assert_eq!(binding.index, None);
		assert_eq!(binding.list, Expr::Ident("items".into()));
	}

	#[test]
	fn test_for_with_index() {
		let binding = parse_for("(todo, i) in todos").unwrap();
		assert_eq!(binding.item, "todo");
		assert_eq!(binding.index.as_deref(), Some("i"));
	}

	#[test]
	fn test_for_over_expression() {
		let binding = parse_for("n in list(3)").unwrap();
		assert_eq!(
			binding.list,
			Expr::Call(
				Box::new(Expr::Ident("list".into())),
				vec![Expr::Literal(Value::Number(3.0))]
			)
		);
	}

	#[test]
	fn test_for_rejects_bad_heads() {
		assert!(parse_for("in items").is_err());
		assert!(parse_for("item of items").is_err());
		assert!(parse_for("(a, b, c) in items").is_err());
	}

	#[test]
	fn test_bad_expression_surfaces() {
		assert!(parse_directive("v-if", "1 +").is_err());
		assert!(parse_directive("@click", "").is_err());
	}
}
