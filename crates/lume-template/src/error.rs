use thiserror::Error;

/// Errors raised while parsing a template string.
#[derive(Debug, Error)]
pub enum TemplateError {
	#[error("template is empty or contains no root element")]
	EmptyTemplate,

	#[error("unexpected end of template while parsing <{0}>")]
	UnexpectedEof(String),

	#[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
	MismatchedClosingTag { expected: String, found: String },

	#[error("unclosed {{{{ ... }}}} interpolation in text")]
	UnclosedInterpolation,

	#[error("invalid expression: `{0}`")]
	InvalidExpression(String),

	#[error("invalid v-for binding: `{0}` (expected `item in list` or `(item, index) in list`)")]
	InvalidForBinding(String),
}
