//! Expression parsing using nom parser combinators.
//!
//! Template expressions are a small, side-effect-free language: literals,
//! identifiers, member access, calls, and the usual unary/binary operator
//! ladder. Assignment, indexing, and statements are deliberately absent;
//! anything with behavior belongs in a method binding, not the template.

use nom::{
	IResult, Parser,
	branch::alt,
	bytes::complete::{tag, take_while},
	character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
	combinator::{map, map_res, opt, recognize, value},
	multi::{many0, many0_count, separated_list0},
	sequence::{delimited, pair, preceded},
};

use crate::error::TemplateError;
use crate::value::Value;

/// Abstract syntax tree of a template expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Literal(Value),
	Ident(String),
	/// `base.member`
	Member(Box<Expr>, String),
	/// `callee(arg, ...)`
	Call(Box<Expr>, Vec<Expr>),
	Unary(UnaryOp, Box<Expr>),
	Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Not,
	Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	And,
	Or,
}

/// Parse a complete expression, requiring all input to be consumed.
pub fn parse_expr(input: &str) -> Result<Expr, TemplateError> {
	match delimited(multispace0, expression, multispace0).parse(input) {
		Ok(("", expr)) => Ok(expr),
		_ => Err(TemplateError::InvalidExpression(input.to_string())),
	}
}

pub(crate) fn expression(input: &str) -> IResult<&str, Expr> {
	or_expr(input)
}

fn ws<'a, F>(
	inner: F,
) -> impl Parser<&'a str, Output = F::Output, Error = nom::error::Error<&'a str>>
where
	F: Parser<&'a str, Error = nom::error::Error<&'a str>>,
{
	delimited(multispace0, inner, multispace0)
}

pub(crate) fn identifier(input: &str) -> IResult<&str, &str> {
	recognize(pair(
		alt((alpha1, tag("_"))),
		many0_count(alt((alphanumeric1, tag("_")))),
	))
	.parse(input)
}

fn number(input: &str) -> IResult<&str, Expr> {
	map_res(
		recognize(pair(digit1, opt(pair(char('.'), digit1)))),
		|s: &str| s.parse::<f64>().map(|n| Expr::Literal(Value::Number(n))),
	)
	.parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Expr> {
	map(
		alt((
			delimited(char('\''), take_while(|c| c != '\''), char('\'')),
			delimited(char('"'), take_while(|c| c != '"'), char('"')),
		)),
		|s: &str| Expr::Literal(Value::String(s.to_string())),
	)
	.parse(input)
}

fn ident_or_keyword(input: &str) -> IResult<&str, Expr> {
	map(identifier, |name| match name {
		"true" => Expr::Literal(Value::Bool(true)),
		"false" => Expr::Literal(Value::Bool(false)),
		"null" => Expr::Literal(Value::Null),
		_ => Expr::Ident(name.to_string()),
	})
	.parse(input)
}

fn primary(input: &str) -> IResult<&str, Expr> {
	preceded(
		multispace0,
		alt((
			number,
			string_literal,
			ident_or_keyword,
			delimited(ws(char('(')), expression, ws(char(')'))),
		)),
	)
	.parse(input)
}

/// Member access and calls bind tightest and chain left to right.
fn postfix(input: &str) -> IResult<&str, Expr> {
	let (mut input, mut expr) = primary(input)?;
	loop {
		if let Ok((rest, name)) = preceded(ws(char('.')), identifier).parse(input) {
			expr = Expr::Member(Box::new(expr), name.to_string());
			input = rest;
			continue;
		}
		let call = delimited(
			ws(char('(')),
			separated_list0(ws(char(',')), expression),
			ws(char(')')),
		)
		.parse(input);
		if let Ok((rest, args)) = call {
			expr = Expr::Call(Box::new(expr), args);
			input = rest;
			continue;
		}
		break;
	}
	Ok((input, expr))
}

fn unary(input: &str) -> IResult<&str, Expr> {
	alt((
		map(preceded(ws(char('!')), unary), |e| {
			Expr::Unary(UnaryOp::Not, Box::new(e))
		}),
		map(preceded(ws(char('-')), unary), |e| {
			Expr::Unary(UnaryOp::Neg, Box::new(e))
		}),
		postfix,
	))
	.parse(input)
}

fn fold_binary(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
	rest.into_iter().fold(first, |lhs, (op, rhs)| {
		Expr::Binary(op, Box::new(lhs), Box::new(rhs))
	})
}

fn product(input: &str) -> IResult<&str, Expr> {
	let (input, first) = unary(input)?;
	let (input, rest) = many0(pair(
		ws(alt((
			value(BinaryOp::Mul, tag("*")),
			value(BinaryOp::Div, tag("/")),
			value(BinaryOp::Rem, tag("%")),
		))),
		unary,
	))
	.parse(input)?;
	Ok((input, fold_binary(first, rest)))
}

fn sum(input: &str) -> IResult<&str, Expr> {
	let (input, first) = product(input)?;
	let (input, rest) = many0(pair(
		ws(alt((
			value(BinaryOp::Add, tag("+")),
			value(BinaryOp::Sub, tag("-")),
		))),
		product,
	))
	.parse(input)?;
	Ok((input, fold_binary(first, rest)))
}

fn comparison(input: &str) -> IResult<&str, Expr> {
	let (input, first) = sum(input)?;
	let (input, rest) = many0(pair(
		ws(alt((
			value(BinaryOp::Le, tag("<=")),
			value(BinaryOp::Ge, tag(">=")),
			value(BinaryOp::Lt, tag("<")),
			value(BinaryOp::Gt, tag(">")),
		))),
		sum,
	))
	.parse(input)?;
	Ok((input, fold_binary(first, rest)))
}

fn equality(input: &str) -> IResult<&str, Expr> {
	let (input, first) = comparison(input)?;
	// Strict and loose spellings are accepted and mean the same thing.
	let (input, rest) = many0(pair(
		ws(alt((
			value(BinaryOp::Eq, tag("===")),
			value(BinaryOp::Ne, tag("!==")),
			value(BinaryOp::Eq, tag("==")),
			value(BinaryOp::Ne, tag("!=")),
		))),
		comparison,
	))
	.parse(input)?;
	Ok((input, fold_binary(first, rest)))
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
	let (input, first) = equality(input)?;
	let (input, rest) = many0(preceded(ws(tag("&&")), equality)).parse(input)?;
	Ok((
		input,
		rest.into_iter().fold(first, |lhs, rhs| {
			Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs))
		}),
	))
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
	let (input, first) = and_expr(input)?;
	let (input, rest) = many0(preceded(ws(tag("||")), and_expr)).parse(input)?;
	Ok((
		input,
		rest.into_iter().fold(first, |lhs, rhs| {
			Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs))
		}),
	))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ident(name: &str) -> Expr {
		Expr::Ident(name.to_string())
	}

	#[test]
	fn test_parse_literals() {
		assert_eq!(
			parse_expr("42").unwrap(),
			Expr::Literal(Value::Number(42.0))
		);
		assert_eq!(
			parse_expr("2.5").unwrap(),
			Expr::Literal(Value::Number(2.5))
		);
		assert_eq!(
			parse_expr("'hi'").unwrap(),
			Expr::Literal(Value::String("hi".into()))
		);
		assert_eq!(parse_expr("true").unwrap(), Expr::Literal(Value::Bool(true)));
		assert_eq!(parse_expr("null").unwrap(), Expr::Literal(Value::Null));
	}

	#[test]
	fn test_keyword_prefix_is_an_identifier() {
		assert_eq!(parse_expr("truthy").unwrap(), ident("truthy"));
		assert_eq!(parse_expr("nullable").unwrap(), ident("nullable"));
	}

	#[test]
	fn test_member_chain() {
		assert_eq!(
			parse_expr("user.address.city").unwrap(),
			Expr::Member(
				Box::new(Expr::Member(Box::new(ident("user")), "address".into())),
				"city".into()
			)
		);
	}

	#[test]
	fn test_call_with_args() {
		assert_eq!(
			parse_expr("add(1, count)").unwrap(),
			Expr::Call(
				Box::new(ident("add")),
				vec![Expr::Literal(Value::Number(1.0)), ident("count")]
			)
		);
	}

	#[test]
	fn test_precedence_product_over_sum() {
		assert_eq!(
			parse_expr("1 + 2 * 3").unwrap(),
			Expr::Binary(
				BinaryOp::Add,
				Box::new(Expr::Literal(Value::Number(1.0))),
				Box::new(Expr::Binary(
					BinaryOp::Mul,
					Box::new(Expr::Literal(Value::Number(2.0))),
					Box::new(Expr::Literal(Value::Number(3.0)))
				))
			)
		);
	}

	#[test]
	fn test_parens_override_precedence() {
		assert_eq!(
			parse_expr("(1 + 2) * 3").unwrap(),
			Expr::Binary(
				BinaryOp::Mul,
				Box::new(Expr::Binary(
					BinaryOp::Add,
					Box::new(Expr::Literal(Value::Number(1.0))),
					Box::new(Expr::Literal(Value::Number(2.0)))
				)),
				Box::new(Expr::Literal(Value::Number(3.0)))
			)
		);
	}

	#[test]
	fn test_strict_and_loose_equality_agree() {
		assert_eq!(
			parse_expr("a === b").unwrap(),
			parse_expr("a == b").unwrap()
		);
		assert_eq!(
			parse_expr("a !== b").unwrap(),
			parse_expr("a != b").unwrap()
		);
	}

	#[test]
	fn test_logical_over_comparison() {
		assert_eq!(
			parse_expr("a > 1 && b < 2").unwrap(),
			Expr::Binary(
				BinaryOp::And,
				Box::new(Expr::Binary(
					BinaryOp::Gt,
					Box::new(ident("a")),
					Box::new(Expr::Literal(Value::Number(1.0)))
				)),
				Box::new(Expr::Binary(
					BinaryOp::Lt,
					Box::new(ident("b")),
					Box::new(Expr::Literal(Value::Number(2.0)))
				))
			)
		);
	}

	#[test]
	fn test_unary_chain() {
		assert_eq!(
			parse_expr("!!done").unwrap(),
			Expr::Unary(
				UnaryOp::Not,
				Box::new(Expr::Unary(UnaryOp::Not, Box::new(ident("done"))))
			)
		);
		assert_eq!(
			parse_expr("-x").unwrap(),
			Expr::Unary(UnaryOp::Neg, Box::new(ident("x")))
		);
	}

	#[test]
	fn test_trailing_garbage_is_rejected() {
		assert!(parse_expr("a b").is_err());
		assert!(parse_expr("1 +").is_err());
		assert!(parse_expr("").is_err());
	}

	#[test]
	fn test_method_call_on_member() {
		assert_eq!(
			parse_expr("item.label(2)").unwrap(),
			Expr::Call(
				Box::new(Expr::Member(Box::new(ident("item")), "label".into())),
				vec![Expr::Literal(Value::Number(2.0))]
			)
		);
	}
}
