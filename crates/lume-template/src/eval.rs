//! Expression evaluation against a [`Context`].
//!
//! Evaluation is pull-based and reactive for free: reading a
//! [`Binding::Signal`] goes through `Signal::get`, so any effect currently
//! running picks up the dependency. Evaluating the same expression outside
//! an effect just reads the current value.

use thiserror::Error;

use crate::context::{Binding, Context, ContextFn};
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::value::Value;

use lume_reactive::Signal;

#[derive(Debug, Error)]
pub enum EvalError {
	#[error("unknown identifier `{0}`")]
	UnknownIdentifier(String),

	#[error("`{0}` is not callable")]
	NotCallable(String),
}

/// What a name or expression resolves to before value coercion. Callers
/// that need the binding itself (v-model wants the signal, v-on wants the
/// function) use this instead of [`evaluate`].
pub enum Resolved {
	Value(Value),
	Signal(Signal<Value>),
	Func(ContextFn),
}

/// Resolve an expression to a binding without unwrapping signals or
/// invoking functions in value position.
pub fn resolve(expr: &Expr, ctx: &Context) -> Result<Resolved, EvalError> {
	match expr {
		Expr::Ident(name) => match ctx.get(name) {
			Some(Binding::Value(v)) => Ok(Resolved::Value(v.clone())),
			Some(Binding::Signal(s)) => Ok(Resolved::Signal(s.clone())),
			Some(Binding::Func(f)) => Ok(Resolved::Func(f.clone())),
			None => Err(EvalError::UnknownIdentifier(name.clone())),
		},
		Expr::Member(base, name) => {
			let base = evaluate(base, ctx)?;
			Ok(Resolved::Value(member_of(&base, name)))
		}
		Expr::Call(callee, args) => {
			let func = match resolve(callee, ctx)? {
				Resolved::Func(f) => f,
				_ => return Err(EvalError::NotCallable(describe(callee))),
			};
			let mut values = Vec::with_capacity(args.len());
			for arg in args {
				values.push(evaluate(arg, ctx)?);
			}
			Ok(Resolved::Value(func(&values)))
		}
		_ => Ok(Resolved::Value(evaluate(expr, ctx)?)),
	}
}

/// Evaluate an expression to a [`Value`], unwrapping signal bindings.
/// A function in value position evaluates to null.
pub fn evaluate(expr: &Expr, ctx: &Context) -> Result<Value, EvalError> {
	match expr {
		Expr::Literal(v) => Ok(v.clone()),
		Expr::Ident(_) | Expr::Member(..) | Expr::Call(..) => match resolve(expr, ctx)? {
			Resolved::Value(v) => Ok(v),
			Resolved::Signal(s) => Ok(s.get()),
			Resolved::Func(_) => Ok(Value::Null),
		},
		Expr::Unary(op, inner) => {
			let v = evaluate(inner, ctx)?;
			Ok(match op {
				UnaryOp::Not => Value::Bool(!v.truthy()),
				UnaryOp::Neg => Value::Number(-v.as_number()),
			})
		}
		Expr::Binary(op, lhs, rhs) => evaluate_binary(*op, lhs, rhs, ctx),
	}
}

/// Evaluate, degrading any error to null after logging it. Rendering
/// never tears down the tree over one bad expression.
pub fn eval_or_null(expr: &Expr, ctx: &Context) -> Value {
	match evaluate(expr, ctx) {
		Ok(v) => v,
		Err(error) => {
			tracing::warn!(%error, "expression evaluation failed, using null");
			Value::Null
		}
	}
}

fn evaluate_binary(
	op: BinaryOp,
	lhs: &Expr,
	rhs: &Expr,
	ctx: &Context,
) -> Result<Value, EvalError> {
	// Logical operators short-circuit and yield an operand, not a bool.
	match op {
		BinaryOp::And => {
			let left = evaluate(lhs, ctx)?;
			return if left.truthy() { evaluate(rhs, ctx) } else { Ok(left) };
		}
		BinaryOp::Or => {
			let left = evaluate(lhs, ctx)?;
			return if left.truthy() { Ok(left) } else { evaluate(rhs, ctx) };
		}
		_ => {}
	}
	let left = evaluate(lhs, ctx)?;
	let right = evaluate(rhs, ctx)?;
	Ok(match op {
		BinaryOp::Add => match (&left, &right) {
			(Value::String(_), _) | (_, Value::String(_)) => {
				Value::String(format!("{}{}", left.display_text(), right.display_text()))
			}
			_ => Value::Number(left.as_number() + right.as_number()),
		},
		BinaryOp::Sub => Value::Number(left.as_number() - right.as_number()),
		BinaryOp::Mul => Value::Number(left.as_number() * right.as_number()),
		BinaryOp::Div => Value::Number(left.as_number() / right.as_number()),
		BinaryOp::Rem => Value::Number(left.as_number() % right.as_number()),
		BinaryOp::Eq => Value::Bool(left == right),
		BinaryOp::Ne => Value::Bool(left != right),
		BinaryOp::Lt => compare(&left, &right, |o| o == core::cmp::Ordering::Less),
		BinaryOp::Le => compare(&left, &right, |o| o != core::cmp::Ordering::Greater),
		BinaryOp::Gt => compare(&left, &right, |o| o == core::cmp::Ordering::Greater),
		BinaryOp::Ge => compare(&left, &right, |o| o != core::cmp::Ordering::Less),
		BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
	})
}

fn compare(left: &Value, right: &Value, accept: impl Fn(core::cmp::Ordering) -> bool) -> Value {
	let ordering = match (left, right) {
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		// NaN on either side makes every comparison false.
		_ => left.as_number().partial_cmp(&right.as_number()),
	};
	Value::Bool(ordering.is_some_and(accept))
}

fn member_of(base: &Value, name: &str) -> Value {
	match base {
		Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
		Value::Array(items) if name == "length" => Value::Number(items.len() as f64),
		Value::String(s) if name == "length" => Value::Number(s.chars().count() as f64),
		_ => Value::Null,
	}
}

fn describe(expr: &Expr) -> String {
	match expr {
		Expr::Ident(name) => name.clone(),
		Expr::Member(_, name) => name.clone(),
		_ => "expression".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::parse_expr;
	use lume_reactive::{Runtime, Scope};
	use std::cell::Cell;
	use std::collections::BTreeMap;
	use std::rc::Rc;

	fn eval(src: &str, ctx: &Context) -> Value {
		evaluate(&parse_expr(src).unwrap(), ctx).unwrap()
	}

	#[test]
	fn test_arithmetic_and_precedence() {
		let ctx = Context::new();
		assert_eq!(eval("1 + 2 * 3", &ctx), Value::Number(7.0));
		assert_eq!(eval("10 % 3", &ctx), Value::Number(1.0));
	}

	#[test]
	fn test_string_concat_wins_over_addition() {
		let mut ctx = Context::new();
		ctx.insert("n", Binding::Value(Value::from(5)));
		assert_eq!(eval("'count: ' + n", &ctx), Value::from("count: 5"));
	}

	#[test]
	fn test_division_by_zero_is_infinite_not_fatal() {
		let ctx = Context::new();
		match eval("1 / 0", &ctx) {
			Value::Number(n) => assert!(n.is_infinite()),
			other => panic!("expected number, got {other:?}"),
		}
	}

	#[test]
	fn test_signal_bindings_unwrap() {
		let rt = Runtime::new();
		let count = rt.create_signal(Value::from(3));
		let mut ctx = Context::new();
		ctx.insert("count", Binding::Signal(count.clone()));

		assert_eq!(eval("count + 1", &ctx), Value::Number(4.0));
		count.set(Value::from(10));
		assert_eq!(eval("count + 1", &ctx), Value::Number(11.0));
	}

	#[test]
	fn test_signal_read_tracks_inside_effect() {
		let rt = Runtime::new();
		let scope = Scope::new();
		let count = rt.create_signal(Value::from(0));
		let mut ctx = Context::new();
		ctx.insert("count", Binding::Signal(count.clone()));
		let expr = parse_expr("count * 2").unwrap();

		let runs = Rc::new(Cell::new(0));
		let runs_clone = runs.clone();
		let eval_ctx = ctx.clone();
		rt.create_effect_in(&scope, move || {
			let _ = eval_or_null(&expr, &eval_ctx);
			runs_clone.set(runs_clone.get() + 1);
			None::<fn()>
		});

		count.set(Value::from(1));
		assert_eq!(runs.get(), 2);
	}

	#[test]
	fn test_member_access_and_missing_members() {
		let mut map = BTreeMap::new();
		map.insert("name".to_string(), Value::from("ada"));
		let mut ctx = Context::new();
		ctx.insert("user", Binding::Value(Value::Object(map)));

		assert_eq!(eval("user.name", &ctx), Value::from("ada"));
		assert_eq!(eval("user.missing", &ctx), Value::Null);
		assert_eq!(eval("user.missing.deeper", &ctx), Value::Null);
	}

	#[test]
	fn test_array_and_string_length() {
		let mut ctx = Context::new();
		ctx.insert(
			"items",
			Binding::Value(Value::Array(vec![Value::Null, Value::Null])),
		);
		ctx.insert("name", Binding::Value(Value::from("abc")));

		assert_eq!(eval("items.length", &ctx), Value::Number(2.0));
		assert_eq!(eval("name.length", &ctx), Value::Number(3.0));
	}

	#[test]
	fn test_call_binding() {
		let mut ctx = Context::new();
		ctx.insert(
			"double",
			Binding::Func(Rc::new(|args: &[Value]| {
				Value::Number(args.first().map_or(f64::NAN, Value::as_number) * 2.0)
			})),
		);

		assert_eq!(eval("double(21)", &ctx), Value::Number(42.0));
	}

	#[test]
	fn test_logical_operators_return_operands() {
		let mut ctx = Context::new();
		ctx.insert("name", Binding::Value(Value::from("")));
		assert_eq!(eval("name || 'anon'", &ctx), Value::from("anon"));
		assert_eq!(eval("1 && 'yes'", &ctx), Value::from("yes"));
		assert_eq!(eval("0 && boom", &ctx), Value::Number(0.0));
	}

	#[test]
	fn test_unknown_identifier_errors_and_degrades_to_null() {
		let ctx = Context::new();
		let expr = parse_expr("missing + 1").unwrap();
		assert!(evaluate(&expr, &ctx).is_err());
		assert_eq!(eval_or_null(&expr, &ctx), Value::Null);
	}

	#[test]
	fn test_nan_comparisons_are_false() {
		let ctx = Context::new();
		assert_eq!(eval("'a' * 1 < 2", &ctx), Value::Bool(false));
		assert_eq!(eval("'a' * 1 >= 2", &ctx), Value::Bool(false));
	}

	#[test]
	fn test_function_in_value_position_is_null() {
		let mut ctx = Context::new();
		ctx.insert("f", Binding::Func(Rc::new(|_| Value::Null)));
		assert_eq!(eval("f", &ctx), Value::Null);
	}
}
