//! Template layer for lume: values, expressions, and directives.
//!
//! A template is parsed once into a static tree ([`parse_template`]);
//! the renderer then evaluates its expressions ([`evaluate`]) against a
//! [`Context`] of named bindings. Bindings may be plain values, reactive
//! signals (unwrapped transparently and tracked when read inside an
//! effect), or callable functions for event handlers.
//!
//! ## Example
//!
//! ```
//! use lume_template::{Binding, Context, Value, evaluate, parse_expr};
//!
//! let mut ctx = Context::new();
//! ctx.insert("count", Binding::Value(Value::from(2)));
//!
//! let expr = parse_expr("count * 10").unwrap();
//! assert_eq!(evaluate(&expr, &ctx).unwrap(), Value::Number(20.0));
//! ```

mod context;
mod directive;
mod error;
mod eval;
mod expr;
mod parse;
mod value;

pub use context::{Binding, Context, ContextFn};
pub use directive::{Directive, EventModifier, ForBinding, parse_directive, parse_for};
pub use error::TemplateError;
pub use eval::{EvalError, Resolved, eval_or_null, evaluate, resolve};
pub use expr::{BinaryOp, Expr, UnaryOp, parse_expr};
pub use parse::{ElementTemplate, TemplateNode, TextSegment, parse_template};
pub use value::Value;
