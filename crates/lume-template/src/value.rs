//! Dynamically typed template values.
//!
//! Expression evaluation and component props traffic in `Value`, a small
//! JSON-like type with loose, display-oriented coercions. Equality treats
//! NaN as equal to itself so that writing NaN into a signal twice is a
//! no-op rather than an endless re-render.

use std::collections::BTreeMap;

/// A dynamically typed value flowing through templates and props.
#[derive(Debug, Clone, Default)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Number(f64),
	String(String),
	Array(Vec<Value>),
	Object(BTreeMap<String, Value>),
}

impl Value {
	/// Loose truthiness: `null`, `false`, `0`, `NaN`, and `""` are falsy;
	/// everything else (including empty arrays and objects) is truthy.
	pub fn truthy(&self) -> bool {
		match self {
			Value::Null => false,
			Value::Bool(b) => *b,
			Value::Number(n) => *n != 0.0 && !n.is_nan(),
			Value::String(s) => !s.is_empty(),
			Value::Array(_) | Value::Object(_) => true,
		}
	}

	/// Numeric coercion: `null` is 0, booleans are 0/1, strings parse
	/// (empty string is 0, garbage is NaN), arrays and objects are NaN.
	pub fn as_number(&self) -> f64 {
		match self {
			Value::Null => 0.0,
			Value::Bool(b) => {
				if *b {
					1.0
				} else {
					0.0
				}
			}
			Value::Number(n) => *n,
			Value::String(s) => {
				let trimmed = s.trim();
				if trimmed.is_empty() {
					0.0
				} else {
					trimmed.parse().unwrap_or(f64::NAN)
				}
			}
			Value::Array(_) | Value::Object(_) => f64::NAN,
		}
	}

	/// Render this value for text output.
	///
	/// Sentinel values render as the empty string: `null`, both booleans,
	/// NaN, and the infinities all vanish from text. `0` and `""` are not
	/// sentinels and render as themselves.
	pub fn display_text(&self) -> String {
		match self {
			Value::Null | Value::Bool(_) => String::new(),
			Value::Number(n) => format_number(*n),
			Value::String(s) => s.clone(),
			Value::Array(items) => {
				let parts: Vec<String> = items.iter().map(Value::display_text).collect();
				parts.join(",")
			}
			Value::Object(_) => "[object Object]".to_string(),
		}
	}

	/// Convert to `serde_json::Value`. Non-finite numbers have no JSON
	/// representation and become `null`.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Value::Null => serde_json::Value::Null,
			Value::Bool(b) => serde_json::Value::Bool(*b),
			Value::Number(n) => serde_json::Number::from_f64(*n)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null),
			Value::String(s) => serde_json::Value::String(s.clone()),
			Value::Array(items) => {
				serde_json::Value::Array(items.iter().map(Value::to_json).collect())
			}
			Value::Object(map) => serde_json::Value::Object(
				map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
			),
		}
	}
}

fn format_number(n: f64) -> String {
	if !n.is_finite() {
		return String::new();
	}
	if n.fract() == 0.0 && n.abs() < 1e15 {
		format!("{}", n as i64)
	} else {
		format!("{n}")
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			// NaN equals NaN here, so repeated NaN writes coalesce.
			(Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Array(a), Value::Array(b)) => a == b,
			(Value::Object(a), Value::Object(b)) => a == b,
			_ => false,
		}
	}
}

impl core::fmt::Display for Value {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(&self.display_text())
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Value::Number(n)
	}
}

impl From<i64> for Value {
	fn from(n: i64) -> Self {
		Value::Number(n as f64)
	}
}

impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Value::Number(f64::from(n))
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::String(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::String(s)
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Value::Array(items)
	}
}

impl From<serde_json::Value> for Value {
	fn from(json: serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Bool(b),
			serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
			serde_json::Value::String(s) => Value::String(s),
			serde_json::Value::Array(items) => {
				Value::Array(items.into_iter().map(Value::from).collect())
			}
			serde_json::Value::Object(map) => Value::Object(
				map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Value::Null, false)]
	#[case(Value::Bool(false), false)]
	#[case(Value::Bool(true), true)]
	#[case(Value::Number(0.0), false)]
	#[case(Value::Number(f64::NAN), false)]
	#[case(Value::Number(-1.5), true)]
	#[case(Value::String(String::new()), false)]
	#[case(Value::String("0".into()), true)]
	#[case(Value::Array(vec![]), true)]
	fn test_truthiness(#[case] value: Value, #[case] expected: bool) {
		assert_eq!(value.truthy(), expected);
	}

	#[rstest]
	#[case(Value::Null, "")]
	#[case(Value::Bool(true), "")]
	#[case(Value::Bool(false), "")]
	#[case(Value::Number(f64::NAN), "")]
	#[case(Value::Number(f64::INFINITY), "")]
	#[case(Value::Number(0.0), "0")]
	#[case(Value::Number(5.0), "5")]
	#[case(Value::Number(2.5), "2.5")]
	#[case(Value::String(String::new()), "")]
	#[case(Value::String("hi".into()), "hi")]
	#[case(Value::Object(BTreeMap::new()), "[object Object]")]
	fn test_display_text(#[case] value: Value, #[case] expected: &str) {
		assert_eq!(value.display_text(), expected);
	}

	#[test]
	fn test_array_display_joins_with_commas() {
		let value = Value::Array(vec![Value::from(1), Value::Null, Value::from("x")]);
		assert_eq!(value.display_text(), "1,,x");
	}

	#[test]
	fn test_nan_equals_nan() {
		assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
		assert_ne!(Value::Number(f64::NAN), Value::Number(1.0));
	}

	#[rstest]
	#[case(Value::Null, 0.0)]
	#[case(Value::Bool(true), 1.0)]
	#[case(Value::String("  12 ".into()), 12.0)]
	#[case(Value::String(String::new()), 0.0)]
	fn test_as_number(#[case] value: Value, #[case] expected: f64) {
		assert_eq!(value.as_number(), expected);
	}

	#[test]
	fn test_as_number_garbage_is_nan() {
		assert!(Value::String("abc".into()).as_number().is_nan());
	}

	#[test]
	fn test_json_round_trip_drops_non_finite() {
		let value = Value::Array(vec![Value::Number(f64::NAN), Value::Number(1.0)]);
		let json = value.to_json();
		assert_eq!(Value::from(json), Value::Array(vec![Value::Null, Value::Number(1.0)]));
	}
}
