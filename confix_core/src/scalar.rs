use std::fmt::Display;

use float_cmp::approx_eq;

use crate::ConfixError;
use crate::ConfixResult;

/// A typed leaf value.
///
/// Template results, filter inputs and outputs, and the scalars found in
/// JSON and YAML documents all use this representation. The [`Display`]
/// implementation is the string projection used when a value is spliced into
/// text or written to an untyped format.
#[derive(Debug, Clone)]
pub enum Scalar {
	String(String),
	Int(i64),
	Float(f64),
	Bool(bool),
}

impl Eq for Scalar {}
impl PartialEq for Scalar {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Scalar::String(value), Scalar::String(other_value)) => value == other_value,
			(Scalar::Int(value), Scalar::Int(other_value)) => value == other_value,
			(Scalar::Float(value), Scalar::Float(other_value)) => {
				approx_eq!(f64, *value, *other_value, ulps = 2)
			}
			(Scalar::Bool(value), Scalar::Bool(other_value)) => value == other_value,
			_ => false,
		}
	}
}

impl Display for Scalar {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Scalar::String(value) => write!(f, "{value}"),
			Scalar::Int(value) => write!(f, "{value}"),
			Scalar::Float(value) => write!(f, "{value}"),
			Scalar::Bool(value) => write!(f, "{value}"),
		}
	}
}

impl From<String> for Scalar {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<&str> for Scalar {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<i64> for Scalar {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<f64> for Scalar {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<bool> for Scalar {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl Scalar {
	/// Name of the variant, used in error messages.
	pub fn type_name(&self) -> &'static str {
		match self {
			Scalar::String(_) => "string",
			Scalar::Int(_) => "integer",
			Scalar::Float(_) => "float",
			Scalar::Bool(_) => "boolean",
		}
	}

	pub fn is_string(&self) -> bool {
		matches!(self, Scalar::String(_))
	}

	/// Consume the scalar and return its string projection without copying
	/// when it already is a string.
	pub fn into_string(self) -> String {
		match self {
			Scalar::String(value) => value,
			other => other.to_string(),
		}
	}

	/// Convert `text` to a scalar of the same variant as `self`.
	///
	/// `path` is only used to describe the failure.
	pub fn convert(&self, text: &str, path: &str) -> ConfixResult<Scalar> {
		let converted = match self {
			Scalar::String(_) => Some(Scalar::String(text.to_string())),
			Scalar::Int(_) => text.parse::<i64>().ok().map(Scalar::Int),
			Scalar::Float(_) => text.parse::<f64>().ok().map(Scalar::Float),
			Scalar::Bool(_) => parse_bool(text).map(Scalar::Bool),
		};

		converted.ok_or_else(|| {
			ConfixError::TypeConversion {
				path: path.to_string(),
				value: text.to_string(),
				expected: self.type_name().to_string(),
			}
		})
	}
}

/// Boolean spellings accepted when converting an edited value back to a
/// boolean.
pub fn parse_bool(text: &str) -> Option<bool> {
	match text {
		"1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
		"0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
		_ => None,
	}
}
