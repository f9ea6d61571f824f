use std::num::ParseFloatError;
use std::str::FromStr;

use indexmap::IndexMap;

pub mod options;
pub mod parse;
pub mod tokenize;
mod unescape;

pub use options::{ParseOptions, DEFAULT_MAX_DEPTH};
pub use parse::{parse, parse_tokens, parse_with, Error, ParseError, Parser};
pub use tokenize::{tokenize, LexError, Token};
pub use unescape::EscapeError;

/// Key/value pairs of a JSON object, kept in the order they were read.
pub type Map = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// literal characters `null`
    Null,

    /// literal characters `true` or `false`
    Bool(bool),

    /// a number, either integer or floating point
    Number(Number),

    /// a string of characters wrapped in double quotes
    String(String),

    /// an array of values
    Array(Vec<Value>),

    /// an object with key-value pairs; a repeated key replaces the earlier value
    Object(Map),
}

impl Value {
    /// Short name of the variant, as used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(Number::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    /// Integers are widened, so this is `Some` for every number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when `self` is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }
}

impl FromStr for Value {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse(input)
    }
}

/// A JSON number. Equality is kind-sensitive: `Integer(1) != Float(1.0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Number::Integer(_))
    }
}

impl FromStr for Number {
    type Err = ParseFloatError;

    /// A lexeme with a fraction or exponent is a float. Anything else is an
    /// integer, promoted to a float when it does not fit in an `i64`.
    fn from_str(lexeme: &str) -> Result<Self, Self::Err> {
        if !lexeme.contains(['.', 'e', 'E']) {
            if let Ok(n) = lexeme.parse::<i64>() {
                return Ok(Number::Integer(n));
            }
        }
        lexeme.parse::<f64>().map(Number::Float)
    }
}
