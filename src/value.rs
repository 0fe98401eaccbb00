//! Dynamically typed stream elements.
//!
//! Most pipelines are typed end to end. [`Value`] is for the ones that are
//! not: streams mixing integers, floats and strings, or tuples whose arity
//! is only known at runtime. Accessors are checked and report a
//! [`Error::TypeMismatch`] rather than coercing.

use std::fmt;

use crate::core::error::{Error, Result};
use crate::processors::StarArgs;

/// A dynamically typed element
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// The placeholder for a missing element
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Name of the variant, as used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(Error::type_mismatch("bool", other.type_name())),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(Error::type_mismatch("int", other.type_name())),
        }
    }

    pub fn as_uint(&self) -> Result<u64> {
        match self {
            Value::Uint(u) => Ok(*u),
            other => Err(Error::type_mismatch("uint", other.type_name())),
        }
    }

    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            other => Err(Error::type_mismatch("float", other.type_name())),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(Error::type_mismatch("string", other.type_name())),
        }
    }

    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(Error::type_mismatch("list", other.type_name())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A list spreads into its items, anything else is a single argument
impl StarArgs for Value {
    type Arg = Value;

    fn into_args(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            other => vec![other],
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Uint(u64::from(u))
    }
}

impl From<usize> for Value {
    fn from(u: usize) -> Self {
        Value::Uint(u as u64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_accessors() {
        assert_eq!(Value::from(3i32).as_int(), Ok(3));
        assert_eq!(Value::from(3u32).as_uint(), Ok(3));
        assert_eq!(Value::from(0.5f32).as_float(), Ok(0.5));
        assert_eq!(Value::from("abc").as_str(), Ok("abc"));
        assert_eq!(Value::from(true).as_bool(), Ok(true));

        assert_eq!(
            Value::from("abc").as_int(),
            Err(Error::type_mismatch("int", "string"))
        );
        assert_eq!(
            Value::Nil.as_list(),
            Err(Error::type_mismatch("list", "nil"))
        );
    }

    #[test]
    fn test_option_maps_none_to_nil() {
        assert_eq!(Value::from(None::<i64>), Value::Nil);
        assert_eq!(Value::from(Some(2i64)), Value::Int(2));
        assert!(Value::default().is_nil());
    }

    #[test]
    fn test_star_args() {
        let list = Value::List(vec![Value::Int(1), Value::Str("a".into())]);
        assert_eq!(list.into_args(), vec![Value::Int(1), Value::Str("a".into())]);
        assert_eq!(Value::Int(4).into_args(), vec![Value::Int(4)]);
    }

    #[test]
    fn test_display() {
        let list = Value::from(vec![Value::Int(1), Value::Nil, Value::from("x")]);
        assert_eq!(list.to_string(), "[1, nil, \"x\"]");
    }
}
