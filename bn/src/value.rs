use std::{fmt, rc::Rc};

use crate::Handle;

pub const BN_TYPE_NAME: &str = "bn.number";

/// A host value as seen by the bn primitives.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    BigNum(Handle),
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::BigNum(_) => BN_TYPE_NAME,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Value::BigNum(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_handle(&self) -> bool {
        matches!(self, Value::BigNum(_))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<Handle> for Value {
    fn from(value: Handle) -> Self {
        Value::BigNum(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(d) => write!(f, "{d:?}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bytes(bytes) => {
                for byte in bytes.iter() {
                    write!(f, "\\x{byte:02x}")?;
                }
                Ok(())
            }
            Value::BigNum(handle) => write!(f, "{}", handle.value()),
        }
    }
}
