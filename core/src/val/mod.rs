//! Constant-pool values.
//!
//! `Val` is what a substitution binds a name to and what ends up in the
//! constant pool of a patched function. Payloads are `Arc`-backed so cloning a
//! pool is cheap and values can be shared across threads.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Val {
    /// String type, wrapped in Arc<str> for efficient cloning
    Str(Arc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Immutable fixed-length sequence
    Tuple(Arc<[Val]>),
    List(Arc<[Val]>),
    /// Half-open integer range `start..end`
    Range(i64, i64),
    #[default]
    Nil,
}

impl Val {
    pub fn str(s: impl AsRef<str>) -> Self {
        Val::Str(Arc::from(s.as_ref()))
    }

    pub fn tuple(items: impl IntoIterator<Item = Val>) -> Self {
        Val::Tuple(items.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = Val>) -> Self {
        Val::List(items.into_iter().collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Str(_) => "str",
            Val::Int(_) => "int",
            Val::Float(_) => "float",
            Val::Bool(_) => "bool",
            Val::Tuple(_) => "tuple",
            Val::List(_) => "list",
            Val::Range(..) => "range",
            Val::Nil => "nil",
        }
    }

    /// Only `nil`, `false`, zero and empty containers are falsey.
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Nil => false,
            Val::Bool(b) => *b,
            Val::Int(i) => *i != 0,
            Val::Float(f) => *f != 0.0,
            Val::Str(s) => !s.is_empty(),
            Val::Tuple(items) | Val::List(items) => !items.is_empty(),
            Val::Range(start, end) => start < end,
        }
    }
}

// Floats compare by bit pattern so a pool containing NaN still equals itself.
impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Float(a), Val::Float(b)) => a.to_bits() == b.to_bits(),
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Tuple(a), Val::Tuple(b)) | (Val::List(a), Val::List(b)) => a == b,
            (Val::Range(a0, a1), Val::Range(b0, b1)) => a0 == b0 && a1 == b1,
            (Val::Nil, Val::Nil) => true,
            _ => false,
        }
    }
}

impl From<i64> for Val {
    fn from(value: i64) -> Self {
        Val::Int(value)
    }
}

impl From<f64> for Val {
    fn from(value: f64) -> Self {
        Val::Float(value)
    }
}

impl From<bool> for Val {
    fn from(value: bool) -> Self {
        Val::Bool(value)
    }
}

impl From<&str> for Val {
    fn from(value: &str) -> Self {
        Val::str(value)
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Val]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match item {
            Val::Str(s) => write!(f, "{:?}", s.as_ref())?,
            other => write!(f, "{}", other)?,
        }
    }
    Ok(())
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Int(i) => {
                let mut buf = itoa::Buffer::new();
                f.write_str(buf.format(*i))
            }
            Val::Float(fl) => {
                let mut buf = ryu::Buffer::new();
                f.write_str(buf.format(*fl))
            }
            Val::Bool(b) => write!(f, "{b}"),
            Val::Str(s) => f.write_str(s.as_ref()),
            Val::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Val::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Val::Range(start, end) => write!(f, "{start}..{end}"),
            Val::Nil => f.write_str("nil"),
        }
    }
}

#[cfg(test)]
mod val_test;
