//! Dynamically typed values held in scope bindings and agent attributes.

use std::collections::HashMap;
use std::fmt;

use crate::{AgentId, Point3};

/// A runtime value.  Behaviors produced by the model compiler read and
/// write these through scopes and agent attribute maps.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Point(Point3),
    Agent(AgentId),
    List(Vec<Value>),
}

/// Name → value map used for frame bindings, agent attributes and globals.
pub type Bindings = HashMap<String, Value>;

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil      => "nil",
            Value::Bool(_)  => "bool",
            Value::Int(_)   => "int",
            Value::Float(_) => "float",
            Value::Str(_)   => "string",
            Value::Point(_) => "point",
            Value::Agent(_) => "agent",
            Value::List(_)  => "list",
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and ints widened to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point3> {
        match self {
            Value::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_agent(&self) -> Option<AgentId> {
        match self {
            Value::Agent(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil      => f.write_str("nil"),
            Value::Bool(b)  => write!(f, "{b}"),
            Value::Int(i)   => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s)   => write!(f, "'{s}'"),
            Value::Point(p) => write!(f, "{p}"),
            Value::Agent(a) => write!(f, "{a}"),
            Value::List(l) => {
                f.write_str("[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(v: $t) -> Value {
                    Value::$variant(v $(as $cast)?)
                }
            }
        )*
    };
}

value_from! {
    bool       => Bool,
    i64        => Int,
    i32        => Int as i64,
    u32        => Int as i64,
    f64        => Float,
    String     => Str,
    Point3     => Point,
    AgentId    => Agent,
    Vec<Value> => List,
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_owned())
    }
}
