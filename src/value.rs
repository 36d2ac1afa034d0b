use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::Callable;
use crate::class::LoxInstance;
use crate::expr::LiteralValue;

/// Runtime value domain.  Callables and instances are reference types:
/// cloning a `Value` shares them, it never copies their state.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable),
    Instance(Rc<RefCell<LoxInstance>>),
}

impl Value {
    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(_) | Value::String(_) | Value::Callable(_) | Value::Instance(_) => true,
        }
    }

    /// Name of the value's runtime type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Callable(_) => "callable",
            Value::Instance(_) => "instance",
        }
    }
}

impl PartialEq for Value {
    /// Same-type structural equality; reference types compare by identity.
    /// Values of different types are never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&LiteralValue> for Value {
    fn from(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::Str(s) => Value::String(s.clone()),
            LiteralValue::True => Value::Bool(true),
            LiteralValue::False => Value::Bool(false),
            LiteralValue::Nil => Value::Nil,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            // f64's Display never emits an exponent nor a trailing ".0":
            // 3.0 prints as "3", 2.5 as "2.5".
            Value::Number(n) => write!(f, "{}", n),

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(c) => write!(f, "{}", c),

            Value::Instance(instance) => write!(f, "{}", instance.borrow()),
        }
    }
}

const MAX_FRACTION_DIGITS: usize = 15;

/// Formats a number for string concatenation: at most 15 significant and 15
/// fractional digits, trailing zeros and a dangling point removed, never
/// exponential.
pub fn concat_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }

    // Any decimal of 15 significant digits parses back exactly, so the
    // shortest form of `rounded` carries no binary noise.
    let rounded = format!("{:.14e}", n).parse::<f64>().unwrap_or(n);
    let mut text = rounded.to_string();

    let Some(point) = text.find('.') else {
        return if text == "-0" { "0".to_string() } else { text };
    };

    if text.len() - point - 1 > MAX_FRACTION_DIGITS {
        text = format!("{:.*}", MAX_FRACTION_DIGITS, rounded);
    }

    let text = text.trim_end_matches('0').trim_end_matches('.');

    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
