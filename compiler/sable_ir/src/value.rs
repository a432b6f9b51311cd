//! Script values bound in the variable namespace.
//!
//! Only the shapes the scoping core needs to store, compare and print are
//! modelled. Arithmetic, color math and unit conversion belong to the
//! expression evaluator, not here.

use std::fmt;

/// A number with an optional unit (`10px`, `1.5em`, `3`).
#[derive(Clone, Debug, PartialEq)]
pub struct Number {
    pub value: f64,
    pub unit: Option<String>,
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if let Some(unit) = &self.unit {
            f.write_str(unit)?;
        }
        Ok(())
    }
}

/// How the members of a list are joined when printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListSeparator {
    Space,
    Comma,
}

/// A script value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    /// A string, remembering whether it was written with quotes.
    Str { text: String, quoted: bool },
    List(Vec<Value>, ListSeparator),
}

impl Value {
    /// A unitless number.
    pub fn number(value: f64) -> Self {
        Value::Number(Number { value, unit: None })
    }

    /// A number with a unit.
    pub fn dimension(value: f64, unit: impl Into<String>) -> Self {
        Value::Number(Number {
            value,
            unit: Some(unit.into()),
        })
    }

    /// A quoted string.
    pub fn string(text: impl Into<String>) -> Self {
        Value::Str {
            text: text.into(),
            quoted: true,
        }
    }

    /// An unquoted string (identifiers such as `bold` or `red`).
    pub fn ident(text: impl Into<String>) -> Self {
        Value::Str {
            text: text.into(),
            quoted: false,
        }
    }

    /// Truthiness: only `null` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str { text, quoted: true } => write!(f, "\"{text}\""),
            Value::Str {
                text,
                quoted: false,
            } => f.write_str(text),
            Value::List(items, separator) => {
                let sep = match separator {
                    ListSeparator::Space => " ",
                    ListSeparator::Comma => ", ",
                };
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}
