//! Filter tree types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single literal value compared against a metadata attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Absent value
    Null,
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// String literal
    Str(String),
}

impl Scalar {
    /// Whether this is the null literal
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
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

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Right-hand side of a comparison: one literal or a set of literals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    /// A single literal
    Scalar(Scalar),
    /// A set of literals, rendered as a bracketed list
    Set(Vec<Scalar>),
}

impl From<Scalar> for Operand {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<Scalar>> for Operand {
    fn from(values: Vec<Scalar>) -> Self {
        Self::Set(values)
    }
}

/// Boolean predicate tree over metadata attributes.
///
/// Comparison leaves name an attribute `key` and an [`Operand`]; `And`, `Or`
/// and `Not` combine sub-trees. Trees are finite by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterExpr {
    /// `key == value`
    Eq { key: String, value: Operand },
    /// `key != value`
    Neq { key: String, value: Operand },
    /// `key >= value`
    Gte { key: String, value: Operand },
    /// `key > value`
    Gt { key: String, value: Operand },
    /// `key < value`
    Lt { key: String, value: Operand },
    /// `key <= value`
    Lte { key: String, value: Operand },
    /// `key` is one of `value`
    In { key: String, value: Operand },
    /// `key` is none of `value`
    NotIn { key: String, value: Operand },
    /// `key` contains the substring `value`. Vector-set filters have no
    /// rendering for this, so it never compiles.
    ContainsString { key: String, value: Operand },
    /// Both sides hold
    And {
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
    /// Either side holds
    Or {
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
    /// The inner expression does not hold
    Not { expr: Box<FilterExpr> },
}

impl FilterExpr {
    /// `key == value`
    pub fn eq(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Eq {
            key: key.into(),
            value: Operand::Scalar(value.into()),
        }
    }

    /// `key != value`
    pub fn neq(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Neq {
            key: key.into(),
            value: Operand::Scalar(value.into()),
        }
    }

    /// `key >= value`
    pub fn gte(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Gte {
            key: key.into(),
            value: Operand::Scalar(value.into()),
        }
    }

    /// `key > value`
    pub fn gt(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Gt {
            key: key.into(),
            value: Operand::Scalar(value.into()),
        }
    }

    /// `key < value`
    pub fn lt(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Lt {
            key: key.into(),
            value: Operand::Scalar(value.into()),
        }
    }

    /// `key <= value`
    pub fn lte(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Lte {
            key: key.into(),
            value: Operand::Scalar(value.into()),
        }
    }

    /// Membership test against a set of literals
    pub fn is_in<I, V>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self::In {
            key: key.into(),
            value: Operand::Set(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Negated membership test against a set of literals
    pub fn not_in<I, V>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self::NotIn {
            key: key.into(),
            value: Operand::Set(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Substring test, which has no vector-set rendering
    pub fn contains_string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ContainsString {
            key: key.into(),
            value: Operand::Scalar(Scalar::Str(value.into())),
        }
    }

    /// Conjunction of two trees
    pub fn and(left: Self, right: Self) -> Self {
        Self::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Disjunction of two trees
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Negation of a tree
    pub fn not(expr: Self) -> Self {
        Self::Not {
            expr: Box::new(expr),
        }
    }

    /// Chain `self and other`
    pub fn and_also(self, other: Self) -> Self {
        Self::and(self, other)
    }

    /// Chain `self or other`
    pub fn or_else(self, other: Self) -> Self {
        Self::or(self, other)
    }

    /// Short name of the node kind, used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Eq { .. } => "eq",
            Self::Neq { .. } => "neq",
            Self::Gte { .. } => "gte",
            Self::Gt { .. } => "gt",
            Self::Lt { .. } => "lt",
            Self::Lte { .. } => "lte",
            Self::In { .. } => "in",
            Self::NotIn { .. } => "not_in",
            Self::ContainsString { .. } => "contains_string",
            Self::And { .. } => "and",
            Self::Or { .. } => "or",
            Self::Not { .. } => "not",
        }
    }
}
