// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time expressions used by `enable` fields.

use serde::{Deserialize, Serialize};

/// Binary operator inside a time expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// `+`
    #[serde(rename = "+")]
    Add,
    /// `-`
    #[serde(rename = "-")]
    Subtract,
    /// `*`
    #[serde(rename = "*")]
    Multiply,
    /// `/`
    #[serde(rename = "/")]
    Divide,
    /// `%`
    #[serde(rename = "%")]
    Modulo,
}

impl Operator {
    /// Get the operator symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
        }
    }
}

/// A binary expression node with two operand expressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryExpr {
    /// Left operand
    pub lhs: Expr,
    /// Operator
    pub op: Operator,
    /// Right operand
    pub rhs: Expr,
}

/// A time expression: a plain number of milliseconds, a textual reference
/// expression (e.g. `"#section_0.end + 500"`), or a binary expression tree.
///
/// Numbers are absolute or parent-relative depending on where the expression
/// sits in the compiled tree. Reference tokens inside textual expressions are
/// subject to id rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expr {
    /// Plain milliseconds
    Number(i64),
    /// Textual reference expression
    Text(String),
    /// Binary expression tree
    Binary(Box<BinaryExpr>),
}

impl Expr {
    /// Shift a numeric expression by `delta` milliseconds.
    ///
    /// Textual and binary expressions are parent-relative by construction and
    /// are left untouched.
    pub fn shift(&mut self, delta: i64) {
        if let Self::Number(value) = self {
            *value += delta;
        }
    }

    /// Get the numeric value if this is a plain number
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for Expr {
    fn from(value: u64) -> Self {
        Self::Number(value as i64)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// When an object exists on the timeline and how its content repeats.
///
/// Every field is optional; an empty enable means "never active".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enable {
    /// Start time, relative to the parent object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Expr>,
    /// End time, relative to the parent object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Expr>,
    /// Duration of one occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Expr>,
    /// Repeat period; the object restarts every `repeating` milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeating: Option<Expr>,
    /// Condition expression; the object is active while this evaluates truthy
    #[serde(rename = "while", skip_serializing_if = "Option::is_none")]
    pub while_active: Option<Expr>,
}

impl Enable {
    /// An enable starting at `start` and never ending
    pub fn starting_at(start: impl Into<Expr>) -> Self {
        Self {
            start: Some(start.into()),
            ..Self::default()
        }
    }

    /// An enable covering `start..end` (open-ended when `end` is `None`)
    pub fn span(start: impl Into<Expr>, end: Option<i64>) -> Self {
        Self {
            start: Some(start.into()),
            end: end.map(Expr::Number),
            ..Self::default()
        }
    }

    /// Iterate over every expression present in this enable
    pub fn exprs_mut(&mut self) -> impl Iterator<Item = &mut Expr> {
        [
            self.start.as_mut(),
            self.end.as_mut(),
            self.duration.as_mut(),
            self.repeating.as_mut(),
            self.while_active.as_mut(),
        ]
        .into_iter()
        .flatten()
    }
}
