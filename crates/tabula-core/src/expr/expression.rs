//! Closed predicate tree
//!
//! Comparisons and compounds are the only independently compilable nodes; the
//! remaining variants appear as comparison operands.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TabulaError};
use crate::model::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Comparison(Comparison),
    Compound(Compound),
    /// Property name of the type being filtered
    KeyPath(String),
    Constant(Value),
    /// Ordered constants, the operand of IN and BETWEEN
    Aggregate(Vec<Expression>),
    /// Named template placeholder, replaced by [`Expression::bind`]
    Variable(String),
    Function {
        name: String,
        arguments: Vec<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
    Between,
    In,
    Contains,
    BeginsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub left: Box<Expression>,
    pub operator: Operator,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connector {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    pub connector: Connector,
    pub subexpressions: Vec<Expression>,
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Constant(value)
    }
}

impl Expression {
    pub fn key(path: impl Into<String>) -> Self {
        Expression::KeyPath(path.into())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    pub fn list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Expression::Aggregate(
            values
                .into_iter()
                .map(|v| Expression::Constant(v.into()))
                .collect(),
        )
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    /// `key_path <operator> right`
    pub fn compare(key_path: impl Into<String>, operator: Operator, right: Expression) -> Self {
        Expression::Comparison(Comparison {
            left: Box::new(Expression::key(key_path)),
            operator,
            right: Box::new(right),
        })
    }

    pub fn eq(key_path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(key_path, Operator::Equal, Expression::constant(value))
    }

    pub fn between(
        key_path: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::compare(
            key_path,
            Operator::Between,
            Expression::Aggregate(vec![Expression::constant(low), Expression::constant(high)]),
        )
    }

    pub fn is_in<V: Into<Value>>(
        key_path: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::compare(key_path, Operator::In, Expression::list(values))
    }

    pub fn and(subexpressions: Vec<Expression>) -> Self {
        Expression::Compound(Compound {
            connector: Connector::And,
            subexpressions,
        })
    }

    pub fn or(subexpressions: Vec<Expression>) -> Self {
        Expression::Compound(Compound {
            connector: Connector::Or,
            subexpressions,
        })
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expression) -> Self {
        Expression::Compound(Compound {
            connector: Connector::Not,
            subexpressions: vec![inner],
        })
    }

    /// Name of the node kind, as reported in compilation errors
    pub fn node_kind(&self) -> &'static str {
        match self {
            Expression::Comparison(_) => "comparison",
            Expression::Compound(_) => "compound",
            Expression::KeyPath(_) => "key_path",
            Expression::Constant(_) => "constant",
            Expression::Aggregate(_) => "aggregate",
            Expression::Variable(_) => "variable",
            Expression::Function { .. } => "function",
        }
    }

    /// Replace every [`Expression::Variable`] with its bound constant.
    ///
    /// Fails on a variable with no binding.
    pub fn bind(&self, bindings: &HashMap<String, Value>) -> Result<Expression> {
        Ok(match self {
            Expression::Variable(name) => match bindings.get(name) {
                Some(value) => Expression::Constant(value.clone()),
                None => {
                    return Err(TabulaError::unsupported(
                        "variable",
                        format!("no binding for ${}", name),
                    ))
                }
            },
            Expression::Comparison(c) => Expression::Comparison(Comparison {
                left: Box::new(c.left.bind(bindings)?),
                operator: c.operator,
                right: Box::new(c.right.bind(bindings)?),
            }),
            Expression::Compound(c) => Expression::Compound(Compound {
                connector: c.connector,
                subexpressions: c
                    .subexpressions
                    .iter()
                    .map(|e| e.bind(bindings))
                    .collect::<Result<_>>()?,
            }),
            Expression::Aggregate(items) => Expression::Aggregate(
                items
                    .iter()
                    .map(|e| e.bind(bindings))
                    .collect::<Result<_>>()?,
            ),
            Expression::Function { name, arguments } => Expression::Function {
                name: name.clone(),
                arguments: arguments
                    .iter()
                    .map(|e| e.bind(bindings))
                    .collect::<Result<_>>()?,
            },
            Expression::KeyPath(_) | Expression::Constant(_) => self.clone(),
        })
    }
}
