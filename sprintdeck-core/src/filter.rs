//! Filter clauses for declarative queries
//!
//! Clauses always combine conjunctively. There is no OR: callers needing a
//! disjunction issue separate queries and merge the results.

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison applied by a filter clause.
///
/// This is a closed set; operator names outside it are rejected when a
/// clause is constructed rather than silently treated as equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal to
    Eq,
    /// Not equal to
    Neq,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Case-sensitive pattern match (`%` and `_` wildcards)
    Like,
    /// Case-insensitive pattern match
    Ilike,
    /// Membership in a list of values
    In,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 9] = [
        FilterOperator::Eq,
        FilterOperator::Neq,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Like,
        FilterOperator::Ilike,
        FilterOperator::In,
    ];

    /// Name of the comparison primitive on the remote side.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::Ilike => "ilike",
            FilterOperator::In => "in",
        }
    }

    /// Whether this operator takes a list operand.
    pub fn expects_list(&self) -> bool {
        matches!(self, FilterOperator::In)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| QueryError::UnknownOperator {
                operator: s.to_string(),
            })
    }
}

/// Operand of a filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<Value>),
    Scalar(Value),
}

impl FilterValue {
    pub fn scalar(value: impl Into<Value>) -> Self {
        FilterValue::Scalar(value.into())
    }

    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FilterValue::List(_))
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => FilterValue::List(items),
            other => FilterValue::Scalar(other),
        }
    }
}

/// A single `column <operator> value` predicate.
///
/// Fields are private so every clause in circulation has passed the
/// operand check in [`FilterClause::new`]. Deserialization goes through
/// the same check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilterClause")]
pub struct FilterClause {
    column: String,
    operator: FilterOperator,
    value: FilterValue,
}

impl FilterClause {
    /// Build a clause, normalizing the operand.
    ///
    /// A list operand under a scalar operator is treated as membership;
    /// `in` with a scalar operand is rejected.
    pub fn new(
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Result<Self, QueryError> {
        let column = column.into();
        let value = value.into();
        let operator = match (&value, operator) {
            (FilterValue::Scalar(_), FilterOperator::In) => {
                return Err(QueryError::ListRequired { column });
            }
            (FilterValue::List(_), _) => FilterOperator::In,
            (FilterValue::Scalar(_), op) => op,
        };
        Ok(Self {
            column,
            operator,
            value,
        })
    }

    /// Build a clause from an operator name, as supplied by loosely typed callers.
    pub fn parse(
        column: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self, QueryError> {
        let operator = operator.parse::<FilterOperator>()?;
        Self::new(column, operator, value)
    }

    fn scalar(column: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        match value {
            Value::Array(items) => Self {
                column: column.into(),
                operator: FilterOperator::In,
                value: FilterValue::List(items),
            },
            other => Self {
                column: column.into(),
                operator,
                value: FilterValue::Scalar(other),
            },
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, FilterOperator::Eq, value.into())
    }

    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, FilterOperator::Neq, value.into())
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, FilterOperator::Gt, value.into())
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, FilterOperator::Gte, value.into())
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, FilterOperator::Lt, value.into())
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, FilterOperator::Lte, value.into())
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::scalar(column, FilterOperator::Like, Value::String(pattern.into()))
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::scalar(column, FilterOperator::Ilike, Value::String(pattern.into()))
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            column: column.into(),
            operator: FilterOperator::In,
            value: FilterValue::list(values),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }
}

#[derive(Deserialize)]
struct RawFilterClause {
    column: String,
    operator: String,
    value: Value,
}

impl TryFrom<RawFilterClause> for FilterClause {
    type Error = QueryError;

    fn try_from(raw: RawFilterClause) -> Result<Self, Self::Error> {
        FilterClause::parse(raw.column, &raw.operator, raw.value)
    }
}
