//! Query descriptors and mutation requests
//!
//! A [`QueryDescriptor`] is an immutable description of a read. It is
//! constructed per call and handed to the builder by reference, so one
//! request can never observe another's filters.

use crate::error::QueryError;
use crate::filter::FilterClause;
use crate::identity::{Identifier, Record};
use serde::{Deserialize, Serialize};

/// Single-column ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// What to read from a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    select: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order_by: Option<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    relationships: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    filters: Vec<FilterClause>,
}

impl QueryDescriptor {
    /// Start a descriptor selecting every column of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: None,
            order_by: None,
            limit: None,
            relationships: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Restrict the selected columns.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.select = if columns.is_empty() { None } else { Some(columns) };
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order_by = Some(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Expand a named relationship into a nested object on each row.
    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationships.push(relationship.into());
        self
    }

    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.filters.push(clause);
        self
    }

    pub fn filters<I>(mut self, clauses: I) -> Self
    where
        I: IntoIterator<Item = FilterClause>,
    {
        self.filters.extend(clauses);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Requested columns, or `None` for all columns.
    pub fn columns(&self) -> Option<&[String]> {
        self.select.as_deref()
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn relationships(&self) -> &[String] {
        &self.relationships
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.filters
    }
}

/// Kind of write carried by a [`MutationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

/// Resource-polymorphic write request.
///
/// When `kind` is absent it is inferred from which of `id` and `data`
/// are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub resource: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MutationKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
}

impl MutationRequest {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            kind: None,
            id: None,
            data: None,
        }
    }

    pub fn with_kind(mut self, kind: MutationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_id(mut self, id: impl Into<Identifier>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: Record) -> Self {
        self.data = Some(data);
        self
    }

    /// Determine the write to perform.
    ///
    /// `id + data` is an update, `data` alone a create, `id` alone a delete.
    /// An explicit kind is checked against the operands it needs.
    pub fn resolve_kind(&self) -> Result<MutationKind, QueryError> {
        let kind = match (self.kind, &self.id, &self.data) {
            (Some(kind), _, _) => kind,
            (None, Some(_), Some(_)) => MutationKind::Update,
            (None, None, Some(_)) => MutationKind::Create,
            (None, Some(_), None) => MutationKind::Delete,
            (None, None, None) => {
                return Err(QueryError::EmptyMutation {
                    resource: self.resource.clone(),
                })
            }
        };

        if matches!(kind, MutationKind::Update | MutationKind::Delete) && self.id.is_none() {
            return Err(QueryError::MissingIdentifier {
                operation: kind.as_str(),
            });
        }
        if matches!(kind, MutationKind::Create | MutationKind::Update) && self.data.is_none() {
            return Err(QueryError::MissingPayload {
                operation: kind.as_str(),
            });
        }
        Ok(kind)
    }
}
