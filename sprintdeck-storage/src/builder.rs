//! Translation of query descriptors into remote statements
//!
//! The builder is a pure function of its input. It does not check column
//! names or types; a bad column surfaces as a store error when the
//! statement runs.

use serde::Serialize;
use sprintdeck_core::{
    FilterClause, Identifier, MutationKind, OrderBy, QueryDescriptor, Record,
};

/// A read statement against one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteQuery {
    pub resource: String,
    /// Projected columns. Empty selects every column.
    pub columns: Vec<String>,
    /// Relationships expanded into nested objects on each row.
    pub embeds: Vec<String>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
    pub predicates: Vec<FilterClause>,
    /// Exactly one row is expected.
    pub single: bool,
}

impl RemoteQuery {
    /// Statement selecting every column of `resource`.
    pub fn all(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            columns: Vec::new(),
            embeds: Vec::new(),
            order: None,
            limit: None,
            predicates: Vec::new(),
            single: false,
        }
    }

    /// Cheapest statement that proves `resource` is reachable.
    pub fn probe(resource: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into()],
            limit: Some(1),
            ..Self::all(resource)
        }
    }

    /// Narrow to the row whose `id_field` equals `id` and expect exactly one.
    pub fn single_by_id(mut self, id_field: &str, id: &Identifier) -> Self {
        self.predicates.push(FilterClause::eq(id_field, id.to_value()));
        self.single = true;
        self
    }

    /// Select-list text as the remote API spells it.
    ///
    /// `*`, `a,b`, or `*,projects(*)` when relationships are expanded.
    pub fn select_clause(&self) -> String {
        let mut parts: Vec<String> = if self.columns.is_empty() {
            vec!["*".to_string()]
        } else {
            self.columns.clone()
        };
        parts.extend(self.embeds.iter().map(|embed| format!("{}(*)", embed)));
        parts.join(",")
    }
}

/// A write statement against one resource.
///
/// The affected rows are always requested back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteWrite {
    pub resource: String,
    pub kind: MutationKind,
    pub predicates: Vec<FilterClause>,
    pub payload: Option<Record>,
}

/// Builds remote statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    /// Translate a descriptor into a read statement.
    ///
    /// Applied in order: base selection, relationship expansion, ordering,
    /// limit, filters.
    pub fn build(descriptor: &QueryDescriptor) -> RemoteQuery {
        let mut query = RemoteQuery::all(descriptor.table_name());
        if let Some(columns) = descriptor.columns() {
            query.columns = columns.to_vec();
        }
        query.embeds = descriptor.relationships().to_vec();
        query.order = descriptor.ordering().cloned();
        query.limit = descriptor.row_limit();
        query.predicates = descriptor.clauses().to_vec();
        query
    }

    pub fn insert(resource: impl Into<String>, payload: Record) -> RemoteWrite {
        RemoteWrite {
            resource: resource.into(),
            kind: MutationKind::Create,
            predicates: Vec::new(),
            payload: Some(payload),
        }
    }

    pub fn update(
        resource: impl Into<String>,
        id_field: &str,
        id: &Identifier,
        payload: Record,
    ) -> RemoteWrite {
        RemoteWrite {
            resource: resource.into(),
            kind: MutationKind::Update,
            predicates: vec![FilterClause::eq(id_field, id.to_value())],
            payload: Some(payload),
        }
    }

    pub fn delete(resource: impl Into<String>, id_field: &str, id: &Identifier) -> RemoteWrite {
        RemoteWrite {
            resource: resource.into(),
            kind: MutationKind::Delete,
            predicates: vec![FilterClause::eq(id_field, id.to_value())],
            payload: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sprintdeck_core::FilterOperator;

    #[test]
    fn test_build_defaults_to_star() {
        let query = QueryBuilder::build(&QueryDescriptor::table("tasks"));
        assert_eq!(query.resource, "tasks");
        assert_eq!(query.select_clause(), "*");
        assert!(query.predicates.is_empty());
        assert!(!query.single);
    }

    #[test]
    fn test_build_carries_every_part() {
        let descriptor = QueryDescriptor::table("sprints")
            .select(["id", "name"])
            .with_relationship("projects")
            .order_by("start_date", true)
            .limit(5)
            .filter(FilterClause::eq("status", "active"))
            .filter(FilterClause::is_in("project_id", [1, 2]));
        let query = QueryBuilder::build(&descriptor);

        assert_eq!(query.select_clause(), "id,name,projects(*)");
        assert_eq!(query.order.as_ref().map(|o| o.column.as_str()), Some("start_date"));
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.predicates.len(), 2);
        assert_eq!(query.predicates[1].operator(), FilterOperator::In);
    }

    #[test]
    fn test_relationship_with_all_columns() {
        let query =
            QueryBuilder::build(&QueryDescriptor::table("sprints").with_relationship("projects"));
        assert_eq!(query.select_clause(), "*,projects(*)");
    }

    #[test]
    fn test_build_leaves_descriptor_untouched() {
        let descriptor = QueryDescriptor::table("tasks").filter(FilterClause::eq("status", "todo"));
        let before = descriptor.clone();
        let mut query = QueryBuilder::build(&descriptor);
        query.predicates.clear();
        assert_eq!(descriptor, before);
    }

    #[test]
    fn test_single_by_id_adds_equality() {
        let query = RemoteQuery::all("tasks").single_by_id("id", &Identifier::Int(4));
        assert!(query.single);
        assert_eq!(query.predicates, vec![FilterClause::eq("id", json!(4))]);
    }

    #[test]
    fn test_probe_is_minimal() {
        let query = RemoteQuery::probe("sprints", "id");
        assert_eq!(query.select_clause(), "id");
        assert_eq!(query.limit, Some(1));
    }

    #[test]
    fn test_write_builders() {
        let mut payload = Record::new();
        payload.insert("status".to_string(), json!("done"));

        let update = QueryBuilder::update("tasks", "id", &Identifier::Int(2), payload.clone());
        assert_eq!(update.kind, MutationKind::Update);
        assert_eq!(update.predicates, vec![FilterClause::eq("id", json!(2))]);

        let delete = QueryBuilder::delete("tasks", "task_key", &Identifier::from("T-1"));
        assert!(delete.payload.is_none());
        assert_eq!(delete.predicates[0].column(), "task_key");

        let insert = QueryBuilder::insert("tasks", payload);
        assert!(insert.predicates.is_empty());
    }
}
