//! In-memory relational store
//!
//! Implements [`RemoteStore`] over plain row vectors. Tables declare their
//! columns up front so unknown columns fail the way a real store would.
//! Tests use the call log, failure injection and the pause gate to
//! observe and steer gateway behavior.

use crate::builder::{RemoteQuery, RemoteWrite};
use crate::remote::RemoteStore;
use ::async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sprintdeck_core::{
    FilterClause, FilterOperator, FilterValue, Identifier, MutationKind, OrderBy, Record,
    StoreError, DEFAULT_ID_FIELD,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tokio::sync::watch;

// ============================================================================
// CALL LOG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl From<MutationKind> for CallKind {
    fn from(kind: MutationKind) -> Self {
        match kind {
            MutationKind::Create => CallKind::Insert,
            MutationKind::Update => CallKind::Update,
            MutationKind::Delete => CallKind::Delete,
        }
    }
}

/// One statement received by the store, recorded before it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub kind: CallKind,
    pub resource: String,
    pub single: bool,
    pub limit: Option<usize>,
    pub predicates: Vec<FilterClause>,
    pub payload: Option<Record>,
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Default)]
struct MemoryTable {
    columns: BTreeSet<String>,
    rows: Vec<Record>,
    next_id: i64,
}

#[derive(Debug, Clone)]
struct Relation {
    target: String,
    foreign_key: String,
}

#[derive(Debug, Default)]
struct Failures {
    next: VecDeque<StoreError>,
    always: Option<StoreError>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, MemoryTable>,
    relations: HashMap<(String, String), Relation>,
    failures: HashMap<String, Failures>,
    calls: Vec<StoreCall>,
}

/// In-memory [`RemoteStore`].
#[derive(Debug)]
pub struct MemoryStore {
    id_field: String,
    state: Mutex<MemoryState>,
    gate: watch::Sender<bool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_id_field(DEFAULT_ID_FIELD)
    }

    /// Store whose tables are keyed by `id_field`.
    pub fn with_id_field(id_field: impl Into<String>) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            id_field: id_field.into(),
            state: Mutex::new(MemoryState::default()),
            gate,
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Declare a table. The identifier column is always present.
    pub fn with_table<I, S>(self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.create_table(name, columns);
        self
    }

    /// Expand `name` on rows of `from` into the `target` row whose
    /// identifier equals the row's `foreign_key` column.
    pub fn with_relation(
        self,
        from: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.state.lock().relations.insert(
            (from.into(), name.into()),
            Relation {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        );
        self
    }

    pub fn create_table<I, S>(&self, name: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: BTreeSet<String> = columns.into_iter().map(Into::into).collect();
        columns.insert(self.id_field.clone());
        self.state.lock().tables.insert(
            name.into(),
            MemoryTable {
                columns,
                rows: Vec::new(),
                next_id: 1,
            },
        );
    }

    pub fn drop_table(&self, name: &str) {
        self.state.lock().tables.remove(name);
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.state.lock().tables.contains_key(name)
    }

    /// Insert rows directly, bypassing the call log, gate and failures.
    pub fn seed<I>(&self, table: &str, rows: I) -> Result<Vec<Record>, StoreError>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut state = self.state.lock();
        let mut inserted = Vec::new();
        for row in rows {
            inserted.push(state.insert_row(table, row, &self.id_field)?);
        }
        Ok(inserted)
    }

    /// Current contents of a table in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.state
            .lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn row(&self, table: &str, id: &Identifier) -> Option<Record> {
        self.state.lock().tables.get(table).and_then(|t| {
            t.rows
                .iter()
                .find(|row| row.get(&self.id_field).is_some_and(|v| id.matches(v)))
                .cloned()
        })
    }

    /// Fail the next statement against `resource` with `error`.
    pub fn fail_next(&self, resource: impl Into<String>, error: StoreError) {
        self.state
            .lock()
            .failures
            .entry(resource.into())
            .or_default()
            .next
            .push_back(error);
    }

    /// Fail every statement against `resource` until cleared.
    pub fn fail_always(&self, resource: impl Into<String>, error: StoreError) {
        self.state
            .lock()
            .failures
            .entry(resource.into())
            .or_default()
            .always = Some(error);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, kind: CallKind) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.kind == kind)
            .count()
    }

    pub fn calls_to(&self, kind: CallKind, resource: &str) -> Vec<StoreCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.kind == kind && c.resource == resource)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Hold every subsequent statement after it is logged until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    async fn wait_open(&self) {
        let mut open = self.gate.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = open.wait_for(|open| *open).await;
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &RemoteQuery) -> Result<Vec<Record>, StoreError> {
        self.state.lock().calls.push(StoreCall {
            kind: CallKind::Select,
            resource: query.resource.clone(),
            single: query.single,
            limit: query.limit,
            predicates: query.predicates.clone(),
            payload: None,
        });
        self.wait_open().await;

        let mut state = self.state.lock();
        state.take_failure(&query.resource)?;
        state.select(query, &self.id_field)
    }

    async fn execute(&self, write: &RemoteWrite) -> Result<Vec<Record>, StoreError> {
        self.state.lock().calls.push(StoreCall {
            kind: CallKind::from(write.kind),
            resource: write.resource.clone(),
            single: false,
            limit: None,
            predicates: write.predicates.clone(),
            payload: write.payload.clone(),
        });
        self.wait_open().await;

        let mut state = self.state.lock();
        state.take_failure(&write.resource)?;
        match write.kind {
            MutationKind::Create => {
                let payload = write.payload.clone().unwrap_or_default();
                let row = state.insert_row(&write.resource, payload, &self.id_field)?;
                Ok(vec![row])
            }
            MutationKind::Update => {
                let payload = write.payload.clone().unwrap_or_default();
                state.update_rows(&write.resource, &write.predicates, &payload)
            }
            MutationKind::Delete => state.delete_rows(&write.resource, &write.predicates),
        }
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

impl MemoryState {
    fn take_failure(&mut self, resource: &str) -> Result<(), StoreError> {
        let Some(failures) = self.failures.get_mut(resource) else {
            return Ok(());
        };
        if let Some(error) = failures.next.pop_front() {
            return Err(error);
        }
        match &failures.always {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn table(&self, resource: &str) -> Result<&MemoryTable, StoreError> {
        self.tables
            .get(resource)
            .ok_or_else(|| StoreError::unknown_resource(resource))
    }

    fn table_mut(&mut self, resource: &str) -> Result<&mut MemoryTable, StoreError> {
        self.tables
            .get_mut(resource)
            .ok_or_else(|| StoreError::unknown_resource(resource))
    }

    fn select(&self, query: &RemoteQuery, id_field: &str) -> Result<Vec<Record>, StoreError> {
        let table = self.table(&query.resource)?;
        for column in &query.columns {
            table.check_column(&query.resource, column)?;
        }
        table.check_predicates(&query.resource, &query.predicates)?;

        let mut rows: Vec<&Record> = table
            .rows
            .iter()
            .filter(|row| query.predicates.iter().all(|clause| clause_matches(row, clause)))
            .collect();

        if let Some(order) = &query.order {
            table.check_column(&query.resource, &order.column)?;
            sort_rows(&mut rows, order);
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut projected = project(row, &query.columns);
            for embed in &query.embeds {
                let value = self.embed(&query.resource, embed, row, id_field)?;
                projected.insert(embed.clone(), value);
            }
            out.push(projected);
        }

        if query.single {
            match out.len() {
                0 => {
                    return Err(StoreError::NoRows {
                        resource: query.resource.clone(),
                    })
                }
                1 => {}
                count => {
                    return Err(StoreError::MultipleRows {
                        resource: query.resource.clone(),
                        count,
                    })
                }
            }
        }
        Ok(out)
    }

    fn embed(
        &self,
        resource: &str,
        name: &str,
        row: &Record,
        id_field: &str,
    ) -> Result<Value, StoreError> {
        let relation = self
            .relations
            .get(&(resource.to_string(), name.to_string()))
            .ok_or_else(|| {
                StoreError::query(resource, format!("no relationship named '{}'", name))
            })?;
        let target = self.table(&relation.target)?;
        let Some(key) = row.get(&relation.foreign_key).and_then(Identifier::from_value) else {
            return Ok(Value::Null);
        };
        Ok(target
            .rows
            .iter()
            .find(|candidate| candidate.get(id_field).is_some_and(|v| key.matches(v)))
            .map(|found| Value::Object(found.clone()))
            .unwrap_or(Value::Null))
    }

    fn insert_row(
        &mut self,
        resource: &str,
        payload: Record,
        id_field: &str,
    ) -> Result<Record, StoreError> {
        let table = self.table_mut(resource)?;
        for column in payload.keys() {
            table.check_column(resource, column)?;
        }

        let id = match payload.get(id_field).and_then(Identifier::from_value) {
            Some(id) => {
                if table.find(id_field, &id).is_some() {
                    return Err(StoreError::query(
                        resource,
                        format!("duplicate key {}={}", id_field, id),
                    ));
                }
                if let Identifier::Int(n) = id {
                    table.next_id = table.next_id.max(n.saturating_add(1));
                }
                id
            }
            None => {
                let id = Identifier::Int(table.next_id);
                if table.find(id_field, &id).is_some() {
                    return Err(StoreError::query(resource, "id sequence exhausted"));
                }
                table.next_id = table.next_id.saturating_add(1);
                id
            }
        };

        let mut row: Record = table
            .columns
            .iter()
            .map(|column| (column.clone(), Value::Null))
            .collect();
        row.extend(payload);
        row.insert(id_field.to_string(), id.to_value());
        table.rows.push(row.clone());
        Ok(row)
    }

    fn update_rows(
        &mut self,
        resource: &str,
        predicates: &[FilterClause],
        payload: &Record,
    ) -> Result<Vec<Record>, StoreError> {
        let table = self.table_mut(resource)?;
        table.check_predicates(resource, predicates)?;
        for column in payload.keys() {
            table.check_column(resource, column)?;
        }

        let mut updated = Vec::new();
        for row in table
            .rows
            .iter_mut()
            .filter(|row| predicates.iter().all(|clause| clause_matches(row, clause)))
        {
            for (column, value) in payload {
                row.insert(column.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    fn delete_rows(
        &mut self,
        resource: &str,
        predicates: &[FilterClause],
    ) -> Result<Vec<Record>, StoreError> {
        let table = self.table_mut(resource)?;
        table.check_predicates(resource, predicates)?;

        let (removed, kept): (Vec<Record>, Vec<Record>) = std::mem::take(&mut table.rows)
            .into_iter()
            .partition(|row| predicates.iter().all(|clause| clause_matches(row, clause)));
        table.rows = kept;
        Ok(removed)
    }
}

impl MemoryTable {
    fn check_column(&self, resource: &str, column: &str) -> Result<(), StoreError> {
        if self.columns.contains(column) {
            Ok(())
        } else {
            Err(StoreError::query(
                resource,
                format!("column '{}' does not exist", column),
            ))
        }
    }

    fn check_predicates(&self, resource: &str, predicates: &[FilterClause]) -> Result<(), StoreError> {
        predicates
            .iter()
            .try_for_each(|clause| self.check_column(resource, clause.column()))
    }

    fn find(&self, id_field: &str, id: &Identifier) -> Option<&Record> {
        self.rows
            .iter()
            .find(|row| row.get(id_field).is_some_and(|v| id.matches(v)))
    }
}

fn project(row: &Record, columns: &[String]) -> Record {
    if columns.is_empty() {
        return row.clone();
    }
    columns
        .iter()
        .map(|column| {
            (
                column.clone(),
                row.get(column).cloned().unwrap_or(Value::Null),
            )
        })
        .collect()
}

fn sort_rows(rows: &mut [&Record], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let left = a.get(&order.column).unwrap_or(&Value::Null);
        let right = b.get(&order.column).unwrap_or(&Value::Null);
        // Nulls sort last ascending.
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
        };
        if order.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Evaluate one clause against a row. SQL null semantics: a null on
/// either side never matches.
pub(crate) fn clause_matches(row: &Record, clause: &FilterClause) -> bool {
    let cell = match row.get(clause.column()) {
        Some(value) if !value.is_null() => value,
        _ => return false,
    };
    match (clause.operator(), clause.value()) {
        (FilterOperator::In, FilterValue::List(items)) => items.iter().any(|item| equals(cell, item)),
        (_, FilterValue::List(_)) => false,
        (op, FilterValue::Scalar(operand)) => {
            if operand.is_null() {
                return false;
            }
            match op {
                FilterOperator::Eq => equals(cell, operand),
                FilterOperator::Neq => !equals(cell, operand),
                FilterOperator::Gt => compare(cell, operand) == Some(Ordering::Greater),
                FilterOperator::Gte => matches!(
                    compare(cell, operand),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                FilterOperator::Lt => compare(cell, operand) == Some(Ordering::Less),
                FilterOperator::Lte => {
                    matches!(compare(cell, operand), Some(Ordering::Less | Ordering::Equal))
                }
                FilterOperator::Like => pattern_matches(cell, operand, false),
                FilterOperator::Ilike => pattern_matches(cell, operand, true),
                FilterOperator::In => false,
            }
        }
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn equals(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    match compare(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

fn pattern_matches(cell: &Value, pattern: &Value, case_insensitive: bool) -> bool {
    let (Value::String(text), Value::String(pattern)) = (cell, pattern) else {
        return false;
    };
    if case_insensitive {
        like(&text.to_lowercase(), &pattern.to_lowercase())
    } else {
        like(text, pattern)
    }
}

/// SQL LIKE: `%` matches any run, `_` exactly one character.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    // reachable[j]: text[..i] matches pattern[..j]
    let mut reachable = vec![false; pattern.len() + 1];
    reachable[0] = true;
    for j in 1..=pattern.len() {
        reachable[j] = reachable[j - 1] && pattern[j - 1] == '%';
    }
    for &c in &text {
        let mut next = vec![false; pattern.len() + 1];
        for j in 1..=pattern.len() {
            next[j] = match pattern[j - 1] {
                '%' => next[j - 1] || reachable[j],
                '_' => reachable[j - 1],
                p => reachable[j - 1] && p == c,
            };
        }
        reachable = next;
    }
    reachable[pattern.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::QueryBuilder;
    use serde_json::json;
    use sprintdeck_core::QueryDescriptor;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new()
            .with_table("projects", ["name"])
            .with_table("tasks", ["title", "status", "points", "project_id"])
            .with_relation("tasks", "projects", "projects", "project_id");
        store
            .seed("projects", [record(json!({"name": "Apollo"}))])
            .unwrap();
        store
            .seed(
                "tasks",
                [
                    record(json!({"title": "Write docs", "status": "todo", "points": 3, "project_id": 1})),
                    record(json!({"title": "Fix login", "status": "done", "points": 5, "project_id": 1})),
                    record(json!({"title": "Deploy", "status": "todo", "points": null})),
                ],
            )
            .unwrap();
        store
    }

    async fn select(store: &MemoryStore, descriptor: QueryDescriptor) -> Result<Vec<Record>, StoreError> {
        store.select(&QueryBuilder::build(&descriptor)).await
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like("Fix login", "Fix%"));
        assert!(like("Fix login", "%log_n"));
        assert!(like("", "%"));
        assert!(!like("Fix login", "fix%"));
        assert!(!like("abc", "a_"));
        assert!(like("a%c", "a%c"));
    }

    #[test]
    fn test_seed_assigns_sequential_ids() {
        let store = store();
        let ids: Vec<Value> = store.rows("tasks").iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_seed_with_max_id_saturates_counter() {
        let store = MemoryStore::new().with_table("tasks", ["title"]);
        store
            .seed("tasks", [record(json!({"id": i64::MAX, "title": "Last"}))])
            .unwrap();
        assert!(store.row("tasks", &Identifier::Int(i64::MAX)).is_some());

        // The counter is pinned at the maximum, so the next auto id collides.
        let err = store
            .seed("tasks", [record(json!({"title": "Next"}))])
            .unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }));
    }

    #[tokio::test]
    async fn test_filters_and_null_semantics() {
        let store = store();
        let rows = select(&store, QueryDescriptor::table("tasks").filter(FilterClause::gte("points", 3)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        let rows = select(&store, QueryDescriptor::table("tasks").filter(FilterClause::neq("points", 3)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1, "null never matches neq");

        let rows = select(
            &store,
            QueryDescriptor::table("tasks").filter(FilterClause::ilike("title", "%LOGIN%")),
        )
        .await
        .unwrap();
        assert_eq!(rows[0]["title"], json!("Fix login"));
    }

    #[tokio::test]
    async fn test_unknown_column_is_query_error() {
        let store = store();
        let err = select(&store, QueryDescriptor::table("tasks").filter(FilterClause::eq("colour", "red")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }));

        let err = select(&store, QueryDescriptor::table("tasks").order_by("colour", true))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }));
    }

    #[tokio::test]
    async fn test_unknown_table_is_unknown_resource() {
        let err = select(&store(), QueryDescriptor::table("epics")).await.unwrap_err();
        assert_eq!(err, StoreError::unknown_resource("epics"));
    }

    #[tokio::test]
    async fn test_order_limit_and_projection() {
        let store = store();
        let rows = select(
            &store,
            QueryDescriptor::table("tasks")
                .select(["title"])
                .order_by("points", false)
                .limit(2),
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 2);
        // Descending puts the null first.
        assert_eq!(rows[0], record(json!({"title": "Deploy"})));
        assert_eq!(rows[1], record(json!({"title": "Fix login"})));
    }

    #[tokio::test]
    async fn test_relationship_embeds_target_row() {
        let store = store();
        let rows = select(
            &store,
            QueryDescriptor::table("tasks")
                .with_relationship("projects")
                .order_by("id", true),
        )
        .await
        .unwrap();
        assert_eq!(rows[0]["projects"]["name"], json!("Apollo"));
        assert_eq!(rows[2]["projects"], Value::Null);
    }

    #[tokio::test]
    async fn test_single_row_outcomes() {
        let store = store();
        let one = RemoteQuery::all("tasks").single_by_id("id", &Identifier::Int(2));
        assert_eq!(store.select(&one).await.unwrap().len(), 1);

        let none = RemoteQuery::all("tasks").single_by_id("id", &Identifier::Int(99));
        assert!(matches!(store.select(&none).await, Err(StoreError::NoRows { .. })));

        let mut many = RemoteQuery::all("tasks");
        many.single = true;
        assert!(matches!(
            store.select(&many).await,
            Err(StoreError::MultipleRows { count: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_writes_return_affected_rows() {
        let store = store();
        let created = store
            .execute(&QueryBuilder::insert("tasks", record(json!({"title": "New", "status": "todo"}))))
            .await
            .unwrap();
        assert_eq!(created[0]["id"], json!(4));
        assert_eq!(created[0]["points"], Value::Null);

        let updated = store
            .execute(&QueryBuilder::update(
                "tasks",
                "id",
                &Identifier::Int(4),
                record(json!({"status": "done"})),
            ))
            .await
            .unwrap();
        assert_eq!(updated[0]["status"], json!("done"));

        let deleted = store
            .execute(&QueryBuilder::delete("tasks", "id", &Identifier::Int(4)))
            .await
            .unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(store.rows("tasks").len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let store = store();
        let err = store
            .execute(&QueryBuilder::insert("tasks", record(json!({"id": 1, "title": "Dup"}))))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }));
    }

    #[tokio::test]
    async fn test_failure_injection_and_call_log() {
        let store = store();
        store.fail_next("tasks", StoreError::transport("tasks", "reset"));

        let query = RemoteQuery::all("tasks");
        assert!(store.select(&query).await.is_err());
        assert!(store.select(&query).await.is_ok());
        assert_eq!(store.call_count(CallKind::Select), 2);

        store.fail_always("tasks", StoreError::transport("tasks", "down"));
        assert!(store.select(&query).await.is_err());
        assert!(store.select(&query).await.is_err());
        store.clear_failures();
        assert!(store.select(&query).await.is_ok());
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
