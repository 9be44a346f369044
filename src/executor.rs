use crate::ast::{ColumnSelection, Direction, JoinClause, OrderKey, Predicate, Query, QueryKind};
use crate::config::EngineConfig;
use crate::error::{QueryError, QueryResult};
use crate::storage::{load_table, persist_table, Row, Table};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Rows produced by a select, already projected. Mutations return an empty set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One pipe-separated line per row, no header.
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.join("|")).collect()
    }
}

/// Executes queries against the backing files under one data directory.
/// Each execution loads its tables from scratch and drops them afterwards.
#[derive(Debug, Clone, Default)]
pub struct Database {
    config: EngineConfig,
}

impl Database {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn execute(&self, query: &Query) -> QueryResult<ResultSet> {
        let mut table = self.load(&query.table)?;
        for join in &query.joins {
            let right = self.load(&join.table)?;
            table = perform_join(table, &right, join);
            debug!(table = %join.table, rows = table.len(), "joined table");
        }

        match query.kind {
            QueryKind::Select => Ok(self.execute_select(&table, query)),
            QueryKind::Insert => self.execute_insert(table, query),
            QueryKind::Update => self.execute_update(table, query),
            QueryKind::Delete => self.execute_delete(table, query),
        }
    }

    fn load(&self, table_name: &str) -> QueryResult<Table> {
        load_table(&self.config.table_path(table_name))
    }

    fn persist(&self, table_name: &str, table: &Table) -> QueryResult<ResultSet> {
        persist_table(&self.config.table_path(table_name), table)?;
        Ok(ResultSet::default())
    }

    fn execute_select(&self, table: &Table, query: &Query) -> ResultSet {
        let mut rows = apply_where_clause(table, &query.predicates);
        apply_order_by(&mut rows, &query.order_by);
        ResultSet { rows: project(table, &rows, &query.columns) }
    }

    fn execute_insert(&self, mut table: Table, query: &Query) -> QueryResult<ResultSet> {
        let values = query.values.as_deref().unwrap_or_default();
        if values.len() != table.columns.len() {
            return Err(QueryError::validation(format!(
                "Insert column value mismatch: table has {} columns, got {} values",
                table.columns.len(),
                values.len()
            )));
        }

        let fields = table.columns.iter().cloned().zip(values.iter().cloned()).collect();
        let id = table.push(fields);
        debug!(table = %query.table, id, "inserted row");
        self.persist(&query.table, &table)
    }

    fn execute_update(&self, mut table: Table, query: &Query) -> QueryResult<ResultSet> {
        let assignments = query.assignments.as_deref().unwrap_or_default();
        if let Some((column, _)) = assignments.iter().find(|(col, _)| !table.columns.contains(col)) {
            return Err(QueryError::validation(format!("Unknown column '{}' in SET", column)));
        }

        let mut updated = 0;
        for row in table.rows.values_mut() {
            if matches_all(row, &query.predicates) {
                for (column, value) in assignments {
                    row.fields.insert(column.clone(), value.clone());
                }
                updated += 1;
            }
        }
        debug!(table = %query.table, updated, "updated rows");
        self.persist(&query.table, &table)
    }

    fn execute_delete(&self, mut table: Table, query: &Query) -> QueryResult<ResultSet> {
        let before = table.len();
        if query.predicates.is_empty() {
            table.rows.clear();
        } else {
            table.rows.retain(|_, row| !matches_all(row, &query.predicates));
        }
        debug!(table = %query.table, deleted = before - table.len(), "deleted rows");
        self.persist(&query.table, &table)
    }
}

/// Nested-loop equality join. Right fields overwrite left fields of the same
/// name, duplicate column names keep their first position, and the result is
/// renumbered from 1 in left-major order.
pub fn perform_join(left: Table, right: &Table, join: &JoinClause) -> Table {
    let mut columns = left.columns;
    for col in &right.columns {
        if !columns.contains(col) {
            columns.push(col.clone());
        }
    }

    let mut joined = Table::new(columns);
    for lrow in left.rows.values() {
        let Some(key) = lrow.get(&join.left_column) else { continue };
        for rrow in right.rows.values() {
            if rrow.get(&join.right_column) == Some(key) {
                let mut fields: HashMap<String, String> = lrow.fields.clone();
                fields.extend(rrow.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                joined.push(fields);
            }
        }
    }
    joined
}

/// True when the row satisfies every predicate; an empty list accepts all rows.
pub fn matches_all(row: &Row, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| p.criterion.accepts(row.get(&p.column)))
}

pub fn apply_where_clause<'t>(table: &'t Table, predicates: &[Predicate]) -> Vec<&'t Row> {
    table.rows.values().filter(|row| matches_all(row, predicates)).collect()
}

/// Stable multi-key sort. A missing value orders before any present one.
pub fn apply_order_by(rows: &mut [&Row], keys: &[OrderKey]) {
    if keys.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for key in keys {
            let ordering = a.get(&key.column).cmp(&b.get(&key.column));
            let ordering = match key.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Selected fields of each row in table column order; absent fields are skipped.
pub fn project(table: &Table, rows: &[&Row], selection: &ColumnSelection) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            table
                .columns
                .iter()
                .filter(|col| selection.includes(col))
                .filter_map(|col| row.get(col).map(str::to_string))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Criterion;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for values in rows {
            let fields = columns
                .iter()
                .zip(values.iter())
                .map(|(c, v)| (c.to_string(), v.to_string()))
                .collect();
            table.push(fields);
        }
        table
    }

    fn eq(column: &str, value: &str) -> Predicate {
        Predicate { column: column.into(), criterion: Criterion::Equals(value.into()) }
    }

    fn names(rows: &[&Row]) -> Vec<String> {
        rows.iter().map(|r| r.get("name").unwrap_or_default().to_string()).collect()
    }

    #[test]
    fn test_where_is_conjunction() {
        let t = table(&["name", "age", "city"], &[&["a", "30", "x"], &["b", "30", "y"], &["c", "25", "x"]]);
        let preds = vec![eq("age", "30"), eq("city", "x")];
        assert_eq!(names(&apply_where_clause(&t, &preds)), vec!["a"]);

        for row in t.rows.values() {
            let individually = preds.iter().all(|p| matches_all(row, std::slice::from_ref(p)));
            assert_eq!(matches_all(row, &preds), individually);
        }
        assert_eq!(apply_where_clause(&t, &[]).len(), 3);
    }

    #[test]
    fn test_missing_column_never_matches() {
        let t = table(&["name"], &[&["a"]]);
        assert!(apply_where_clause(&t, &[eq("ghost", "a")]).is_empty());
    }

    #[test]
    fn test_order_by_is_stable_and_multi_key() {
        let t = table(
            &["name", "age", "city"],
            &[&["a", "30", "x"], &["b", "25", "y"], &["c", "30", "y"], &["d", "25", "y"]],
        );
        let mut rows = apply_where_clause(&t, &[]);
        apply_order_by(&mut rows, &[OrderKey { column: "city".into(), direction: Direction::Descending }]);
        assert_eq!(names(&rows), vec!["b", "c", "d", "a"]);

        apply_order_by(
            &mut rows,
            &[
                OrderKey { column: "age".into(), direction: Direction::Ascending },
                OrderKey { column: "name".into(), direction: Direction::Descending },
            ],
        );
        assert_eq!(names(&rows), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_sort_compares_text_not_numbers() {
        let t = table(&["name", "n"], &[&["a", "9"], &["b", "10"]]);
        let mut rows = apply_where_clause(&t, &[]);
        apply_order_by(&mut rows, &[OrderKey { column: "n".into(), direction: Direction::Ascending }]);
        assert_eq!(names(&rows), vec!["b", "a"]);
    }

    #[test]
    fn test_join_renumbers_and_overwrites() {
        let orders = table(&["order", "user_id", "note"], &[&["o1", "1", "left"], &["o2", "2", "left"], &["o3", "1", "left"]]);
        let users = table(&["uid", "name", "note"], &[&["1", "alice", "right"], &["2", "bob", "right"]]);
        let join = JoinClause { left_column: "user_id".into(), table: "users.csv".into(), right_column: "uid".into() };

        let joined = perform_join(orders, &users, &join);

        assert_eq!(joined.columns, vec!["order", "user_id", "note", "uid", "name"]);
        assert_eq!(joined.rows.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(joined.rows[&2].get("name"), Some("bob"));
        assert_eq!(joined.rows[&3].get("order"), Some("o3"));
        assert_eq!(joined.rows[&1].get("note"), Some("right"));
    }

    #[test]
    fn test_join_without_matches_is_empty() {
        let left = table(&["k"], &[&["1"]]);
        let right = table(&["k2"], &[&["2"]]);
        let join = JoinClause { left_column: "k".into(), table: "r.csv".into(), right_column: "k2".into() };
        assert!(perform_join(left, &right, &join).is_empty());
    }

    #[test]
    fn test_project_keeps_table_column_order() {
        let t = table(&["name", "age"], &[&["alice", "30"]]);
        let rows = apply_where_clause(&t, &[]);
        let selection = ColumnSelection::Columns(vec!["age".into(), "name".into()]);
        assert_eq!(project(&t, &rows, &selection), vec![vec!["alice".to_string(), "30".to_string()]]);
        assert_eq!(project(&t, &rows, &ColumnSelection::All)[0].len(), 2);
    }

    #[test]
    fn test_result_set_lines() {
        let set = ResultSet { rows: vec![vec!["alice".into(), "30".into()]] };
        assert_eq!(set.lines(), vec!["alice|30"]);
    }
}
