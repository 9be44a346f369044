use crate::error::{QueryError, QueryResult};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ColumnSelection {
    All,
    Columns(Vec<String>),
}

impl ColumnSelection {
    pub fn includes(&self, column: &str) -> bool {
        match self {
            ColumnSelection::All => true,
            ColumnSelection::Columns(cols) => cols.iter().any(|c| c == column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Criterion {
    Equals(String),
    OneOf(BTreeSet<String>),
}

impl Criterion {
    pub fn accepts(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (_, None) => false,
            (Criterion::Equals(expected), Some(v)) => expected == v,
            (Criterion::OneOf(set), Some(v)) => set.contains(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub column: String,
    pub criterion: Criterion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinClause {
    pub left_column: String,
    pub table: String,
    pub right_column: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Parses `ASC`/`DESC` in any case; anything else is not a direction.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "ASC" => Some(Direction::Ascending),
            "DESC" => Some(Direction::Descending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderKey {
    pub column: String,
    pub direction: Direction,
}

/// A fully validated request. Only `QueryBuilder::build` produces one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub kind: QueryKind,
    pub table: String,
    pub columns: ColumnSelection,
    pub joins: Vec<JoinClause>,
    pub predicates: Vec<Predicate>,
    pub order_by: Vec<OrderKey>,
    pub values: Option<Vec<String>>,
    pub assignments: Option<Vec<(String, String)>>,
}

/// Accumulates clauses in any order and enforces the cross-clause rules.
/// Table names arrive already canonical.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    kind: Option<QueryKind>,
    table: Option<String>,
    columns: Vec<String>,
    joins: Vec<JoinClause>,
    predicates: Vec<Predicate>,
    order_by: Vec<OrderKey>,
    values: Option<Vec<String>>,
    assignments: Option<Vec<(String, String)>>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_kind(&mut self, kind: QueryKind) -> QueryResult<()> {
        match self.kind {
            Some(existing) if existing != kind => {
                Err(QueryError::semantic("Can't have different query types"))
            }
            _ => {
                self.kind = Some(kind);
                Ok(())
            }
        }
    }

    fn set_table(&mut self, table: String) -> QueryResult<()> {
        if self.table.is_some() {
            return Err(QueryError::semantic("Can't have two FROMs"));
        }
        self.table = Some(table);
        Ok(())
    }

    pub fn from(&mut self, table: String) -> QueryResult<()> {
        self.set_table(table)
    }

    pub fn select(&mut self, columns: Vec<String>) -> QueryResult<()> {
        self.set_kind(QueryKind::Select)?;
        self.columns.extend(columns);
        Ok(())
    }

    pub fn insert(&mut self, table: String) -> QueryResult<()> {
        self.set_table(table)?;
        self.set_kind(QueryKind::Insert)
    }

    pub fn update(&mut self, table: String) -> QueryResult<()> {
        self.set_table(table)?;
        self.set_kind(QueryKind::Update)
    }

    pub fn delete(&mut self) -> QueryResult<()> {
        self.set_kind(QueryKind::Delete)
    }

    pub fn join(&mut self, left_column: String, table: String, right_column: String) {
        self.joins.push(JoinClause { left_column, table, right_column });
    }

    pub fn where_clause(&mut self, column: String, criterion: Criterion) {
        self.predicates.push(Predicate { column, criterion });
    }

    pub fn order(&mut self, column: String, direction: Direction) {
        self.order_by.push(OrderKey { column, direction });
    }

    pub fn values(&mut self, values: Vec<String>) -> QueryResult<()> {
        if self.values.is_some() {
            return Err(QueryError::semantic("Can't have multiple values"));
        }
        if self.assignments.is_some() {
            return Err(QueryError::semantic("Can't have value and set"));
        }
        self.values = Some(values);
        Ok(())
    }

    pub fn set(&mut self, assignments: Vec<(String, String)>) -> QueryResult<()> {
        if self.assignments.is_some() {
            return Err(QueryError::semantic("Can't have multiple sets"));
        }
        if self.values.is_some() {
            return Err(QueryError::semantic("Can't have value and set"));
        }
        self.assignments = Some(assignments);
        Ok(())
    }

    pub fn build(self) -> QueryResult<Query> {
        let table = self.table.ok_or_else(|| QueryError::semantic("Must have a table"))?;
        let kind = self.kind.ok_or_else(|| QueryError::semantic("Must have a query type"))?;

        if kind != QueryKind::Select && (!self.order_by.is_empty() || !self.joins.is_empty()) {
            return Err(QueryError::semantic("Order and join can only be used with select"));
        }
        match kind {
            QueryKind::Select if self.values.is_some() || self.assignments.is_some() => {
                return Err(QueryError::semantic("Select can't have values or set"));
            }
            QueryKind::Insert if self.values.is_none() => {
                return Err(QueryError::semantic("Insert must have values"));
            }
            QueryKind::Insert if !self.predicates.is_empty() => {
                return Err(QueryError::semantic("Insert can't have where"));
            }
            QueryKind::Update if self.assignments.is_none() => {
                return Err(QueryError::semantic("Update must have set"));
            }
            QueryKind::Update if self.values.is_some() => {
                return Err(QueryError::semantic("Update can't have values"));
            }
            QueryKind::Delete if self.values.is_some() || self.assignments.is_some() => {
                return Err(QueryError::semantic("Delete can't have values or set"));
            }
            _ => {}
        }

        let columns = if self.columns.iter().any(|c| c == "*") {
            ColumnSelection::All
        } else {
            ColumnSelection::Columns(self.columns)
        };

        Ok(Query {
            kind,
            table,
            columns,
            joins: self.joins,
            predicates: self.predicates,
            order_by: self.order_by,
            values: self.values,
            assignments: self.assignments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semantic_message(result: QueryResult<impl std::fmt::Debug>) -> String {
        match result {
            Err(QueryError::Semantic(msg)) => msg,
            other => panic!("expected semantic error, got {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_kinds_rejected() {
        let mut builder = QueryBuilder::new();
        builder.select(vec!["name".into()]).unwrap();
        assert_eq!(semantic_message(builder.delete()), "Can't have different query types");
    }

    #[test]
    fn test_repeated_same_kind_is_fine() {
        let mut builder = QueryBuilder::new();
        builder.select(vec!["a".into()]).unwrap();
        builder.select(vec!["b".into()]).unwrap();
        builder.from("t.csv".into()).unwrap();
        let query = builder.build().unwrap();
        assert_eq!(query.columns, ColumnSelection::Columns(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_two_tables_rejected() {
        let mut builder = QueryBuilder::new();
        builder.update("a.csv".into()).unwrap();
        assert_eq!(semantic_message(builder.from("b.csv".into())), "Can't have two FROMs");
    }

    #[test]
    fn test_values_and_set_exclusive() {
        let mut builder = QueryBuilder::new();
        builder.values(vec!["1".into()]).unwrap();
        assert_eq!(semantic_message(builder.set(vec![])), "Can't have value and set");
    }

    #[test]
    fn test_order_outside_select_rejected() {
        let mut builder = QueryBuilder::new();
        builder.delete().unwrap();
        builder.from("t.csv".into()).unwrap();
        builder.order("a".into(), Direction::Ascending);
        assert_eq!(semantic_message(builder.build()), "Order and join can only be used with select");
    }

    #[test]
    fn test_insert_rules() {
        let mut builder = QueryBuilder::new();
        builder.insert("t.csv".into()).unwrap();
        assert_eq!(semantic_message(builder.build()), "Insert must have values");

        let mut builder = QueryBuilder::new();
        builder.insert("t.csv".into()).unwrap();
        builder.values(vec!["x".into()]).unwrap();
        builder.where_clause("a".into(), Criterion::Equals("x".into()));
        assert_eq!(semantic_message(builder.build()), "Insert can't have where");
    }

    #[test]
    fn test_missing_table_and_kind() {
        assert_eq!(semantic_message(QueryBuilder::new().build()), "Must have a table");
        let mut builder = QueryBuilder::new();
        builder.from("t.csv".into()).unwrap();
        assert_eq!(semantic_message(builder.build()), "Must have a query type");
    }

    #[test]
    fn test_wildcard_selection() {
        let mut builder = QueryBuilder::new();
        builder.select(vec!["*".into()]).unwrap();
        builder.from("t.csv".into()).unwrap();
        assert_eq!(builder.build().unwrap().columns, ColumnSelection::All);
    }

    #[test]
    fn test_criterion_accepts() {
        let set: BTreeSet<String> = ["25", "40"].iter().map(|s| s.to_string()).collect();
        assert!(Criterion::OneOf(set.clone()).accepts(Some("25")));
        assert!(!Criterion::OneOf(set).accepts(Some("30")));
        assert!(Criterion::Equals("30".into()).accepts(Some("30")));
        assert!(!Criterion::Equals("30".into()).accepts(None));
    }
}
