use crate::error::QueryResult;
use crate::executor::Database;
use crate::parser::parse_sql;
use crate::tokenizer::tokenize;
use crate::ast::Query;

/// Turns one raw input line into a validated `Query`.
pub fn build_query(db: &Database, input: &str) -> QueryResult<Query> {
    let tokens = tokenize(input)?;
    parse_sql(tokens, db.config())
}

/// Runs one input line end to end and returns the select output lines;
/// mutations yield no lines.
pub fn process_query(db: &Database, input: &str) -> QueryResult<Vec<String>> {
    let query = build_query(db, input)?;
    let result = db.execute(&query)?;
    Ok(result.lines())
}
