use crate::ast::{Criterion, Direction, Query, QueryBuilder};
use crate::config::EngineConfig;
use crate::error::{QueryError, QueryResult};
use crate::tokenizer::{split_items, unquote};

/// Walks the token list clause by clause, feeding each validated clause
/// into a `QueryBuilder`. Every handler starts at the clause keyword and
/// leaves `current` on the next clause keyword.
pub struct Parser<'a> {
    tokens: Vec<String>,
    current: usize,
    config: &'a EngineConfig,
    builder: QueryBuilder,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<String>, config: &'a EngineConfig) -> Self {
        Self { tokens, current: 0, config, builder: QueryBuilder::new() }
    }

    pub fn parse(mut self) -> QueryResult<Query> {
        while let Some(keyword) = self.peek().map(str::to_ascii_uppercase) {
            match keyword.as_str() {
                "SELECT" => self.parse_select()?,
                "INSERT" => self.parse_insert()?,
                "UPDATE" => self.parse_update()?,
                "DELETE" => self.parse_delete()?,
                "FROM" => self.parse_from()?,
                "JOIN" => self.parse_join()?,
                "WHERE" | "AND" => self.parse_where()?,
                "ORDER" => self.parse_order()?,
                "VALUES" => self.parse_values()?,
                "SET" => self.parse_set()?,
                other => return Err(QueryError::syntax(format!("Unexpected keyword `{}`", other))),
            }
        }
        self.builder.build()
    }

    fn parse_select(&mut self) -> QueryResult<()> {
        self.advance();
        let mut columns = Vec::new();
        loop {
            let token = self.expect_token("Expected column name after SELECT")?;
            match token.strip_suffix(',') {
                Some(head) => columns.extend(list_items(head, false)?),
                None => {
                    columns.extend(list_items(&token, false)?);
                    break;
                }
            }
        }
        self.builder.select(columns)
    }

    fn parse_insert(&mut self) -> QueryResult<()> {
        self.advance();
        let into = self.expect_token("Must be INSERT INTO")?;
        if !into.eq_ignore_ascii_case("INTO") {
            return Err(QueryError::syntax("Must be INSERT INTO"));
        }
        let table = self.expect_table("Expected table name after INSERT INTO")?;
        self.builder.insert(table)
    }

    fn parse_update(&mut self) -> QueryResult<()> {
        self.advance();
        let table = self.expect_table("Expected table name after UPDATE")?;
        self.builder.update(table)
    }

    fn parse_delete(&mut self) -> QueryResult<()> {
        self.advance();
        self.builder.delete()
    }

    fn parse_from(&mut self) -> QueryResult<()> {
        self.advance();
        let table = self.expect_table("Expected table name after FROM")?;
        self.builder.from(table)
    }

    // JOIN <table> ON <col_a> = <col_b>
    fn parse_join(&mut self) -> QueryResult<()> {
        let clause = self.tokens.get(self.current..self.current + 6)
            .ok_or_else(|| QueryError::syntax("Invalid join syntax"))?;
        if !clause[2].eq_ignore_ascii_case("ON") || clause[4] != "=" {
            return Err(QueryError::syntax("Invalid join syntax"));
        }
        let table = self.config.canonical_name(&unquote(&clause[1]));
        let left_column = unquote(&clause[3]);
        let right_column = unquote(&clause[5]);
        self.current += 6;
        self.builder.join(left_column, table, right_column);
        Ok(())
    }

    fn parse_where(&mut self) -> QueryResult<()> {
        self.advance();
        let column = unquote(&self.expect_token("Invalid where syntax")?);
        let operator = self.expect_token("Invalid where syntax")?;
        let criterion = match operator.to_ascii_uppercase().as_str() {
            "=" => Criterion::Equals(unquote(&self.expect_token("Invalid where syntax")?)),
            "IN" => {
                self.expect_open_paren("Invalid where syntax")?;
                Criterion::OneOf(self.parse_list()?.into_iter().collect())
            }
            other => return Err(QueryError::syntax(format!("Unsupported where operator `{}`", other))),
        };
        self.builder.where_clause(column, criterion);
        Ok(())
    }

    fn parse_order(&mut self) -> QueryResult<()> {
        self.advance();
        match self.advance() {
            Some(by) if by.eq_ignore_ascii_case("BY") => {}
            _ => return Err(QueryError::syntax("Invalid order syntax")),
        }
        let column = unquote(&self.expect_token("Invalid order syntax")?);
        let direction = match self.peek().and_then(|t| Direction::parse(&unquote(t))) {
            Some(direction) => {
                self.advance();
                direction
            }
            None => Direction::Ascending,
        };
        self.builder.order(column, direction);
        Ok(())
    }

    fn parse_values(&mut self) -> QueryResult<()> {
        self.advance();
        self.expect_open_paren("Invalid values syntax")?;
        let values = self.parse_list()?;
        self.builder.values(values)
    }

    // Accepts `col = value` triples and packed `col=value` tokens; a
    // trailing comma continues the list.
    fn parse_set(&mut self) -> QueryResult<()> {
        self.advance();
        let mut assignments = Vec::new();
        loop {
            let first = self.expect_token("Expected assignment after SET")?;
            let continues = if self.peek() == Some("=") {
                self.advance();
                let value = self.expect_token("Expected value in SET clause")?;
                let head = value.strip_suffix(',');
                match split_items(head.unwrap_or(&value))?.as_slice() {
                    [single] => assignments.push((unquote(&first), unquote(single))),
                    _ => return Err(QueryError::syntax("Invalid set syntax")),
                }
                head.is_some()
            } else {
                let head = first.strip_suffix(',');
                for item in split_items(head.unwrap_or(&first))? {
                    let (column, value) = item
                        .split_once('=')
                        .filter(|(column, value)| !column.is_empty() && !value.is_empty())
                        .ok_or_else(|| QueryError::syntax("Invalid set syntax"))?;
                    assignments.push((unquote(column), unquote(value)));
                }
                head.is_some()
            };
            if !continues {
                break;
            }
        }
        self.builder.set(assignments)
    }

    /// Reads the items after an opening parenthesis up to the token that
    /// closes the list. Every token before the last must end in a comma.
    fn parse_list(&mut self) -> QueryResult<Vec<String>> {
        let mut items = Vec::new();
        loop {
            let token = self.expect_token("Invalid values syntax")?;
            if let Some(head) = token.strip_suffix(')') {
                // `()` is the only place an empty fragment is allowed.
                items.extend(list_items(head, items.is_empty())?);
                return Ok(items);
            }
            match token.strip_suffix(',') {
                Some(head) => items.extend(list_items(head, false)?),
                None => return Err(QueryError::syntax("Invalid values syntax")),
            }
        }
    }

    fn expect_open_paren(&mut self, error_message: &str) -> QueryResult<()> {
        match self.advance() {
            Some("(") => Ok(()),
            _ => Err(QueryError::syntax(error_message)),
        }
    }

    fn expect_table(&mut self, error_message: &str) -> QueryResult<String> {
        let token = self.expect_token(error_message)?;
        Ok(self.config.canonical_name(&unquote(&token)))
    }

    fn expect_token(&mut self, error_message: &str) -> QueryResult<String> {
        self.advance()
            .map(str::to_string)
            .ok_or_else(|| QueryError::syntax(format!("{}, but reached end of input", error_message)))
    }

    fn advance(&mut self) -> Option<&str> {
        let token = self.tokens.get(self.current)?;
        self.current += 1;
        Some(token.as_str())
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.current).map(String::as_str)
    }
}

fn list_items(fragment: &str, allow_empty: bool) -> QueryResult<Vec<String>> {
    if fragment.is_empty() && !allow_empty {
        return Err(QueryError::syntax("Empty item in list"));
    }
    Ok(split_items(fragment)?.iter().map(|item| unquote(item)).collect())
}

/// Builds a `Query` from a tokenized line.
pub fn parse_sql(tokens: Vec<String>, config: &EngineConfig) -> QueryResult<Query> {
    Parser::new(tokens, config).parse()
}
