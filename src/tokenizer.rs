use crate::error::{QueryError, QueryResult};
use lazy_static::lazy_static;
use regex::Regex;

pub const TERMINATOR: char = ';';

lazy_static! {
    // A token is a run of quoted strings and plain characters.
    static ref TOKEN_RE: Regex = Regex::new(r#"(?:'[^']*'|"[^"]*"|[^\s'"])+"#).unwrap();
}

/// Splits one terminated input line into raw tokens. Quotes are kept on the
/// tokens; the parser strips them once a token's role is known. Only the
/// first opening parenthesis outside quotes becomes a token of its own.
pub fn tokenize(input: &str) -> QueryResult<Vec<String>> {
    let line = input.trim_end();
    let body = line
        .strip_suffix(TERMINATOR)
        .ok_or_else(|| QueryError::syntax("Query must end with a semicolon"))?;
    let body = isolate_first_paren(body);
    let body = body.as_str();

    let mut tokens = Vec::new();
    let mut last_end = 0;
    for m in TOKEN_RE.find_iter(body) {
        check_gap(&body[last_end..m.start()])?;
        tokens.push(m.as_str().to_string());
        last_end = m.end();
    }
    check_gap(&body[last_end..])?;

    Ok(tokens)
}

fn isolate_first_paren(body: &str) -> String {
    let mut quote: Option<char> = None;
    for (idx, c) in body.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '(') => return format!("{} ( {}", &body[..idx], &body[idx + 1..]),
            _ => {}
        }
    }
    body.to_string()
}

fn check_gap(gap: &str) -> QueryResult<()> {
    if gap.trim().is_empty() {
        Ok(())
    } else {
        Err(QueryError::syntax(format!("Unterminated quote near `{}`", gap.trim())))
    }
}

/// Removes one leading and one trailing quote character, if present.
pub fn unquote(token: &str) -> String {
    let token = token.strip_prefix(['\'', '"']).unwrap_or(token);
    let token = token.strip_suffix(['\'', '"']).unwrap_or(token);
    token.to_string()
}

/// Splits a list fragment on commas that sit outside quotes.
/// `'a','b,c'` yields `'a'` and `'b,c'`. An empty fragment has no items;
/// an empty item between commas is a syntax error.
pub fn split_items(fragment: &str) -> QueryResult<Vec<String>> {
    if fragment.is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in fragment.chars() {
        match (quote, c) {
            (None, '\'' | '"') => {
                quote = Some(c);
                current.push(c);
            }
            (Some(q), _) if c == q => {
                quote = None;
                current.push(c);
            }
            (None, ',') => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);

    if items.iter().any(|item| item.trim().is_empty()) {
        return Err(QueryError::syntax(format!("Empty item in list `{}`", fragment)));
    }
    Ok(items)
}
