use crate::error::QueryResult;
use crate::executor::Database;
use crate::integration::build_query;
use std::io::{self, BufRead, Write};

pub const PROMPT: &str = "csvql> ";

/// Read-eval-print loop over `input`. A failing line is reported on `err`
/// and the loop moves on; only `quit`, `exit` or end of input stop it.
pub fn run_repl<R, W, E>(db: &Database, mut input: R, out: &mut W, err: &mut E, explain: bool) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut buf = Vec::new();
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                writeln!(err, "Error: input is not valid UTF-8: {}", e)?;
                continue;
            }
        };

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        match run_line(db, line, explain, err) {
            Ok(rows) => {
                for row in rows {
                    writeln!(out, "{}", row)?;
                }
            }
            Err(e) => writeln!(err, "Error: {}", e)?,
        }
    }
    Ok(())
}

fn run_line<E: Write>(db: &Database, line: &str, explain: bool, err: &mut E) -> QueryResult<Vec<String>> {
    let query = build_query(db, line)?;
    if explain {
        let _ = match serde_json::to_string_pretty(&query) {
            Ok(json) => writeln!(err, "{}", json),
            Err(e) => writeln!(err, "Could not render query: {}", e),
        };
    }
    Ok(db.execute(&query)?.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use std::fs;
    use tempfile::TempDir;

    fn run(dir: &TempDir, input: &[u8]) -> (String, String) {
        let db = Database::new(EngineConfig::new().with_data_dir(dir.path()));
        let mut out = Vec::new();
        let mut err = Vec::new();
        run_repl(&db, input, &mut out, &mut err, false).unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    fn users_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("users.csv"), "name,age\nalice,30\nbob,25\n").unwrap();
        dir
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_session() {
        let dir = users_dir();
        let mut input = b"SELECT name FROM users WHERE age = '\xff';\n".to_vec();
        input.extend_from_slice(b"SELECT name FROM users WHERE age = '25';\n");

        let (out, err) = run(&dir, &input);
        assert!(err.contains("not valid UTF-8"));
        assert!(out.contains("bob\n"));
    }

    #[test]
    fn test_errors_reported_and_loop_continues() {
        let dir = users_dir();
        let (out, err) = run(&dir, b"SELECT * FROM users\nSELECT * FROM users;\nquit\nSELECT * FROM users;\n");
        assert!(err.starts_with("Error: Syntax error"));
        assert_eq!(out.matches("alice|30").count(), 1);
    }
}
