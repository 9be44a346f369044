use crate::error::{QueryError, QueryResult};
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// One record of a table. `id` is synthetic and only meaningful within a
/// single execution; it is never written back to disk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub id: usize,
    pub fields: HashMap<String, String>,
}

impl Row {
    pub fn new(id: usize, fields: HashMap<String, String>) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// In-memory image of a backing file. Rows are keyed by synthetic id, so
/// iteration follows load order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: BTreeMap<usize, Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: BTreeMap::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The smallest id greater than every id handed out so far.
    pub fn next_id(&self) -> usize {
        self.rows.keys().next_back().map_or(1, |id| id + 1)
    }

    pub fn push(&mut self, fields: HashMap<String, String>) -> usize {
        let id = self.next_id();
        self.rows.insert(id, Row::new(id, fields));
        id
    }

    /// Field values of `row` in column order; absent fields become empty.
    pub fn values_of<'r>(&self, row: &'r Row) -> Vec<&'r str> {
        self.columns.iter().map(|col| row.get(col).unwrap_or("")).collect()
    }
}

/// Reads a backing file: the header names the columns, every following
/// record becomes a row whose id is its 1-based position.
/// Blank lines are skipped, so ids count records rather than physical lines.
pub fn load_table(path: &Path) -> QueryResult<Table> {
    let file = File::open(path).map_err(|e| QueryError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| QueryError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = Table::new(columns);
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| QueryError::csv(path, e))?;
        let fields = table
            .columns
            .iter()
            .zip(record.iter())
            .map(|(col, val)| (col.clone(), val.to_string()))
            .collect();
        let id = idx + 1;
        table.rows.insert(id, Row::new(id, fields));
    }

    debug!(path = %path.display(), rows = table.len(), "loaded table");
    Ok(table)
}

/// Overwrites the backing file with the header and every row, in place.
pub fn persist_table(path: &Path, table: &Table) -> QueryResult<()> {
    let file = File::create(path).map_err(|e| QueryError::io(path, e))?;
    let mut writer = WriterBuilder::new().from_writer(file);

    if !table.columns.is_empty() {
        writer.write_record(&table.columns).map_err(|e| QueryError::csv(path, e))?;
        for row in table.rows.values() {
            writer
                .write_record(table.values_of(row))
                .map_err(|e| QueryError::csv(path, e))?;
        }
    }
    writer.flush().map_err(|e| QueryError::io(path, e))?;

    debug!(path = %path.display(), rows = table.len(), "persisted table");
    Ok(())
}
