//! Results of dispatched statements.

use crate::error::OrmResult;
use crate::row::{FromRow, Row};
use crate::value::Value;
use std::time::Duration;

/// What was sent to the database and how long it took.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Statement as sent, including any rewrite by a hook of the database.
    pub sql: String,
    pub elapsed: Duration,
}

/// Outcome of an INSERT, UPDATE, DELETE or DDL statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecResult {
    pub affected_rows: u64,
    /// Identifier generated by a single-row `create`.
    pub insert_id: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl ExecResult {
    pub fn new(affected_rows: u64, diagnostics: Diagnostics) -> Self {
        Self {
            affected_rows,
            insert_id: None,
            diagnostics,
        }
    }

    /// Typed form of [`ExecResult::insert_id`].
    pub fn insert_id_as<T: crate::value::FromValue>(&self) -> Option<T> {
        self.insert_id.as_ref().and_then(T::from_value)
    }
}

/// Rows returned by a SELECT, consumed front to back.
#[derive(Debug, Clone, Default)]
pub struct Recordset {
    rows: Vec<Row>,
    cursor: usize,
    diagnostics: Diagnostics,
}

impl Recordset {
    pub fn new(rows: Vec<Row>, diagnostics: Diagnostics) -> Self {
        Self {
            rows,
            cursor: 0,
            diagnostics,
        }
    }

    /// Next row, or `None` once the set is exhausted.
    pub fn fetch(&mut self) -> Option<Row> {
        let row = self.rows.get_mut(self.cursor).map(std::mem::take)?;
        self.cursor += 1;
        Some(row)
    }

    /// All rows not yet fetched.
    pub fn fetch_all(mut self) -> Vec<Row> {
        self.rows.drain(..self.cursor);
        self.rows
    }

    /// Values of one column across the rows not yet fetched.
    ///
    /// Rows without the column contribute `NULL`.
    pub fn fetch_column(&self, column: &str) -> Vec<Value> {
        self.remaining()
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or_default())
            .collect()
    }

    /// Decode the remaining rows with [`FromRow`].
    pub fn decode<T: FromRow>(self) -> OrmResult<Vec<T>> {
        self.remaining().iter().map(T::from_row).collect()
    }

    /// Unmarshal the remaining rows with a caller-supplied mapping.
    pub fn map<T, F>(self, f: F) -> Vec<T>
    where
        F: FnMut(Row) -> T,
    {
        self.fetch_all().into_iter().map(f).collect()
    }

    pub fn remaining(&self) -> &[Row] {
        &self.rows[self.cursor..]
    }

    pub fn len(&self) -> usize {
        self.rows.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl Iterator for Recordset {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.fetch()
    }
}

/// Result of `read`: a single row for primary-key reads, a recordset otherwise.
#[derive(Debug, Clone)]
pub enum Fetched {
    One(Option<Row>),
    Many(Recordset),
}

impl Fetched {
    /// The single row, or the first row of a recordset.
    pub fn into_row(self) -> Option<Row> {
        match self {
            Fetched::One(row) => row,
            Fetched::Many(mut set) => set.fetch(),
        }
    }

    /// All rows, a primary-key read giving zero or one.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Fetched::One(row) => row.into_iter().collect(),
            Fetched::Many(set) => set.fetch_all(),
        }
    }

    pub fn into_recordset(self) -> Option<Recordset> {
        match self {
            Fetched::Many(set) => Some(set),
            Fetched::One(_) => None,
        }
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Fetched::One(_))
    }
}
