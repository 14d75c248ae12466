use super::Database;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::format::SqlFormat;
use crate::row::Row;
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory [`Database`] that records every statement and replays scripted
/// results.
///
/// Useful for inspecting generated SQL without a server. Unscripted calls
/// succeed: `execute` reports one affected row and `query` returns no rows.
///
/// ```
/// use pgcrud::{RecordingDatabase, Row, Table, TableSchema};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> pgcrud::OrmResult<()> {
/// let db = RecordingDatabase::new();
/// db.push_rows(vec![Row::new().with("id", 1)]);
///
/// let table = Table::new(TableSchema::new("widgets").with_primary_key("id"), &db);
/// let row = table.read(1).await?.into_row();
///
/// assert!(row.is_some());
/// assert_eq!(
///     db.last_statement().as_deref(),
///     Some("SELECT * FROM widgets WHERE id = '1'")
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RecordingDatabase {
    dialect: Dialect,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    statements: Vec<String>,
    rows: VecDeque<Vec<Row>>,
    affected: VecDeque<u64>,
    errors: VecDeque<String>,
    last_insert_id: Value,
}

impl RecordingDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the rows returned by the next `query`.
    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.state().rows.push_back(rows);
        self
    }

    /// Queue the affected-row count returned by the next `execute`.
    pub fn push_affected(&self, affected: u64) -> &Self {
        self.state().affected.push_back(affected);
        self
    }

    /// Make the next `execute` or `query` fail with a database error.
    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.state().errors.push_back(message.into());
        self
    }

    pub fn set_last_insert_id(&self, id: impl Into<Value>) -> &Self {
        self.state().last_insert_id = id.into();
        self
    }

    /// Every statement received so far, oldest first.
    pub fn statements(&self) -> Vec<String> {
        self.state().statements.clone()
    }

    pub fn last_statement(&self) -> Option<String> {
        self.state().statements.last().cloned()
    }

    /// Forget recorded statements and any unconsumed scripted results.
    pub fn clear(&self) {
        let mut state = self.state();
        let last_insert_id = std::mem::take(&mut state.last_insert_id);
        *state = State {
            last_insert_id,
            ..State::default()
        };
    }

    fn record(&self, sql: &str) -> OrmResult<MutexGuard<'_, State>> {
        let mut state = self.state();
        state.statements.push(sql.to_string());
        match state.errors.pop_front() {
            Some(message) => Err(OrmError::Database(message)),
            None => Ok(state),
        }
    }
}

impl SqlFormat for RecordingDatabase {
    fn dialect(&self) -> Dialect {
        self.dialect
    }
}

impl Database for RecordingDatabase {
    async fn execute(&self, sql: &str) -> OrmResult<u64> {
        let mut state = self.record(sql)?;
        Ok(state.affected.pop_front().unwrap_or(1))
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Row>> {
        let mut state = self.record(sql)?;
        Ok(state.rows.pop_front().unwrap_or_default())
    }

    async fn last_insert_id(&self) -> OrmResult<Value> {
        Ok(self.state().last_insert_id.clone())
    }
}
