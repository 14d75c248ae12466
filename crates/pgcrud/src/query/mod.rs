//! Lazily chained queries.
//!
//! Every chain method consumes a [`Query`] and returns a new one carrying one
//! more [`Modifier`]; nothing touches the database until a terminal verb
//! (`create`, `read`, `update`, `delete`, `count`) merges the chain into a
//! [`QueryDescriptor`] and hands it to the [`Table`]. `Query` is `Clone`, so a
//! chain can be branched:
//!
//! ```
//! use pgcrud::{RecordingDatabase, Table, TableSchema};
//!
//! let db = RecordingDatabase::new();
//! let table = Table::new(TableSchema::new("widgets").with_primary_key("id"), &db);
//!
//! let recent = table.sort("id DESC").slice(0, 10);
//! let spew = recent.clone().filter([("foo", "Spew")]);
//!
//! assert_eq!(
//!     recent.read_sql(true).unwrap(),
//!     "SELECT * FROM widgets ORDER BY id DESC LIMIT 10"
//! );
//! assert_eq!(
//!     spew.read_sql(true).unwrap(),
//!     "SELECT * FROM widgets WHERE foo = 'Spew' ORDER BY id DESC LIMIT 10"
//! );
//! ```

mod descriptor;
mod modifier;

pub use descriptor::{Operation, QueryDescriptor};
pub use modifier::{Columns, Expression, Join, JoinTarget, Modifier, Projected, Slice};

use crate::database::Database;
use crate::error::OrmResult;
use crate::filter::{Filter, FilterSpec};
use crate::result::{ExecResult, Fetched};
use crate::row::Row;
use crate::schema::FieldType;
use crate::table::Table;
use crate::value::Value;

/// An immutable chain of modifiers rooted at a [`Table`].
pub struct Query<'t, D> {
    table: &'t Table<D>,
    modifiers: Vec<Modifier>,
}

impl<D> Clone for Query<'_, D> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            modifiers: self.modifiers.clone(),
        }
    }
}

impl<D> std::fmt::Debug for Query<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.table.name())
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

impl<'t, D> Query<'t, D> {
    pub(crate) fn new(table: &'t Table<D>) -> Self {
        Self {
            table,
            modifiers: Vec::new(),
        }
    }

    fn push(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// AND a filter onto the chain.
    pub fn filter(self, spec: impl Into<FilterSpec>) -> Self {
        self.push(Modifier::Filter(Filter::new(spec)))
    }

    /// AND a negated filter onto the chain.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self, spec: impl Into<FilterSpec>) -> Self {
        self.push(Modifier::Filter(Filter::negated(spec)))
    }

    /// AND a raw SQL expression, substituting `?` wildcards with `wildcards`
    /// formatted as strings.
    pub fn filter_expression<I, V>(self, sql: impl Into<String>, wildcards: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter_expression_typed(sql, wildcards, [])
    }

    /// Like [`Query::filter_expression`] with a field type per wildcard.
    pub fn filter_expression_typed<I, V, T>(
        self,
        sql: impl Into<String>,
        wildcards: I,
        types: T,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
        T: IntoIterator<Item = FieldType>,
    {
        self.push(Modifier::Expression(Expression {
            sql: sql.into(),
            wildcards: wildcards.into_iter().map(Into::into).collect(),
            types: types.into_iter().collect(),
        }))
    }

    /// AND a raw SQL expression without wildcards.
    pub fn filter_sql(self, sql: impl Into<String>) -> Self {
        self.filter_expression(sql, Vec::<Value>::new())
    }

    /// Limit reads to `count` rows starting at `offset`; a zero count is unbounded.
    pub fn slice(self, offset: u64, count: u64) -> Self {
        self.push(Modifier::Slice(Slice { offset, count }))
    }

    pub fn sort(self, order: impl Into<Columns>) -> Self {
        self.push(Modifier::Sort(order.into()))
    }

    /// Project the given columns or expressions instead of `*`.
    pub fn fields(self, fields: impl Into<Columns>) -> Self {
        let projected = fields
            .into()
            .0
            .into_iter()
            .map(|expr| Projected { alias: None, expr })
            .collect();
        self.push(Modifier::Fields(projected))
    }

    /// Project `(alias, expression)` pairs, rendered as `expression AS alias`.
    pub fn fields_as<A, E, I>(self, pairs: I) -> Self
    where
        A: Into<String>,
        E: Into<String>,
        I: IntoIterator<Item = (A, E)>,
    {
        let projected = pairs
            .into_iter()
            .map(|(alias, expr)| Projected {
                alias: Some(alias.into()),
                expr: expr.into(),
            })
            .collect();
        self.push(Modifier::Fields(projected))
    }

    pub fn aggregate(self, group: impl Into<Columns>) -> Self {
        self.push(Modifier::Aggregate(group.into()))
    }

    /// `JOIN <target> USING (<column>)`.
    pub fn join(self, target: impl JoinTarget, column: impl Into<String>) -> Self {
        self.push(Modifier::Join(Join {
            table: target.join_name(),
            column: column.into(),
        }))
    }

    /// Unlock bulk `update` and `delete` for this chain.
    pub fn all(self) -> AllQuery<'t, D> {
        AllQuery { inner: self }
    }

    pub fn descriptor(&self, operation: Operation) -> QueryDescriptor {
        QueryDescriptor::merge(operation, &self.modifiers, false)
    }
}

impl<'t, D: Database> Query<'t, D> {
    /// Compile the statement a terminal verb would run, without running it.
    pub fn to_sql(&self, operation: Operation) -> OrmResult<String> {
        self.table.compile(&self.descriptor(operation))
    }

    /// SQL of `read(spec)`.
    pub fn read_sql(&self, spec: impl Into<FilterSpec>) -> OrmResult<String> {
        self.to_sql(Operation::Read(spec.into()))
    }

    /// Insert a row.
    ///
    /// Auto-fill fields are set, declared fields are taken from `data` and
    /// `NULL` values are left to the column default. When exactly one row is
    /// inserted the generated identifier is attached as `insert_id`.
    pub async fn create(self, data: impl Into<Row>) -> OrmResult<ExecResult> {
        self.table
            .run_create(self.descriptor(Operation::Create(data.into())))
            .await
    }

    /// Read rows.
    ///
    /// A primary-key spec returns [`Fetched::One`], anything else
    /// [`Fetched::Many`].
    pub async fn read(self, spec: impl Into<FilterSpec>) -> OrmResult<Fetched> {
        self.table
            .run_read(self.descriptor(Operation::Read(spec.into())))
            .await
    }

    /// Read every row matching the chain.
    pub async fn read_all(self) -> OrmResult<Fetched> {
        self.read(FilterSpec::MatchAll).await
    }

    /// Update the row whose primary key is in `data`.
    ///
    /// Fails with [`OrmError::UnsafeBulkMutation`](crate::OrmError::UnsafeBulkMutation)
    /// when `data` carries no primary key; use [`Query::all`] for bulk updates.
    pub async fn update(self, data: impl Into<Row>) -> OrmResult<ExecResult> {
        self.table
            .run_update(self.descriptor(Operation::Update(data.into())))
            .await
    }

    /// Delete the row with the given primary key.
    ///
    /// Any other spec fails with
    /// [`OrmError::UnsafeBulkMutation`](crate::OrmError::UnsafeBulkMutation);
    /// use [`Query::all`] for bulk deletes.
    pub async fn delete(self, spec: impl Into<FilterSpec>) -> OrmResult<ExecResult> {
        self.table
            .run_delete(self.descriptor(Operation::Delete(spec.into())))
            .await
    }

    /// Number of rows matching the chain and `spec`.
    pub async fn count(self, spec: impl Into<FilterSpec>) -> OrmResult<i64> {
        let row = self
            .fields_as([("tally", "COUNT(*)")])
            .read(spec)
            .await?
            .into_row();
        match row {
            Some(row) => row.try_get::<i64>("tally"),
            None => Ok(0),
        }
    }
}

/// A chain with bulk mutation unlocked.
///
/// Only `update` and `delete` are available, so the unlock applies to exactly
/// the verb called on it.
pub struct AllQuery<'t, D> {
    inner: Query<'t, D>,
}

impl<D> std::fmt::Debug for AllQuery<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllQuery").field("inner", &self.inner).finish()
    }
}

impl<D: Database> AllQuery<'_, D> {
    fn descriptor(&self, operation: Operation) -> QueryDescriptor {
        QueryDescriptor::merge(operation, &self.inner.modifiers, true)
    }

    pub fn to_sql(&self, operation: Operation) -> OrmResult<String> {
        self.inner.table.compile(&self.descriptor(operation))
    }

    /// Update every row matching the chain.
    pub async fn update(self, data: impl Into<Row>) -> OrmResult<ExecResult> {
        self.inner
            .table
            .run_update(self.descriptor(Operation::Update(data.into())))
            .await
    }

    /// Delete every row matching the chain and `spec`.
    pub async fn delete(self, spec: impl Into<FilterSpec>) -> OrmResult<ExecResult> {
        self.inner
            .table
            .run_delete(self.descriptor(Operation::Delete(spec.into())))
            .await
    }
}
