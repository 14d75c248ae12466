//! Tables: the root of every query chain.
//!
//! A [`Table`] owns its schema and database handle, compiles merged
//! [`QueryDescriptor`]s into SQL text and dispatches the result.

mod compile;
mod ddl;


use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::filter::{FilterContext, FilterSpec};
use crate::query::{AllQuery, Columns, JoinTarget, Operation, Query, QueryDescriptor};
use crate::result::{Diagnostics, ExecResult, Fetched, Recordset};
use crate::row::Row;
use crate::schema::{Catalog, FieldIndex, FieldType, TableSchema};
use crate::value::Value;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// `tracing` target of every dispatched statement.
pub const SQL_TARGET: &str = "pgcrud.sql";

/// A database table bound to a [`Database`].
///
/// Chain methods start a [`Query`]; terminal verbs run directly against the
/// whole table.
///
/// ```
/// use pgcrud::{FieldDef, RecordingDatabase, Table, TableSchema};
///
/// let schema = TableSchema::new("widgets")
///     .with_primary_key("id")
///     .with_field(FieldDef::new("id", "INT").auto_increment())
///     .with_field(FieldDef::new("foo", "VARCHAR"))
///     .with_field(FieldDef::new("category", "INT"));
/// let table = Table::new(schema, RecordingDatabase::new());
///
/// let sql = table
///     .filter([("category", 2)])
///     .not([("foo", "Chunks")])
///     .sort("foo")
///     .read_sql(true)
///     .unwrap();
/// assert_eq!(
///     sql,
///     "SELECT * FROM widgets WHERE category = 2 AND NOT (foo = 'Chunks') ORDER BY foo"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Table<D> {
    schema: Arc<TableSchema>,
    db: D,
    index: OnceLock<FieldIndex>,
    client_addr: Option<String>,
}

impl<D> Table<D> {
    pub fn new(schema: impl Into<Arc<TableSchema>>, db: D) -> Self {
        Self {
            schema: schema.into(),
            db,
            index: OnceLock::new(),
            client_addr: None,
        }
    }

    /// Look a schema up in a catalog.
    pub fn from_catalog(catalog: &Catalog, name: &str, db: D) -> OrmResult<Self> {
        let schema = catalog
            .get_table(name)
            .ok_or_else(|| OrmError::Config(format!("table '{name}' is not in the catalog")))?;
        Ok(Self::new(schema.clone(), db))
    }

    /// Client address written by remote-address auto-fill fields.
    ///
    /// Without one those fields are set to `NULL`.
    pub fn with_client_addr(mut self, addr: impl Into<String>) -> Self {
        self.client_addr = Some(addr.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub fn client_addr(&self) -> Option<&str> {
        self.client_addr.as_deref()
    }

    /// Field types and auto-fill directives, built on first use.
    pub fn field_index(&self) -> &FieldIndex {
        self.index.get_or_init(|| FieldIndex::build(&self.schema))
    }

    /// An empty chain on this table.
    pub fn query(&self) -> Query<'_, D> {
        Query::new(self)
    }

    pub fn filter(&self, spec: impl Into<FilterSpec>) -> Query<'_, D> {
        self.query().filter(spec)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(&self, spec: impl Into<FilterSpec>) -> Query<'_, D> {
        self.query().not(spec)
    }

    pub fn filter_expression<I, V>(&self, sql: impl Into<String>, wildcards: I) -> Query<'_, D>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.query().filter_expression(sql, wildcards)
    }

    pub fn filter_expression_typed<I, V, T>(
        &self,
        sql: impl Into<String>,
        wildcards: I,
        types: T,
    ) -> Query<'_, D>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
        T: IntoIterator<Item = FieldType>,
    {
        self.query().filter_expression_typed(sql, wildcards, types)
    }

    pub fn filter_sql(&self, sql: impl Into<String>) -> Query<'_, D> {
        self.query().filter_sql(sql)
    }

    pub fn slice(&self, offset: u64, count: u64) -> Query<'_, D> {
        self.query().slice(offset, count)
    }

    pub fn sort(&self, order: impl Into<Columns>) -> Query<'_, D> {
        self.query().sort(order)
    }

    pub fn fields(&self, fields: impl Into<Columns>) -> Query<'_, D> {
        self.query().fields(fields)
    }

    pub fn fields_as<A, E, I>(&self, pairs: I) -> Query<'_, D>
    where
        A: Into<String>,
        E: Into<String>,
        I: IntoIterator<Item = (A, E)>,
    {
        self.query().fields_as(pairs)
    }

    pub fn aggregate(&self, group: impl Into<Columns>) -> Query<'_, D> {
        self.query().aggregate(group)
    }

    pub fn join(&self, target: impl JoinTarget, column: impl Into<String>) -> Query<'_, D> {
        self.query().join(target, column)
    }

    pub fn all(&self) -> AllQuery<'_, D> {
        self.query().all()
    }
}

impl<D: Database> Table<D> {
    fn filter_context(&self) -> FilterContext<'_> {
        FilterContext {
            primary_key: &self.schema.primary_key,
            fields: self.field_index(),
            format: &self.db,
        }
    }

    /// Format a value for insertion into or comparison against `field`.
    ///
    /// Integer fields use the integer formatter, everything else is quoted as
    /// a string; `NULL` stays `NULL`.
    pub fn format_field_value(&self, field: &str, value: &Value) -> String {
        let ty = self.field_index().field_type(field).unwrap_or_default();
        self.db.format_field(value, ty)
    }

    pub fn read_sql(&self, spec: impl Into<FilterSpec>) -> OrmResult<String> {
        self.query().read_sql(spec)
    }

    pub async fn create(&self, data: impl Into<Row>) -> OrmResult<ExecResult> {
        self.query().create(data).await
    }

    pub async fn read(&self, spec: impl Into<FilterSpec>) -> OrmResult<Fetched> {
        self.query().read(spec).await
    }

    pub async fn read_all(&self) -> OrmResult<Fetched> {
        self.query().read_all().await
    }

    pub async fn update(&self, data: impl Into<Row>) -> OrmResult<ExecResult> {
        self.query().update(data).await
    }

    pub async fn delete(&self, spec: impl Into<FilterSpec>) -> OrmResult<ExecResult> {
        self.query().delete(spec).await
    }

    pub async fn count(&self, spec: impl Into<FilterSpec>) -> OrmResult<i64> {
        self.query().count(spec).await
    }

    pub(crate) async fn run_create(&self, desc: QueryDescriptor) -> OrmResult<ExecResult> {
        let sql = self.compile(&desc)?;
        let generated = match &desc.operation {
            Operation::Create(data) => self.generates_id(data),
            _ => false,
        };
        let mut result = self.dispatch_execute("create", sql).await?;
        if generated && result.affected_rows == 1 {
            let id = self.db.last_insert_id().await?;
            if !id.is_null() {
                result.insert_id = Some(id);
            }
        }
        Ok(result)
    }

    /// Whether inserting `data` draws a value from an auto-increment column.
    ///
    /// Only then is the last insert id asked for: on PostgreSQL `lastval()`
    /// fails when no sequence was used, and that error aborts an open
    /// transaction.
    fn generates_id(&self, data: &Row) -> bool {
        self.schema
            .fields
            .iter()
            .filter(|field| field.auto_increment)
            .any(|field| data.get(&field.name).is_none_or(Value::is_null))
    }

    pub(crate) async fn run_read(&self, desc: QueryDescriptor) -> OrmResult<Fetched> {
        let single = matches!(desc.operation, Operation::Read(FilterSpec::PrimaryKey(_)));
        let sql = self.compile(&desc)?;
        let mut set = self.dispatch_query("read", sql).await?;
        if single {
            Ok(Fetched::One(set.fetch()))
        } else {
            Ok(Fetched::Many(set))
        }
    }

    pub(crate) async fn run_update(&self, desc: QueryDescriptor) -> OrmResult<ExecResult> {
        let sql = self.compile(&desc)?;
        self.dispatch_execute("update", sql).await
    }

    pub(crate) async fn run_delete(&self, desc: QueryDescriptor) -> OrmResult<ExecResult> {
        let sql = self.compile(&desc)?;
        self.dispatch_execute("delete", sql).await
    }

    fn prepare(&self, tag: &str, sql: String) -> OrmResult<String> {
        self.db.prepare_sql(tag, sql).inspect_err(|e| {
            tracing::warn!(target: SQL_TARGET, tag = %tag, error = %e, "statement refused");
        })
    }

    async fn dispatch_execute(&self, op: &str, sql: String) -> OrmResult<ExecResult> {
        let tag = format!("{}.{op}", self.name());
        let sql = self.prepare(&tag, sql)?;
        tracing::debug!(target: SQL_TARGET, tag = %tag, sql = %sql, "executing");
        let start = Instant::now();
        match self.db.execute_prepared(&tag, &sql).await {
            Ok(affected) => {
                let elapsed = start.elapsed();
                tracing::debug!(
                    target: SQL_TARGET,
                    tag = %tag,
                    affected,
                    elapsed_us = elapsed.as_micros() as u64,
                    "executed"
                );
                Ok(ExecResult::new(affected, Diagnostics { sql, elapsed }))
            }
            Err(e) => {
                tracing::error!(
                    target: SQL_TARGET,
                    tag = %tag,
                    sql = %sql,
                    error = %e,
                    "statement failed"
                );
                Err(e)
            }
        }
    }

    async fn dispatch_query(&self, op: &str, sql: String) -> OrmResult<Recordset> {
        let tag = format!("{}.{op}", self.name());
        let sql = self.prepare(&tag, sql)?;
        tracing::debug!(target: SQL_TARGET, tag = %tag, sql = %sql, "querying");
        let start = Instant::now();
        match self.db.query_prepared(&tag, &sql).await {
            Ok(rows) => {
                let elapsed = start.elapsed();
                tracing::debug!(
                    target: SQL_TARGET,
                    tag = %tag,
                    rows = rows.len(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "queried"
                );
                Ok(Recordset::new(rows, Diagnostics { sql, elapsed }))
            }
            Err(e) => {
                tracing::error!(
                    target: SQL_TARGET,
                    tag = %tag,
                    sql = %sql,
                    error = %e,
                    "query failed"
                );
                Err(e)
            }
        }
    }
}
