//! The database collaborator.
//!
//! [`Database`] is the only thing the query engine needs from a backend: run
//! a statement, run a query, report the last generated identifier and format
//! literals for its dialect. This allows a [`Table`](crate::Table) to sit on a
//! plain client, a transaction, an instrumented wrapper or the in-memory
//! [`RecordingDatabase`].

pub mod postgres;
mod recording;

pub use recording::RecordingDatabase;

use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::format::SqlFormat;
use crate::row::Row;
use crate::value::Value;
use std::sync::Arc;

/// A backend able to run raw SQL text.
pub trait Database: SqlFormat + Send + Sync {
    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Execute a query and return all rows.
    fn query(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a statement, associating a tag for monitoring/observability.
    ///
    /// The default implementation ignores `tag` and calls [`Database::execute`].
    fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        let _ = tag;
        self.execute(sql)
    }

    /// Execute a query, associating a tag for monitoring/observability.
    ///
    /// The default implementation ignores `tag` and calls [`Database::query`].
    fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        let _ = tag;
        self.query(sql)
    }

    /// Final text of a statement about to be dispatched under `tag`.
    ///
    /// Wrappers that rewrite or refuse statements do it here, once, so the
    /// caller can record exactly what runs. Pair with
    /// [`Database::execute_prepared`] / [`Database::query_prepared`]. The
    /// default implementation returns `sql` unchanged.
    fn prepare_sql(&self, tag: &str, sql: String) -> OrmResult<String> {
        let _ = tag;
        Ok(sql)
    }

    /// Execute a statement already passed through [`Database::prepare_sql`].
    fn execute_prepared(
        &self,
        tag: &str,
        sql: &str,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        self.execute_tagged(tag, sql)
    }

    /// Run a query already passed through [`Database::prepare_sql`].
    fn query_prepared(
        &self,
        tag: &str,
        sql: &str,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        self.query_tagged(tag, sql)
    }

    /// Identifier generated by the most recent INSERT on this connection.
    ///
    /// The default implementation runs the dialect's last-insert-id query and
    /// reads its `last_id` column, `NULL` when nothing was returned.
    fn last_insert_id(&self) -> impl std::future::Future<Output = OrmResult<Value>> + Send {
        async move {
            let rows = self.query(self.dialect().last_insert_id_sql()).await?;
            Ok(last_id(rows))
        }
    }
}

pub(crate) fn last_id(rows: Vec<Row>) -> Value {
    rows.into_iter()
        .next()
        .and_then(|mut row| row.remove("last_id"))
        .unwrap_or_default()
}

impl<D: SqlFormat + ?Sized> SqlFormat for &D {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn format_string(&self, value: &Value) -> String {
        (**self).format_string(value)
    }

    fn format_int(&self, value: &Value) -> String {
        (**self).format_int(value)
    }
}

impl<D: Database> Database for &D {
    async fn execute(&self, sql: &str) -> OrmResult<u64> {
        (**self).execute(sql).await
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Row>> {
        (**self).query(sql).await
    }

    async fn execute_tagged(&self, tag: &str, sql: &str) -> OrmResult<u64> {
        (**self).execute_tagged(tag, sql).await
    }

    async fn query_tagged(&self, tag: &str, sql: &str) -> OrmResult<Vec<Row>> {
        (**self).query_tagged(tag, sql).await
    }

    fn prepare_sql(&self, tag: &str, sql: String) -> OrmResult<String> {
        (**self).prepare_sql(tag, sql)
    }

    async fn execute_prepared(&self, tag: &str, sql: &str) -> OrmResult<u64> {
        (**self).execute_prepared(tag, sql).await
    }

    async fn query_prepared(&self, tag: &str, sql: &str) -> OrmResult<Vec<Row>> {
        (**self).query_prepared(tag, sql).await
    }

    async fn last_insert_id(&self) -> OrmResult<Value> {
        (**self).last_insert_id().await
    }
}

impl<D: SqlFormat + ?Sized> SqlFormat for Arc<D> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn format_string(&self, value: &Value) -> String {
        (**self).format_string(value)
    }

    fn format_int(&self, value: &Value) -> String {
        (**self).format_int(value)
    }
}

impl<D: Database> Database for Arc<D> {
    async fn execute(&self, sql: &str) -> OrmResult<u64> {
        (**self).execute(sql).await
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Row>> {
        (**self).query(sql).await
    }

    async fn execute_tagged(&self, tag: &str, sql: &str) -> OrmResult<u64> {
        (**self).execute_tagged(tag, sql).await
    }

    async fn query_tagged(&self, tag: &str, sql: &str) -> OrmResult<Vec<Row>> {
        (**self).query_tagged(tag, sql).await
    }

    fn prepare_sql(&self, tag: &str, sql: String) -> OrmResult<String> {
        (**self).prepare_sql(tag, sql)
    }

    async fn execute_prepared(&self, tag: &str, sql: &str) -> OrmResult<u64> {
        (**self).execute_prepared(tag, sql).await
    }

    async fn query_prepared(&self, tag: &str, sql: &str) -> OrmResult<Vec<Row>> {
        (**self).query_prepared(tag, sql).await
    }

    async fn last_insert_id(&self) -> OrmResult<Value> {
        (**self).last_insert_id().await
    }
}
