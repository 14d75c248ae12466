//! # pgcrud
//!
//! Lazily chained CRUD queries over relational tables.
//!
//! ## Features
//!
//! - **Lazy chains**: `filter`, `not`, `sort`, `slice`, `fields`, `aggregate`
//!   and `join` only record intent; SQL is compiled when a verb runs
//! - **Last one wins**: single-valued modifiers are overridden by later ones,
//!   filters and expressions accumulate
//! - **Safe defaults**: UPDATE needs a primary key and DELETE a primary-key
//!   value unless the chain is unlocked with `all()`
//! - **Schema driven**: field types pick literal formatting, auto-fill fields
//!   get `NOW()` and the client address
//! - **Pluggable backends**: anything implementing [`Database`]; a
//!   `tokio-postgres` client or transaction, an [`InstrumentedDatabase`] or the
//!   in-memory [`RecordingDatabase`]
//!
//! ## Example
//!
//! ```
//! use pgcrud::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> OrmResult<()> {
//! let schema = TableSchema::new("grubby_test")
//!     .with_primary_key("id")
//!     .with_field(FieldDef::new("id", "INT").auto_increment())
//!     .with_field(FieldDef::new("foo", "VARCHAR"))
//!     .with_field(FieldDef::new("category", "INT"));
//! let db = RecordingDatabase::new();
//! let table = Table::new(schema, &db);
//!
//! table.create(Row::new().with("foo", "Chunks").with("category", 1)).await?;
//! table.filter([("category", 1)]).sort("foo").slice(0, 10).read_all().await?;
//! table.update(Row::new().with("id", 1).with("foo", "Spew")).await?;
//! let err = table.filter([("category", 1)]).delete(true).await.unwrap_err();
//! assert!(err.is_unsafe_bulk());
//!
//! assert_eq!(
//!     db.statements()[1],
//!     "SELECT * FROM grubby_test WHERE category = 1 ORDER BY foo LIMIT 10"
//! );
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod format;
pub mod monitor;
pub mod prelude;
pub mod query;
pub mod result;
pub mod row;
pub mod schema;
pub mod table;
pub mod value;

pub use database::{Database, RecordingDatabase};
pub use dialect::Dialect;
pub use error::{OrmError, OrmResult};
pub use filter::{CompiledFilter, Filter, FilterSpec};
pub use format::{SqlFormat, format_int};
pub use monitor::{
    CompositeHook, CompositeMonitor, HookAction, InstrumentedDatabase, LoggingMonitor,
    MonitorConfig, NoopMonitor, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryStats,
    QueryType, StatsMonitor, TracingSqlHook,
};
pub use query::{AllQuery, Columns, Operation, Query, QueryDescriptor};
pub use result::{Diagnostics, ExecResult, Fetched, Recordset};
pub use row::{FromRow, Row};
pub use schema::{AutoFill, Catalog, FieldDef, FieldIndex, FieldType, PrimaryKey, TableSchema};
pub use table::{SQL_TARGET, Table};
pub use value::{FromValue, Value};
