//! Statement monitoring and hooks.
//!
//! [`InstrumentedDatabase`] wraps any [`Database`](crate::Database) and
//! reports every statement, with the `<table>.<verb>` tag a
//! [`Table`](crate::Table) attaches, to a [`QueryMonitor`]. [`QueryHook`]s can
//! rewrite or reject statements before they run.
//!
//! ```
//! use pgcrud::monitor::{
//!     CompositeMonitor, InstrumentedDatabase, LoggingMonitor, MonitorConfig, StatsMonitor,
//! };
//! use pgcrud::{RecordingDatabase, Table, TableSchema};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> pgcrud::OrmResult<()> {
//! let stats = Arc::new(StatsMonitor::new());
//! let db = InstrumentedDatabase::new(RecordingDatabase::new())
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_slow_query_threshold(Duration::from_millis(250))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor(CompositeMonitor::new().add(LoggingMonitor::new()).add_arc(stats.clone()));
//!
//! let table = Table::new(TableSchema::new("widgets").with_primary_key("id"), db);
//! table.read(1).await?;
//! assert_eq!(stats.stats().select_count, 1);
//! # Ok(())
//! # }
//! ```

mod config;
mod instrumented;
mod monitors;
mod tracing_hook;
mod types;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedDatabase;
pub use monitors::{
    CompositeHook, CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor,
};
pub use tracing_hook::TracingSqlHook;
pub use types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
