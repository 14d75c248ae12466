use super::config::MonitorConfig;
use super::monitors::{CompositeHook, NoopMonitor};
use super::types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult};
use crate::database::Database;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::format::SqlFormat;
use crate::row::Row;
use crate::value::Value;
use std::sync::Arc;
use std::time::Instant;

/// A [`Database`] wrapper that runs hooks, reports to a monitor and enforces
/// a statement timeout.
///
/// Monitors only receive events once monitoring is enabled in the
/// [`MonitorConfig`].
pub struct InstrumentedDatabase<D> {
    pub(super) db: D,
    pub(super) monitor: Arc<dyn QueryMonitor>,
    pub(super) hook: Option<Arc<dyn QueryHook>>,
    pub(super) config: MonitorConfig,
}

impl<D> InstrumentedDatabase<D> {
    pub fn new(db: D) -> Self {
        Self {
            db,
            monitor: Arc::new(NoopMonitor),
            hook: None,
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Add a hook after any already set.
    pub fn add_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.add_hook_arc(Arc::new(hook))
    }

    pub fn add_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = Some(match self.hook.take() {
            None => hook,
            Some(existing) => Arc::new(CompositeHook::new().add_arc(existing).add_arc(hook)),
        });
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = true;
        self
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &D {
        &self.db
    }

    pub fn into_inner(self) -> D {
        self.db
    }

    fn context(&self, sql: &str, tag: Option<&str>) -> QueryContext {
        let mut ctx = QueryContext::new(sql);
        ctx.tag = tag.map(str::to_string);
        ctx
    }

    /// Run the hook chain over `sql`, returning the text to execute.
    fn apply_hook(&self, sql: &str, tag: Option<&str>) -> OrmResult<String> {
        let Some(hook) = &self.hook else {
            return Ok(sql.to_string());
        };
        match hook.before_query(&self.context(sql, tag)) {
            HookAction::Continue => Ok(sql.to_string()),
            HookAction::ModifySql(sql) => Ok(sql),
            HookAction::Abort(reason) => Err(OrmError::Aborted(reason)),
        }
    }

    fn report(&self, ctx: &QueryContext, duration: std::time::Duration, result: &QueryResult) {
        if let Some(hook) = &self.hook {
            hook.after_query(ctx, duration, result);
        }
        if !self.config.monitoring_enabled {
            return;
        }

        self.monitor.on_query_complete(ctx, duration, result);
        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                self.monitor.on_slow_query(ctx, duration);
            }
        }
    }

    async fn with_timeout<T>(
        &self,
        future: impl std::future::Future<Output = OrmResult<T>> + Send,
    ) -> OrmResult<T> {
        match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .unwrap_or(Err(OrmError::Timeout(timeout))),
            None => future.await,
        }
    }
}

/// How far a statement has already been through the hooks.
#[derive(Clone, Copy)]
enum Dispatch<'a> {
    Plain,
    Tagged(&'a str),
    Prepared(&'a str),
}

impl<'a> Dispatch<'a> {
    fn tag(self) -> Option<&'a str> {
        match self {
            Dispatch::Plain => None,
            Dispatch::Tagged(tag) | Dispatch::Prepared(tag) => Some(tag),
        }
    }
}

impl<D: Database> InstrumentedDatabase<D> {
    async fn execute_inner(&self, sql: &str, dispatch: Dispatch<'_>) -> OrmResult<u64> {
        let ctx = match dispatch {
            Dispatch::Prepared(_) => self.context(sql, dispatch.tag()),
            _ => self.context(&self.apply_hook(sql, dispatch.tag())?, dispatch.tag()),
        };
        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = match dispatch {
            Dispatch::Plain => self.with_timeout(self.db.execute(&ctx.sql)).await,
            Dispatch::Tagged(tag) => self.with_timeout(self.db.execute_tagged(tag, &ctx.sql)).await,
            Dispatch::Prepared(tag) => {
                self.with_timeout(self.db.execute_prepared(tag, &ctx.sql)).await
            }
        };
        let duration = start.elapsed();

        let outcome = match &result {
            Ok(n) => QueryResult::Affected(*n),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.report(&ctx, duration, &outcome);
        result
    }

    async fn query_inner(&self, sql: &str, dispatch: Dispatch<'_>) -> OrmResult<Vec<Row>> {
        let ctx = match dispatch {
            Dispatch::Prepared(_) => self.context(sql, dispatch.tag()),
            _ => self.context(&self.apply_hook(sql, dispatch.tag())?, dispatch.tag()),
        };
        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = match dispatch {
            Dispatch::Plain => self.with_timeout(self.db.query(&ctx.sql)).await,
            Dispatch::Tagged(tag) => self.with_timeout(self.db.query_tagged(tag, &ctx.sql)).await,
            Dispatch::Prepared(tag) => {
                self.with_timeout(self.db.query_prepared(tag, &ctx.sql)).await
            }
        };
        let duration = start.elapsed();

        let outcome = match &result {
            Ok(rows) => QueryResult::Rows(rows.len()),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.report(&ctx, duration, &outcome);
        result
    }
}

impl<D: SqlFormat> SqlFormat for InstrumentedDatabase<D> {
    fn dialect(&self) -> Dialect {
        self.db.dialect()
    }

    fn format_string(&self, value: &Value) -> String {
        self.db.format_string(value)
    }

    fn format_int(&self, value: &Value) -> String {
        self.db.format_int(value)
    }
}

impl<D: Database> Database for InstrumentedDatabase<D> {
    async fn execute(&self, sql: &str) -> OrmResult<u64> {
        self.execute_inner(sql, Dispatch::Plain).await
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Row>> {
        self.query_inner(sql, Dispatch::Plain).await
    }

    async fn execute_tagged(&self, tag: &str, sql: &str) -> OrmResult<u64> {
        self.execute_inner(sql, Dispatch::Tagged(tag)).await
    }

    async fn query_tagged(&self, tag: &str, sql: &str) -> OrmResult<Vec<Row>> {
        self.query_inner(sql, Dispatch::Tagged(tag)).await
    }

    // Own hooks first, then whatever the wrapped database rewrites.
    fn prepare_sql(&self, tag: &str, sql: String) -> OrmResult<String> {
        let sql = self.apply_hook(&sql, Some(tag))?;
        self.db.prepare_sql(tag, sql)
    }

    async fn execute_prepared(&self, tag: &str, sql: &str) -> OrmResult<u64> {
        self.execute_inner(sql, Dispatch::Prepared(tag)).await
    }

    async fn query_prepared(&self, tag: &str, sql: &str) -> OrmResult<Vec<Row>> {
        self.query_inner(sql, Dispatch::Prepared(tag)).await
    }

    async fn last_insert_id(&self) -> OrmResult<Value> {
        self.db.last_insert_id().await
    }
}

impl<D: std::fmt::Debug> std::fmt::Debug for InstrumentedDatabase<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentedDatabase")
            .field("db", &self.db)
            .field("config", &self.config)
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}
