use super::truncate_sql_bytes;
use super::types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};
use crate::table::SQL_TARGET;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}

/// Emits one `tracing` event per statement on the `pgcrud.sql` target.
///
/// Completions go out at `INFO`, failures at `ERROR` and slow statements at
/// `WARN`.
#[derive(Debug, Clone)]
pub struct LoggingMonitor {
    /// Skip statements faster than this.
    pub min_duration: Option<Duration>,
    pub max_sql_length: Option<usize>,
}

impl Default for LoggingMonitor {
    fn default() -> Self {
        Self {
            min_duration: None,
            max_sql_length: Some(200),
        }
    }
}

impl LoggingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = Some(duration);
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl QueryMonitor for LoggingMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if let Some(min) = self.min_duration {
            if duration < min {
                return;
            }
        }

        let sql = self.truncate_sql(&ctx.sql);
        let tag = ctx.tag.as_deref().unwrap_or("-");
        let elapsed_us = duration.as_micros() as u64;
        if result.is_error() {
            tracing::error!(
                target: SQL_TARGET,
                query_type = ?ctx.query_type,
                tag,
                elapsed_us,
                result = %result,
                sql = %sql,
                "statement failed"
            );
        } else {
            tracing::info!(
                target: SQL_TARGET,
                query_type = ?ctx.query_type,
                tag,
                elapsed_us,
                result = %result,
                sql = %sql,
                "statement complete"
            );
        }
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        tracing::warn!(
            target: SQL_TARGET,
            query_type = ?ctx.query_type,
            tag = ctx.tag.as_deref().unwrap_or("-"),
            elapsed_us = duration.as_micros() as u64,
            sql = %self.truncate_sql(&ctx.sql),
            "slow query"
        );
    }
}

/// Counts statements by kind and tracks the slowest one.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    total_duration_nanos: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    max_duration_nanos: AtomicU64,
    slowest_query: Mutex<Option<String>>,
}

/// Snapshot of a [`StatsMonitor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub total_queries: u64,
    pub failed_queries: u64,
    pub total_duration: Duration,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    pub max_duration: Duration,
    pub slowest_query: Option<String>,
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> QueryStats {
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            slowest_query: self
                .slowest_query
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.failed_queries,
            &self.total_duration_nanos,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
            &self.max_duration_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self
            .slowest_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl QueryMonitor for StatsMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let duration_nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        self.total_queries.fetch_add(1, Ordering::Relaxed);
        let prev_total = self
            .total_duration_nanos
            .fetch_add(duration_nanos, Ordering::Relaxed);
        if prev_total.checked_add(duration_nanos).is_none() {
            // saturate
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }

        let counter = match ctx.query_type {
            QueryType::Select => Some(&self.select_count),
            QueryType::Insert => Some(&self.insert_count),
            QueryType::Update => Some(&self.update_count),
            QueryType::Delete => Some(&self.delete_count),
            QueryType::Other => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        if result.is_error() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }

        let mut current_max = self.max_duration_nanos.load(Ordering::Relaxed);
        while duration_nanos > current_max {
            match self.max_duration_nanos.compare_exchange_weak(
                current_max,
                duration_nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    *self
                        .slowest_query
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) = Some(ctx.sql.clone());
                    break;
                }
                Err(updated) => current_max = updated,
            }
        }
    }
}

/// Fans every event out to several monitors, in insertion order.
#[derive(Default)]
pub struct CompositeMonitor {
    monitors: Vec<Arc<dyn QueryMonitor>>,
}

impl CompositeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitors.push(Arc::new(monitor));
        self
    }

    pub fn add_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }
}

impl QueryMonitor for CompositeMonitor {
    fn on_query_start(&self, ctx: &QueryContext) {
        for monitor in &self.monitors {
            monitor.on_query_start(ctx);
        }
    }

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        for monitor in &self.monitors {
            monitor.on_query_complete(ctx, duration, result);
        }
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        for monitor in &self.monitors {
            monitor.on_slow_query(ctx, duration);
        }
    }
}

/// Runs hooks in sequence; each sees the SQL left by the previous one and
/// the first abort wins.
#[derive(Default)]
pub struct CompositeHook {
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn add_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }
}

impl QueryHook for CompositeHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let mut current = ctx.clone();
        for hook in &self.hooks {
            match hook.before_query(&current) {
                HookAction::Continue => {}
                HookAction::ModifySql(sql) => {
                    current.query_type = QueryType::from_sql(&sql);
                    current.sql = sql;
                }
                action @ HookAction::Abort(_) => return action,
            }
        }
        if current.sql != ctx.sql {
            HookAction::ModifySql(current.sql)
        } else {
            HookAction::Continue
        }
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        for hook in &self.hooks {
            hook.after_query(ctx, duration, result);
        }
    }
}
