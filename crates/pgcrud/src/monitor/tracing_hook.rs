use super::truncate_sql_bytes;
use super::types::{HookAction, QueryContext, QueryHook};
use crate::table::SQL_TARGET;
use tracing::Level;

/// Emits the SQL about to run as a `tracing` event.
///
/// Logs before execution, so it works with monitoring disabled.
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    pub level: Level,
    /// `None` disables truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingSqlHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                let level = $level;
                if level == Level::ERROR {
                    tracing::error!($($field)*)
                } else if level == Level::WARN {
                    tracing::warn!($($field)*)
                } else if level == Level::INFO {
                    tracing::info!($($field)*)
                } else if level == Level::DEBUG {
                    tracing::debug!($($field)*)
                } else {
                    tracing::trace!($($field)*)
                }
            };
        }

        let sql = self.truncate_sql(&ctx.sql);
        let tag = ctx.tag.as_deref().unwrap_or("-");
        emit_at_level!(
            self.level,
            target: SQL_TARGET,
            query_type = ?ctx.query_type,
            tag,
            sql = %sql,
        );
        HookAction::Continue
    }
}
