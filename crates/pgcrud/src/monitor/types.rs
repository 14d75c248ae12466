use std::fmt;
use std::time::Duration;

/// The kind of statement being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL and anything else.
    Other,
}

impl QueryType {
    /// Detect the statement kind from its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default();

        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// What a monitor or hook sees of a statement.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// SQL as it is sent, after any rewriting hook.
    pub sql: String,
    pub query_type: QueryType,
    /// `<table>.<verb>` for statements dispatched by a [`Table`](crate::Table).
    pub tag: Option<String>,
}

impl QueryContext {
    pub fn new(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            query_type: QueryType::from_sql(sql),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

const MAX_ERROR_LEN: usize = 512;

/// Outcome of a statement, for monitoring purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Rows(usize),
    Affected(u64),
    /// Error message, truncated to 512 bytes.
    Error(String),
}

impl QueryResult {
    pub fn error(msg: String) -> Self {
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Observe statement execution.
pub trait QueryMonitor: Send + Sync {
    fn on_query_start(&self, _ctx: &QueryContext) {}

    /// Called once per statement, successful or not.
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);

    /// Called after `on_query_complete` when the statement ran longer than the
    /// configured threshold.
    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}

/// Decision of a [`QueryHook`] about a pending statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    Continue,
    /// Run this SQL instead.
    ModifySql(String),
    /// Fail the statement with [`OrmError::Aborted`](crate::OrmError::Aborted).
    Abort(String),
}

/// Inspect, rewrite or reject statements before they reach the database.
pub trait QueryHook: Send + Sync {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}
