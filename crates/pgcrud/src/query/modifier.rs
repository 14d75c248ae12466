use crate::filter::Filter;
use crate::schema::{FieldType, TableSchema};
use crate::value::Value;

/// A list of column names or SQL expressions (`ORDER BY`, `GROUP BY`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns(pub Vec<String>);

impl Columns {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, sep: &str) -> String {
        self.0.join(sep)
    }
}

impl From<&str> for Columns {
    fn from(column: &str) -> Self {
        Columns(vec![column.to_string()])
    }
}

impl From<String> for Columns {
    fn from(column: String) -> Self {
        Columns(vec![column])
    }
}

impl From<Vec<String>> for Columns {
    fn from(columns: Vec<String>) -> Self {
        Columns(columns)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(columns: Vec<&str>) -> Self {
        Columns(columns.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(columns: [&str; N]) -> Self {
        Columns(columns.iter().map(|c| c.to_string()).collect())
    }
}

/// A SELECT projection entry: an expression with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projected {
    pub alias: Option<String>,
    pub expr: String,
}

impl Projected {
    pub fn render(&self) -> String {
        match &self.alias {
            Some(alias) if *alias != self.expr => format!("{} AS {alias}", self.expr),
            _ => self.expr.clone(),
        }
    }
}

/// A raw boolean SQL expression with `?` wildcards.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub sql: String,
    pub wildcards: Vec<Value>,
    pub types: Vec<FieldType>,
}

/// Row window of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub offset: u64,
    /// `0` means unbounded.
    pub count: u64,
}

/// Equi-join `JOIN <table> USING (<column>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: String,
    pub column: String,
}

/// Anything that names a table to join against.
pub trait JoinTarget {
    fn join_name(&self) -> String;
}

impl JoinTarget for &str {
    fn join_name(&self) -> String {
        self.to_string()
    }
}

impl JoinTarget for String {
    fn join_name(&self) -> String {
        self.clone()
    }
}

impl JoinTarget for &TableSchema {
    fn join_name(&self) -> String {
        self.name.clone()
    }
}

impl<D> JoinTarget for &crate::table::Table<D> {
    fn join_name(&self) -> String {
        self.name().to_string()
    }
}

/// One link of a query chain.
#[derive(Debug, Clone)]
pub enum Modifier {
    Filter(Filter),
    Expression(Expression),
    Slice(Slice),
    Sort(Columns),
    Fields(Vec<Projected>),
    Aggregate(Columns),
    Join(Join),
}
