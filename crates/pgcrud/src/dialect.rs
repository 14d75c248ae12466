//! SQL dialect differences.
//!
//! Only string-level formatting differs between backends: literal quoting,
//! the LIMIT clause, the last-insert-id query and a few DDL spellings.

use serde::{Deserialize, Serialize};

/// SQL dialect spoken by a [`Database`](crate::Database).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL (standard conforming strings)
    #[default]
    Postgres,
    /// MySQL / MariaDB (backslash escapes)
    #[serde(alias = "mariadb")]
    MySql,
}

impl Dialect {
    /// Quote and escape text as a string literal.
    pub fn quote_string(self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('\'');
        match self {
            Dialect::Postgres => {
                for ch in text.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
            }
            Dialect::MySql => {
                for ch in text.chars() {
                    match ch {
                        '\0' => out.push_str("\\0"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\x1a' => out.push_str("\\Z"),
                        '\\' | '\'' | '"' => {
                            out.push('\\');
                            out.push(ch);
                        }
                        _ => out.push(ch),
                    }
                }
            }
        }
        out.push('\'');
        out
    }

    /// Render ` LIMIT ...` for a row window.
    pub fn limit_clause(self, offset: u64, count: u64) -> String {
        match self {
            Dialect::Postgres if offset > 0 => format!(" LIMIT {count} OFFSET {offset}"),
            Dialect::MySql if offset > 0 => format!(" LIMIT {offset},{count}"),
            _ => format!(" LIMIT {count}"),
        }
    }

    /// Query returning the identifier generated by the last INSERT.
    pub fn last_insert_id_sql(self) -> &'static str {
        match self {
            Dialect::Postgres => "SELECT lastval() AS last_id",
            Dialect::MySql => "SELECT LAST_INSERT_ID() AS last_id",
        }
    }

    /// Whether column definitions accept `CHARACTER SET`.
    pub fn supports_column_charset(self) -> bool {
        matches!(self, Dialect::MySql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_doubles_quotes() {
        assert_eq!(
            Dialect::Postgres.quote_string(r"See Chris's Tests...\"),
            r"'See Chris''s Tests...\'"
        );
    }

    #[test]
    fn mysql_escapes_backslashes() {
        assert_eq!(
            Dialect::MySql.quote_string(r"See Chris's Tests...\"),
            r"'See Chris\'s Tests...\\'"
        );
        assert_eq!(Dialect::MySql.quote_string("a\nb\0"), r"'a\nb\0'");
    }

    #[test]
    fn limit_clause_per_dialect() {
        assert_eq!(Dialect::Postgres.limit_clause(0, 3), " LIMIT 3");
        assert_eq!(Dialect::Postgres.limit_clause(10, 5), " LIMIT 5 OFFSET 10");
        assert_eq!(Dialect::MySql.limit_clause(10, 5), " LIMIT 10,5");
        assert_eq!(Dialect::MySql.limit_clause(0, 5), " LIMIT 5");
    }
}
