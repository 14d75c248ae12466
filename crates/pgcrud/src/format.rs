//! Inline literal formatting and `?` wildcard substitution.
//!
//! Values are never bound as parameters: every literal is escaped and quoted
//! into the SQL text. [`SqlFormat`] is the formatting half of a
//! [`Database`](crate::Database); [`Dialect`] implements it on its own so SQL
//! can be rendered without a connection.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::schema::FieldType;
use crate::value::Value;
use rust_decimal::RoundingStrategy;

/// Escaping and quoting of values for one SQL dialect.
pub trait SqlFormat {
    /// Dialect the formatted SQL is meant for.
    fn dialect(&self) -> Dialect;

    /// Escape and delimit a value as a string literal.
    ///
    /// - `NULL` becomes the `NULL` literal
    /// - falsy values (`false`, `0`, `0.0`, `""`) become `''`
    /// - anything else is quoted from its textual form
    fn format_string(&self, value: &Value) -> String {
        if value.is_null() {
            "NULL".to_string()
        } else if !value.is_truthy() {
            "''".to_string()
        } else {
            self.dialect().quote_string(&value.to_text())
        }
    }

    /// Render a value as an integer literal. See [`format_int`].
    fn format_int(&self, value: &Value) -> String {
        format_int(value)
    }

    /// Format a value according to a logical field type.
    fn format(&self, value: &Value, ty: FieldType) -> String {
        match ty {
            FieldType::Integer => self.format_int(value),
            FieldType::String | FieldType::DateTime => self.format_string(value),
        }
    }

    /// Format a value stored into or compared against a column.
    ///
    /// Unlike [`SqlFormat::format`], `NULL` is always kept as `NULL`.
    fn format_field(&self, value: &Value, ty: FieldType) -> String {
        if value.is_null() {
            "NULL".to_string()
        } else {
            self.format(value, ty)
        }
    }

    /// Replace `?` wildcards in `sql` with formatted `wildcards`.
    ///
    /// `?` inside single-quoted literals (backslash escapes honoured) is left
    /// alone. `types` gives the field type of each wildcard by position and
    /// defaults to [`FieldType::String`].
    ///
    /// Errors when there are more `?` than values, when values are left over,
    /// or when a literal is unterminated. A `NULL` value at a `?` counts as
    /// missing. A single falsy value with no `?` in
    /// the text is accepted as "no wildcards".
    fn replace_wildcards(
        &self,
        sql: &str,
        wildcards: &[Value],
        types: &[FieldType],
    ) -> OrmResult<String> {
        let bytes = sql.as_bytes();
        let len = bytes.len();
        let mut out = String::with_capacity(len);
        let mut used = 0;
        let mut marker = 0;
        let mut i = 0;

        while i < len {
            match bytes[i] {
                b'?' => {
                    let value = wildcards
                        .get(used)
                        .filter(|value| !value.is_null())
                        .ok_or_else(|| {
                            OrmError::wildcard("Too few wildcards for filter expression.")
                        })?;
                    let ty = types.get(used).copied().unwrap_or_default();
                    out.push_str(&sql[marker..i]);
                    out.push_str(&self.format(value, ty));
                    marker = i + 1;
                    used += 1;
                }
                b'\'' => loop {
                    i += 1;
                    if i >= len {
                        return Err(OrmError::wildcard(format!(
                            "Unterminated string in filter expression, \"{sql}\""
                        )));
                    }
                    match bytes[i] {
                        b'\\' => i += 1,
                        b'\'' => break,
                        _ => {}
                    }
                },
                _ => {}
            }
            i += 1;
        }

        let supplied = wildcards.len();
        if used < supplied && (supplied > 1 || wildcards[0].is_truthy()) {
            return Err(OrmError::wildcard(
                "Too many wildcards for filter expression.",
            ));
        }

        out.push_str(&sql[marker..]);
        Ok(out)
    }
}

impl SqlFormat for Dialect {
    fn dialect(&self) -> Dialect {
        *self
    }
}

/// Render a value as an integer literal.
///
/// Integers print as-is, floats and decimals are rounded, numeric text passes through
/// trimmed and everything else silently becomes `0`.
pub fn format_int(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => format!("{}", f.round()),
        Value::Decimal(d) => d
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Text(s) if is_numeric(s) => s.trim().to_string(),
        _ => "0".to_string(),
    }
}

fn is_numeric(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        && text.parse::<f64>().is_ok_and(f64::is_finite)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PG: Dialect = Dialect::Postgres;

    #[test]
    fn format_string_nulls_and_falsy() {
        assert_eq!(PG.format_string(&Value::Null), "NULL");
        assert_eq!(PG.format_string(&Value::from("")), "''");
        assert_eq!(PG.format_string(&Value::from(0)), "''");
        assert_eq!(PG.format_string(&Value::from(false)), "''");
        assert_eq!(PG.format_string(&Value::from("0")), "'0'");
        assert_eq!(PG.format_string(&Value::from(42)), "'42'");
        assert_eq!(PG.format_string(&Value::from(true)), "'1'");
        assert_eq!(PG.format_string(&Value::from("it's")), "'it''s'");
    }

    #[test]
    fn format_int_is_lenient() {
        assert_eq!(format_int(&Value::from(12)), "12");
        assert_eq!(format_int(&Value::from(2.5)), "3");
        assert_eq!(format_int(&Value::from(-2.4)), "-2");
        assert_eq!(format_int(&Value::from(" 17 ")), "17");
        assert_eq!(format_int(&Value::from("1.5")), "1.5");
        assert_eq!(format_int(&Value::from("abc")), "0");
        assert_eq!(format_int(&Value::from("inf")), "0");
        assert_eq!(format_int(&Value::from("1; DROP TABLE t")), "0");
        assert_eq!(format_int(&Value::Null), "0");
        assert_eq!(format_int(&Value::from(f64::NAN)), "0");
        assert_eq!(format_int(&Value::from(rust_decimal::Decimal::new(25, 1))), "3");
    }

    #[test]
    fn format_field_keeps_null() {
        assert_eq!(PG.format_field(&Value::Null, FieldType::Integer), "NULL");
        assert_eq!(PG.format_field(&Value::from(0), FieldType::Integer), "0");
        assert_eq!(PG.format_field(&Value::from(""), FieldType::String), "''");
    }

    #[test]
    fn replaces_single_wildcard() {
        let sql = PG
            .replace_wildcards("foo=?", &[Value::from("bar")], &[])
            .unwrap();
        assert_eq!(sql, "foo='bar'");
    }

    #[test]
    fn quoted_question_mark_is_literal() {
        let sql = PG.replace_wildcards("foo='?'", &[], &[]).unwrap();
        assert_eq!(sql, "foo='?'");
    }

    #[test]
    fn escaped_quote_inside_literal() {
        let sql = PG
            .replace_wildcards(r"foo='a\'?' AND bar=?", &[Value::from(1)], &[])
            .unwrap();
        assert_eq!(sql, r"foo='a\'?' AND bar='1'");
    }

    #[test]
    fn typed_wildcards() {
        let sql = PG
            .replace_wildcards(
                "id < ? AND name = ?",
                &[Value::from("20"), Value::from("x")],
                &[FieldType::Integer],
            )
            .unwrap();
        assert_eq!(sql, "id < 20 AND name = 'x'");
    }

    #[test]
    fn too_few_wildcards() {
        let err = PG
            .replace_wildcards("foo=? OR bar=?", &[Value::from(1)], &[])
            .unwrap_err();
        assert!(err.is_wildcard());
    }

    #[test]
    fn null_wildcard_is_missing() {
        let err = PG
            .replace_wildcards("foo = ?", &[Value::Null], &[])
            .unwrap_err();
        assert!(err.is_wildcard());

        let err = PG
            .replace_wildcards("foo = ? AND bar = ?", &[Value::from(1), Value::Null], &[])
            .unwrap_err();
        assert!(err.is_wildcard());
    }

    #[test]
    fn too_many_wildcards() {
        let err = PG
            .replace_wildcards("foo=1", &[Value::from(1), Value::from(2)], &[])
            .unwrap_err();
        assert!(err.is_wildcard());

        let err = PG
            .replace_wildcards("foo=1", &[Value::from("x")], &[])
            .unwrap_err();
        assert!(err.is_wildcard());
    }

    #[test]
    fn single_falsy_wildcard_is_tolerated() {
        for falsy in [Value::Null, Value::from(""), Value::from(0), Value::from(false)] {
            let sql = PG.replace_wildcards("id < 20", &[falsy], &[]).unwrap();
            assert_eq!(sql, "id < 20");
        }
    }

    #[test]
    fn unterminated_literal() {
        let err = PG
            .replace_wildcards("foo='abc AND bar=?", &[Value::from(1)], &[])
            .unwrap_err();
        assert!(err.is_wildcard());

        let err = PG.replace_wildcards(r"foo='abc\", &[], &[]).unwrap_err();
        assert!(err.is_wildcard());
    }

    #[test]
    fn multibyte_text_survives() {
        let sql = PG
            .replace_wildcards("name = ? AND note = 'héllo?'", &[Value::from("ñandú")], &[])
            .unwrap();
        assert_eq!(sql, "name = 'ñandú' AND note = 'héllo?'");
    }
}
