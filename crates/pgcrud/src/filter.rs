//! Filter specs and their compilation into WHERE expressions.

use crate::error::{OrmError, OrmResult};
use crate::format::SqlFormat;
use crate::row::Row;
use crate::schema::{FieldIndex, PrimaryKey};
use crate::value::Value;
use std::sync::OnceLock;

/// Which rows an operation targets.
///
/// An empty [`FilterSpec::Fields`] matches nothing: an accidentally empty
/// field list never widens into "every row".
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterSpec {
    /// Every row (`true`)
    #[default]
    MatchAll,
    /// `FALSE`, without the empty-set short circuit (`false`)
    MatchNone,
    /// Equality against the single-column primary key
    PrimaryKey(Value),
    /// Conjunction of `field = value` equalities, `NULL` meaning `IS NULL`
    Fields(Vec<(String, Value)>),
}

impl FilterSpec {
    /// Build a field-equality spec.
    pub fn fields<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        FilterSpec::Fields(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Whether the spec pins an operation to one primary key value.
    pub fn is_row_bound(&self) -> bool {
        matches!(self, FilterSpec::PrimaryKey(_))
    }

    /// Convert a dynamically typed JSON filter.
    ///
    /// Booleans, scalars and objects map to the matching variants; `null`
    /// and empty containers are the empty set. Non-empty arrays (positional
    /// entries), integer keys and nested array or object values are
    /// rejected.
    pub fn from_json(json: &serde_json::Value) -> OrmResult<Self> {
        use serde_json::Value as Json;

        match json {
            Json::Bool(b) => Ok(FilterSpec::from(*b)),
            Json::Null => Ok(FilterSpec::Fields(Vec::new())),
            Json::Number(_) | Json::String(_) => {
                Ok(FilterSpec::PrimaryKey(Value::from_json(json)?))
            }
            Json::Array(items) if items.is_empty() => Ok(FilterSpec::Fields(Vec::new())),
            Json::Array(_) => Err(OrmError::malformed_filter(
                "Filter arrays can only contain column=>value pairings.",
            )),
            Json::Object(map) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (field, value) in map {
                    if field.parse::<i64>().is_ok_and(|i| i.to_string() == *field) {
                        return Err(OrmError::malformed_filter(
                            "Filter arrays can only contain column=>value pairings.",
                        ));
                    }
                    if value.is_array() || value.is_object() {
                        return Err(OrmError::malformed_filter(format!(
                            "Array filter values are not supported (field '{field}')"
                        )));
                    }
                    pairs.push((field.clone(), Value::from_json(value)?));
                }
                Ok(FilterSpec::Fields(pairs))
            }
        }
    }
}

impl From<bool> for FilterSpec {
    fn from(b: bool) -> Self {
        if b {
            FilterSpec::MatchAll
        } else {
            FilterSpec::MatchNone
        }
    }
}

impl From<Value> for FilterSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => FilterSpec::from(b),
            Value::Null => FilterSpec::Fields(Vec::new()),
            other => FilterSpec::PrimaryKey(other),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterSpec {
                fn from(v: $ty) -> Self {
                    FilterSpec::PrimaryKey(Value::from(v))
                }
            }
        )*
    };
}

impl_from_scalar!(i16, i32, i64, u16, u32, f64, &str, String, &String);

impl From<Row> for FilterSpec {
    fn from(row: Row) -> Self {
        FilterSpec::Fields(row.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for FilterSpec {
    fn from(pairs: [(K, V); N]) -> Self {
        FilterSpec::fields(pairs)
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for FilterSpec {
    fn from(pairs: Vec<(K, V)>) -> Self {
        FilterSpec::fields(pairs)
    }
}

/// Table metadata a filter needs to compile.
pub(crate) struct FilterContext<'a> {
    pub primary_key: &'a PrimaryKey,
    pub fields: &'a FieldIndex,
    pub format: &'a dyn SqlFormat,
}

impl FilterContext<'_> {
    pub(crate) fn format_field(&self, field: &str, value: &Value) -> String {
        let ty = self.fields.field_type(field).unwrap_or_default();
        self.format.format_field(value, ty)
    }
}

/// A compiled filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub expression: String,
    /// The filter can match no row; the whole WHERE clause collapses to `1=0`.
    pub empty: bool,
    /// The filter constrains nothing and is left out of the WHERE clause.
    pub unconstrained: bool,
}

/// A filter spec, optionally negated, compiled once on first use.
#[derive(Debug, Clone)]
pub struct Filter {
    spec: FilterSpec,
    negated: bool,
    compiled: OnceLock<CompiledFilter>,
}

impl Filter {
    pub fn new(spec: impl Into<FilterSpec>) -> Self {
        Self {
            spec: spec.into(),
            negated: false,
            compiled: OnceLock::new(),
        }
    }

    /// `NOT (<expression>)` of the spec.
    pub fn negated(spec: impl Into<FilterSpec>) -> Self {
        Self {
            negated: true,
            ..Self::new(spec)
        }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub(crate) fn compile(&self, ctx: &FilterContext<'_>) -> OrmResult<&CompiledFilter> {
        if let Some(compiled) = self.compiled.get() {
            return Ok(compiled);
        }
        let compiled = self.build(ctx)?;
        Ok(self.compiled.get_or_init(|| compiled))
    }

    fn build(&self, ctx: &FilterContext<'_>) -> OrmResult<CompiledFilter> {
        let (expression, empty, unconstrained) = match &self.spec {
            FilterSpec::MatchNone => ("FALSE".to_string(), false, false),
            FilterSpec::MatchAll => ("TRUE".to_string(), false, true),
            FilterSpec::Fields(pairs) if pairs.is_empty() => ("FALSE".to_string(), true, false),
            FilterSpec::PrimaryKey(value) if !value.is_truthy() => {
                ("FALSE".to_string(), true, false)
            }
            FilterSpec::Fields(pairs) => {
                let terms: Vec<String> = pairs
                    .iter()
                    .map(|(field, value)| {
                        if value.is_null() {
                            format!("{field} IS NULL")
                        } else {
                            format!("{field} = {}", ctx.format_field(field, value))
                        }
                    })
                    .collect();
                (terms.join(" AND "), false, false)
            }
            FilterSpec::PrimaryKey(value) => {
                let pk = ctx.primary_key.single().ok_or_else(|| {
                    OrmError::malformed_filter(
                        "Multi-column or missing primary keys cannot use shorthand pk notation.",
                    )
                })?;
                (format!("{pk} = {}", ctx.format_field(pk, value)), false, false)
            }
        };

        if self.negated {
            Ok(CompiledFilter {
                expression: format!("NOT ({expression})"),
                empty,
                unconstrained: false,
            })
        } else {
            Ok(CompiledFilter {
                expression,
                empty,
                unconstrained,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::schema::{FieldDef, TableSchema};

    fn schema() -> TableSchema {
        TableSchema::new("grubby_test")
            .with_primary_key("id")
            .with_field(FieldDef::new("id", "INT"))
            .with_field(FieldDef::new("foo", "VARCHAR"))
            .with_field(FieldDef::new("category", "INT"))
    }

    fn compile(filter: &Filter, schema: &TableSchema) -> OrmResult<CompiledFilter> {
        let index = FieldIndex::build(schema);
        let ctx = FilterContext {
            primary_key: &schema.primary_key,
            fields: &index,
            format: &Dialect::Postgres,
        };
        filter.compile(&ctx).cloned()
    }

    #[test]
    fn expression_shapes() {
        let schema = schema();
        let cases: Vec<(FilterSpec, &str, bool)> = vec![
            (42.into(), "id = 42", false),
            (FilterSpec::Fields(vec![]), "FALSE", true),
            (false.into(), "FALSE", false),
            (true.into(), "TRUE", false),
            ([("foo", "bar")].into(), "foo = 'bar'", false),
            (
                [("foo", "bar"), ("chunk", "down")].into(),
                "foo = 'bar' AND chunk = 'down'",
                false,
            ),
            ([("foo", Value::Null)].into(), "foo IS NULL", false),
            ([("category", "2")].into(), "category = 2", false),
        ];
        for (spec, expected, empty) in cases {
            let compiled = compile(&Filter::new(spec.clone()), &schema).unwrap();
            assert_eq!(compiled.expression, expected, "{spec:?}");
            assert_eq!(compiled.empty, empty, "{spec:?}");
        }
    }

    #[test]
    fn falsy_primary_key_is_empty_set() {
        let schema = schema();
        for spec in [
            FilterSpec::from(0),
            FilterSpec::from(""),
            FilterSpec::PrimaryKey(Value::Null),
        ] {
            let compiled = compile(&Filter::new(spec), &schema).unwrap();
            assert!(compiled.empty);
        }
    }

    #[test]
    fn negation_wraps_and_keeps_empty_flag() {
        let schema = schema();

        let not_false = compile(&Filter::negated(false), &schema).unwrap();
        assert_eq!(not_false.expression, "NOT (FALSE)");
        assert!(!not_false.empty);

        let not_true = compile(&Filter::negated(true), &schema).unwrap();
        assert_eq!(not_true.expression, "NOT (TRUE)");
        assert!(!not_true.unconstrained);

        let not_empty = compile(&Filter::negated(FilterSpec::Fields(vec![])), &schema).unwrap();
        assert!(not_empty.empty);
    }

    #[test]
    fn match_all_is_unconstrained() {
        let compiled = compile(&Filter::new(true), &schema()).unwrap();
        assert!(compiled.unconstrained);
    }

    #[test]
    fn shorthand_needs_single_primary_key() {
        let composite = TableSchema::new("links").with_primary_key(["a", "b"]);
        let err = compile(&Filter::new(5), &composite).unwrap_err();
        assert!(err.is_malformed_filter());

        let keyless = TableSchema::new("log");
        let err = compile(&Filter::new("x"), &keyless).unwrap_err();
        assert!(err.is_malformed_filter());
    }

    #[test]
    fn from_json_specs() {
        use serde_json::json;

        assert_eq!(FilterSpec::from_json(&json!(true)).unwrap(), FilterSpec::MatchAll);
        assert_eq!(FilterSpec::from_json(&json!(7)).unwrap(), FilterSpec::from(7));
        assert_eq!(
            FilterSpec::from_json(&json!({"foo": null})).unwrap(),
            FilterSpec::Fields(vec![("foo".into(), Value::Null)])
        );
        assert_eq!(
            FilterSpec::from_json(&json!([])).unwrap(),
            FilterSpec::Fields(vec![])
        );

        for bad in [
            json!(["foo"]),
            json!({"0": "foo"}),
            json!({"foo": [1, 2]}),
            json!({"foo": {"a": 1}}),
        ] {
            let err = FilterSpec::from_json(&bad).unwrap_err();
            assert!(err.is_malformed_filter(), "{bad}");
        }
    }

    #[test]
    fn value_conversion_respects_booleans() {
        assert_eq!(FilterSpec::from(Value::Bool(false)), FilterSpec::MatchNone);
        assert_eq!(FilterSpec::from(Value::Null), FilterSpec::Fields(vec![]));
        assert!(FilterSpec::from(Value::from("abc")).is_row_bound());
    }

    #[test]
    fn default_spec_matches_everything() {
        assert_eq!(FilterSpec::default(), FilterSpec::MatchAll);
    }
}
