use super::Table;
use crate::database::Database;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::filter::{Filter, FilterSpec};
use crate::query::{Expression, Operation, Projected, QueryDescriptor};
use crate::row::Row;
use crate::schema::AutoFill;
use crate::value::Value;

/// LIMIT rendered for a slice with a zero count.
pub const UNBOUNDED_LIMIT: u64 = 999_999_999_999_999;

impl<D: Database> Table<D> {
    /// Compile a merged descriptor into one SQL statement.
    ///
    /// Enforces the bulk mutation rules: an UPDATE must be bound to a primary
    /// key and a DELETE must target a primary-key value unless the descriptor
    /// was unlocked with `all()`.
    pub fn compile(&self, desc: &QueryDescriptor) -> OrmResult<String> {
        match &desc.operation {
            Operation::Create(data) => Ok(self.compile_create(data)),
            Operation::Read(spec) => self.compile_read(spec, desc),
            Operation::Update(data) => self.compile_update(data, desc),
            Operation::Delete(spec) => self.compile_delete(spec, desc),
        }
    }

    fn compile_create(&self, data: &Row) -> String {
        let mut columns = Vec::new();
        let mut values = Vec::new();

        if self.schema.fields.is_empty() {
            for (field, value) in data.iter() {
                columns.push(field.to_string());
                values.push(self.format_field_value(field, value));
            }
        } else {
            for field in &self.schema.fields {
                let value = match field.auto {
                    auto if auto.is_timestamp() => Some("NOW()".to_string()),
                    AutoFill::CreateRemoteAddr | AutoFill::UpdateRemoteAddr => {
                        Some(self.remote_addr_literal())
                    }
                    _ => data
                        .get(&field.name)
                        .filter(|v| !v.is_null())
                        .map(|v| self.format_field_value(&field.name, v)),
                };
                if let Some(value) = value {
                    columns.push(field.name.clone());
                    values.push(value);
                }
            }
        }

        if columns.is_empty() {
            return match self.db.dialect() {
                Dialect::Postgres => format!("INSERT INTO {} DEFAULT VALUES", self.name()),
                Dialect::MySql => format!("INSERT INTO {} () VALUES ()", self.name()),
            };
        }
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name(),
            columns.join(", "),
            values.join(", ")
        )
    }

    fn compile_read(&self, spec: &FilterSpec, desc: &QueryDescriptor) -> OrmResult<String> {
        let fields = match &desc.fields {
            Some(fields) if !fields.is_empty() => fields
                .iter()
                .map(Projected::render)
                .collect::<Vec<_>>()
                .join(", "),
            _ => "*".to_string(),
        };

        let join = desc
            .join
            .as_ref()
            .map(|j| format!(" JOIN {} USING ({})", j.table, j.column))
            .unwrap_or_default();

        let terminal = (*spec != FilterSpec::MatchAll).then(|| Filter::new(spec.clone()));
        let where_clause =
            self.where_clause(desc.filters.iter().chain(terminal.as_ref()), &desc.expressions)?;

        let group = match &desc.aggregate {
            Some(group) if !group.is_empty() => format!(" GROUP BY {}", group.join(", ")),
            _ => String::new(),
        };

        let order = match &desc.sort {
            Some(sort) if !sort.is_empty() => format!(" ORDER BY {}", sort.join(", ")),
            _ => String::new(),
        };

        let limit = desc
            .slice
            .map(|slice| {
                let count = if slice.count == 0 {
                    UNBOUNDED_LIMIT
                } else {
                    slice.count
                };
                self.db.dialect().limit_clause(slice.offset, count)
            })
            .unwrap_or_default();

        Ok(format!(
            "SELECT {fields} FROM {}{join}{where_clause}{group}{order}{limit}",
            self.name()
        ))
    }

    fn compile_update(&self, data: &Row, desc: &QueryDescriptor) -> OrmResult<String> {
        let mut data = data.clone();
        let pk = self.schema.primary_key.columns();

        let bound = if pk.len() == 1 {
            data.remove(pk[0])
                .map(|value| Filter::new(FilterSpec::PrimaryKey(value)))
        } else if !pk.is_empty() && pk.iter().all(|column| data.contains(column)) {
            let pairs = pk
                .iter()
                .map(|column| (column.to_string(), data.remove(column).unwrap_or_default()))
                .collect();
            Some(Filter::new(FilterSpec::Fields(pairs)))
        } else {
            None
        };

        if bound.is_none() && !desc.all {
            return Err(OrmError::unsafe_bulk(
                "Bulk updates must be accompanied by an all() qualifier.",
            ));
        }

        let index = self.field_index();
        let mut changes: Vec<(String, String)> = data
            .iter()
            .filter(|(field, _)| index.contains(field))
            .map(|(field, value)| (field.to_string(), self.format_field_value(field, value)))
            .collect();

        for (field, auto) in index.auto_fields() {
            if !auto.on_update() {
                continue;
            }
            let value = if auto.is_timestamp() {
                "NOW()".to_string()
            } else {
                self.remote_addr_literal()
            };
            match changes.iter_mut().find(|(name, _)| name == field) {
                Some((_, slot)) => *slot = value,
                None => changes.push((field.to_string(), value)),
            }
        }

        if changes.is_empty() {
            return Err(OrmError::malformed_query(format!(
                "update of '{}' has no fields to set",
                self.name()
            )));
        }

        let set = changes
            .iter()
            .map(|(field, value)| format!("{field} = {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let where_clause =
            self.where_clause(desc.filters.iter().chain(bound.as_ref()), &desc.expressions)?;

        Ok(format!("UPDATE {} SET {set}{where_clause}", self.name()))
    }

    fn compile_delete(&self, spec: &FilterSpec, desc: &QueryDescriptor) -> OrmResult<String> {
        if !spec.is_row_bound() && !desc.all {
            return Err(OrmError::unsafe_bulk(
                "Bulk deletes must be accompanied by an all() qualifier.",
            ));
        }

        let terminal = Filter::new(spec.clone());
        let where_clause = self.where_clause(
            desc.filters.iter().chain(std::iter::once(&terminal)),
            &desc.expressions,
        )?;

        Ok(format!("DELETE FROM {}{where_clause}", self.name()))
    }

    /// ` WHERE ...` for the given filters and expressions, or nothing.
    ///
    /// An empty-set filter collapses the clause to ` WHERE 1=0`.
    fn where_clause<'a>(
        &self,
        filters: impl IntoIterator<Item = &'a Filter>,
        expressions: &[Expression],
    ) -> OrmResult<String> {
        let ctx = self.filter_context();
        let mut terms = Vec::new();

        for filter in filters {
            let compiled = filter.compile(&ctx)?;
            if compiled.empty {
                return Ok(" WHERE 1=0".to_string());
            }
            if !compiled.unconstrained {
                terms.push(compiled.expression.clone());
            }
        }

        for expr in expressions {
            let sql = self
                .db
                .replace_wildcards(&expr.sql, &expr.wildcards, &expr.types)?;
            terms.push(format!("({sql})"));
        }

        if terms.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" WHERE {}", terms.join(" AND ")))
        }
    }

    fn remote_addr_literal(&self) -> String {
        self.db
            .format_string(&Value::from(self.client_addr.as_deref()))
    }
}
