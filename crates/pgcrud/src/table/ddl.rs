use super::Table;
use crate::database::Database;
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::result::ExecResult;
use crate::schema::{FieldDef, FieldType};

const DEFAULT_VARCHAR_SIZE: u32 = 255;

impl<D: Database> Table<D> {
    /// `CREATE TABLE` statement for the schema.
    pub fn create_table_sql(&self) -> String {
        let dialect = self.db.dialect();
        let pk = self.schema.primary_key.columns();

        let mut lines: Vec<String> = self
            .schema
            .fields
            .iter()
            .map(|field| self.column_sql(field, dialect, pk.contains(&field.name.as_str())))
            .collect();
        if !pk.is_empty() {
            lines.push(format!("PRIMARY KEY ({})", pk.join(", ")));
        }

        let mut sql = format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.name(),
            lines.join(",\n    ")
        );
        if dialect.supports_column_charset() {
            if let Some(charset) = &self.schema.character_set {
                sql.push_str(&format!(" DEFAULT CHARACTER SET {charset}"));
            }
            if let Some(collate) = &self.schema.collate {
                sql.push_str(&format!(" COLLATE {collate}"));
            }
        }
        sql
    }

    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name())
    }

    pub async fn create_table(&self) -> OrmResult<ExecResult> {
        let sql = self.create_table_sql();
        self.dispatch_execute("create_table", sql).await
    }

    pub async fn drop_table(&self) -> OrmResult<ExecResult> {
        let sql = self.drop_table_sql();
        self.dispatch_execute("drop_table", sql).await
    }

    fn column_sql(&self, field: &FieldDef, dialect: Dialect, primary: bool) -> String {
        let declared = field.sql_type.trim().to_ascii_uppercase();
        let serial = dialect == Dialect::Postgres
            && field.auto_increment
            && field.field_type() == FieldType::Integer;

        let ty = match dialect {
            Dialect::MySql => field.sql_type.clone(),
            Dialect::Postgres if serial => match declared.as_str() {
                "BIGINT" | "BIGSERIAL" => "BIGSERIAL".to_string(),
                _ => "SERIAL".to_string(),
            },
            Dialect::Postgres => match declared.as_str() {
                "DATETIME" => "TIMESTAMP".to_string(),
                "TINYINT" => "SMALLINT".to_string(),
                "VARBINARY" | "BLOB" => "BYTEA".to_string(),
                _ => field.sql_type.clone(),
            },
        };

        let sized = match dialect {
            Dialect::MySql => true,
            Dialect::Postgres => matches!(declared.as_str(), "VARCHAR" | "CHAR"),
        };
        let size = field.size.or_else(|| {
            matches!(declared.as_str(), "VARCHAR" | "VARBINARY").then_some(DEFAULT_VARCHAR_SIZE)
        });

        let mut sql = format!("{} {ty}", field.name);
        if let (true, Some(size)) = (sized, size) {
            sql.push_str(&format!("({size})"));
        }
        if dialect.supports_column_charset() {
            if let Some(charset) = &field.character_set {
                sql.push_str(&format!(" CHARACTER SET {charset}"));
            }
        }
        if let Some(collate) = &field.collate {
            sql.push_str(&format!(" COLLATE {collate}"));
        }

        let nullable = field.null && !primary;
        match (dialect, nullable) {
            (_, false) => sql.push_str(" NOT NULL"),
            (Dialect::MySql, true) => sql.push_str(" NULL"),
            (Dialect::Postgres, true) => {}
        }

        if let Some(default) = &field.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.db.format_field(default, field.field_type()));
        }
        if field.auto_increment && dialect == Dialect::MySql {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql
    }
}
