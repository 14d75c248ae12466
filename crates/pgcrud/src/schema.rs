//! Table schema metadata.
//!
//! A [`TableSchema`] is built once, either in code with the `with_*` builders
//! or from TOML, and shared read-only by every [`Table`](crate::Table) using it.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Logical type of a field, used to pick a value formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    #[default]
    String,
    DateTime,
}

impl FieldType {
    /// Classify a declared SQL type such as `INT`, `varchar` or `DATETIME`.
    pub fn from_sql_type(sql_type: &str) -> Self {
        match sql_type.trim().to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" | "SMALLINT" | "BIGINT" | "TINYINT" | "SERIAL" | "BIGSERIAL" => {
                FieldType::Integer
            }
            "DATETIME" | "TIMESTAMP" => FieldType::DateTime,
            _ => FieldType::String,
        }
    }
}

/// Value a field is filled with automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoFill {
    #[default]
    None,
    /// `NOW()` on insert
    CreateTimestamp,
    /// `NOW()` on insert and update
    UpdateTimestamp,
    /// Client address on insert
    CreateRemoteAddr,
    /// Client address on insert and update
    UpdateRemoteAddr,
}

impl AutoFill {
    /// Whether the directive applies to an INSERT.
    pub fn on_create(self) -> bool {
        !matches!(self, AutoFill::None)
    }

    /// Whether the directive applies to an UPDATE.
    pub fn on_update(self) -> bool {
        matches!(self, AutoFill::UpdateTimestamp | AutoFill::UpdateRemoteAddr)
    }

    pub fn is_timestamp(self) -> bool {
        matches!(self, AutoFill::CreateTimestamp | AutoFill::UpdateTimestamp)
    }
}

/// Primary key of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
    #[default]
    None,
}

impl PrimaryKey {
    /// The column name when the key is a single column.
    pub fn single(&self) -> Option<&str> {
        match self {
            PrimaryKey::Single(name) => Some(name),
            PrimaryKey::Composite(names) if names.len() == 1 => Some(&names[0]),
            _ => None,
        }
    }

    /// All key columns in declaration order.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(name) => vec![name.as_str()],
            PrimaryKey::Composite(names) => names.iter().map(String::as_str).collect(),
            PrimaryKey::None => Vec::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.columns().is_empty()
    }
}

impl From<&str> for PrimaryKey {
    fn from(name: &str) -> Self {
        PrimaryKey::Single(name.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(name: String) -> Self {
        PrimaryKey::Single(name)
    }
}

impl<const N: usize> From<[&str; N]> for PrimaryKey {
    fn from(names: [&str; N]) -> Self {
        PrimaryKey::Composite(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<String>> for PrimaryKey {
    fn from(names: Vec<String>) -> Self {
        PrimaryKey::Composite(names)
    }
}

fn default_nullable() -> bool {
    true
}

/// Definition of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Declared SQL type, e.g. `INT`, `VARCHAR`, `DATETIME`.
    #[serde(rename = "type")]
    pub sql_type: String,
    #[serde(default = "default_nullable")]
    pub null: bool,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub character_set: Option<String>,
    #[serde(default)]
    pub collate: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub auto: AutoFill,
}

impl FieldDef {
    /// Create a nullable field of the given SQL type.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            null: true,
            size: None,
            character_set: None,
            collate: None,
            default: None,
            auto_increment: false,
            auto: AutoFill::None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.null = false;
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_character_set(mut self, charset: impl Into<String>) -> Self {
        self.character_set = Some(charset.into());
        self
    }

    pub fn with_collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_auto(mut self, auto: AutoFill) -> Self {
        self.auto = auto;
        self
    }

    pub fn field_type(&self) -> FieldType {
        FieldType::from_sql_type(&self.sql_type)
    }
}

/// Schema of one table.
///
/// # Example
///
/// ```
/// use pgcrud::{FieldDef, TableSchema};
///
/// let schema = TableSchema::new("widgets")
///     .with_primary_key("id")
///     .with_field(FieldDef::new("id", "INT").not_null().auto_increment())
///     .with_field(FieldDef::new("foo", "VARCHAR").with_size(64))
///     .with_field(FieldDef::new("category", "INT"));
///
/// assert_eq!(schema.primary_key.single(), Some("id"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub primary_key: PrimaryKey,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub character_set: Option<String>,
    #[serde(default)]
    pub collate: Option<String>,
}

impl TableSchema {
    /// Create a schema with no primary key and no declared fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: PrimaryKey::None,
            fields: Vec::new(),
            character_set: None,
            collate: None,
        }
    }

    pub fn with_primary_key(mut self, pk: impl Into<PrimaryKey>) -> Self {
        self.primary_key = pk.into();
        self
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_character_set(mut self, charset: impl Into<String>) -> Self {
        self.character_set = Some(charset.into());
        self
    }

    pub fn with_collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Parse and validate a single table from TOML.
    pub fn from_toml_str(source: &str) -> OrmResult<Self> {
        let schema: TableSchema = toml::from_str(source)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Check that the schema is internally consistent.
    ///
    /// Field names must be unique and, when fields are declared, every
    /// primary key column must be one of them.
    pub fn validate(&self) -> OrmResult<()> {
        if self.name.trim().is_empty() {
            return Err(OrmError::Config("table name is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(OrmError::Config(format!(
                    "table '{}' declares field '{}' twice",
                    self.name, field.name
                )));
            }
        }
        if !self.fields.is_empty() {
            for column in self.primary_key.columns() {
                if !seen.contains(column) {
                    return Err(OrmError::Config(format!(
                        "primary key column '{column}' is not a field of table '{}'",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Field name to type and auto-fill lookup, derived from a schema.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    types: HashMap<String, FieldType>,
    auto: Vec<(String, AutoFill)>,
}

impl FieldIndex {
    pub fn build(schema: &TableSchema) -> Self {
        let types = schema
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.field_type()))
            .collect();
        let auto = schema
            .fields
            .iter()
            .filter(|f| f.auto != AutoFill::None)
            .map(|f| (f.name.clone(), f.auto))
            .collect();
        Self { types, auto }
    }

    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.types.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.types.contains_key(field)
    }

    /// Auto-fill directives in schema order.
    pub fn auto_fields(&self) -> impl Iterator<Item = (&str, AutoFill)> {
        self.auto.iter().map(|(name, auto)| (name.as_str(), *auto))
    }

    pub fn auto(&self, field: &str) -> AutoFill {
        self.auto
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, auto)| *auto)
            .unwrap_or_default()
    }
}

/// A set of table schemas, usually loaded from one configuration file.
///
/// ```toml
/// [[tables]]
/// name = "widgets"
/// primary_key = "id"
///
/// [[tables.fields]]
/// name = "id"
/// type = "INT"
/// null = false
/// auto_increment = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    tables: Vec<TableSchema>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> OrmResult<Self> {
        let catalog: Catalog = toml::from_str(source)?;
        let mut seen = HashSet::new();
        for table in &catalog.tables {
            table.validate()?;
            if !seen.insert(table.name.as_str()) {
                return Err(OrmError::Config(format!(
                    "table '{}' is declared twice",
                    table.name
                )));
            }
        }
        Ok(catalog)
    }

    /// Read and parse a TOML catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| OrmError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Register a table, replacing one with the same name.
    pub fn register_table(&mut self, table: TableSchema) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(slot) => *slot = table,
            None => self.tables.push(table),
        }
    }

    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_declared_types() {
        assert_eq!(FieldType::from_sql_type("int"), FieldType::Integer);
        assert_eq!(FieldType::from_sql_type("BIGINT"), FieldType::Integer);
        assert_eq!(FieldType::from_sql_type("DateTime"), FieldType::DateTime);
        assert_eq!(FieldType::from_sql_type("VARCHAR"), FieldType::String);
        assert_eq!(FieldType::from_sql_type("BLOB"), FieldType::String);
    }

    #[test]
    fn auto_fill_phases() {
        assert!(AutoFill::CreateTimestamp.on_create());
        assert!(!AutoFill::CreateTimestamp.on_update());
        assert!(AutoFill::UpdateRemoteAddr.on_create());
        assert!(AutoFill::UpdateRemoteAddr.on_update());
        assert!(!AutoFill::None.on_create());
    }

    #[test]
    fn loads_table_from_toml() {
        let schema = TableSchema::from_toml_str(
            r#"
            name = "widgets"
            primary_key = "id"

            [[fields]]
            name = "id"
            type = "INT"
            null = false
            auto_increment = true

            [[fields]]
            name = "foo"
            type = "VARCHAR"
            size = 64
            default = "none"

            [[fields]]
            name = "created"
            type = "DATETIME"
            auto = "create_timestamp"
            "#,
        )
        .unwrap();

        assert_eq!(schema.primary_key, PrimaryKey::Single("id".into()));
        assert_eq!(schema.fields.len(), 3);
        assert!(!schema.fields[0].null);
        assert!(schema.fields[1].null);
        assert_eq!(schema.fields[1].default, Some(Value::from("none")));
        assert_eq!(schema.fields[2].auto, AutoFill::CreateTimestamp);
    }

    #[test]
    fn composite_key_from_toml() {
        let schema = TableSchema::from_toml_str(
            r#"
            name = "links"
            primary_key = ["a", "b"]
            "#,
        )
        .unwrap();
        assert_eq!(schema.primary_key.columns(), vec!["a", "b"]);
        assert_eq!(schema.primary_key.single(), None);
    }

    #[test]
    fn rejects_unknown_primary_key_column() {
        let err = TableSchema::from_toml_str(
            r#"
            name = "widgets"
            primary_key = "missing"

            [[fields]]
            name = "id"
            type = "INT"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn catalog_lookup_and_duplicates() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[tables]]
            name = "a"

            [[tables]]
            name = "b"
            primary_key = "id"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get_table("b").is_some());
        assert!(catalog.get_table("c").is_none());

        let err = Catalog::from_toml_str(
            r#"
            [[tables]]
            name = "a"

            [[tables]]
            name = "a"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn field_index_lookups() {
        let schema = TableSchema::new("t")
            .with_field(FieldDef::new("id", "int"))
            .with_field(FieldDef::new("modified", "DATETIME").with_auto(AutoFill::UpdateTimestamp));
        let index = FieldIndex::build(&schema);
        assert_eq!(index.field_type("id"), Some(FieldType::Integer));
        assert_eq!(index.field_type("nope"), None);
        assert_eq!(index.auto("modified"), AutoFill::UpdateTimestamp);
        assert_eq!(index.auto("id"), AutoFill::None);
        assert_eq!(index.auto_fields().count(), 1);
    }
}
