//! Convenient imports for typical `pgcrud` usage.
//!
//! ```
//! use pgcrud::prelude::*;
//! ```

pub use crate::{
    Catalog, Database, ExecResult, Fetched, FieldDef, FilterSpec, FromRow, OrmError, OrmResult,
    RecordingDatabase, Row, Table, TableSchema, Value,
};
pub use crate::{AutoFill, FieldType, Operation, PrimaryKey};
