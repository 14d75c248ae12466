//! Verb flows against the in-memory recording database.

use pgcrud::prelude::*;
use pgcrud::{Dialect, SqlFormat};
use serde::{Deserialize, Serialize};

fn schema() -> TableSchema {
    TableSchema::new("grubby_test")
        .with_primary_key("id")
        .with_field(FieldDef::new("id", "INT").auto_increment())
        .with_field(FieldDef::new("foo", "VARCHAR"))
        .with_field(FieldDef::new("category", "INT"))
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Widget {
    id: i64,
    foo: Option<String>,
    category: i64,
}

impl FromRow for Widget {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            foo: row.try_get("foo")?,
            category: row.try_get("category")?,
        })
    }
}

#[tokio::test]
async fn create_reports_insert_id() -> OrmResult<()> {
    let db = RecordingDatabase::new();
    db.set_last_insert_id(17);
    let table = Table::new(schema(), &db);

    let result = table
        .create(Row::new().with("foo", "Spew").with("category", 1))
        .await?;
    assert_eq!(result.affected_rows, 1);
    assert_eq!(result.insert_id_as::<i64>(), Some(17));
    assert_eq!(
        result.diagnostics.sql,
        "INSERT INTO grubby_test (foo, category) VALUES ('Spew', 1)"
    );
    Ok(())
}

#[tokio::test]
async fn create_without_single_row_has_no_insert_id() -> OrmResult<()> {
    let db = RecordingDatabase::new();
    db.set_last_insert_id(17).push_affected(0);
    let table = Table::new(schema(), &db);

    let result = table.create(Row::new().with("foo", "x")).await?;
    assert_eq!(result.insert_id, None);
    Ok(())
}

#[tokio::test]
async fn read_by_primary_key_fetches_one() -> OrmResult<()> {
    let db = RecordingDatabase::new();
    db.push_rows(vec![
        Row::new().with("id", 4).with("foo", "bar").with("category", 1),
    ]);
    let table = Table::new(schema(), &db);

    let row = table.read(4).await?.into_row().expect("row 4");
    let widget: Widget = row.decode()?;
    assert_eq!(
        widget,
        Widget {
            id: 4,
            foo: Some("bar".into()),
            category: 1
        }
    );

    assert!(table.read(5).await?.into_row().is_none());
    assert_eq!(
        db.statements(),
        [
            "SELECT * FROM grubby_test WHERE id = 4",
            "SELECT * FROM grubby_test WHERE id = 5",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn read_with_fields_returns_recordset() -> OrmResult<()> {
    let db = RecordingDatabase::new();
    db.push_rows(vec![
        Row::new().with("id", 1).with("foo", "a").with("category", 2),
        Row::new().with("id", 2).with("foo", Value::Null).with("category", 2),
    ]);
    let table = Table::new(schema(), &db);

    let fetched = table
        .filter([("category", 2)])
        .sort("id")
        .read_all()
        .await?;
    assert!(!fetched.is_one());
    let set = fetched.into_recordset().expect("recordset");
    assert_eq!(set.len(), 2);
    assert_eq!(set.fetch_column("foo"), vec![Value::from("a"), Value::Null]);
    Ok(())
}

#[tokio::test]
async fn decode_rows_into_structs() -> OrmResult<()> {
    let db = RecordingDatabase::new();
    db.push_rows(vec![
        Row::new().with("id", 1).with("foo", "a").with("category", 2),
        Row::new().with("id", 2).with("foo", Value::Null).with("category", 2),
    ]);
    let table = Table::new(schema(), &db);

    let widgets: Vec<Widget> = table
        .read_all()
        .await?
        .into_recordset()
        .expect("recordset")
        .decode()?;
    assert_eq!(widgets.len(), 2);
    assert_eq!(widgets[1].foo, None);
    Ok(())
}

#[tokio::test]
async fn update_and_delete_are_row_bound() -> OrmResult<()> {
    let db = RecordingDatabase::new();
    let table = Table::new(schema(), &db);

    let updated = table
        .update(Row::new().with("id", 4).with("foo", "bar"))
        .await?;
    assert_eq!(updated.affected_rows, 1);
    table.delete(4).await?;

    let err = table.update(Row::new().with("foo", "bar")).await.unwrap_err();
    assert!(err.is_unsafe_bulk());
    let err = table.delete(true).await.unwrap_err();
    assert!(err.is_unsafe_bulk());
    let err = table.delete([("category", 2)]).await.unwrap_err();
    assert!(err.is_unsafe_bulk());

    assert_eq!(
        db.statements(),
        [
            "UPDATE grubby_test SET foo = 'bar' WHERE id = 4",
            "DELETE FROM grubby_test WHERE id = 4",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn all_unlocks_bulk_mutation() -> OrmResult<()> {
    let db = RecordingDatabase::new();
    db.push_affected(3).push_affected(5);
    let table = Table::new(schema(), &db);

    let deleted = table.all().delete([("category", 2)]).await?;
    assert_eq!(deleted.affected_rows, 3);
    let updated = table
        .filter([("category", 1)])
        .all()
        .update(Row::new().with("foo", "moved"))
        .await?;
    assert_eq!(updated.affected_rows, 5);

    assert_eq!(
        db.statements(),
        [
            "DELETE FROM grubby_test WHERE category = 2",
            "UPDATE grubby_test SET foo = 'moved' WHERE category = 1",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn count_reads_the_tally() -> OrmResult<()> {
    let db = RecordingDatabase::new();
    db.push_rows(vec![Row::new().with("tally", 12)]);
    let table = Table::new(schema(), &db);

    assert_eq!(table.filter([("category", 2)]).count(true).await?, 12);
    assert_eq!(
        db.last_statement().as_deref(),
        Some("SELECT COUNT(*) AS tally FROM grubby_test WHERE category = 2")
    );

    assert_eq!(table.count(FilterSpec::MatchNone).await?, 0);
    Ok(())
}

#[tokio::test]
async fn database_errors_propagate() {
    let db = RecordingDatabase::new();
    db.push_error("duplicate key value violates unique constraint");
    let table = Table::new(schema(), &db);

    let err = table.create(Row::new().with("foo", "x")).await.unwrap_err();
    assert!(err.is_database());
    assert!(err.to_string().contains("duplicate key"));
}

#[tokio::test]
async fn compile_errors_never_reach_the_database() {
    let db = RecordingDatabase::new();
    let table = Table::new(schema(), &db);

    let err = table
        .filter_expression("foo = ? AND category = ?", ["only one"])
        .read_all()
        .await
        .unwrap_err();
    assert!(err.is_wildcard());
    assert!(db.statements().is_empty());
}

#[tokio::test]
async fn ddl_is_dispatched() -> OrmResult<()> {
    let db = RecordingDatabase::with_dialect(Dialect::MySql);
    let table = Table::new(schema(), &db);

    table.drop_table().await?;
    table.create_table().await?;
    let statements = db.statements();
    assert_eq!(statements[0], "DROP TABLE IF EXISTS grubby_test");
    assert!(
        statements[1].starts_with("CREATE TABLE grubby_test (\n    id INT NOT NULL AUTO_INCREMENT,")
    );
    Ok(())
}

#[test]
fn wildcard_substitution() {
    let db = RecordingDatabase::new();
    assert_eq!(
        db.replace_wildcards("foo=?", &["bar".into()], &[]).unwrap(),
        "foo='bar'"
    );
    assert_eq!(db.replace_wildcards("foo='?'", &[], &[]).unwrap(), "foo='?'");
    assert!(
        db.replace_wildcards("foo=? OR bar=?", &[1.into()], &[])
            .unwrap_err()
            .is_wildcard()
    );
}

#[test]
fn schema_from_toml_drives_compilation() {
    let catalog = Catalog::from_toml_str(
        r#"
        [[tables]]
        name = "grubby_test"
        primary_key = "id"

        [[tables.fields]]
        name = "id"
        type = "INT"
        auto_increment = true

        [[tables.fields]]
        name = "stamp"
        type = "DATETIME"
        auto = "update_timestamp"
        "#,
    )
    .unwrap();
    let table = Table::from_catalog(&catalog, "grubby_test", RecordingDatabase::new()).unwrap();
    assert_eq!(
        table
            .query()
            .to_sql(Operation::Update(Row::new().with("id", 9)))
            .unwrap(),
        "UPDATE grubby_test SET stamp = NOW() WHERE id = 9"
    );
}

#[tokio::test]
async fn create_without_generated_key_skips_insert_id() -> OrmResult<()> {
    let db = RecordingDatabase::new();
    db.set_last_insert_id(17);
    let codes = Table::new(
        TableSchema::new("codes")
            .with_primary_key("code")
            .with_field(FieldDef::new("code", "VARCHAR"))
            .with_field(FieldDef::new("n", "INT")),
        &db,
    );

    let result = codes.create(Row::new().with("code", "a").with("n", 1)).await?;
    assert_eq!(result.affected_rows, 1);
    assert_eq!(result.insert_id, None);

    let widgets = Table::new(schema(), &db);
    let result = widgets
        .create(Row::new().with("id", 40).with("foo", "explicit"))
        .await?;
    assert_eq!(result.insert_id, None);

    let result = widgets.create(Row::new().with("foo", "generated")).await?;
    assert_eq!(result.insert_id_as::<i64>(), Some(17));
    Ok(())
}

#[test]
fn timestamps_decode_into_chrono_fields() {
    #[derive(Debug, Deserialize)]
    struct Stamped {
        id: i64,
        created: chrono::NaiveDateTime,
        modified: Option<chrono::NaiveDateTime>,
    }

    let created = chrono::NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_micro_opt(13, 5, 9, 250)
        .unwrap();
    let row = Row::new()
        .with("id", 1)
        .with("created", created)
        .with("modified", Value::Null);

    let stamped: Stamped = row.decode().unwrap();
    assert_eq!(stamped.id, 1);
    assert_eq!(stamped.created, created);
    assert_eq!(stamped.modified, None);
}
