use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgcrud::{FieldDef, Operation, RecordingDatabase, Row, Table, TableSchema};

/// A table with `n` VARCHAR columns plus an integer primary key.
fn wide_table(n: usize) -> Table<RecordingDatabase> {
    let mut schema = TableSchema::new("bench")
        .with_primary_key("id")
        .with_field(FieldDef::new("id", "INT").auto_increment());
    for i in 0..n {
        schema = schema.with_field(FieldDef::new(format!("col{i}"), "VARCHAR"));
    }
    Table::new(schema, RecordingDatabase::new())
}

fn row(n: usize) -> Row {
    (0..n)
        .map(|i| (format!("col{i}"), format!("value {i} with 'quotes'")))
        .collect()
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/read");

    for n in [1, 5, 10, 50] {
        let table = wide_table(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut query = table.sort("id DESC").slice(10, 20);
                for i in 0..n {
                    query = query.filter([(format!("col{i}"), i as i64)]);
                }
                black_box(query.read_sql(true))
            });
        });
    }

    group.finish();
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/create");

    for n in [1, 5, 10, 50] {
        let table = wide_table(n);
        let data = row(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| black_box(table.query().to_sql(Operation::Create(data.clone()))));
        });
    }

    group.finish();
}

fn bench_wildcards(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/wildcards");

    for n in [1, 10, 100] {
        let table = wide_table(1);
        let sql = vec!["col0 = ?"; n].join(" OR ");
        let values: Vec<String> = (0..n).map(|i| format!("v{i}")).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                black_box(
                    table
                        .filter_expression(sql.as_str(), values.iter().map(String::as_str))
                        .read_sql(true),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_read, bench_create, bench_wildcards);
criterion_main!(benches);
