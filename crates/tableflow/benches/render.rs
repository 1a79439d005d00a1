use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use tableflow::{
    ChangeAction, ChangeRegister, Column, ConditionGroup, QueryBuilder, TableChangeListener,
    TableId, select, select_columns,
};

/// SELECT `col0`,`col1`,... FROM `t` [INNER JOIN `j0` ON ...] WHERE `col0`=0 AND ...
fn build_query(columns: usize, joins: usize) -> QueryBuilder {
    let names: Vec<String> = (0..columns).map(|i| format!("col{i}")).collect();
    let mut query = select_columns(names.iter().map(String::as_str))
        .from("t")
        .expect("valid table");
    for j in 0..joins {
        let table = format!("j{j}");
        query
            .inner_join(table.as_str())
            .expect("select base")
            .on(Column::qualified(&table, "id").eq(Column::qualified("t", "id")));
    }
    query.where_(ConditionGroup::all(
        names.iter().enumerate().map(|(i, n)| Column::new(n).eq(i as i64)),
    ));
    query
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/select");

    for n in [1, 5, 10, 50, 100] {
        let query = build_query(n, 0);
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, query| {
            b.iter(|| black_box(query.render()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/build_and_render");

    for joins in [0, 2, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(joins), &joins, |b, &joins| {
            b.iter(|| {
                let query = build_query(10, joins);
                black_box(query.render());
            });
        });
    }

    group.finish();
}

fn bench_associated_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/associated_tables");

    for depth in [1, 4, 16] {
        let mut query = select().from("base").expect("valid table");
        for d in 0..depth {
            query = select().from(query).expect("select subquery");
            query
                .cross_join(format!("level{d}"))
                .expect("select base");
        }
        group.bench_with_input(BenchmarkId::from_parameter(depth), &query, |b, query| {
            b.iter(|| black_box(query.associated_tables()));
        });
    }

    group.finish();
}

fn bench_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("register/notify");

    for listeners in [1, 10, 100] {
        let register = ChangeRegister::new();
        let table = TableId::new("hot").expect("valid table");
        let handles: Vec<_> = (0..listeners)
            .map(|_| {
                let listener: Arc<dyn TableChangeListener> =
                    Arc::new(|_: &TableId, _: ChangeAction| {});
                register.subscribe([table.clone()], listener)
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(listeners), &table, |b, table| {
            b.iter(|| black_box(register.notify(table, ChangeAction::Update)));
        });
        drop(handles);
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render,
    bench_build_and_render,
    bench_associated_tables,
    bench_notify
);
criterion_main!(benches);
