//! Filter benchmarks: casting cells and evaluating criteria over rows.
//!
//! Measures: scalar and array casting, single-column predicates, composed criteria,
//! and two-column comparisons.

use rowcast::prelude::*;

fn main() {
    divan::main();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════════════════

fn rows(count: usize) -> Vec<Map> {
    (0..count)
        .map(|i| {
            Map::new()
                .with("id", i as i64)
                .with("name", format!("user{i}"))
                .with("age", (i % 90).to_string())
                .with("budget", (i % 500) as i64)
                .with("spent", (i * 7 % 600) as i64)
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Casting
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn cast_int(bencher: divan::Bencher) {
    let registry = CasterRegistry::with_builtin_casters();
    let decl = TypeDeclaration::property("User", "age").with_types("?int");
    let caster = CallbackCaster::new(&registry, &decl, None).unwrap();

    bencher.bench_local(|| caster.to_variable(Some(divan::black_box("42"))));
}

#[divan::bench(args = [ArrayShape::List, ArrayShape::Csv, ArrayShape::Json])]
fn cast_array(bencher: divan::Bencher, shape: ArrayShape) {
    let decl = TypeDeclaration::property("Post", "tags").with_types("array");
    let caster = ArrayCaster::new(&decl, ArrayOptions::shape(shape)).unwrap();
    let raw = match shape {
        ArrayShape::Json => r#"["a","b","c","d"]"#,
        _ => "a,b,c,d",
    };

    bencher.bench_local(|| caster.to_variable(Some(divan::black_box(raw))));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Predicates
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [100, 1000])]
fn column_numeric(bencher: divan::Bencher, count: usize) {
    let rows = rows(count);
    let adults = Column::filter_on("age", ">=", 18).unwrap();

    bencher.bench_local(|| adults.filter(&rows).count());
}

#[divan::bench(args = [100, 1000])]
fn column_regexp(bencher: divan::Bencher, count: usize) {
    let rows = rows(count);
    let pattern = Column::filter_on("name", "REGEXP", r"^user\d*7$").unwrap();

    bencher.bench_local(|| pattern.filter(&rows).count());
}

#[divan::bench(args = [100, 1000])]
fn criteria_composed(bencher: divan::Bencher, count: usize) {
    let rows = rows(count);
    let criteria = Criteria::all(vec![
        Column::filter_on("age", "BETWEEN", vec![18, 65]).unwrap().into(),
        Criteria::not(Column::filter_on("name", "ENDS_WITH", "0").unwrap().into()),
        Criteria::any(vec![
            Column::filter_on("id", "IN", vec![1, 2, 3]).unwrap().into(),
            TwoColumns::filter_on("spent", ">", "budget").unwrap().into(),
        ]),
    ]);

    bencher.bench_local(|| criteria.filter(&rows).count());
}

#[divan::bench(args = [100, 1000])]
fn two_columns_many(bencher: divan::Bencher, count: usize) {
    let rows = rows(count);
    let over = TwoColumns::filter_on("spent", ">", vec!["budget", "age"]).unwrap();

    bencher.bench_local(|| over.filter(&rows).count());
}
