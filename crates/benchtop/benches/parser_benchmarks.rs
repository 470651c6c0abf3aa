//! Parser performance benchmarks.
//!
//! Measures ingestion across table sizes and delimiters.

use benchtop::{FormatHint, Parser};
use benchtop::input::detect_delimiter;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// Synthetic delimited data with mixed column types.
fn generate_data(rows: usize, cols: usize, delimiter: char) -> String {
    let mut data = String::new();

    let header: Vec<String> = (0..cols).map(|i| format!("column_{}", i + 1)).collect();
    data.push_str(&header.join(&delimiter.to_string()));
    data.push('\n');

    for row in 0..rows {
        let fields: Vec<String> = (0..cols)
            .map(|col| match col % 5 {
                0 => format!("ID_{:06}", row),
                1 => format!("{:.2}", row as f64 * 1.5),
                2 => format!("2023-{:02}-{:02}", (row % 12) + 1, (row % 28) + 1),
                3 if row % 17 == 0 => String::new(),
                3 => format!("{}", (row * 7) % 100),
                _ => format!("Category_{}", row % 10),
            })
            .collect();
        data.push_str(&fields.join(&delimiter.to_string()));
        data.push('\n');
    }

    data
}

fn bench_parse_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_csv");
    let parser = Parser::new();

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_data(*rows, 10, ',');
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| {
                parser
                    .parse_bytes(black_box(data.as_bytes()), &FormatHint::delimited(b','))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_parse_autodetect(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_autodetect");
    let parser = Parser::new();

    for (name, delimiter) in [("comma", ','), ("semicolon", ';'), ("tab", '\t')] {
        let data = generate_data(1_000, 10, delimiter);
        group.bench_with_input(BenchmarkId::new("delimiter", name), &data, |b, data| {
            b.iter(|| {
                parser
                    .parse_bytes(black_box(data.as_bytes()), &FormatHint::default())
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_detect_delimiter(c: &mut Criterion) {
    let data = generate_data(1_000, 20, ';');
    c.bench_function("detect_delimiter", |b| {
        b.iter(|| detect_delimiter(black_box(data.as_bytes())).unwrap())
    });
}

criterion_group!(benches, bench_parse_csv, bench_parse_autodetect, bench_detect_delimiter);
criterion_main!(benches);
