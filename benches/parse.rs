use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_mtcsv::{from_str, parse, parse_with_options, to_string, MetadataDeclaration, ParseOptions};

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    #[serde(rename = "Id")]
    id: u32,
    #[serde(rename = "Name")]
    name: String,
    price: f64,
    quantity: u32,
}

fn catalogue(size: usize) -> String {
    let mut input = String::from("Properties,Category,Id,Name\n");
    for i in 0..10 {
        input.push_str(&format!("Values,Category,#,\"Category {}\"\n", i));
    }
    input.push_str("Properties,Product,Id,Name,Category,Price\n");
    for i in 0..size {
        input.push_str(&format!(
            "Values,Product,#,\"Product {}\",#Category(\"Category {}\"),{}.99\n",
            i,
            i % 10,
            i
        ));
        input.push_str(&format!("Note,Product,\"note for {}\"\n", i));
    }
    input
}

fn benchmark_parse_small(c: &mut Criterion) {
    let input = catalogue(10);
    c.bench_function("parse_small_catalogue", |b| b.iter(|| parse(black_box(&input))));
}

fn benchmark_parse_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_catalogue");
    for size in [10, 100, 1000].iter() {
        let input = catalogue(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| parse(black_box(input)))
        });
    }
    group.finish();
}

fn benchmark_parse_with_metadata(c: &mut Criterion) {
    let input = catalogue(100);
    let options = ParseOptions::new()
        .with_metadata(MetadataDeclaration::mapping("Note", "Product", ["Text"]));
    c.bench_function("parse_with_metadata", |b| {
        b.iter(|| parse_with_options(black_box(&input), options.clone()))
    });
}

fn benchmark_bind(c: &mut Criterion) {
    let input = catalogue(100);
    c.bench_function("bind_products", |b| {
        b.iter(|| from_str::<Product>(black_box(&input), "Product"))
    });
}

fn benchmark_write(c: &mut Criterion) {
    let products: Vec<Product> = (0..100)
        .map(|i| Product {
            id: i,
            name: format!("Product {}", i),
            price: f64::from(i) + 0.99,
            quantity: i * 2,
        })
        .collect();
    c.bench_function("write_products", |b| {
        b.iter(|| to_string("Product", black_box(&products)))
    });
}

criterion_group!(
    benches,
    benchmark_parse_small,
    benchmark_parse_sizes,
    benchmark_parse_with_metadata,
    benchmark_bind,
    benchmark_write
);
criterion_main!(benches);
