use bank_etl::extract::Extractor;
use bank_etl::rates::RateTable;
use bank_etl::transform::transform;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn ranked_page(rows: usize) -> String {
    let mut body = String::from("<tr><th>Rank</th><th>Bank name</th><th>Market cap</th></tr>");
    for i in 0..rows {
        body.push_str(&format!(
            "<tr><td>{i}\n</td><td><span class=\"flagicon\"><a href=\"/wiki/Flag\"><img alt=\"\"></a></span>&#160;\
             <a href=\"/wiki/Bank_{i}\">Bank {i}</a>\n</td><td>{}.{:02}\n</td></tr>",
            500 - i % 500,
            i % 100
        ));
    }
    format!("<html><body><table class=\"wikitable\"><tbody>{body}</tbody></table></body></html>")
}

fn benchmark_extract(c: &mut Criterion) {
    let page = ranked_page(1000);
    let extractor = Extractor::new().unwrap();

    c.bench_function("extract_1000_rows", |b| {
        b.iter(|| extractor.extract(black_box(&page)).unwrap());
    });
}

fn benchmark_transform(c: &mut Criterion) {
    let records = Extractor::new().unwrap().extract(&ranked_page(1000)).unwrap();
    let mut rates = RateTable::new();
    rates.add_rate("GBP", 0.8).unwrap();
    rates.add_rate("EUR", 0.93).unwrap();
    rates.add_rate("INR", 82.95).unwrap();

    c.bench_function("transform_1000_records", |b| {
        b.iter(|| {
            transform(
                black_box(records.clone()),
                &rates,
                "USD",
                &["GBP", "EUR", "INR"],
            )
            .unwrap()
        });
    });
}

criterion_group!(benches, benchmark_extract, benchmark_transform);
criterion_main!(benches);
