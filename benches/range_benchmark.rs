use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cascade::response::{calculate_byte_range, Response};

fn calculate_range_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate_byte_range");
    for (name, header) in [
        ("absent", None),
        ("suffix", Some("bytes=-500")),
        ("bounded", Some("bytes=50-200")),
        ("open", Some("bytes=1024-")),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| calculate_byte_range(black_box(header), black_box(1_048_576)));
        });
    }
    group.finish();
}

fn send_file_benchmark(c: &mut Criterion) {
    let content = Bytes::from(vec![b'x'; 1_048_576]);
    c.bench_function("send_file_partial", |b| {
        b.iter(|| {
            let mut response = Response::new();
            response.send_file(content.clone(), "application/octet-stream", Some("bytes=1000-9999"));
            black_box(response.render().len())
        });
    });
}

criterion_group!(benches, calculate_range_benchmark, send_file_benchmark);
criterion_main!(benches);
