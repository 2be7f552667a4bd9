use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flate2::{write::GzEncoder, Compression};
use locio::handle::compressed::GzipLocation;
use locio::location::BytesLocation;
use locio::{DataHandle, HandleFactory, HandleRegistry, IoConfig, Location};
use std::io::Write;
use std::sync::Arc;

fn create_log_content(size_kb: usize) -> Vec<u8> {
    let target_size = size_kb * 1024;
    let mut content = Vec::with_capacity(target_size);
    let mut line_num = 0;

    while content.len() < target_size {
        let log_line = format!(
            "[2024-09-02T10:{}:{}] INFO: Request {} user_{}\n",
            (line_num / 3600) % 24,
            (line_num / 60) % 60,
            line_num,
            line_num % 1000
        );
        content.extend_from_slice(log_line.as_bytes());
        line_num += 1;
    }
    content
}

fn gzip_location(size_kb: usize) -> Arc<dyn Location> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&create_log_content(size_kb)).unwrap();
    let inner: Arc<dyn Location> = Arc::new(BytesLocation::new(
        format!("{}KB.gz", size_kb),
        encoder.finish().unwrap(),
    ));
    Arc::new(GzipLocation::new(inner))
}

fn bench_gzip_seek(c: &mut Criterion) {
    let registry = Arc::new(HandleRegistry::with_defaults(IoConfig::default()).unwrap());
    let mut group = c.benchmark_group("gzip_seek");
    group.sample_size(10);

    for &size_kb in &[64, 512, 4096] {
        let location = gzip_location(size_kb);
        let end = (size_kb * 1024 - 64) as u64;

        group.bench_with_input(
            BenchmarkId::new("forward_to_end", size_kb),
            &location,
            |b, location| {
                b.iter(|| {
                    let mut handle = Arc::clone(&registry).create(Arc::clone(location)).unwrap();
                    let mut buf = [0u8; 64];
                    handle.read_at(end, &mut buf).unwrap();
                    black_box(buf);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("end_then_start", size_kb),
            &location,
            |b, location| {
                b.iter(|| {
                    let mut handle = Arc::clone(&registry).create(Arc::clone(location)).unwrap();
                    let mut buf = [0u8; 64];
                    handle.read_at(end, &mut buf).unwrap();
                    handle.read_at(0, &mut buf).unwrap();
                    black_box(buf);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("buffered_end_then_start", size_kb),
            &location,
            |b, location| {
                b.iter(|| {
                    let mut handle = Arc::clone(&registry)
                        .create_buffered(Arc::clone(location))
                        .unwrap();
                    let mut buf = [0u8; 64];
                    handle.read_at(end, &mut buf).unwrap();
                    handle.read_at(0, &mut buf).unwrap();
                    black_box(buf);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_gzip_seek);
criterion_main!(benches);
