use criterion::{BenchmarkId, Criterion, Throughput};
use zipstream::{ChunkReader, EntryOptions, ZipStreamWriter, ZipStreamWriterBuilder};

fn crc32(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32");
    for size in &[1, 4, 16, 64, 256, 1024, 4096, 16384, 65536] {
        let data = vec![0; *size];
        let input = data.as_slice();
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _size| {
            b.iter(|| zipstream::crc32(input));
        });
    }
    group.finish();
}

fn entries(c: &mut Criterion) {
    let names: Vec<String> = (0..20_000).map(|i| format!("file{:06}.txt", i)).collect();
    let mut group = c.benchmark_group("entries");
    group.throughput(Throughput::Elements(names.len() as u64));
    group.bench_function("one-byte", |b| {
        b.iter(|| {
            let mut archive = ZipStreamWriter::new(std::io::sink());
            for name in &names {
                archive.add(name, &b"x"[..], EntryOptions::default()).unwrap();
            }
            archive.finish().unwrap();
        });
    });
    group.finish();
}

fn chunk_size(c: &mut Criterion) {
    let data = vec![0x5a; 16 * 1024 * 1024];
    let mut group = c.benchmark_group("chunk-size");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for size in &[512, 4096, 8192, 65536, 1 << 20] {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, size| {
            b.iter(|| {
                let mut archive = ZipStreamWriterBuilder::new().build(std::io::sink());
                let chunks = ChunkReader::with_chunk_size(data.as_slice(), *size);
                archive
                    .add("large.bin", chunks, EntryOptions::default())
                    .unwrap();
                archive.finish().unwrap();
            });
        });
    }
    group.finish();
}

criterion::criterion_group!(benches, crc32, entries, chunk_size);
criterion::criterion_main!(benches);
