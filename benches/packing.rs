use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dnapack::codec::{encode_sequence, pack, unpack, PackWriter, PackedArray};
use rand::Rng;

/// Generate random codes in 0..4
fn generate_codes(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(0..4u8)).collect()
}

/// Generate random 150bp reads
fn generate_reads(num_reads: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    let bases = b"ACGT";
    (0..num_reads)
        .map(|_| (0..150).map(|_| bases[rng.gen_range(0..4)]).collect())
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");

    for len in [1_000, 100_000, 1_000_000] {
        let codes = generate_codes(len);
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("slice", len), &codes, |b, codes| {
            b.iter(|| black_box(pack(codes)));
        });

        group.bench_with_input(BenchmarkId::new("writer_push", len), &codes, |b, codes| {
            b.iter(|| {
                let mut writer = PackWriter::new(Vec::with_capacity(codes.len() / 4 + 1));
                for &code in codes {
                    writer.push(code).unwrap();
                }
                black_box(writer.finish().unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("writer_push_all", len), &codes, |b, codes| {
            b.iter(|| {
                let mut writer = PackWriter::new(Vec::with_capacity(codes.len() / 4 + 1));
                writer.push_all(codes).unwrap();
                black_box(writer.finish().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("unpack");

    for len in [1_000, 100_000, 1_000_000] {
        let packed = pack(&generate_codes(len));
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("full", len), &packed, |b, packed| {
            b.iter(|| black_box(unpack(packed, len).unwrap()));
        });
    }

    group.finish();
}

/// Random 10k-base slices, the access pattern of downstream samplers
fn bench_random_slices(c: &mut Criterion) {
    let len = 4_000_000;
    let array = PackedArray::from_bytes(pack(&generate_codes(len)), len).unwrap();
    let mut rng = rand::thread_rng();
    let starts: Vec<usize> = (0..1_000).map(|_| rng.gen_range(0..len - 10_000)).collect();

    c.bench_function("packed_array_slice_10k", |b| {
        b.iter(|| {
            for &start in &starts {
                black_box(array.slice(start..start + 10_000).unwrap());
            }
        });
    });
}

fn bench_encode(c: &mut Criterion) {
    let reads = generate_reads(10_000);
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes((reads.len() * 150) as u64));

    group.bench_function("encode_sequence_150bp", |b| {
        b.iter(|| {
            for read in &reads {
                black_box(encode_sequence(read).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pack, bench_unpack, bench_random_slices, bench_encode);
criterion_main!(benches);
