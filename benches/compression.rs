use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recompression_rs::{Recompression, Rlslp};

/// Generate repetitive text data
fn generate_repetitive_text(size: usize) -> Vec<u8> {
    let pattern = "the quick brown fox jumps over the lazy dog ";
    pattern.repeat(size / pattern.len()).into_bytes()
}

/// Generate source code-like data
fn generate_source_code(size: usize) -> Vec<u8> {
    let patterns = [
        "fn main() {\n",
        "    let x = 42;\n",
        "    println!(\"Hello, world!\");\n",
        "    if x > 0 {\n",
        "        return x;\n",
        "    }\n",
        "}\n",
    ];

    let mut result = String::new();
    let mut i = 0;
    while result.len() < size {
        result.push_str(patterns[i % patterns.len()]);
        i += 1;
    }
    result.truncate(size);
    result.into_bytes()
}

/// Generate low-repetition data (simulating base64)
fn generate_low_repetition(size: usize) -> Vec<u8> {
    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut seed = 12345u64;

    (0..size)
        .map(|_| {
            // Simple LCG random
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            chars[(seed % chars.len() as u64) as usize]
        })
        .collect()
}

/// Benchmarks every driver variant on one family of inputs.
fn bench_variants(c: &mut Criterion, name: &str, generate: fn(usize) -> Vec<u8>) {
    let sizes = [10_000, 100_000, 1_000_000];
    let cores = num_cpus::get().max(2);
    let mut group = c.benchmark_group(name);
    group.sample_size(10);

    for size in sizes.iter() {
        let data = generate(*size);

        group.bench_with_input(BenchmarkId::new("hash", size), &data, |b, data| {
            b.iter(|| {
                let mut recompression = Recompression::new();
                black_box(recompression.compress_bytes(black_box(data)).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("fast", size), &data, |b, data| {
            b.iter(|| {
                let mut recompression = Recompression::fast();
                black_box(recompression.compress_bytes(black_box(data)).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &data, |b, data| {
            let mut recompression = Recompression::parallel(cores).unwrap();
            b.iter(|| black_box(recompression.compress_bytes(black_box(data)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("ls3", size), &data, |b, data| {
            let mut recompression = Recompression::local_search(cores, 3).unwrap();
            b.iter(|| black_box(recompression.compress_bytes(black_box(data)).unwrap()));
        });
    }

    group.finish();
}

fn bench_repetitive(c: &mut Criterion) {
    bench_variants(c, "repetitive_text", generate_repetitive_text);
}

fn bench_source_code(c: &mut Criterion) {
    bench_variants(c, "source_code", generate_source_code);
}

fn bench_low_repetition(c: &mut Criterion) {
    bench_variants(c, "low_repetition", generate_low_repetition);
}

fn bench_extract(c: &mut Criterion) {
    let data = generate_source_code(1_000_000);
    let grammar: Rlslp = Recompression::fast().compress_bytes(&data).unwrap();
    let mut group = c.benchmark_group("extract");

    for len in [1u64, 100, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("extract", len), len, |b, &len| {
            let mut i = 0u64;
            b.iter(|| {
                i = (i + 7919) % grammar.text_len();
                black_box(grammar.extract_symbols(black_box(i), len))
            });
        });
    }

    group.bench_function("derive", |b| b.iter(|| black_box(grammar.derive())));
    group.finish();
}

criterion_group!(
    benches,
    bench_repetitive,
    bench_source_code,
    bench_low_repetition,
    bench_extract
);
criterion_main!(benches);
