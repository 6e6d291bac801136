use bf16_dot::amx;
use bf16_dot::avx512_kernel::{self, inner_product_avx512};
use bf16_dot::scalar::inner_product_scalar;
use bf16_dot::wide_kernel::inner_product_wide;
use bf16_dot::{VectorSet, DIMENSION, TILE_ROWS};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

// 32 multiplies + 32 adds per pair
const FLOPS_PER_PAIR: u64 = 2 * DIMENSION as u64;

/// Benchmark a single vector pair through each pairwise kernel
fn bench_pair_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("inner_product_pair");
    group.throughput(Throughput::Elements(FLOPS_PER_PAIR));

    let set = VectorSet::random_seeded(2, DIMENSION, 42);
    let (a, b) = (set.vector(0), set.vector(1));

    group.bench_function("scalar", |bencher| {
        bencher.iter(|| inner_product_scalar(black_box(a), black_box(b)))
    });
    group.bench_function("wide", |bencher| {
        bencher.iter(|| inner_product_wide(black_box(a), black_box(b)))
    });
    group.bench_function("dispatch", |bencher| {
        bencher.iter(|| inner_product_avx512(black_box(a), black_box(b)))
    });

    group.finish();
}

#[cfg(target_arch = "x86_64")]
fn bench_avx512_intrinsics(c: &mut Criterion) {
    if !avx512_kernel::is_supported() {
        eprintln!("Warning: AVX-512 BF16 not available, skipping intrinsic benchmarks");
        return;
    }

    let mut group = c.benchmark_group("inner_product_avx512_bf16");
    group.throughput(Throughput::Elements(FLOPS_PER_PAIR));

    let set = VectorSet::random_seeded(2, DIMENSION, 43);
    let (a, b) = (set.vector(0), set.vector(1));

    group.bench_function("vdpbf16ps", |bencher| {
        bencher.iter(|| unsafe { avx512_kernel::inner_product_avx512_bf16(black_box(a), black_box(b)) })
    });

    group.finish();
}

#[cfg(not(target_arch = "x86_64"))]
fn bench_avx512_intrinsics(_c: &mut Criterion) {
    eprintln!("Skipping AVX-512 intrinsic benchmarks on non-x86_64 platform");
}

/// One 16 × 16 tile block against the same pairs through the scalar loop
fn bench_tile_block(c: &mut Criterion) {
    let tiles = match amx::enable() {
        Ok(tiles) => tiles,
        Err(e) => {
            eprintln!("Warning: {e}, skipping tile benchmarks");
            return;
        }
    };

    let mut group = c.benchmark_group("inner_product_block_16x16");
    group.throughput(Throughput::Elements(FLOPS_PER_PAIR * (TILE_ROWS * TILE_ROWS) as u64));

    let queries = VectorSet::random_seeded(TILE_ROWS, DIMENSION, 44);
    let corpus = VectorSet::random_seeded(TILE_ROWS, DIMENSION, 45);
    let packed = amx::pack_corpus(&corpus);

    group.bench_function("amx", |bencher| {
        bencher.iter(|| tiles.inner_product_block(black_box(queries.data()), black_box(packed.block(0))))
    });

    group.bench_function("scalar", |bencher| {
        bencher.iter(|| {
            let mut out = [0.0f32; TILE_ROWS * TILE_ROWS];
            for m in 0..TILE_ROWS {
                for n in 0..TILE_ROWS {
                    out[m * TILE_ROWS + n] = inner_product_scalar(queries.vector(m), corpus.vector(n));
                }
            }
            black_box(out)
        })
    });

    group.finish();
}

/// Cost of re-laying out the corpus for the tile path
fn bench_pack_corpus(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_corpus");

    for count in [TILE_ROWS * 16, TILE_ROWS * 256, TILE_ROWS * 4096] {
        let corpus = VectorSet::random_seeded(count, DIMENSION, 46);
        group.throughput(Throughput::Bytes((count * DIMENSION * 2) as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bencher, _| {
            bencher.iter(|| amx::pack_corpus(black_box(&corpus)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pair_kernels,
    bench_avx512_intrinsics,
    bench_tile_block,
    bench_pack_corpus,
);
criterion_main!(benches);
