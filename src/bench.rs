//! Benchmark driver: enable tiles, generate data, time the three paths.

use std::hint::black_box;
use std::io::Write;
use std::time::Instant;

use half::bf16;
use tracing::{debug, info};

use crate::amx::{self, AmxTiles, RESULT_LEN};
use crate::avx512_kernel::VectorBackend;
use crate::config::BenchConfig;
use crate::data::VectorSet;
use crate::error::Result;
use crate::scalar::inner_product_scalar;
use crate::wide_kernel::inner_product_wide;
use crate::TILE_ROWS;

// Shortest interval treated as non-zero when forming ratios.
const MIN_ELAPSED_SECS: f64 = 1e-9;

/// Elapsed time of one path and the sum of every dot product it produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathTiming {
    pub elapsed_secs: f64,
    pub checksum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchReport {
    pub scalar: PathTiming,
    pub vectorized: PathTiming,
    pub tile: PathTiming,
    pub backend: VectorBackend,
}

impl BenchReport {
    /// How many times faster the vectorized path ran than the scalar one.
    pub fn vectorized_speedup(&self) -> f64 {
        speedup(self.scalar.elapsed_secs, self.vectorized.elapsed_secs)
    }

    pub fn tile_speedup_over_scalar(&self) -> f64 {
        speedup(self.scalar.elapsed_secs, self.tile.elapsed_secs)
    }

    pub fn tile_speedup_over_vectorized(&self) -> f64 {
        speedup(self.vectorized.elapsed_secs, self.tile.elapsed_secs)
    }
}

#[inline]
fn speedup(baseline: f64, candidate: f64) -> f64 {
    baseline.max(MIN_ELAPSED_SECS) / candidate.max(MIN_ELAPSED_SECS)
}

/// Runs the whole benchmark once and writes the report to `out`.
///
/// `enable_tiles` is called before anything is generated or printed; if it
/// fails, the error is returned and `out` is left untouched.
pub fn run<W, F>(config: &BenchConfig, enable_tiles: F, out: &mut W) -> Result<BenchReport>
where
    W: Write,
    F: FnOnce() -> Result<AmxTiles>,
{
    config.validate()?;
    let tiles = enable_tiles()?;
    info!("AMX tiles enabled");

    writeln!(
        out,
        "Running test with dimension: {}, data size: {}, test size: {}",
        config.dimension, config.corpus_count, config.query_count
    )?;

    let queries = VectorSet::random(config.query_count, config.dimension);
    let corpus = VectorSet::random(config.corpus_count, config.dimension);
    writeln!(out, "Data generated.")?;
    info!(
        queries = queries.len(),
        corpus = corpus.len(),
        pairs = config.pair_count(),
        "data generated"
    );

    writeln!(out, "Start test.\n")?;

    let scalar = run_scalar(&queries, &corpus);
    writeln!(
        out,
        "Inner product calculations completed in {} seconds.\n",
        scalar.elapsed_secs
    )?;

    let backend = VectorBackend::detect();
    info!(backend = backend.name(), "vectorized backend selected");
    let vectorized = run_vectorized(backend, &queries, &corpus);
    let label = match backend {
        VectorBackend::Avx512Bf16 => "AVX-512",
        VectorBackend::Portable => "Portable SIMD",
    };
    writeln!(
        out,
        "{label} calculations completed in {} seconds.\n",
        vectorized.elapsed_secs
    )?;

    let tile = run_tiles(&tiles, &queries, &corpus);
    writeln!(out, "AMX calculations completed in {} seconds.\n", tile.elapsed_secs)?;

    let report = BenchReport {
        scalar,
        vectorized,
        tile,
        backend,
    };

    writeln!(
        out,
        "\nUsing {label} is {} times faster than standard.",
        report.vectorized_speedup()
    )?;
    writeln!(
        out,
        "Using AMX is {} times faster than standard and {} times faster than {label}.",
        report.tile_speedup_over_scalar(),
        report.tile_speedup_over_vectorized()
    )?;
    out.flush()?;

    debug!(
        scalar = report.scalar.checksum,
        vectorized = report.vectorized.checksum,
        tile = report.tile.checksum,
        "checksums"
    );
    Ok(report)
}

/// Times `kernel` over every query × corpus pair.
#[inline(always)]
fn time_pairs<K>(queries: &VectorSet, corpus: &VectorSet, kernel: K) -> PathTiming
where
    K: Fn(&[bf16], &[bf16]) -> f32,
{
    let start = Instant::now();

    let mut checksum = 0.0f64;
    for i in 0..queries.len() {
        let q = queries.vector(i);
        for j in 0..corpus.len() {
            checksum += kernel(q, corpus.vector(j)) as f64;
        }
    }
    let checksum = black_box(checksum);

    PathTiming {
        elapsed_secs: start.elapsed().as_secs_f64(),
        checksum,
    }
}

pub fn run_scalar(queries: &VectorSet, corpus: &VectorSet) -> PathTiming {
    time_pairs(queries, corpus, inner_product_scalar)
}

pub fn run_vectorized(backend: VectorBackend, queries: &VectorSet, corpus: &VectorSet) -> PathTiming {
    match backend {
        #[cfg(target_arch = "x86_64")]
        VectorBackend::Avx512Bf16 => {
            use crate::avx512_kernel::inner_product_avx512_bf16;
            // Only selected after `avx512_kernel::is_supported()` returned true.
            time_pairs(queries, corpus, |a, b| unsafe { inner_product_avx512_bf16(a, b) })
        }
        #[cfg(not(target_arch = "x86_64"))]
        VectorBackend::Avx512Bf16 => unreachable!("AVX-512 is never detected off x86_64"),
        VectorBackend::Portable => time_pairs(queries, corpus, inner_product_wide),
    }
}

/// Times the tile path over the same cross-product, 16 × 16 pairs per call.
///
/// The corpus is packed into tile operand layout before the clock starts.
pub fn run_tiles(tiles: &AmxTiles, queries: &VectorSet, corpus: &VectorSet) -> PathTiming {
    let packed = amx::pack_corpus(corpus);
    debug!(blocks = packed.blocks(), "corpus packed for tiles");

    let start = Instant::now();

    let mut sums = [0.0f32; RESULT_LEN];
    for i in (0..queries.len()).step_by(TILE_ROWS) {
        let query_block = queries.block(i, TILE_ROWS);
        for j in 0..packed.blocks() {
            let results = tiles.inner_product_block(query_block, packed.block(j));
            for (acc, value) in sums.iter_mut().zip(results.iter()) {
                *acc += *value;
            }
        }
    }
    let sums = black_box(sums);
    let elapsed_secs = start.elapsed().as_secs_f64();

    PathTiming {
        elapsed_secs,
        checksum: sums.iter().map(|&v| v as f64).sum(),
    }
}
