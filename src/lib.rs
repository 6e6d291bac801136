//! Inner products of 32-dimensional bf16 vectors, computed three ways:
//! a scalar loop, AVX-512 BF16, and AMX tiles, plus the driver that times them.

pub mod amx;
pub mod avx512_kernel;
pub mod bench;
pub mod config;
pub mod data;
pub mod error;
pub mod scalar;
pub mod wide_kernel;

pub use bench::{run, BenchReport, PathTiming};
pub use config::BenchConfig;
pub use data::VectorSet;
pub use error::{BenchError, Result};

/// Elements per vector; every kernel is built for exactly this width.
pub const DIMENSION: usize = 32;

/// Rows per AMX tile, and so vectors per tile batch.
pub const TILE_ROWS: usize = 16;
