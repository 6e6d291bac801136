use thiserror::Error;

/// Errors raised while preparing or running the benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The kernel refused `ARCH_REQ_XCOMP_PERM` for tile data.
    #[error("Failed to enable AMX: arch_prctl(ARCH_REQ_XCOMP_PERM) returned errno {errno}")]
    PermissionDenied {
        /// errno reported by the syscall
        errno: i32,
    },

    /// The CPU or target has no AMX-TILE / AMX-BF16 support.
    #[error("AMX tiles are not supported on this CPU or target")]
    TileUnsupported,

    /// Sizes incompatible with the fixed kernel geometry.
    #[error("Invalid benchmark configuration: {0}")]
    InvalidConfig(String),

    /// Writing the report failed.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;
