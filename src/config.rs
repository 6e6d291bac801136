use crate::error::{BenchError, Result};
use crate::{DIMENSION, TILE_ROWS};

/// Number of query vectors used by the default run.
pub const QUERY_COUNT: usize = 16 * 100;
/// Number of corpus vectors used by the default run.
pub const CORPUS_COUNT: usize = 16 * 10000;

/// Sizes of one benchmark run.
///
/// `query_count` and `corpus_count` must both be multiples of the tile
/// batch (16), and `dimension` must match the fixed kernel width (32).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    pub query_count: usize,
    pub corpus_count: usize,
    pub dimension: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            query_count: QUERY_COUNT,
            corpus_count: CORPUS_COUNT,
            dimension: DIMENSION,
        }
    }
}

impl BenchConfig {
    pub fn new(query_count: usize, corpus_count: usize) -> Self {
        Self {
            query_count,
            corpus_count,
            dimension: DIMENSION,
        }
    }

    /// Checks the sizes against the kernel geometry.
    pub fn validate(&self) -> Result<()> {
        if self.dimension != DIMENSION {
            return Err(BenchError::InvalidConfig(format!(
                "dimension must be {DIMENSION}, got {}",
                self.dimension
            )));
        }
        for (name, count) in [("query", self.query_count), ("corpus", self.corpus_count)] {
            if count == 0 {
                return Err(BenchError::InvalidConfig(format!("{name} count must be non-zero")));
            }
            if count % TILE_ROWS != 0 {
                return Err(BenchError::InvalidConfig(format!(
                    "{name} count {count} is not a multiple of {TILE_ROWS}"
                )));
            }
        }
        Ok(())
    }

    /// Number of query × corpus pairs covered by each path.
    #[inline]
    pub fn pair_count(&self) -> usize {
        self.query_count * self.corpus_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_sizes() {
        let config = BenchConfig::default();
        assert_eq!(config.query_count, 1600);
        assert_eq!(config.corpus_count, 160_000);
        assert_eq!(config.dimension, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unaligned_counts() {
        let err = BenchConfig::new(17, 32).validate().unwrap_err();
        assert!(err.to_string().contains("query count 17"));

        let err = BenchConfig::new(16, 40).validate().unwrap_err();
        assert!(err.to_string().contains("corpus count 40"));
    }

    #[test]
    fn test_rejects_zero_and_wrong_dimension() {
        assert!(BenchConfig::new(0, 16).validate().is_err());

        let config = BenchConfig {
            dimension: 64,
            ..BenchConfig::new(16, 16)
        };
        assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(BenchConfig::new(32, 48).pair_count(), 32 * 48);
    }
}
