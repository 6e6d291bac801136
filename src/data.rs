use half::bf16;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A contiguous, row-major set of fixed-dimension bf16 vectors.
#[derive(Debug, Clone)]
pub struct VectorSet {
    data: Vec<bf16>,
    count: usize,
    dimension: usize,
}

impl VectorSet {
    /// Zero-filled set of `count` vectors.
    pub fn new(count: usize, dimension: usize) -> Self {
        VectorSet {
            data: vec![bf16::ZERO; count * dimension],
            count,
            dimension,
        }
    }

    pub fn from_vec(data: Vec<bf16>, count: usize, dimension: usize) -> Self {
        assert_eq!(data.len(), count * dimension);
        VectorSet { data, count, dimension }
    }

    /// Random set seeded from OS entropy; not reproducible across runs.
    pub fn random(count: usize, dimension: usize) -> Self {
        let mut rng = StdRng::from_entropy();
        Self::random_with(&mut rng, count, dimension)
    }

    /// Random set from a fixed seed.
    pub fn random_seeded(count: usize, dimension: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random_with(&mut rng, count, dimension)
    }

    fn random_with<R: Rng>(rng: &mut R, count: usize, dimension: usize) -> Self {
        let mut set = Self::new(count, dimension);
        generate_random_data(rng, &mut set.data);
        set
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn data(&self) -> &[bf16] {
        &self.data
    }

    /// The `i`-th vector.
    #[inline]
    pub fn vector(&self, i: usize) -> &[bf16] {
        &self.data[i * self.dimension..(i + 1) * self.dimension]
    }

    /// `rows` consecutive vectors starting at `first`.
    #[inline]
    pub fn block(&self, first: usize, rows: usize) -> &[bf16] {
        &self.data[first * self.dimension..(first + rows) * self.dimension]
    }
}

/// Fills `out` with independent uniform values in `[0.0, 1.0)`.
///
/// Each value is drawn as an `f32` and truncated to bf16. Truncation rather
/// than round-to-nearest keeps draws just below 1.0 from rounding up to 1.0.
pub fn generate_random_data<R: Rng>(rng: &mut R, out: &mut [bf16]) {
    for value in out.iter_mut() {
        let draw: f32 = rng.gen();
        *value = truncate_to_bf16(draw);
    }
}

#[inline]
fn truncate_to_bf16(value: f32) -> bf16 {
    bf16::from_bits((value.to_bits() >> 16) as u16)
}
