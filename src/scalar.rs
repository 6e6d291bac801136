use half::bf16;

use crate::DIMENSION;

/// Reference inner product of two 32-element bf16 vectors.
///
/// Each product of two bf16 values is exact in f32; the running sum is kept
/// in f32 and accumulated one element at a time, in index order.
#[inline(never)]
pub fn inner_product_scalar(a: &[bf16], b: &[bf16]) -> f32 {
    debug_assert_eq!(a.len(), DIMENSION, "a must hold {DIMENSION} elements");
    debug_assert_eq!(b.len(), DIMENSION, "b must hold {DIMENSION} elements");

    let mut sum = 0.0f32;
    for i in 0..DIMENSION {
        sum += a[i].to_f32() * b[i].to_f32();
    }
    sum
}
