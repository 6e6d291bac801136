use half::bf16;
use wide::f32x8;

use crate::DIMENSION;

/// Portable SIMD inner product using the `wide` crate.
///
/// Used when the CPU has no AVX-512 BF16. bf16 inputs are widened to f32,
/// multiplied lane-wise and accumulated across `DIMENSION / 8` chunks, then
/// reduced horizontally.
#[inline(always)]
pub fn inner_product_wide(a: &[bf16], b: &[bf16]) -> f32 {
    type V = f32x8;
    // Derive lane count by size to avoid depending on specific API versions
    let lanes: usize = std::mem::size_of::<V>() / std::mem::size_of::<f32>();

    debug_assert_eq!(a.len(), DIMENSION);
    debug_assert_eq!(b.len(), DIMENSION);
    debug_assert_eq!(DIMENSION % lanes, 0);

    let mut acc = V::splat(0.0);
    for (a_chunk, b_chunk) in a[..DIMENSION].chunks_exact(8).zip(b[..DIMENSION].chunks_exact(8)) {
        let mut a_tmp = [0.0f32; 8];
        let mut b_tmp = [0.0f32; 8];
        for lane in 0..8 {
            a_tmp[lane] = a_chunk[lane].to_f32();
            b_tmp[lane] = b_chunk[lane].to_f32();
        }
        acc = V::from(a_tmp) * V::from(b_tmp) + acc;
    }

    let lanes_out: [f32; 8] = acc.into();
    lanes_out.iter().sum()
}
