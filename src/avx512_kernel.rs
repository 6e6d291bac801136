// AVX-512 BF16 inner-product kernel
// One VDPBF16PS covers the whole 32-element vector pair.

use half::bf16;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::wide_kernel::inner_product_wide;
use crate::DIMENSION;

/// Which implementation serves the vectorized path on this CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    /// `vdpbf16ps` on 512-bit registers
    Avx512Bf16,
    /// `wide::f32x8` over widened inputs
    Portable,
}

impl VectorBackend {
    pub fn detect() -> Self {
        if is_supported() {
            VectorBackend::Avx512Bf16
        } else {
            VectorBackend::Portable
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VectorBackend::Avx512Bf16 => "avx512-bf16",
            VectorBackend::Portable => "portable-simd",
        }
    }
}

/// True when the CPU exposes AVX-512F and AVX-512 BF16.
pub fn is_supported() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bf16")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// AVX-512 BF16 inner product of two 32-element vectors
///
/// # Arguments
/// * `a` - 32 bf16 values (64 bytes, one ZMM register)
/// * `b` - 32 bf16 values
///
/// # Numerics
/// `vdpbf16ps` multiplies adjacent bf16 pairs and adds both products into one
/// f32 lane, so the 32 products land in 16 partial sums before the horizontal
/// reduction. The summation order differs from [`crate::scalar::inner_product_scalar`],
/// so the last bits may differ.
///
/// # Safety
/// The caller must ensure the CPU supports `avx512f` and `avx512bf16`.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f,avx512bf16")]
#[inline(never)]
pub unsafe fn inner_product_avx512_bf16(a: &[bf16], b: &[bf16]) -> f32 {
    assert!(a.len() >= DIMENSION && b.len() >= DIMENSION);

    let va: __m512bh = std::mem::transmute(_mm512_loadu_ps(a.as_ptr() as *const f32));
    let vb: __m512bh = std::mem::transmute(_mm512_loadu_ps(b.as_ptr() as *const f32));

    let sum = _mm512_dpbf16_ps(_mm512_setzero_ps(), va, vb);
    _mm512_reduce_add_ps(sum)
}

/// Generic wrapper that uses AVX-512 BF16 if available, falls back to `wide`
#[inline]
pub fn inner_product_avx512(a: &[bf16], b: &[bf16]) -> f32 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_supported() {
            unsafe {
                return inner_product_avx512_bf16(a, b);
            }
        }
    }

    inner_product_wide(a, b)
}
