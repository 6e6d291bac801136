//! AMX tile inner products.
//!
//! The tile path computes a full 16×16 block of query × corpus dot products
//! with one `tdpbf16ps`. Before any tile instruction can run, the process must
//! be granted the XTILEDATA extended state by the kernel, and the calling
//! thread must load a tile configuration. [`enable`] does both and hands back
//! an [`AmxTiles`] handle that is tied to the calling thread.
//!
//! Tile layout (palette 1, all tiles 16 rows × 64 bytes):
//! - `tmm0` accumulator: 16 × 16 f32
//! - `tmm1` query block: 16 vectors × 32 bf16
//! - `tmm2` packed corpus block: 16 pair-rows × 16 bf16 pairs (see [`pack_corpus`])

use std::cell::Cell;
use std::marker::PhantomData;

use half::bf16;
use tracing::debug;

use crate::data::VectorSet;
use crate::error::{BenchError, Result};
use crate::{DIMENSION, TILE_ROWS};

pub const ARCH_GET_XCOMP_PERM: libc::c_int = 0x1022;
pub const ARCH_REQ_XCOMP_PERM: libc::c_int = 0x1023;
pub const XFEATURE_XTILECFG: libc::c_ulong = 17;
pub const XFEATURE_XTILEDATA: libc::c_ulong = 18;

/// Bytes per tile row; also the load/store stride for every tile.
pub const TILE_STRIDE: usize = 64;
/// bf16 elements in one operand tile.
pub const BLOCK_LEN: usize = TILE_ROWS * DIMENSION;
/// f32 results produced by one tile call.
pub const RESULT_LEN: usize = TILE_ROWS * TILE_ROWS;

/// In-memory layout consumed by `ldtilecfg`.
#[repr(C, align(64))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileConfig {
    pub palette_id: u8,
    pub start_row: u8,
    pub reserved_0: [u8; 14],
    pub colsb: [u16; 16],
    pub rows: [u8; 16],
}

impl TileConfig {
    /// Three 16 × 64-byte tiles: accumulator, query block, corpus block.
    pub fn inner_product() -> Self {
        let mut config = TileConfig {
            palette_id: 1,
            start_row: 0,
            reserved_0: [0; 14],
            colsb: [0; 16],
            rows: [0; 16],
        };
        for tile in 0..3 {
            config.colsb[tile] = TILE_STRIDE as u16;
            config.rows[tile] = TILE_ROWS as u8;
        }
        config
    }
}

/// True when CPUID reports AMX-TILE and AMX-BF16.
pub fn is_supported() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        use std::arch::x86_64::{__cpuid_count, __get_cpuid_max};

        #[allow(unused_unsafe)]
        let (max_leaf, _) = unsafe { __get_cpuid_max(0) };
        if max_leaf < 7 {
            return false;
        }
        #[allow(unused_unsafe)]
        let leaf7 = unsafe { __cpuid_count(7, 0) };
        let amx_bf16 = leaf7.edx & (1 << 22) != 0;
        let amx_tile = leaf7.edx & (1 << 24) != 0;
        amx_bf16 && amx_tile
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Asks the kernel for permission to use XTILEDATA.
///
/// The grant is process-wide and repeated requests succeed.
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
pub fn request_permission() -> Result<()> {
    let rc = unsafe { libc::syscall(libc::SYS_arch_prctl, ARCH_REQ_XCOMP_PERM, XFEATURE_XTILEDATA) };
    if rc != 0 {
        let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(-1);
        return Err(BenchError::PermissionDenied { errno });
    }

    let mut permitted: u64 = 0;
    let rc = unsafe {
        libc::syscall(
            libc::SYS_arch_prctl,
            ARCH_GET_XCOMP_PERM,
            &mut permitted as *mut u64,
        )
    };
    if rc == 0 {
        debug!(
            permitted = %format!("{permitted:#x}"),
            xtilecfg = permitted & (1 << XFEATURE_XTILECFG) != 0,
            xtiledata = permitted & (1 << XFEATURE_XTILEDATA) != 0,
            "xcomp permissions"
        );
    }
    Ok(())
}

#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
pub fn request_permission() -> Result<()> {
    Err(BenchError::TileUnsupported)
}

thread_local! {
    // Live `AmxTiles` handles on this thread; tile state is released at zero.
    static LIVE_HANDLES: Cell<usize> = const { Cell::new(0) };
}

/// Tile state loaded on the current thread.
///
/// Not `Send`: the tile configuration belongs to the thread that loaded it.
#[derive(Debug)]
pub struct AmxTiles {
    _thread_bound: PhantomData<*const ()>,
}

/// Disabled → Enabled: request permission, then load [`TileConfig::inner_product`].
///
/// Fails with [`BenchError::TileUnsupported`] when the CPU has no AMX and with
/// [`BenchError::PermissionDenied`] when the kernel refuses the request. Safe
/// to call again; each call returns another handle on the same thread state.
pub fn enable() -> Result<AmxTiles> {
    if !is_supported() {
        return Err(BenchError::TileUnsupported);
    }
    request_permission()?;

    let config = TileConfig::inner_product();
    unsafe { load_config(&config) };
    LIVE_HANDLES.with(|live| live.set(live.get() + 1));
    debug!(palette = config.palette_id, tiles = 3, "tile configuration loaded");

    Ok(AmxTiles {
        _thread_bound: PhantomData,
    })
}

impl AmxTiles {
    /// Dot products of 16 query vectors against 16 corpus vectors.
    ///
    /// `query` holds 16 consecutive 32-element vectors, `corpus` is one block
    /// from [`PackedCorpus`]. Entry `m * 16 + n` of the result is
    /// `dot(query[m], corpus[n])`. The accumulator tile is zeroed first, so
    /// nothing carries over between calls.
    #[inline]
    pub fn inner_product_block(&self, query: &[bf16], corpus: &[bf16]) -> [f32; RESULT_LEN] {
        assert_eq!(query.len(), BLOCK_LEN, "query block must hold 16 vectors");
        assert_eq!(corpus.len(), BLOCK_LEN, "corpus block must hold 16 vectors");

        let mut results = [0.0f32; RESULT_LEN];
        unsafe { tile_dot_block(query.as_ptr(), corpus.as_ptr(), results.as_mut_ptr()) };
        results
    }
}

impl Drop for AmxTiles {
    fn drop(&mut self) {
        let remaining = LIVE_HANDLES.with(|live| {
            let n = live.get().saturating_sub(1);
            live.set(n);
            n
        });
        if remaining == 0 {
            unsafe { release_tiles() };
        }
    }
}

#[cfg(target_arch = "x86_64")]
unsafe fn load_config(config: &TileConfig) {
    std::arch::asm!(
        "ldtilecfg [{cfg}]",
        cfg = in(reg) config as *const TileConfig,
        options(nostack, readonly, preserves_flags),
    );
}

#[cfg(target_arch = "x86_64")]
unsafe fn release_tiles() {
    std::arch::asm!("tilerelease", options(nostack, nomem, preserves_flags));
}

/// tmm0 = 0; tmm1 = query; tmm2 = corpus; tmm0 += tmm1 · tmm2; store tmm0.
#[cfg(target_arch = "x86_64")]
unsafe fn tile_dot_block(query: *const bf16, corpus: *const bf16, results: *mut f32) {
    std::arch::asm!(
        "tilezero tmm0",
        "tileloadd tmm1, [{a} + {stride}*1]",
        "tileloadd tmm2, [{b} + {stride}*1]",
        "tdpbf16ps tmm0, tmm1, tmm2",
        "tilestored [{c} + {stride}*1], tmm0",
        a = in(reg) query,
        b = in(reg) corpus,
        c = in(reg) results,
        stride = in(reg) TILE_STRIDE,
        options(nostack, preserves_flags),
    );
}

// `enable` never succeeds off x86_64, so these are unreachable there.
#[cfg(not(target_arch = "x86_64"))]
unsafe fn load_config(_config: &TileConfig) {}

#[cfg(not(target_arch = "x86_64"))]
unsafe fn release_tiles() {}

#[cfg(not(target_arch = "x86_64"))]
unsafe fn tile_dot_block(_query: *const bf16, _corpus: *const bf16, _results: *mut f32) {
    unreachable!("AMX tiles are x86_64 only")
}

/// Corpus vectors re-laid out for the second `tdpbf16ps` operand.
#[derive(Debug, Clone)]
pub struct PackedCorpus {
    data: Vec<bf16>,
    blocks: usize,
}

impl PackedCorpus {
    #[inline]
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Packed block `j`, covering corpus vectors `16 * j .. 16 * j + 16`.
    #[inline]
    pub fn block(&self, j: usize) -> &[bf16] {
        &self.data[j * BLOCK_LEN..(j + 1) * BLOCK_LEN]
    }
}

/// Packs each run of 16 corpus vectors into pair-interleaved form.
///
/// `tdpbf16ps` reads its second operand as K/2 rows of N bf16 pairs, so row
/// `k` of a packed block holds `(v_n[2k], v_n[2k + 1])` for `n` in `0..16`.
pub fn pack_corpus(corpus: &VectorSet) -> PackedCorpus {
    assert_eq!(corpus.dimension(), DIMENSION);
    assert_eq!(corpus.len() % TILE_ROWS, 0, "corpus size must be a multiple of 16");

    let blocks = corpus.len() / TILE_ROWS;
    let mut data = vec![bf16::ZERO; blocks * BLOCK_LEN];
    const PAIRS: usize = DIMENSION / 2;

    for j in 0..blocks {
        let packed = &mut data[j * BLOCK_LEN..(j + 1) * BLOCK_LEN];
        for n in 0..TILE_ROWS {
            let v = corpus.vector(j * TILE_ROWS + n);
            for k in 0..PAIRS {
                let dst = k * 2 * TILE_ROWS + n * 2;
                packed[dst] = v[2 * k];
                packed[dst + 1] = v[2 * k + 1];
            }
        }
    }

    PackedCorpus { data, blocks }
}
