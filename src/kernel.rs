//! The kernel contract.
//!
//! A kernel is a stateless set of pure functions implementing every batch
//! operation for one `(T, N)` pair over some storage representation. The
//! [`Fallback`](crate::backends::fallback::Fallback) kernel defines the
//! reference results; any other kernel must match it bit for bit on every
//! input, NaN payloads and saturation boundaries included.
//!
//! Operations that the hardware cannot express directly may delegate to the
//! fallback internally. Callers never observe the substitution.

use core::fmt::Debug;

use crate::element::{Element, FloatElement, IntElement};

/// How a kernel stores lanes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    /// Plain `[T; N]` array.
    Array,
    /// One 128-bit vector register.
    Register128,
}

/// How a kernel stores lane masks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStorage {
    /// One bit per lane, packed into an integer.
    Bits,
    /// A full-width all-ones / all-zeros sentinel per lane.
    Lanes,
}

/// Per-`(T, N)` operation set.
///
/// Methods restricted to float or integer lanes carry a `where` clause on
/// `T`; a kernel implements them for every `T` it supports that satisfies it.
pub trait Kernel<T: Element, const N: usize>:
    'static + Copy + Clone + Debug + Default + Send + Sync
{
    /// Lane storage.
    type Reg: Copy + Send + Sync;
    /// Mask storage.
    type MaskReg: Copy + Send + Sync;

    const NAME: &'static str;
    /// Required alignment for aligned loads and stores, 0 for none.
    const ALIGN: usize;
    const STORAGE: Storage;
    const MASK_STORAGE: MaskStorage;
    /// Name of the `MaskReg` type.
    const MASK_TYPE: &'static str;

    // =========================================================================
    // Movement
    // =========================================================================

    fn splat(val: T) -> Self::Reg;
    fn from_array(lanes: [T; N]) -> Self::Reg;
    fn to_array(reg: Self::Reg) -> [T; N];

    /// # Safety
    /// `ptr` must be valid for reading `N` values and aligned to
    /// `max(ALIGN, align_of::<T>())`.
    unsafe fn load_aligned(ptr: *const T) -> Self::Reg;
    /// # Safety
    /// `ptr` must be valid for reading `N` values.
    unsafe fn load_unaligned(ptr: *const T) -> Self::Reg;
    /// # Safety
    /// `ptr` must be valid for writing `N` values and aligned to
    /// `max(ALIGN, align_of::<T>())`.
    unsafe fn store_aligned(reg: Self::Reg, ptr: *mut T);
    /// # Safety
    /// `ptr` must be valid for writing `N` values.
    unsafe fn store_unaligned(reg: Self::Reg, ptr: *mut T);

    // =========================================================================
    // Arithmetic
    // =========================================================================

    fn neg(a: Self::Reg) -> Self::Reg;
    fn add(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn sub(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn mul(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn div(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn rem(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn sadd(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn ssub(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    fn min(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn max(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn abs(a: Self::Reg) -> Self::Reg;

    /// `a * b + c`, fused for floats.
    fn fma(a: Self::Reg, b: Self::Reg, c: Self::Reg) -> Self::Reg;

    /// `a * b - c`.
    #[inline(always)]
    fn fms(a: Self::Reg, b: Self::Reg, c: Self::Reg) -> Self::Reg {
        Self::fma(a, b, Self::neg(c))
    }

    /// `-(a * b) + c`.
    #[inline(always)]
    fn fnma(a: Self::Reg, b: Self::Reg, c: Self::Reg) -> Self::Reg {
        Self::fma(Self::neg(a), b, c)
    }

    /// `-(a * b) - c`.
    #[inline(always)]
    fn fnms(a: Self::Reg, b: Self::Reg, c: Self::Reg) -> Self::Reg {
        Self::fma(Self::neg(a), b, Self::neg(c))
    }

    // =========================================================================
    // Bitwise (on the bit pattern, also for floats)
    // =========================================================================

    fn bitand(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn bitor(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn bitxor(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn not(a: Self::Reg) -> Self::Reg;
    /// `a & !b`.
    fn andnot(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    // =========================================================================
    // Comparison
    // =========================================================================

    fn eq(a: Self::Reg, b: Self::Reg) -> Self::MaskReg;
    fn ne(a: Self::Reg, b: Self::Reg) -> Self::MaskReg;
    fn lt(a: Self::Reg, b: Self::Reg) -> Self::MaskReg;
    fn le(a: Self::Reg, b: Self::Reg) -> Self::MaskReg;
    fn isnan(a: Self::Reg) -> Self::MaskReg;

    // =========================================================================
    // Lane movement and reduction
    // =========================================================================

    fn select(mask: Self::MaskReg, if_true: Self::Reg, if_false: Self::Reg) -> Self::Reg;

    /// Interleaves the low halves: `[a0, b0, a1, b1, ...]`.
    fn zip_lo(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    /// Interleaves the high halves: `[a(N/2), b(N/2), ...]`.
    fn zip_hi(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    /// Sum of all lanes, folded as an adjacent pairwise tree:
    /// `[v0+v1, v2+v3, ...]` per level until one lane remains.
    fn hadd(a: Self::Reg) -> T;

    /// Lane `i` of the result is `hadd(rows[i])`.
    #[inline(always)]
    fn haddp(rows: &[Self::Reg; N]) -> Self::Reg {
        Self::from_array(core::array::from_fn(|i| Self::hadd(rows[i])))
    }

    // =========================================================================
    // Float-only
    // =========================================================================

    fn sqrt(a: Self::Reg) -> Self::Reg
    where
        T: FloatElement;
    fn fabs(a: Self::Reg) -> Self::Reg
    where
        T: FloatElement;
    fn fmin(a: Self::Reg, b: Self::Reg) -> Self::Reg
    where
        T: FloatElement;
    fn fmax(a: Self::Reg, b: Self::Reg) -> Self::Reg
    where
        T: FloatElement;

    // =========================================================================
    // Integer-only
    // =========================================================================

    fn shl(a: Self::Reg, amount: u32) -> Self::Reg
    where
        T: IntElement;
    fn shr(a: Self::Reg, amount: u32) -> Self::Reg
    where
        T: IntElement;
    fn shl_lanes(a: Self::Reg, amounts: Self::Reg) -> Self::Reg
    where
        T: IntElement;
    fn shr_lanes(a: Self::Reg, amounts: Self::Reg) -> Self::Reg
    where
        T: IntElement;

    // =========================================================================
    // Masks
    // =========================================================================

    fn mask_splat(val: bool) -> Self::MaskReg;
    fn mask_from_array(lanes: [bool; N]) -> Self::MaskReg;
    fn mask_to_array(mask: Self::MaskReg) -> [bool; N];
    fn mask_and(a: Self::MaskReg, b: Self::MaskReg) -> Self::MaskReg;
    fn mask_or(a: Self::MaskReg, b: Self::MaskReg) -> Self::MaskReg;
    fn mask_xor(a: Self::MaskReg, b: Self::MaskReg) -> Self::MaskReg;
    fn mask_not(a: Self::MaskReg) -> Self::MaskReg;
    /// Lane `i` true sets bit `i`.
    fn mask_bits(mask: Self::MaskReg) -> u64;

    #[inline(always)]
    fn mask_eq(a: Self::MaskReg, b: Self::MaskReg) -> Self::MaskReg {
        Self::mask_not(Self::mask_xor(a, b))
    }

    #[inline(always)]
    fn mask_any(mask: Self::MaskReg) -> bool {
        Self::mask_bits(mask) != 0
    }

    #[inline(always)]
    fn mask_all(mask: Self::MaskReg) -> bool {
        Self::mask_bits(mask) == lane_bits(N)
    }
}

/// Bit pattern with the low `lanes` bits set.
#[inline(always)]
pub const fn lane_bits(lanes: usize) -> u64 {
    if lanes >= 64 {
        u64::MAX
    } else {
        (1u64 << lanes) - 1
    }
}
