//! SSE2 kernel (one 128-bit register per batch).
//!
//! Covers every 16-byte `(T, N)` pair: `i8x16 u8x16 i16x8 u16x8 i32x4 u32x4
//! i64x2 u64x2 f32x4 f64x2`. Masks are full-width lanes (all ones / all
//! zeros), as SSE2 has no separate mask registers.
//!
//! Lane types implement [`Sse2Element`] with the instructions SSE2 actually
//! has. Everything else defaults to a round trip through the fallback kernel,
//! which keeps results identical by construction.

use core::arch::x86_64::*;
use core::array;
use core::mem::size_of;

use num_traits::Zero;

use super::fallback::Fallback;
use crate::element::{Element, FloatElement, IntElement};
use crate::kernel::{Kernel, MaskStorage, Storage};

/// SSE2 kernel.
#[derive(Copy, Clone, Debug, Default)]
pub struct Sse2;

// ============================================================================
// Register helpers
// ============================================================================

#[inline(always)]
fn to_lanes<T: Element, const N: usize>(reg: __m128i) -> [T; N] {
    const { assert!(N * size_of::<T>() == 16, "SSE2 batches hold exactly 16 bytes") };
    let mut out = [T::ZERO; N];
    unsafe { _mm_storeu_si128(out.as_mut_ptr().cast(), reg) };
    out
}

#[inline(always)]
fn from_lanes<T: Element, const N: usize>(lanes: [T; N]) -> __m128i {
    const { assert!(N * size_of::<T>() == 16, "SSE2 batches hold exactly 16 bytes") };
    unsafe { _mm_loadu_si128(lanes.as_ptr().cast()) }
}

#[inline(always)]
fn mask_from_bits<T: Element, const N: usize>(bits: u64) -> __m128i {
    let ones = !<T::Bits as Zero>::zero();
    let lanes: [T::Bits; N] = array::from_fn(|i| {
        if bits & (1 << i) != 0 {
            ones
        } else {
            <T::Bits as Zero>::zero()
        }
    });
    unsafe { _mm_loadu_si128(lanes.as_ptr().cast()) }
}

/// One bit per lane, lane `i` at bit `i`.
#[inline(always)]
fn movemask<T: Element>(mask: __m128i) -> u64 {
    unsafe {
        match size_of::<T>() {
            1 => _mm_movemask_epi8(mask) as u64,
            2 => _mm_movemask_epi8(_mm_packs_epi16(mask, _mm_setzero_si128())) as u64,
            4 => _mm_movemask_ps(_mm_castsi128_ps(mask)) as u64,
            _ => _mm_movemask_pd(_mm_castsi128_pd(mask)) as u64,
        }
    }
}

#[inline(always)]
fn all_ones() -> __m128i {
    unsafe { _mm_set1_epi32(-1) }
}

/// `(mask & if_true) | (!mask & if_false)`.
#[inline(always)]
fn blend(mask: __m128i, if_true: __m128i, if_false: __m128i) -> __m128i {
    unsafe {
        // _mm_andnot_si128(a, b) computes (!a) & b
        let t = _mm_and_si128(mask, if_true);
        let f = _mm_andnot_si128(mask, if_false);
        _mm_or_si128(t, f)
    }
}

#[inline(always)]
fn not(a: __m128i) -> __m128i {
    unsafe { _mm_xor_si128(a, all_ones()) }
}

#[inline(always)]
fn shift_count(amount: u32) -> __m128i {
    unsafe { _mm_cvtsi32_si128(amount as i32) }
}

#[inline(always)]
fn via1<T: Element, const N: usize>(a: __m128i, f: impl Fn([T; N]) -> [T; N]) -> __m128i {
    from_lanes(f(to_lanes(a)))
}

#[inline(always)]
fn via2<T: Element, const N: usize>(
    a: __m128i,
    b: __m128i,
    f: impl Fn([T; N], [T; N]) -> [T; N],
) -> __m128i {
    from_lanes(f(to_lanes(a), to_lanes(b)))
}

#[inline(always)]
fn via3<T: Element, const N: usize>(
    a: __m128i,
    b: __m128i,
    c: __m128i,
    f: impl Fn([T; N], [T; N], [T; N]) -> [T; N],
) -> __m128i {
    from_lanes(f(to_lanes(a), to_lanes(b), to_lanes(c)))
}

#[inline(always)]
fn mask_via<T: Element, const N: usize>(
    a: __m128i,
    b: __m128i,
    f: impl Fn([T; N], [T; N]) -> u64,
) -> __m128i {
    mask_from_bits::<T, N>(f(to_lanes(a), to_lanes(b)))
}

// ============================================================================
// Per-lane-type instruction selection
// ============================================================================

/// Lane types the SSE2 kernel can hold.
///
/// Required methods are those every width has an instruction for. Defaulted
/// methods go through [`Fallback`] unless a type overrides them.
pub trait Sse2Element: Element {
    fn add(a: __m128i, b: __m128i) -> __m128i;
    fn sub(a: __m128i, b: __m128i) -> __m128i;
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i;
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i;

    #[inline(always)]
    fn eq<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        mask_via::<Self, N>(a, b, <Fallback as Kernel<Self, N>>::eq)
    }

    #[inline(always)]
    fn lt<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        mask_via::<Self, N>(a, b, <Fallback as Kernel<Self, N>>::lt)
    }

    /// Integer-only default; float lanes override for NaN.
    #[inline(always)]
    fn ne<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        not(<Self as Sse2Element>::eq::<N>(a, b))
    }

    /// Integer-only default; float lanes override for NaN.
    #[inline(always)]
    fn le<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        not(<Self as Sse2Element>::lt::<N>(b, a))
    }

    /// Integer-only default; float lanes override to flip the sign bit.
    #[inline(always)]
    fn neg<const N: usize>(a: __m128i) -> __m128i {
        <Self as Sse2Element>::sub(unsafe { _mm_setzero_si128() }, a)
    }

    #[inline(always)]
    fn min<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        blend(<Self as Sse2Element>::lt::<N>(b, a), b, a)
    }

    #[inline(always)]
    fn max<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        blend(<Self as Sse2Element>::lt::<N>(a, b), b, a)
    }

    #[inline(always)]
    fn mul<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        via2::<Self, N>(a, b, <Fallback as Kernel<Self, N>>::mul)
    }

    #[inline(always)]
    fn div<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        via2::<Self, N>(a, b, <Fallback as Kernel<Self, N>>::div)
    }

    #[inline(always)]
    fn rem<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        via2::<Self, N>(a, b, <Fallback as Kernel<Self, N>>::rem)
    }

    #[inline(always)]
    fn sadd<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        via2::<Self, N>(a, b, <Fallback as Kernel<Self, N>>::sadd)
    }

    #[inline(always)]
    fn ssub<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        via2::<Self, N>(a, b, <Fallback as Kernel<Self, N>>::ssub)
    }

    #[inline(always)]
    fn abs<const N: usize>(a: __m128i) -> __m128i {
        via1::<Self, N>(a, <Fallback as Kernel<Self, N>>::abs)
    }

    #[inline(always)]
    fn fma<const N: usize>(a: __m128i, b: __m128i, c: __m128i) -> __m128i {
        via3::<Self, N>(a, b, c, <Fallback as Kernel<Self, N>>::fma)
    }

    #[inline(always)]
    fn isnan<const N: usize>(a: __m128i) -> __m128i {
        mask_from_bits::<Self, N>(<Fallback as Kernel<Self, N>>::isnan(to_lanes(a)))
    }

    #[inline(always)]
    fn hadd<const N: usize>(a: __m128i) -> Self {
        <Fallback as Kernel<Self, N>>::hadd(to_lanes(a))
    }

    #[inline(always)]
    fn sqrt<const N: usize>(a: __m128i) -> __m128i
    where
        Self: FloatElement,
    {
        via1::<Self, N>(a, <Fallback as Kernel<Self, N>>::sqrt)
    }

    #[inline(always)]
    fn fabs<const N: usize>(a: __m128i) -> __m128i
    where
        Self: FloatElement,
    {
        via1::<Self, N>(a, <Fallback as Kernel<Self, N>>::fabs)
    }

    #[inline(always)]
    fn fmin<const N: usize>(a: __m128i, b: __m128i) -> __m128i
    where
        Self: FloatElement,
    {
        via2::<Self, N>(a, b, <Fallback as Kernel<Self, N>>::fmin)
    }

    #[inline(always)]
    fn fmax<const N: usize>(a: __m128i, b: __m128i) -> __m128i
    where
        Self: FloatElement,
    {
        via2::<Self, N>(a, b, <Fallback as Kernel<Self, N>>::fmax)
    }

    #[inline(always)]
    fn shl<const N: usize>(a: __m128i, amount: u32) -> __m128i
    where
        Self: IntElement,
    {
        via1::<Self, N>(a, |x| <Fallback as Kernel<Self, N>>::shl(x, amount))
    }

    #[inline(always)]
    fn shr<const N: usize>(a: __m128i, amount: u32) -> __m128i
    where
        Self: IntElement,
    {
        via1::<Self, N>(a, |x| <Fallback as Kernel<Self, N>>::shr(x, amount))
    }

    // SSE2 has no per-lane variable shifts.
    #[inline(always)]
    fn shl_lanes<const N: usize>(a: __m128i, amounts: __m128i) -> __m128i
    where
        Self: IntElement,
    {
        via2::<Self, N>(a, amounts, <Fallback as Kernel<Self, N>>::shl_lanes)
    }

    #[inline(always)]
    fn shr_lanes<const N: usize>(a: __m128i, amounts: __m128i) -> __m128i
    where
        Self: IntElement,
    {
        via2::<Self, N>(a, amounts, <Fallback as Kernel<Self, N>>::shr_lanes)
    }
}

// ============================================================================
// 8-bit lanes
// ============================================================================

impl Sse2Element for i8 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_add_epi8(a, b) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_sub_epi8(a, b) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpacklo_epi8(a, b) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpackhi_epi8(a, b) }
    }
    #[inline(always)]
    fn eq<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmpeq_epi8(a, b) }
    }
    #[inline(always)]
    fn lt<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmplt_epi8(a, b) }
    }
    #[inline(always)]
    fn sadd<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_adds_epi8(a, b) }
    }
    #[inline(always)]
    fn ssub<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_subs_epi8(a, b) }
    }
}

impl Sse2Element for u8 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_add_epi8(a, b) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_sub_epi8(a, b) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpacklo_epi8(a, b) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpackhi_epi8(a, b) }
    }
    #[inline(always)]
    fn eq<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmpeq_epi8(a, b) }
    }
    #[inline(always)]
    fn lt<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        // No unsigned compare: bias both sides into signed range.
        unsafe {
            let bias = _mm_set1_epi8(i8::MIN);
            _mm_cmplt_epi8(_mm_xor_si128(a, bias), _mm_xor_si128(b, bias))
        }
    }
    #[inline(always)]
    fn min<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_min_epu8(a, b) }
    }
    #[inline(always)]
    fn max<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_max_epu8(a, b) }
    }
    #[inline(always)]
    fn sadd<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_adds_epu8(a, b) }
    }
    #[inline(always)]
    fn ssub<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_subs_epu8(a, b) }
    }
}

// ============================================================================
// 16-bit lanes
// ============================================================================

impl Sse2Element for i16 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_add_epi16(a, b) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_sub_epi16(a, b) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpacklo_epi16(a, b) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpackhi_epi16(a, b) }
    }
    #[inline(always)]
    fn eq<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmpeq_epi16(a, b) }
    }
    #[inline(always)]
    fn lt<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmplt_epi16(a, b) }
    }
    #[inline(always)]
    fn mul<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_mullo_epi16(a, b) }
    }
    #[inline(always)]
    fn min<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_min_epi16(a, b) }
    }
    #[inline(always)]
    fn max<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_max_epi16(a, b) }
    }
    #[inline(always)]
    fn sadd<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_adds_epi16(a, b) }
    }
    #[inline(always)]
    fn ssub<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_subs_epi16(a, b) }
    }
    #[inline(always)]
    fn shl<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_sll_epi16(a, shift_count(amount)) }
    }
    #[inline(always)]
    fn shr<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_sra_epi16(a, shift_count(amount)) }
    }
}

impl Sse2Element for u16 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_add_epi16(a, b) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_sub_epi16(a, b) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpacklo_epi16(a, b) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpackhi_epi16(a, b) }
    }
    #[inline(always)]
    fn eq<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmpeq_epi16(a, b) }
    }
    #[inline(always)]
    fn lt<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe {
            let bias = _mm_set1_epi16(i16::MIN);
            _mm_cmplt_epi16(_mm_xor_si128(a, bias), _mm_xor_si128(b, bias))
        }
    }
    #[inline(always)]
    fn mul<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_mullo_epi16(a, b) }
    }
    #[inline(always)]
    fn sadd<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_adds_epu16(a, b) }
    }
    #[inline(always)]
    fn ssub<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_subs_epu16(a, b) }
    }
    #[inline(always)]
    fn shl<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_sll_epi16(a, shift_count(amount)) }
    }
    #[inline(always)]
    fn shr<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_srl_epi16(a, shift_count(amount)) }
    }
}

// ============================================================================
// 32-bit integer lanes
// ============================================================================

/// Low 32 bits of each 32x32 product. SSE2 only multiplies even lanes.
#[inline(always)]
fn mullo_epi32(a: __m128i, b: __m128i) -> __m128i {
    unsafe {
        let even = _mm_mul_epu32(a, b);
        let odd = _mm_mul_epu32(_mm_srli_epi64(a, 32), _mm_srli_epi64(b, 32));
        let even_lo = _mm_shuffle_epi32(even, 0b00_00_10_00);
        let odd_lo = _mm_shuffle_epi32(odd, 0b00_00_10_00);
        _mm_unpacklo_epi32(even_lo, odd_lo)
    }
}

impl Sse2Element for i32 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_add_epi32(a, b) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_sub_epi32(a, b) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpacklo_epi32(a, b) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpackhi_epi32(a, b) }
    }
    #[inline(always)]
    fn eq<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmpeq_epi32(a, b) }
    }
    #[inline(always)]
    fn lt<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmplt_epi32(a, b) }
    }
    #[inline(always)]
    fn mul<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        mullo_epi32(a, b)
    }
    #[inline(always)]
    fn shl<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_sll_epi32(a, shift_count(amount)) }
    }
    #[inline(always)]
    fn shr<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_sra_epi32(a, shift_count(amount)) }
    }
}

impl Sse2Element for u32 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_add_epi32(a, b) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_sub_epi32(a, b) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpacklo_epi32(a, b) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpackhi_epi32(a, b) }
    }
    #[inline(always)]
    fn eq<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmpeq_epi32(a, b) }
    }
    #[inline(always)]
    fn lt<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe {
            let bias = _mm_set1_epi32(i32::MIN);
            _mm_cmplt_epi32(_mm_xor_si128(a, bias), _mm_xor_si128(b, bias))
        }
    }
    #[inline(always)]
    fn mul<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        mullo_epi32(a, b)
    }
    #[inline(always)]
    fn shl<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_sll_epi32(a, shift_count(amount)) }
    }
    #[inline(always)]
    fn shr<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_srl_epi32(a, shift_count(amount)) }
    }
}

// ============================================================================
// 64-bit integer lanes (no 64-bit compares or arithmetic shift in SSE2)
// ============================================================================

impl Sse2Element for i64 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_add_epi64(a, b) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_sub_epi64(a, b) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpacklo_epi64(a, b) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpackhi_epi64(a, b) }
    }
    #[inline(always)]
    fn shl<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_sll_epi64(a, shift_count(amount)) }
    }
}

impl Sse2Element for u64 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_add_epi64(a, b) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_sub_epi64(a, b) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpacklo_epi64(a, b) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_unpackhi_epi64(a, b) }
    }
    #[inline(always)]
    fn shl<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_sll_epi64(a, shift_count(amount)) }
    }
    #[inline(always)]
    fn shr<const N: usize>(a: __m128i, amount: u32) -> __m128i {
        unsafe { _mm_srl_epi64(a, shift_count(amount)) }
    }
}

// ============================================================================
// f32 lanes
// ============================================================================

#[inline(always)]
fn ps(a: __m128i) -> __m128 {
    unsafe { _mm_castsi128_ps(a) }
}

#[inline(always)]
fn from_ps(a: __m128) -> __m128i {
    unsafe { _mm_castps_si128(a) }
}

impl Sse2Element for f32 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_add_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_sub_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_unpacklo_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_unpackhi_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn eq<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_cmpeq_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn ne<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        // Unordered compares true, matching `!=` on NaN.
        unsafe { from_ps(_mm_cmpneq_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn lt<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_cmplt_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn le<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_cmple_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn isnan<const N: usize>(a: __m128i) -> __m128i {
        unsafe { from_ps(_mm_cmpunord_ps(ps(a), ps(a))) }
    }
    #[inline(always)]
    fn neg<const N: usize>(a: __m128i) -> __m128i {
        unsafe { from_ps(_mm_xor_ps(ps(a), _mm_set1_ps(-0.0))) }
    }
    #[inline(always)]
    fn abs<const N: usize>(a: __m128i) -> __m128i {
        <f32 as Sse2Element>::fabs::<N>(a)
    }
    #[inline(always)]
    fn fabs<const N: usize>(a: __m128i) -> __m128i {
        unsafe { from_ps(_mm_andnot_ps(_mm_set1_ps(-0.0), ps(a))) }
    }
    #[inline(always)]
    fn mul<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_mul_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn div<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_div_ps(ps(a), ps(b))) }
    }
    #[inline(always)]
    fn sqrt<const N: usize>(a: __m128i) -> __m128i {
        unsafe { from_ps(_mm_sqrt_ps(ps(a))) }
    }
    // _mm_min_ps(x, y) is `x < y ? x : y`; swapping operands gives the
    // `rhs < self ? rhs : self` ordering, NaN included.
    #[inline(always)]
    fn min<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_min_ps(ps(b), ps(a))) }
    }
    #[inline(always)]
    fn max<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_ps(_mm_max_ps(ps(b), ps(a))) }
    }
    #[inline(always)]
    fn fmin<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        let m = <f32 as Sse2Element>::min::<N>(a, b);
        let a_nan = <f32 as Sse2Element>::isnan::<N>(a);
        let b_nan = <f32 as Sse2Element>::isnan::<N>(b);
        blend(a_nan, b, blend(b_nan, a, m))
    }
    #[inline(always)]
    fn fmax<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        let m = <f32 as Sse2Element>::max::<N>(a, b);
        let a_nan = <f32 as Sse2Element>::isnan::<N>(a);
        let b_nan = <f32 as Sse2Element>::isnan::<N>(b);
        blend(a_nan, b, blend(b_nan, a, m))
    }
    #[inline(always)]
    fn sadd<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        clamp_finite::<f32, N>(<f32 as Sse2Element>::add(a, b))
    }
    #[inline(always)]
    fn ssub<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        clamp_finite::<f32, N>(<f32 as Sse2Element>::sub(a, b))
    }
    #[inline(always)]
    fn fma<const N: usize>(a: __m128i, b: __m128i, c: __m128i) -> __m128i {
        #[cfg(target_feature = "fma")]
        unsafe {
            from_ps(_mm_fmadd_ps(ps(a), ps(b), ps(c)))
        }
        #[cfg(not(target_feature = "fma"))]
        {
            // No fused instruction: the scalar fused op keeps one rounding.
            via3::<f32, N>(a, b, c, <Fallback as Kernel<f32, N>>::fma)
        }
    }
    #[inline(always)]
    fn hadd<const N: usize>(a: __m128i) -> f32 {
        unsafe {
            let v = ps(a);
            // [v1, v0, v3, v2]
            let swapped = _mm_shuffle_ps(v, v, 0b10_11_00_01);
            // lane 0 = v0 + v1, lane 2 = v2 + v3
            let pairs = _mm_add_ps(v, swapped);
            let upper = _mm_movehl_ps(pairs, pairs);
            _mm_cvtss_f32(_mm_add_ss(pairs, upper))
        }
    }
}

// ============================================================================
// f64 lanes
// ============================================================================

#[inline(always)]
fn pd(a: __m128i) -> __m128d {
    unsafe { _mm_castsi128_pd(a) }
}

#[inline(always)]
fn from_pd(a: __m128d) -> __m128i {
    unsafe { _mm_castpd_si128(a) }
}

impl Sse2Element for f64 {
    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_add_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_sub_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_unpacklo_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_unpackhi_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn eq<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_cmpeq_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn ne<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_cmpneq_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn lt<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_cmplt_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn le<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_cmple_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn isnan<const N: usize>(a: __m128i) -> __m128i {
        unsafe { from_pd(_mm_cmpunord_pd(pd(a), pd(a))) }
    }
    #[inline(always)]
    fn neg<const N: usize>(a: __m128i) -> __m128i {
        unsafe { from_pd(_mm_xor_pd(pd(a), _mm_set1_pd(-0.0))) }
    }
    #[inline(always)]
    fn abs<const N: usize>(a: __m128i) -> __m128i {
        <f64 as Sse2Element>::fabs::<N>(a)
    }
    #[inline(always)]
    fn fabs<const N: usize>(a: __m128i) -> __m128i {
        unsafe { from_pd(_mm_andnot_pd(_mm_set1_pd(-0.0), pd(a))) }
    }
    #[inline(always)]
    fn mul<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_mul_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn div<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_div_pd(pd(a), pd(b))) }
    }
    #[inline(always)]
    fn sqrt<const N: usize>(a: __m128i) -> __m128i {
        unsafe { from_pd(_mm_sqrt_pd(pd(a))) }
    }
    #[inline(always)]
    fn min<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_min_pd(pd(b), pd(a))) }
    }
    #[inline(always)]
    fn max<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        unsafe { from_pd(_mm_max_pd(pd(b), pd(a))) }
    }
    #[inline(always)]
    fn fmin<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        let m = <f64 as Sse2Element>::min::<N>(a, b);
        let a_nan = <f64 as Sse2Element>::isnan::<N>(a);
        let b_nan = <f64 as Sse2Element>::isnan::<N>(b);
        blend(a_nan, b, blend(b_nan, a, m))
    }
    #[inline(always)]
    fn fmax<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        let m = <f64 as Sse2Element>::max::<N>(a, b);
        let a_nan = <f64 as Sse2Element>::isnan::<N>(a);
        let b_nan = <f64 as Sse2Element>::isnan::<N>(b);
        blend(a_nan, b, blend(b_nan, a, m))
    }
    #[inline(always)]
    fn sadd<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        clamp_finite::<f64, N>(<f64 as Sse2Element>::add(a, b))
    }
    #[inline(always)]
    fn ssub<const N: usize>(a: __m128i, b: __m128i) -> __m128i {
        clamp_finite::<f64, N>(<f64 as Sse2Element>::sub(a, b))
    }
    #[inline(always)]
    fn fma<const N: usize>(a: __m128i, b: __m128i, c: __m128i) -> __m128i {
        #[cfg(target_feature = "fma")]
        unsafe {
            from_pd(_mm_fmadd_pd(pd(a), pd(b), pd(c)))
        }
        #[cfg(not(target_feature = "fma"))]
        {
            via3::<f64, N>(a, b, c, <Fallback as Kernel<f64, N>>::fma)
        }
    }
    #[inline(always)]
    fn hadd<const N: usize>(a: __m128i) -> f64 {
        unsafe {
            let v = pd(a);
            _mm_cvtsd_f64(_mm_add_sd(v, _mm_unpackhi_pd(v, v)))
        }
    }
}

/// `max(v, MIN)` then `min(.., MAX)`, the float saturation order.
#[inline(always)]
fn clamp_finite<T: Sse2Element, const N: usize>(v: __m128i) -> __m128i {
    let lo = from_lanes::<T, N>([T::min_value(); N]);
    let hi = from_lanes::<T, N>([T::max_value(); N]);
    <T as Sse2Element>::min::<N>(<T as Sse2Element>::max::<N>(v, lo), hi)
}

// ============================================================================
// Kernel
// ============================================================================

use Sse2Element as E;

impl<T: Sse2Element, const N: usize> Kernel<T, N> for Sse2 {
    type Reg = __m128i;
    type MaskReg = __m128i;

    const NAME: &'static str = "sse2";
    const ALIGN: usize = 16;
    const STORAGE: Storage = Storage::Register128;
    const MASK_STORAGE: MaskStorage = MaskStorage::Lanes;
    const MASK_TYPE: &'static str = "__m128i";

    #[inline(always)]
    fn splat(val: T) -> __m128i {
        from_lanes::<T, N>([val; N])
    }

    #[inline(always)]
    fn from_array(lanes: [T; N]) -> __m128i {
        from_lanes(lanes)
    }

    #[inline(always)]
    fn to_array(reg: __m128i) -> [T; N] {
        to_lanes(reg)
    }

    #[inline(always)]
    unsafe fn load_aligned(ptr: *const T) -> __m128i {
        unsafe { _mm_load_si128(ptr.cast()) }
    }

    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const T) -> __m128i {
        unsafe { _mm_loadu_si128(ptr.cast()) }
    }

    #[inline(always)]
    unsafe fn store_aligned(reg: __m128i, ptr: *mut T) {
        unsafe { _mm_store_si128(ptr.cast(), reg) }
    }

    #[inline(always)]
    unsafe fn store_unaligned(reg: __m128i, ptr: *mut T) {
        unsafe { _mm_storeu_si128(ptr.cast(), reg) }
    }

    #[inline(always)]
    fn neg(a: __m128i) -> __m128i {
        <T as E>::neg::<N>(a)
    }

    #[inline(always)]
    fn add(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::add(a, b)
    }

    #[inline(always)]
    fn sub(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::sub(a, b)
    }

    #[inline(always)]
    fn mul(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::mul::<N>(a, b)
    }

    #[inline(always)]
    fn div(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::div::<N>(a, b)
    }

    #[inline(always)]
    fn rem(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::rem::<N>(a, b)
    }

    #[inline(always)]
    fn sadd(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::sadd::<N>(a, b)
    }

    #[inline(always)]
    fn ssub(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::ssub::<N>(a, b)
    }

    #[inline(always)]
    fn min(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::min::<N>(a, b)
    }

    #[inline(always)]
    fn max(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::max::<N>(a, b)
    }

    #[inline(always)]
    fn abs(a: __m128i) -> __m128i {
        <T as E>::abs::<N>(a)
    }

    #[inline(always)]
    fn fma(a: __m128i, b: __m128i, c: __m128i) -> __m128i {
        <T as E>::fma::<N>(a, b, c)
    }

    #[inline(always)]
    fn bitand(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_and_si128(a, b) }
    }

    #[inline(always)]
    fn bitor(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_or_si128(a, b) }
    }

    #[inline(always)]
    fn bitxor(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_xor_si128(a, b) }
    }

    #[inline(always)]
    fn not(a: __m128i) -> __m128i {
        not(a)
    }

    #[inline(always)]
    fn andnot(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_andnot_si128(b, a) }
    }

    #[inline(always)]
    fn eq(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::eq::<N>(a, b)
    }

    #[inline(always)]
    fn ne(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::ne::<N>(a, b)
    }

    #[inline(always)]
    fn lt(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::lt::<N>(a, b)
    }

    #[inline(always)]
    fn le(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::le::<N>(a, b)
    }

    #[inline(always)]
    fn isnan(a: __m128i) -> __m128i {
        <T as E>::isnan::<N>(a)
    }

    #[inline(always)]
    fn select(mask: __m128i, if_true: __m128i, if_false: __m128i) -> __m128i {
        blend(mask, if_true, if_false)
    }

    #[inline(always)]
    fn zip_lo(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::zip_lo(a, b)
    }

    #[inline(always)]
    fn zip_hi(a: __m128i, b: __m128i) -> __m128i {
        <T as E>::zip_hi(a, b)
    }

    #[inline(always)]
    fn hadd(a: __m128i) -> T {
        <T as E>::hadd::<N>(a)
    }

    #[inline(always)]
    fn sqrt(a: __m128i) -> __m128i
    where
        T: FloatElement,
    {
        <T as E>::sqrt::<N>(a)
    }

    #[inline(always)]
    fn fabs(a: __m128i) -> __m128i
    where
        T: FloatElement,
    {
        <T as E>::fabs::<N>(a)
    }

    #[inline(always)]
    fn fmin(a: __m128i, b: __m128i) -> __m128i
    where
        T: FloatElement,
    {
        <T as E>::fmin::<N>(a, b)
    }

    #[inline(always)]
    fn fmax(a: __m128i, b: __m128i) -> __m128i
    where
        T: FloatElement,
    {
        <T as E>::fmax::<N>(a, b)
    }

    #[inline(always)]
    fn shl(a: __m128i, amount: u32) -> __m128i
    where
        T: IntElement,
    {
        debug_assert!(amount < T::BITS, "shift amount {amount} out of range");
        <T as E>::shl::<N>(a, amount)
    }

    #[inline(always)]
    fn shr(a: __m128i, amount: u32) -> __m128i
    where
        T: IntElement,
    {
        debug_assert!(amount < T::BITS, "shift amount {amount} out of range");
        <T as E>::shr::<N>(a, amount)
    }

    #[inline(always)]
    fn shl_lanes(a: __m128i, amounts: __m128i) -> __m128i
    where
        T: IntElement,
    {
        <T as E>::shl_lanes::<N>(a, amounts)
    }

    #[inline(always)]
    fn shr_lanes(a: __m128i, amounts: __m128i) -> __m128i
    where
        T: IntElement,
    {
        <T as E>::shr_lanes::<N>(a, amounts)
    }

    #[inline(always)]
    fn mask_splat(val: bool) -> __m128i {
        if val {
            all_ones()
        } else {
            unsafe { _mm_setzero_si128() }
        }
    }

    #[inline(always)]
    fn mask_from_array(lanes: [bool; N]) -> __m128i {
        mask_from_bits::<T, N>(<Fallback as Kernel<T, N>>::mask_from_array(lanes))
    }

    #[inline(always)]
    fn mask_to_array(mask: __m128i) -> [bool; N] {
        <Fallback as Kernel<T, N>>::mask_to_array(movemask::<T>(mask))
    }

    #[inline(always)]
    fn mask_and(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_and_si128(a, b) }
    }

    #[inline(always)]
    fn mask_or(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_or_si128(a, b) }
    }

    #[inline(always)]
    fn mask_xor(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_xor_si128(a, b) }
    }

    #[inline(always)]
    fn mask_not(a: __m128i) -> __m128i {
        not(a)
    }

    #[inline(always)]
    fn mask_bits(mask: __m128i) -> u64 {
        movemask::<T>(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lanes_f32(reg: __m128i) -> [f32; 4] {
        <Sse2 as Kernel<f32, 4>>::to_array(reg)
    }

    #[test]
    fn movemask_reads_one_bit_per_lane() {
        let m = <Sse2 as Kernel<u16, 8>>::mask_from_array([
            true, false, true, true, false, false, false, true,
        ]);
        assert_eq!(<Sse2 as Kernel<u16, 8>>::mask_bits(m), 0b1000_1101);
        let m = <Sse2 as Kernel<i64, 2>>::mask_from_array([false, true]);
        assert_eq!(<Sse2 as Kernel<i64, 2>>::mask_bits(m), 0b10);
    }

    #[test]
    fn emulated_mullo_wraps() {
        let a = <Sse2 as Kernel<i32, 4>>::from_array([i32::MAX, -3, 65536, 7]);
        let b = <Sse2 as Kernel<i32, 4>>::from_array([2, 5, 65536, -1]);
        let p = <Sse2 as Kernel<i32, 4>>::mul(a, b);
        assert_eq!(
            <Sse2 as Kernel<i32, 4>>::to_array(p),
            [i32::MAX.wrapping_mul(2), -15, 0, -7]
        );
    }

    #[test]
    fn unsigned_compare_uses_full_range() {
        let a = <Sse2 as Kernel<u32, 4>>::from_array([0, u32::MAX, 5, 0x8000_0000]);
        let b = <Sse2 as Kernel<u32, 4>>::from_array([1, 0, 5, 0x7FFF_FFFF]);
        let m = <Sse2 as Kernel<u32, 4>>::lt(a, b);
        assert_eq!(<Sse2 as Kernel<u32, 4>>::mask_to_array(m), [true, false, false, false]);
    }

    #[test]
    fn float_min_keeps_lhs_when_rhs_is_nan() {
        let a = <Sse2 as Kernel<f32, 4>>::from_array([1.0, f32::NAN, -0.0, 3.0]);
        let b = <Sse2 as Kernel<f32, 4>>::from_array([f32::NAN, 2.0, 0.0, 1.0]);
        let m = lanes_f32(<Sse2 as Kernel<f32, 4>>::min(a, b));
        assert_eq!(m[0], 1.0);
        assert!(m[1].is_nan());
        assert_eq!(m[2].to_bits(), (-0.0f32).to_bits());
        assert_eq!(m[3], 1.0);
    }

    #[test]
    fn hadd_matches_fallback_order() {
        let lanes = [1.0e8f32, 1.0, -1.0e8, 1.0];
        let reg = <Sse2 as Kernel<f32, 4>>::from_array(lanes);
        let fast = <Sse2 as Kernel<f32, 4>>::hadd(reg);
        let reference = <Fallback as Kernel<f32, 4>>::hadd(lanes);
        assert_eq!(fast.to_bits(), reference.to_bits());
    }
}
