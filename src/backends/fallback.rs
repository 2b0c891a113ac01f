//! Scalar reference kernel.
//!
//! Lanes live in a plain `[T; N]` and masks in a packed `u64` bit set. Every
//! operation is a loop over [`Element`] lane functions, so this kernel is the
//! definition of correct results for all the others.

use core::array;

use crate::element::{Element, FloatElement, IntElement};
use crate::kernel::{lane_bits, Kernel, MaskStorage, Storage};

/// Scalar fallback kernel, available for every `(T, N)`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Fallback;

#[inline(always)]
fn map<T: Element, const N: usize>(a: [T; N], f: impl Fn(T) -> T) -> [T; N] {
    array::from_fn(|i| f(a[i]))
}

#[inline(always)]
fn zip<T: Element, const N: usize>(a: [T; N], b: [T; N], f: impl Fn(T, T) -> T) -> [T; N] {
    array::from_fn(|i| f(a[i], b[i]))
}

#[inline(always)]
fn bits<T: Element, const N: usize>(
    a: [T; N],
    b: [T; N],
    f: impl Fn(T::Bits, T::Bits) -> T::Bits,
) -> [T; N] {
    array::from_fn(|i| T::from_bits(f(a[i].to_bits(), b[i].to_bits())))
}

#[inline(always)]
fn compare<T: Element, const N: usize>(a: [T; N], b: [T; N], f: impl Fn(T, T) -> bool) -> u64 {
    let mut mask = 0u64;
    for i in 0..N {
        if f(a[i], b[i]) {
            mask |= 1 << i;
        }
    }
    mask
}

impl<T: Element, const N: usize> Kernel<T, N> for Fallback {
    type Reg = [T; N];
    type MaskReg = u64;

    const NAME: &'static str = "fallback";
    const ALIGN: usize = 0;
    const STORAGE: Storage = Storage::Array;
    const MASK_STORAGE: MaskStorage = MaskStorage::Bits;
    const MASK_TYPE: &'static str = "u64";

    #[inline(always)]
    fn splat(val: T) -> [T; N] {
        [val; N]
    }

    #[inline(always)]
    fn from_array(lanes: [T; N]) -> [T; N] {
        lanes
    }

    #[inline(always)]
    fn to_array(reg: [T; N]) -> [T; N] {
        reg
    }

    #[inline(always)]
    unsafe fn load_aligned(ptr: *const T) -> [T; N] {
        unsafe { ptr.cast::<[T; N]>().read() }
    }

    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const T) -> [T; N] {
        unsafe { ptr.cast::<[T; N]>().read_unaligned() }
    }

    #[inline(always)]
    unsafe fn store_aligned(reg: [T; N], ptr: *mut T) {
        unsafe { ptr.cast::<[T; N]>().write(reg) }
    }

    #[inline(always)]
    unsafe fn store_unaligned(reg: [T; N], ptr: *mut T) {
        unsafe { ptr.cast::<[T; N]>().write_unaligned(reg) }
    }

    #[inline(always)]
    fn neg(a: [T; N]) -> [T; N] {
        map(a, T::lane_neg)
    }

    #[inline(always)]
    fn add(a: [T; N], b: [T; N]) -> [T; N] {
        zip(a, b, T::lane_add)
    }

    #[inline(always)]
    fn sub(a: [T; N], b: [T; N]) -> [T; N] {
        zip(a, b, T::lane_sub)
    }

    #[inline(always)]
    fn mul(a: [T; N], b: [T; N]) -> [T; N] {
        zip(a, b, T::lane_mul)
    }

    #[inline(always)]
    fn div(a: [T; N], b: [T; N]) -> [T; N] {
        zip(a, b, T::lane_div)
    }

    #[inline(always)]
    fn rem(a: [T; N], b: [T; N]) -> [T; N] {
        zip(a, b, T::lane_rem)
    }

    #[inline(always)]
    fn sadd(a: [T; N], b: [T; N]) -> [T; N] {
        zip(a, b, T::lane_sadd)
    }

    #[inline(always)]
    fn ssub(a: [T; N], b: [T; N]) -> [T; N] {
        zip(a, b, T::lane_ssub)
    }

    #[inline(always)]
    fn min(a: [T; N], b: [T; N]) -> [T; N] {
        zip(a, b, T::lane_min)
    }

    #[inline(always)]
    fn max(a: [T; N], b: [T; N]) -> [T; N] {
        zip(a, b, T::lane_max)
    }

    #[inline(always)]
    fn abs(a: [T; N]) -> [T; N] {
        map(a, T::lane_abs)
    }

    #[inline(always)]
    fn fma(a: [T; N], b: [T; N], c: [T; N]) -> [T; N] {
        array::from_fn(|i| a[i].lane_mul_add(b[i], c[i]))
    }

    #[inline(always)]
    fn bitand(a: [T; N], b: [T; N]) -> [T; N] {
        bits(a, b, |x, y| x & y)
    }

    #[inline(always)]
    fn bitor(a: [T; N], b: [T; N]) -> [T; N] {
        bits(a, b, |x, y| x | y)
    }

    #[inline(always)]
    fn bitxor(a: [T; N], b: [T; N]) -> [T; N] {
        bits(a, b, |x, y| x ^ y)
    }

    #[inline(always)]
    fn not(a: [T; N]) -> [T; N] {
        map(a, |x| T::from_bits(!x.to_bits()))
    }

    #[inline(always)]
    fn andnot(a: [T; N], b: [T; N]) -> [T; N] {
        bits(a, b, |x, y| x & !y)
    }

    #[inline(always)]
    fn eq(a: [T; N], b: [T; N]) -> u64 {
        compare(a, b, |x, y| x == y)
    }

    #[inline(always)]
    fn ne(a: [T; N], b: [T; N]) -> u64 {
        compare(a, b, |x, y| x != y)
    }

    #[inline(always)]
    fn lt(a: [T; N], b: [T; N]) -> u64 {
        compare(a, b, |x, y| x < y)
    }

    #[inline(always)]
    fn le(a: [T; N], b: [T; N]) -> u64 {
        compare(a, b, |x, y| x <= y)
    }

    #[inline(always)]
    fn isnan(a: [T; N]) -> u64 {
        compare(a, a, |x, _| x.lane_is_nan())
    }

    #[inline(always)]
    fn select(mask: u64, if_true: [T; N], if_false: [T; N]) -> [T; N] {
        array::from_fn(|i| {
            if mask & (1 << i) != 0 {
                if_true[i]
            } else {
                if_false[i]
            }
        })
    }

    #[inline(always)]
    fn zip_lo(a: [T; N], b: [T; N]) -> [T; N] {
        array::from_fn(|i| if i % 2 == 0 { a[i / 2] } else { b[i / 2] })
    }

    #[inline(always)]
    fn zip_hi(a: [T; N], b: [T; N]) -> [T; N] {
        // Lanes N..2N of the full interleave; for N = 1 that is b0.
        array::from_fn(|i| {
            let j = (N + i) / 2;
            if (N + i) % 2 == 0 {
                a[j]
            } else {
                b[j]
            }
        })
    }

    #[inline(always)]
    fn hadd(a: [T; N]) -> T {
        let mut lanes = a;
        let mut width = N;
        while width > 1 {
            let pairs = width / 2;
            for i in 0..pairs {
                lanes[i] = lanes[2 * i].lane_add(lanes[2 * i + 1]);
            }
            // Odd width carries the last lane up unchanged.
            if width % 2 == 1 {
                lanes[pairs] = lanes[width - 1];
                width = pairs + 1;
            } else {
                width = pairs;
            }
        }
        if N == 0 {
            T::ZERO
        } else {
            lanes[0]
        }
    }

    #[inline(always)]
    fn sqrt(a: [T; N]) -> [T; N]
    where
        T: FloatElement,
    {
        map(a, T::lane_sqrt)
    }

    #[inline(always)]
    fn fabs(a: [T; N]) -> [T; N]
    where
        T: FloatElement,
    {
        map(a, T::lane_fabs)
    }

    #[inline(always)]
    fn fmin(a: [T; N], b: [T; N]) -> [T; N]
    where
        T: FloatElement,
    {
        zip(a, b, T::lane_fmin)
    }

    #[inline(always)]
    fn fmax(a: [T; N], b: [T; N]) -> [T; N]
    where
        T: FloatElement,
    {
        zip(a, b, T::lane_fmax)
    }

    #[inline(always)]
    fn shl(a: [T; N], amount: u32) -> [T; N]
    where
        T: IntElement,
    {
        map(a, |x| x.lane_shl(amount))
    }

    #[inline(always)]
    fn shr(a: [T; N], amount: u32) -> [T; N]
    where
        T: IntElement,
    {
        map(a, |x| x.lane_shr(amount))
    }

    #[inline(always)]
    fn shl_lanes(a: [T; N], amounts: [T; N]) -> [T; N]
    where
        T: IntElement,
    {
        zip(a, amounts, |x, n| x.lane_shl(n.lane_amount()))
    }

    #[inline(always)]
    fn shr_lanes(a: [T; N], amounts: [T; N]) -> [T; N]
    where
        T: IntElement,
    {
        zip(a, amounts, |x, n| x.lane_shr(n.lane_amount()))
    }

    #[inline(always)]
    fn mask_splat(val: bool) -> u64 {
        if val {
            lane_bits(N)
        } else {
            0
        }
    }

    #[inline(always)]
    fn mask_from_array(lanes: [bool; N]) -> u64 {
        let mut mask = 0u64;
        for (i, &lane) in lanes.iter().enumerate() {
            if lane {
                mask |= 1 << i;
            }
        }
        mask
    }

    #[inline(always)]
    fn mask_to_array(mask: u64) -> [bool; N] {
        array::from_fn(|i| mask & (1 << i) != 0)
    }

    #[inline(always)]
    fn mask_and(a: u64, b: u64) -> u64 {
        a & b
    }

    #[inline(always)]
    fn mask_or(a: u64, b: u64) -> u64 {
        a | b
    }

    #[inline(always)]
    fn mask_xor(a: u64, b: u64) -> u64 {
        a ^ b
    }

    #[inline(always)]
    fn mask_not(a: u64) -> u64 {
        !a & lane_bits(N)
    }

    #[inline(always)]
    fn mask_bits(mask: u64) -> u64 {
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hadd_folds_adjacent_pairs() {
        // (a0 + a1) + (a2 + a3), not ((a0 + a1) + a2) + a3.
        let a = [1.0e8f32, 1.0, -1.0e8, 1.0];
        let expected = (1.0e8f32 + 1.0) + (-1.0e8 + 1.0);
        assert_eq!(<Fallback as Kernel<f32, 4>>::hadd(a).to_bits(), expected.to_bits());
    }

    #[test]
    fn hadd_handles_odd_and_single_widths() {
        assert_eq!(<Fallback as Kernel<i32, 1>>::hadd([7]), 7);
        assert_eq!(<Fallback as Kernel<i32, 3>>::hadd([1, 2, 3]), 6);
    }

    #[test]
    fn zip_matches_unpack_semantics() {
        let a = [0u32, 1, 2, 3];
        let b = [10u32, 11, 12, 13];
        assert_eq!(<Fallback as Kernel<u32, 4>>::zip_lo(a, b), [0, 10, 1, 11]);
        assert_eq!(<Fallback as Kernel<u32, 4>>::zip_hi(a, b), [2, 12, 3, 13]);
        assert_eq!(<Fallback as Kernel<u32, 1>>::zip_lo([5], [6]), [5]);
        assert_eq!(<Fallback as Kernel<u32, 1>>::zip_hi([5], [6]), [6]);
    }

    #[test]
    fn mask_not_stays_within_lanes() {
        let m = <Fallback as Kernel<u8, 4>>::mask_from_array([true, false, false, true]);
        let inv = <Fallback as Kernel<u8, 4>>::mask_not(m);
        assert_eq!(inv, 0b0110);
        let either = <Fallback as Kernel<u8, 4>>::mask_or(m, inv);
        assert!(<Fallback as Kernel<u8, 4>>::mask_all(either));
    }

    #[test]
    fn float_bitwise_uses_bit_pattern() {
        let a = [-1.5f64, 2.0];
        let sign = [-0.0f64; 2];
        let cleared = <Fallback as Kernel<f64, 2>>::andnot(a, sign);
        assert_eq!(cleared, [1.5, 2.0]);
    }
}
