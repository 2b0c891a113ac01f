//! `BatchBool<T, N>`: per-lane truth values paired with `Batch<T, N>`.

use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use crate::kernel::Kernel;
use crate::registry::{KernelOf, Registered};

/// N lane booleans in the mask representation of `(T, N)`'s kernel.
///
/// The fallback keeps one bit per lane, SSE2 a full-width sentinel per lane;
/// nothing in the public API can tell the two apart.
#[repr(transparent)]
pub struct BatchBool<T: Registered<N>, const N: usize> {
    pub(crate) mask: <KernelOf<T, N> as Kernel<T, N>>::MaskReg,
}

impl<T: Registered<N>, const N: usize> Clone for BatchBool<T, N> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Registered<N>, const N: usize> Copy for BatchBool<T, N> {}

impl<T: Registered<N>, const N: usize> BatchBool<T, N> {
    #[inline(always)]
    pub(crate) fn from_reg(mask: <KernelOf<T, N> as Kernel<T, N>>::MaskReg) -> Self {
        Self { mask }
    }

    #[inline(always)]
    pub fn splat(val: bool) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::mask_splat(val))
    }

    #[inline(always)]
    pub fn from_array(lanes: [bool; N]) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::mask_from_array(lanes))
    }

    #[inline(always)]
    pub fn to_array(self) -> [bool; N] {
        <KernelOf<T, N> as Kernel<T, N>>::mask_to_array(self.mask)
    }

    /// Lane `i % N`.
    #[inline]
    pub fn get(self, i: usize) -> bool {
        self.to_array()[i % N]
    }

    /// Lane `i` true sets bit `i`.
    #[inline(always)]
    pub fn bits(self) -> u64 {
        <KernelOf<T, N> as Kernel<T, N>>::mask_bits(self.mask)
    }

    #[inline(always)]
    pub fn any(self) -> bool {
        <KernelOf<T, N> as Kernel<T, N>>::mask_any(self.mask)
    }

    #[inline(always)]
    pub fn all(self) -> bool {
        <KernelOf<T, N> as Kernel<T, N>>::mask_all(self.mask)
    }

    #[inline(always)]
    pub fn none(self) -> bool {
        !self.any()
    }

    /// Number of true lanes.
    #[inline(always)]
    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }

    /// Lane-wise equality, as a mask.
    #[inline(always)]
    pub fn eq(self, rhs: Self) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::mask_eq(self.mask, rhs.mask))
    }

    /// Lane-wise inequality, as a mask.
    #[inline(always)]
    pub fn ne(self, rhs: Self) -> Self {
        self ^ rhs
    }
}

impl<T: Registered<N>, const N: usize> From<[bool; N]> for BatchBool<T, N> {
    #[inline(always)]
    fn from(lanes: [bool; N]) -> Self {
        Self::from_array(lanes)
    }
}

impl<T: Registered<N>, const N: usize> PartialEq for BatchBool<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl<T: Registered<N>, const N: usize> Eq for BatchBool<T, N> {}

impl<T: Registered<N>, const N: usize> fmt::Debug for BatchBool<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BatchBool").field(&self.to_array()).finish()
    }
}

macro_rules! impl_mask_op {
    ($Op:ident, $method:ident, $OpAssign:ident, $assign:ident, $kernel_fn:ident) => {
        impl<T: Registered<N>, const N: usize> $Op for BatchBool<T, N> {
            type Output = Self;
            #[inline(always)]
            fn $method(self, rhs: Self) -> Self {
                Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::$kernel_fn(self.mask, rhs.mask))
            }
        }

        impl<T: Registered<N>, const N: usize> $OpAssign for BatchBool<T, N> {
            #[inline(always)]
            fn $assign(&mut self, rhs: Self) {
                *self = $Op::$method(*self, rhs);
            }
        }
    };
}

impl_mask_op!(BitAnd, bitand, BitAndAssign, bitand_assign, mask_and);
impl_mask_op!(BitOr, bitor, BitOrAssign, bitor_assign, mask_or);
impl_mask_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, mask_xor);

impl<T: Registered<N>, const N: usize> Not for BatchBool<T, N> {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::mask_not(self.mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_leaves_unused_bits_clear() {
        let m = !BatchBool::<i32, 2>::from_array([true, false]);
        assert_eq!(m.to_array(), [false, true]);
        assert_eq!(m.bits(), 0b10);
        assert!(!(!BatchBool::<i32, 2>::splat(true)).any());
    }

    #[test]
    fn all_any_none() {
        let m = BatchBool::<f32, 4>::from_array([true, true, true, true]);
        assert!(m.all() && m.any() && !m.none());
        let m = BatchBool::<f32, 4>::splat(false);
        assert!(!m.all() && !m.any() && m.none());
        assert!(BatchBool::<u8, 64>::splat(true).all());
        assert_eq!(BatchBool::<u8, 64>::splat(true).count(), 64);
    }

    #[test]
    fn lane_equality_mask() {
        let a = BatchBool::<u16, 8>::from([true, false, true, false, true, true, false, false]);
        let b = BatchBool::<u16, 8>::from([true, true, false, false, true, false, true, false]);
        assert_eq!(
            a.eq(b).to_array(),
            [true, false, false, true, true, false, false, true]
        );
        assert_eq!(a.ne(b), !a.eq(b));
    }
}
