//! `Batch<T, N>`: N lanes of `T` in the register of the kernel the registry
//! resolved for `(T, N)`.
//!
//! A batch holds no reference to its kernel; the kernel is a type, chosen at
//! compile time, and every operator forwards to it.

use core::array;
use core::fmt;
use core::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Div,
    DivAssign, Mul, MulAssign, Neg, Not, Rem, RemAssign, Sub, SubAssign,
};

use num_traits::AsPrimitive;

use crate::element::Element;
use crate::kernel::Kernel;
use crate::mask::BatchBool;
use crate::registry::{KernelOf, Registered};

/// Fixed-width vector of `N` lanes of `T`.
///
/// Value type: `Copy`, no shared ownership, no retained pointers.
#[repr(transparent)]
pub struct Batch<T: Registered<N>, const N: usize> {
    pub(crate) reg: <KernelOf<T, N> as Kernel<T, N>>::Reg,
}

impl<T: Registered<N>, const N: usize> Clone for Batch<T, N> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Registered<N>, const N: usize> Copy for Batch<T, N> {}

impl<T: Registered<N>, const N: usize> Batch<T, N> {
    pub const LANES: usize = N;
    /// Alignment `load_aligned` and `store_aligned` require, 0 for none.
    pub const ALIGN: usize = <KernelOf<T, N> as Kernel<T, N>>::ALIGN;

    #[inline(always)]
    pub(crate) fn from_reg(reg: <KernelOf<T, N> as Kernel<T, N>>::Reg) -> Self {
        Self { reg }
    }

    /// Broadcasts `val` to every lane.
    #[inline(always)]
    pub fn splat(val: T) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::splat(val))
    }

    #[inline(always)]
    pub fn from_array(lanes: [T; N]) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::from_array(lanes))
    }

    #[inline(always)]
    pub fn to_array(self) -> [T; N] {
        <KernelOf<T, N> as Kernel<T, N>>::to_array(self.reg)
    }

    /// Lane `i % N`.
    #[inline]
    pub fn get(self, i: usize) -> T {
        self.to_array()[i % N]
    }

    /// Copy of `self` with lane `i % N` replaced.
    #[inline]
    pub fn replace(self, i: usize, val: T) -> Self {
        let mut lanes = self.to_array();
        lanes[i % N] = val;
        Self::from_array(lanes)
    }

    /// Loads the first `N` values of `slice`.
    ///
    /// # Panics
    /// If `slice` holds fewer than `N` values.
    #[inline]
    pub fn from_slice(slice: &[T]) -> Self {
        assert!(
            slice.len() >= N,
            "slice of length {} is shorter than {} lanes",
            slice.len(),
            N
        );
        unsafe { Self::load_unaligned(slice.as_ptr()) }
    }

    /// Stores into the first `N` slots of `slice`.
    ///
    /// # Panics
    /// If `slice` holds fewer than `N` values.
    #[inline]
    pub fn store_slice(self, slice: &mut [T]) {
        assert!(
            slice.len() >= N,
            "slice of length {} is shorter than {} lanes",
            slice.len(),
            N
        );
        unsafe { self.store_unaligned(slice.as_mut_ptr()) }
    }

    /// # Safety
    /// `ptr` must be valid for reading `N` values of `T` and aligned to
    /// [`Self::ALIGN`] (and `T`). Misalignment is only caught by a debug
    /// assertion.
    #[inline(always)]
    pub unsafe fn load_aligned(ptr: *const T) -> Self {
        debug_assert!(is_aligned(ptr, Self::ALIGN), "misaligned load_aligned");
        Self::from_reg(unsafe { <KernelOf<T, N> as Kernel<T, N>>::load_aligned(ptr) })
    }

    /// # Safety
    /// `ptr` must be valid for reading `N` values of `T`.
    #[inline(always)]
    pub unsafe fn load_unaligned(ptr: *const T) -> Self {
        Self::from_reg(unsafe { <KernelOf<T, N> as Kernel<T, N>>::load_unaligned(ptr) })
    }

    /// # Safety
    /// `ptr` must be valid for writing `N` values of `T` and aligned to
    /// [`Self::ALIGN`] (and `T`).
    #[inline(always)]
    pub unsafe fn store_aligned(self, ptr: *mut T) {
        debug_assert!(is_aligned(ptr, Self::ALIGN), "misaligned store_aligned");
        unsafe { <KernelOf<T, N> as Kernel<T, N>>::store_aligned(self.reg, ptr) }
    }

    /// # Safety
    /// `ptr` must be valid for writing `N` values of `T`.
    #[inline(always)]
    pub unsafe fn store_unaligned(self, ptr: *mut T) {
        unsafe { <KernelOf<T, N> as Kernel<T, N>>::store_unaligned(self.reg, ptr) }
    }

    /// Loads `N` values of another scalar type, converting each with `as`.
    ///
    /// # Safety
    /// `ptr` must be valid for reading `N` values of `U`.
    #[inline]
    pub unsafe fn load_unaligned_as<U>(ptr: *const U) -> Self
    where
        U: AsPrimitive<T>,
    {
        Self::from_array(array::from_fn(|i| unsafe { ptr.add(i).read_unaligned() }.as_()))
    }

    /// Stores each lane converted to `U` with `as`.
    ///
    /// # Safety
    /// `ptr` must be valid for writing `N` values of `U`.
    #[inline]
    pub unsafe fn store_unaligned_as<U>(self, ptr: *mut U)
    where
        T: AsPrimitive<U>,
        U: Copy + 'static,
    {
        for (i, lane) in self.to_array().into_iter().enumerate() {
            unsafe { ptr.add(i).write_unaligned(lane.as_()) };
        }
    }

    /// Aligned form of [`Self::load_unaligned_as`].
    ///
    /// # Safety
    /// `ptr` must be valid for reading `N` values of `U` and aligned to
    /// [`Self::ALIGN`] (and `U`).
    #[inline]
    pub unsafe fn load_aligned_as<U>(ptr: *const U) -> Self
    where
        U: AsPrimitive<T>,
    {
        debug_assert!(is_aligned(ptr, Self::ALIGN), "misaligned load_aligned_as");
        Self::from_array(array::from_fn(|i| unsafe { ptr.add(i).read() }.as_()))
    }

    /// Aligned form of [`Self::store_unaligned_as`].
    ///
    /// # Safety
    /// `ptr` must be valid for writing `N` values of `U` and aligned to
    /// [`Self::ALIGN`] (and `U`).
    #[inline]
    pub unsafe fn store_aligned_as<U>(self, ptr: *mut U)
    where
        T: AsPrimitive<U>,
        U: Copy + 'static,
    {
        debug_assert!(is_aligned(ptr, Self::ALIGN), "misaligned store_aligned_as");
        for (i, lane) in self.to_array().into_iter().enumerate() {
            unsafe { ptr.add(i).write(lane.as_()) };
        }
    }

    /// Safe form of [`Self::load_unaligned_as`].
    ///
    /// # Panics
    /// If `slice` holds fewer than `N` values.
    #[inline]
    pub fn from_slice_as<U>(slice: &[U]) -> Self
    where
        U: AsPrimitive<T>,
    {
        assert!(
            slice.len() >= N,
            "slice of length {} is shorter than {} lanes",
            slice.len(),
            N
        );
        Self::from_array(array::from_fn(|i| slice[i].as_()))
    }

    /// Safe form of [`Self::store_unaligned_as`].
    ///
    /// # Panics
    /// If `slice` holds fewer than `N` values.
    #[inline]
    pub fn store_slice_as<U>(self, slice: &mut [U])
    where
        T: AsPrimitive<U>,
        U: Copy + 'static,
    {
        assert!(
            slice.len() >= N,
            "slice of length {} is shorter than {} lanes",
            slice.len(),
            N
        );
        for (dst, lane) in slice.iter_mut().zip(self.to_array()) {
            *dst = lane.as_();
        }
    }

    // =========================================================================
    // Comparison
    // =========================================================================

    #[inline(always)]
    pub fn eq(self, rhs: Self) -> BatchBool<T, N> {
        BatchBool::from_reg(<KernelOf<T, N> as Kernel<T, N>>::eq(self.reg, rhs.reg))
    }

    #[inline(always)]
    pub fn ne(self, rhs: Self) -> BatchBool<T, N> {
        BatchBool::from_reg(<KernelOf<T, N> as Kernel<T, N>>::ne(self.reg, rhs.reg))
    }

    #[inline(always)]
    pub fn lt(self, rhs: Self) -> BatchBool<T, N> {
        BatchBool::from_reg(<KernelOf<T, N> as Kernel<T, N>>::lt(self.reg, rhs.reg))
    }

    #[inline(always)]
    pub fn le(self, rhs: Self) -> BatchBool<T, N> {
        BatchBool::from_reg(<KernelOf<T, N> as Kernel<T, N>>::le(self.reg, rhs.reg))
    }

    #[inline(always)]
    pub fn gt(self, rhs: Self) -> BatchBool<T, N> {
        rhs.lt(self)
    }

    #[inline(always)]
    pub fn ge(self, rhs: Self) -> BatchBool<T, N> {
        rhs.le(self)
    }
}

#[inline(always)]
fn is_aligned<P>(ptr: *const P, align: usize) -> bool {
    let align = align.max(core::mem::align_of::<P>());
    (ptr as usize) % align == 0
}

impl<T: Registered<N>, const N: usize> Default for Batch<T, N> {
    #[inline(always)]
    fn default() -> Self {
        Self::splat(T::ZERO)
    }
}

impl<T: Registered<N>, const N: usize> From<[T; N]> for Batch<T, N> {
    #[inline(always)]
    fn from(lanes: [T; N]) -> Self {
        Self::from_array(lanes)
    }
}

impl<T: Registered<N>, const N: usize> From<Batch<T, N>> for [T; N] {
    #[inline(always)]
    fn from(batch: Batch<T, N>) -> Self {
        batch.to_array()
    }
}

/// True lanes become `1`, false lanes `0`.
impl<T: Registered<N>, const N: usize> From<BatchBool<T, N>> for Batch<T, N> {
    #[inline(always)]
    fn from(mask: BatchBool<T, N>) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::select(
            mask.mask,
            <KernelOf<T, N> as Kernel<T, N>>::splat(T::ONE),
            <KernelOf<T, N> as Kernel<T, N>>::splat(T::ZERO),
        ))
    }
}

/// True when every lane compares equal, so a NaN lane never equals itself.
impl<T: Registered<N>, const N: usize> PartialEq for Batch<T, N> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Batch::eq(*self, *other).all()
    }
}

impl<T: Registered<N>, const N: usize> fmt::Debug for Batch<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Batch").field(&self.to_array()).finish()
    }
}

// ============================================================================
// Operators
// ============================================================================

macro_rules! impl_binary_op {
    ($Op:ident, $method:ident, $OpAssign:ident, $assign:ident) => {
        impl<T: Registered<N>, const N: usize> $Op for Batch<T, N> {
            type Output = Self;
            #[inline(always)]
            fn $method(self, rhs: Self) -> Self {
                Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::$method(self.reg, rhs.reg))
            }
        }

        /// Broadcasts the scalar operand.
        impl<T: Registered<N>, const N: usize> $Op<T> for Batch<T, N> {
            type Output = Self;
            #[inline(always)]
            fn $method(self, rhs: T) -> Self {
                $Op::$method(self, Self::splat(rhs))
            }
        }

        impl<T: Registered<N>, const N: usize> $OpAssign for Batch<T, N> {
            #[inline(always)]
            fn $assign(&mut self, rhs: Self) {
                *self = $Op::$method(*self, rhs);
            }
        }

        impl<T: Registered<N>, const N: usize> $OpAssign<T> for Batch<T, N> {
            #[inline(always)]
            fn $assign(&mut self, rhs: T) {
                *self = $Op::$method(*self, Self::splat(rhs));
            }
        }
    };
}

impl_binary_op!(Add, add, AddAssign, add_assign);
impl_binary_op!(Sub, sub, SubAssign, sub_assign);
impl_binary_op!(Mul, mul, MulAssign, mul_assign);
impl_binary_op!(Div, div, DivAssign, div_assign);
impl_binary_op!(Rem, rem, RemAssign, rem_assign);
impl_binary_op!(BitAnd, bitand, BitAndAssign, bitand_assign);
impl_binary_op!(BitOr, bitor, BitOrAssign, bitor_assign);
impl_binary_op!(BitXor, bitxor, BitXorAssign, bitxor_assign);

impl<T: Registered<N>, const N: usize> Neg for Batch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::neg(self.reg))
    }
}

/// Bitwise complement, on the bit pattern for float lanes too.
impl<T: Registered<N>, const N: usize> Not for Batch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::not(self.reg))
    }
}
