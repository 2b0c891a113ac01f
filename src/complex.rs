//! Batches of complex numbers as a pair of real batches.
//!
//! Memory comes in two layouts with separate entry points:
//! interleaved (`re0, im0, re1, im1, ...`, i.e. a `[Complex<T>]`) and split
//! (one plane of real parts, one of imaginary parts).

use core::array;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_complex::Complex;

use crate::batch::Batch;
use crate::ops::{zip_hi, zip_lo};
use crate::registry::Registered;

/// `N` complex lanes held as a real batch and an imaginary batch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexBatch<T: Registered<N>, const N: usize> {
    pub real: Batch<T, N>,
    pub imag: Batch<T, N>,
}

impl<T: Registered<N>, const N: usize> ComplexBatch<T, N> {
    #[inline(always)]
    pub fn from_parts(real: Batch<T, N>, imag: Batch<T, N>) -> Self {
        Self { real, imag }
    }

    #[inline]
    pub fn splat(val: Complex<T>) -> Self {
        Self::from_parts(Batch::splat(val.re), Batch::splat(val.im))
    }

    #[inline]
    pub fn from_array(lanes: [Complex<T>; N]) -> Self {
        Self::from_parts(
            Batch::from_array(array::from_fn(|i| lanes[i].re)),
            Batch::from_array(array::from_fn(|i| lanes[i].im)),
        )
    }

    #[inline]
    pub fn to_array(self) -> [Complex<T>; N] {
        let re = self.real.to_array();
        let im = self.imag.to_array();
        array::from_fn(|i| Complex::new(re[i], im[i]))
    }

    /// Lane `i % N`.
    #[inline]
    pub fn get(self, i: usize) -> Complex<T> {
        Complex::new(self.real.get(i), self.imag.get(i))
    }

    #[inline(always)]
    pub fn real(self) -> Batch<T, N> {
        self.real
    }

    #[inline(always)]
    pub fn imag(self) -> Batch<T, N> {
        self.imag
    }

    #[inline(always)]
    pub fn conj(self) -> Self {
        Self::from_parts(self.real, -self.imag)
    }

    /// `re² + im²`.
    #[inline(always)]
    pub fn norm_sqr(self) -> Batch<T, N> {
        self.real * self.real + self.imag * self.imag
    }

    // =========================================================================
    // Interleaved layout
    // =========================================================================

    /// Splits `2N` interleaved scalars held in `lo` and `hi` into planes.
    ///
    /// `log2(N)` rounds of zip undo the interleave.
    #[inline]
    fn deinterleave(mut lo: Batch<T, N>, mut hi: Batch<T, N>) -> Self {
        for _ in 0..N.trailing_zeros() {
            (lo, hi) = (zip_lo(lo, hi), zip_hi(lo, hi));
        }
        Self::from_parts(lo, hi)
    }

    /// Loads the first `N` values of `data`.
    ///
    /// # Panics
    /// If `data` holds fewer than `N` values.
    #[inline]
    pub fn load_interleaved(data: &[Complex<T>]) -> Self {
        assert!(
            data.len() >= N,
            "slice of length {} is shorter than {} lanes",
            data.len(),
            N
        );
        let scalars: &[T] = bytemuck::cast_slice(&data[..N]);
        Self::deinterleave(
            Batch::from_slice(&scalars[..N]),
            Batch::from_slice(&scalars[N..]),
        )
    }

    /// Stores into the first `N` slots of `out`.
    ///
    /// # Panics
    /// If `out` holds fewer than `N` values.
    #[inline]
    pub fn store_interleaved(self, out: &mut [Complex<T>]) {
        assert!(
            out.len() >= N,
            "slice of length {} is shorter than {} lanes",
            out.len(),
            N
        );
        let scalars: &mut [T] = bytemuck::cast_slice_mut(&mut out[..N]);
        let (lo, hi) = scalars.split_at_mut(N);
        zip_lo(self.real, self.imag).store_slice(lo);
        zip_hi(self.real, self.imag).store_slice(hi);
    }

    /// # Safety
    /// `ptr` must be valid for reading `N` complex values and aligned to
    /// [`Batch::ALIGN`].
    #[inline]
    pub unsafe fn load_interleaved_aligned(ptr: *const Complex<T>) -> Self {
        let ptr = ptr.cast::<T>();
        unsafe { Self::deinterleave(Batch::load_aligned(ptr), Batch::load_aligned(ptr.add(N))) }
    }

    /// # Safety
    /// `ptr` must be valid for reading `N` complex values.
    #[inline]
    pub unsafe fn load_interleaved_unaligned(ptr: *const Complex<T>) -> Self {
        let ptr = ptr.cast::<T>();
        unsafe { Self::deinterleave(Batch::load_unaligned(ptr), Batch::load_unaligned(ptr.add(N))) }
    }

    /// # Safety
    /// `ptr` must be valid for writing `N` complex values and aligned to
    /// [`Batch::ALIGN`].
    #[inline]
    pub unsafe fn store_interleaved_aligned(self, ptr: *mut Complex<T>) {
        let ptr = ptr.cast::<T>();
        unsafe {
            zip_lo(self.real, self.imag).store_aligned(ptr);
            zip_hi(self.real, self.imag).store_aligned(ptr.add(N));
        }
    }

    /// # Safety
    /// `ptr` must be valid for writing `N` complex values.
    #[inline]
    pub unsafe fn store_interleaved_unaligned(self, ptr: *mut Complex<T>) {
        let ptr = ptr.cast::<T>();
        unsafe {
            zip_lo(self.real, self.imag).store_unaligned(ptr);
            zip_hi(self.real, self.imag).store_unaligned(ptr.add(N));
        }
    }

    // =========================================================================
    // Split layout
    // =========================================================================

    /// # Panics
    /// If either plane holds fewer than `N` values.
    #[inline]
    pub fn load_split(real: &[T], imag: &[T]) -> Self {
        Self::from_parts(Batch::from_slice(real), Batch::from_slice(imag))
    }

    /// # Panics
    /// If either plane holds fewer than `N` values.
    #[inline]
    pub fn store_split(self, real: &mut [T], imag: &mut [T]) {
        self.real.store_slice(real);
        self.imag.store_slice(imag);
    }

    /// # Safety
    /// Both pointers must be valid for reading `N` values and aligned to
    /// [`Batch::ALIGN`].
    #[inline]
    pub unsafe fn load_split_aligned(real: *const T, imag: *const T) -> Self {
        unsafe { Self::from_parts(Batch::load_aligned(real), Batch::load_aligned(imag)) }
    }

    /// # Safety
    /// Both pointers must be valid for reading `N` values.
    #[inline]
    pub unsafe fn load_split_unaligned(real: *const T, imag: *const T) -> Self {
        unsafe { Self::from_parts(Batch::load_unaligned(real), Batch::load_unaligned(imag)) }
    }

    /// # Safety
    /// Both pointers must be valid for writing `N` values and aligned to
    /// [`Batch::ALIGN`].
    #[inline]
    pub unsafe fn store_split_aligned(self, real: *mut T, imag: *mut T) {
        unsafe {
            self.real.store_aligned(real);
            self.imag.store_aligned(imag);
        }
    }

    /// # Safety
    /// Both pointers must be valid for writing `N` values.
    #[inline]
    pub unsafe fn store_split_unaligned(self, real: *mut T, imag: *mut T) {
        unsafe {
            self.real.store_unaligned(real);
            self.imag.store_unaligned(imag);
        }
    }
}

impl<T: Registered<N>, const N: usize> Default for ComplexBatch<T, N> {
    fn default() -> Self {
        Self::from_parts(Batch::default(), Batch::default())
    }
}

impl<T: Registered<N>, const N: usize> From<[Complex<T>; N]> for ComplexBatch<T, N> {
    fn from(lanes: [Complex<T>; N]) -> Self {
        Self::from_array(lanes)
    }
}

impl<T: Registered<N>, const N: usize> Add for ComplexBatch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::from_parts(self.real + rhs.real, self.imag + rhs.imag)
    }
}

impl<T: Registered<N>, const N: usize> Sub for ComplexBatch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::from_parts(self.real - rhs.real, self.imag - rhs.imag)
    }
}

impl<T: Registered<N>, const N: usize> Mul for ComplexBatch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        let (a, b) = (self, rhs);
        Self::from_parts(
            a.real * b.real - a.imag * b.imag,
            a.real * b.imag + a.imag * b.real,
        )
    }
}

/// Multiplies by the conjugate of the divisor over its squared modulus.
impl<T: Registered<N>, const N: usize> Div for ComplexBatch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        let (a, c) = (self, rhs);
        let d = c.real * c.real + c.imag * c.imag;
        Self::from_parts(
            (c.real * a.real + c.imag * a.imag) / d,
            (c.real * a.imag - c.imag * a.real) / d,
        )
    }
}

impl<T: Registered<N>, const N: usize> Neg for ComplexBatch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self::from_parts(-self.real, -self.imag)
    }
}

impl<T: Registered<N>, const N: usize> AddAssign for ComplexBatch<T, N> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: Registered<N>, const N: usize> SubAssign for ComplexBatch<T, N> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<T: Registered<N>, const N: usize> MulAssign for ComplexBatch<T, N> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<T: Registered<N>, const N: usize> DivAssign for ComplexBatch<T, N> {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}
