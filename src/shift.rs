//! `<<` and `>>` for integer batches.
//!
//! The amount is either one `u32` for every lane or a batch of per-lane
//! amounts. `>>` is arithmetic on signed lanes and logical on unsigned.
//! Amounts at or above the lane width are a contract violation: debug builds
//! assert, release builds leave the lane value unspecified.

use core::ops::{Shl, ShlAssign, Shr, ShrAssign};

use crate::batch::Batch;
use crate::element::IntElement;
use crate::kernel::Kernel;
use crate::registry::{KernelOf, Registered};

impl<T: Registered<N> + IntElement, const N: usize> Shl<u32> for Batch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn shl(self, amount: u32) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::shl(self.reg, amount))
    }
}

impl<T: Registered<N> + IntElement, const N: usize> Shr<u32> for Batch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn shr(self, amount: u32) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::shr(self.reg, amount))
    }
}

impl<T: Registered<N> + IntElement, const N: usize> Shl for Batch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn shl(self, amounts: Self) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::shl_lanes(self.reg, amounts.reg))
    }
}

impl<T: Registered<N> + IntElement, const N: usize> Shr for Batch<T, N> {
    type Output = Self;
    #[inline(always)]
    fn shr(self, amounts: Self) -> Self {
        Self::from_reg(<KernelOf<T, N> as Kernel<T, N>>::shr_lanes(self.reg, amounts.reg))
    }
}

impl<T: Registered<N> + IntElement, const N: usize> ShlAssign<u32> for Batch<T, N> {
    #[inline(always)]
    fn shl_assign(&mut self, amount: u32) {
        *self = *self << amount;
    }
}

impl<T: Registered<N> + IntElement, const N: usize> ShrAssign<u32> for Batch<T, N> {
    #[inline(always)]
    fn shr_assign(&mut self, amount: u32) {
        *self = *self >> amount;
    }
}

impl<T: Registered<N> + IntElement, const N: usize> ShlAssign for Batch<T, N> {
    #[inline(always)]
    fn shl_assign(&mut self, amounts: Self) {
        *self = *self << amounts;
    }
}

impl<T: Registered<N> + IntElement, const N: usize> ShrAssign for Batch<T, N> {
    #[inline(always)]
    fn shr_assign(&mut self, amounts: Self) {
        *self = *self >> amounts;
    }
}
