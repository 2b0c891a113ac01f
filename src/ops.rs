//! Free functions over batches. Each one forwards to the resolved kernel.

use core::array;

use crate::batch::Batch;
use crate::convert::{FloatConvert, IntConvert};
use crate::element::FloatElement;
use crate::kernel::Kernel;
use crate::mask::BatchBool;
use crate::registry::{KernelOf, Registered};

macro_rules! unary {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[inline(always)]
        pub fn $name<T: Registered<N>, const N: usize>(a: Batch<T, N>) -> Batch<T, N> {
            Batch::from_reg(<KernelOf<T, N> as Kernel<T, N>>::$name(a.reg))
        }
    };
}

macro_rules! binary {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[inline(always)]
        pub fn $name<T: Registered<N>, const N: usize>(
            a: Batch<T, N>,
            b: Batch<T, N>,
        ) -> Batch<T, N> {
            Batch::from_reg(<KernelOf<T, N> as Kernel<T, N>>::$name(a.reg, b.reg))
        }
    };
}

macro_rules! ternary {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[inline(always)]
        pub fn $name<T: Registered<N>, const N: usize>(
            a: Batch<T, N>,
            b: Batch<T, N>,
            c: Batch<T, N>,
        ) -> Batch<T, N> {
            Batch::from_reg(<KernelOf<T, N> as Kernel<T, N>>::$name(a.reg, b.reg, c.reg))
        }
    };
}

macro_rules! float_unary {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[inline(always)]
        pub fn $name<T, const N: usize>(a: Batch<T, N>) -> Batch<T, N>
        where
            T: Registered<N> + FloatElement,
        {
            Batch::from_reg(<KernelOf<T, N> as Kernel<T, N>>::$name(a.reg))
        }
    };
}

macro_rules! float_binary {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[inline(always)]
        pub fn $name<T, const N: usize>(a: Batch<T, N>, b: Batch<T, N>) -> Batch<T, N>
        where
            T: Registered<N> + FloatElement,
        {
            Batch::from_reg(<KernelOf<T, N> as Kernel<T, N>>::$name(a.reg, b.reg))
        }
    };
}

unary!(
    /// Wrapping for integers (`abs(MIN) == MIN`), sign-clearing for floats.
    abs
);
binary!(
    /// `b` where `b < a`, else `a`.
    min
);
binary!(
    /// `b` where `a < b`, else `a`.
    max
);
binary!(
    /// Add clamped to `[T::MIN, T::MAX]`.
    sadd
);
binary!(
    /// Subtract clamped to `[T::MIN, T::MAX]`.
    ssub
);
binary!(
    /// `a & !b`, on the bit pattern.
    andnot
);
binary!(zip_lo);
binary!(zip_hi);
ternary!(
    /// `a * b + c` with one rounding for floats; wrapping for integers.
    fma
);
ternary!(
    /// `a * b - c`.
    fms
);
ternary!(
    /// `-(a * b) + c`.
    fnma
);
ternary!(
    /// `-(a * b) - c`.
    fnms
);

float_unary!(sqrt);
float_unary!(
    /// Clears the sign bit.
    fabs
);
float_binary!(
    /// Minimum that ignores a NaN operand.
    fmin
);
float_binary!(
    /// Maximum that ignores a NaN operand.
    fmax
);

/// Sum of all lanes, folded as `[v0+v1, v2+v3, ...]` per level.
#[inline(always)]
pub fn hadd<T: Registered<N>, const N: usize>(a: Batch<T, N>) -> T {
    <KernelOf<T, N> as Kernel<T, N>>::hadd(a.reg)
}

/// Lane `i` of the result is `hadd(rows[i])`.
#[inline(always)]
pub fn haddp<T: Registered<N>, const N: usize>(rows: &[Batch<T, N>; N]) -> Batch<T, N> {
    let regs = array::from_fn(|i| rows[i].reg);
    Batch::from_reg(<KernelOf<T, N> as Kernel<T, N>>::haddp(&regs))
}

/// `cond[i] ? a[i] : b[i]`.
#[inline(always)]
pub fn select<T: Registered<N>, const N: usize>(
    cond: BatchBool<T, N>,
    a: Batch<T, N>,
    b: Batch<T, N>,
) -> Batch<T, N> {
    Batch::from_reg(<KernelOf<T, N> as Kernel<T, N>>::select(cond.mask, a.reg, b.reg))
}

/// Always false for integer lanes.
#[inline(always)]
pub fn isnan<T: Registered<N>, const N: usize>(a: Batch<T, N>) -> BatchBool<T, N> {
    BatchBool::from_reg(<KernelOf<T, N> as Kernel<T, N>>::isnan(a.reg))
}

#[inline]
pub fn to_int<T, const N: usize>(a: Batch<T, N>) -> Batch<T::Int, N>
where
    T: Registered<N> + FloatConvert,
    T::Int: Registered<N>,
{
    a.to_int()
}

#[inline]
pub fn to_float<T, const N: usize>(a: Batch<T, N>) -> Batch<T::Float, N>
where
    T: Registered<N> + IntConvert,
    T::Float: Registered<N>,
{
    a.to_float()
}

#[inline]
pub fn bitwise_cast<U, const M: usize, T, const N: usize>(a: Batch<T, N>) -> Batch<U, M>
where
    T: Registered<N>,
    U: Registered<M>,
{
    a.bitwise_cast::<U, M>()
}

#[inline]
pub fn bool_cast<U, T, const N: usize>(m: BatchBool<T, N>) -> BatchBool<U, N>
where
    T: Registered<N>,
    U: Registered<N>,
{
    m.bool_cast::<U>()
}
