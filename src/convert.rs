//! Value conversions and bit reinterpretation between batches.
//!
//! [`Batch::to_int`], [`Batch::to_float`] and [`Batch::convert`] change the
//! representation lane by lane and keep the numeric value as far as Rust's
//! `as` does (float to int truncates toward zero, saturates, NaN becomes 0).
//! [`Batch::bitwise_cast`] keeps the bytes and changes only the type.

use core::mem::size_of;

use num_traits::AsPrimitive;

use crate::batch::Batch;
use crate::element::{FloatElement, IntElement};
use crate::mask::BatchBool;
use crate::registry::Registered;

/// Float lanes with a same-width signed integer counterpart.
pub trait FloatConvert: FloatElement {
    type Int: IntElement;
    fn lane_to_int(self) -> Self::Int;
}

/// Integer lanes with a same-width float counterpart.
pub trait IntConvert: IntElement {
    type Float: FloatElement;
    fn lane_to_float(self) -> Self::Float;
}

macro_rules! impl_convert_pair {
    ($float:ty, $int:ty) => {
        impl FloatConvert for $float {
            type Int = $int;
            #[inline(always)]
            fn lane_to_int(self) -> $int {
                self as $int
            }
        }

        impl IntConvert for $int {
            type Float = $float;
            #[inline(always)]
            fn lane_to_float(self) -> $float {
                self as $float
            }
        }
    };
}

impl_convert_pair!(f32, i32);
impl_convert_pair!(f64, i64);

impl IntConvert for u32 {
    type Float = f32;
    #[inline(always)]
    fn lane_to_float(self) -> f32 {
        self as f32
    }
}

impl IntConvert for u64 {
    type Float = f64;
    #[inline(always)]
    fn lane_to_float(self) -> f64 {
        self as f64
    }
}

impl<T, const N: usize> Batch<T, N>
where
    T: Registered<N> + FloatConvert,
    T::Int: Registered<N>,
{
    /// Per-lane `as` cast to the same-width signed integer.
    #[inline]
    pub fn to_int(self) -> Batch<T::Int, N> {
        Batch::from_array(self.to_array().map(T::lane_to_int))
    }
}

impl<T, const N: usize> Batch<T, N>
where
    T: Registered<N> + IntConvert,
    T::Float: Registered<N>,
{
    /// Per-lane `as` cast to the same-width float.
    #[inline]
    pub fn to_float(self) -> Batch<T::Float, N> {
        Batch::from_array(self.to_array().map(T::lane_to_float))
    }
}

impl<T: Registered<N>, const N: usize> Batch<T, N> {
    /// Per-lane `as` cast to any other lane type.
    #[inline]
    pub fn convert<U>(self) -> Batch<U, N>
    where
        U: Registered<N>,
        T: AsPrimitive<U>,
    {
        Batch::from_array(self.to_array().map(|lane| lane.as_()))
    }

    /// Reinterprets the bytes of `self` as `M` lanes of `U`.
    ///
    /// Both sides must hold the same number of bytes; a mismatch fails to
    /// compile. Casting back to `(T, N)` restores `self` exactly.
    #[inline]
    pub fn bitwise_cast<U: Registered<M>, const M: usize>(self) -> Batch<U, M> {
        const {
            assert!(
                size_of::<T>() * N == size_of::<U>() * M,
                "bitwise_cast between batches of different byte size"
            )
        };
        let lanes: [U; M] = bytemuck::cast(self.to_array());
        Batch::from_array(lanes)
    }
}

impl<T: Registered<N>, const N: usize> BatchBool<T, N> {
    /// Relabels the mask for another lane type of the same lane count.
    #[inline]
    pub fn bool_cast<U: Registered<N>>(self) -> BatchBool<U, N> {
        BatchBool::from_array(self.to_array())
    }
}
