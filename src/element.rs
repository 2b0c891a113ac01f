//! Scalar lane types.
//!
//! Every lane operation a kernel performs is defined here once, per scalar
//! type, as the reference semantics. The fallback kernel maps these over an
//! array; accelerated kernels must reproduce them bit for bit.
//!
//! Integer `neg`, `add`, `sub` and `mul` wrap, which is what vector hardware
//! does lane-wise. Integer `div` and `rem` by zero panic like the scalar
//! operators; `MIN / -1` wraps.

use core::fmt::Debug;
use core::ops::{BitAnd, BitOr, BitXor, Not};

use bytemuck::Pod;
use num_traits::{Bounded, PrimInt};

mod sealed {
    pub trait Sealed {}
}

/// A scalar type that may occupy a batch lane.
pub trait Element:
    sealed::Sealed
    + Pod
    + Default
    + PartialEq
    + PartialOrd
    + Debug
    + Bounded
    + Send
    + Sync
    + 'static
{
    /// Unsigned integer of the same width, used for bitwise operations.
    type Bits: PrimInt
        + Pod
        + Debug
        + BitAnd<Output = Self::Bits>
        + BitOr<Output = Self::Bits>
        + BitXor<Output = Self::Bits>
        + Not<Output = Self::Bits>;

    const ZERO: Self;
    const ONE: Self;
    /// Width of the type in bits.
    const BITS: u32;
    const IS_FLOAT: bool;
    const IS_SIGNED: bool;
    /// Type name as it appears in registry reports.
    const NAME: &'static str;

    #[inline(always)]
    fn to_bits(self) -> Self::Bits {
        bytemuck::cast(self)
    }

    #[inline(always)]
    fn from_bits(bits: Self::Bits) -> Self {
        bytemuck::cast(bits)
    }

    fn lane_neg(self) -> Self;
    fn lane_add(self, rhs: Self) -> Self;
    fn lane_sub(self, rhs: Self) -> Self;
    fn lane_mul(self, rhs: Self) -> Self;
    fn lane_div(self, rhs: Self) -> Self;
    fn lane_rem(self, rhs: Self) -> Self;
    fn lane_sadd(self, rhs: Self) -> Self;
    fn lane_ssub(self, rhs: Self) -> Self;
    fn lane_abs(self) -> Self;
    /// `self * b + c`, fused for floats.
    fn lane_mul_add(self, b: Self, c: Self) -> Self;
    fn lane_is_nan(self) -> bool;

    /// `std::cmp::min` ordering: returns `self` unless `rhs < self`.
    #[inline(always)]
    fn lane_min(self, rhs: Self) -> Self {
        if rhs < self {
            rhs
        } else {
            self
        }
    }

    /// `std::cmp::max` ordering: returns `self` unless `self < rhs`.
    #[inline(always)]
    fn lane_max(self, rhs: Self) -> Self {
        if self < rhs {
            rhs
        } else {
            self
        }
    }
}

/// Integer lane types. Shifts are only defined here.
pub trait IntElement: Element + PrimInt {
    /// Shift left. `amount >= Self::BITS` is a contract violation.
    #[inline(always)]
    fn lane_shl(self, amount: u32) -> Self {
        debug_assert!(amount < Self::BITS, "shift amount {amount} out of range");
        self.unsigned_shl(amount)
    }

    /// Arithmetic shift for signed types, logical for unsigned.
    #[inline(always)]
    fn lane_shr(self, amount: u32) -> Self {
        debug_assert!(amount < Self::BITS, "shift amount {amount} out of range");
        if Self::IS_SIGNED {
            self.signed_shr(amount)
        } else {
            self.unsigned_shr(amount)
        }
    }

    /// Interprets a lane of a shift-amount batch as an amount.
    fn lane_amount(self) -> u32;
}

/// IEEE 754 lane types.
pub trait FloatElement: Element {
    const SIGN_MASK: Self::Bits;

    fn lane_sqrt(self) -> Self;

    /// Clears the sign bit.
    #[inline(always)]
    fn lane_fabs(self) -> Self {
        Self::from_bits(self.to_bits() & !Self::SIGN_MASK)
    }

    /// NaN-ignoring minimum.
    #[inline(always)]
    fn lane_fmin(self, rhs: Self) -> Self {
        if self.lane_is_nan() {
            rhs
        } else if rhs.lane_is_nan() {
            self
        } else {
            self.lane_min(rhs)
        }
    }

    /// NaN-ignoring maximum.
    #[inline(always)]
    fn lane_fmax(self, rhs: Self) -> Self {
        if self.lane_is_nan() {
            rhs
        } else if rhs.lane_is_nan() {
            self
        } else {
            self.lane_max(rhs)
        }
    }
}

macro_rules! impl_int_element {
    ($t:ty, $bits:ty, $signed:literal, $abs:path) => {
        impl sealed::Sealed for $t {}

        impl Element for $t {
            type Bits = $bits;

            const ZERO: Self = 0;
            const ONE: Self = 1;
            const BITS: u32 = <$t>::BITS;
            const IS_FLOAT: bool = false;
            const IS_SIGNED: bool = $signed;
            const NAME: &'static str = stringify!($t);

            #[inline(always)]
            fn lane_neg(self) -> Self {
                self.wrapping_neg()
            }
            #[inline(always)]
            fn lane_add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            #[inline(always)]
            fn lane_sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            #[inline(always)]
            fn lane_mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
            #[inline(always)]
            fn lane_div(self, rhs: Self) -> Self {
                self.wrapping_div(rhs)
            }
            #[inline(always)]
            fn lane_rem(self, rhs: Self) -> Self {
                self.wrapping_rem(rhs)
            }
            #[inline(always)]
            fn lane_sadd(self, rhs: Self) -> Self {
                self.saturating_add(rhs)
            }
            #[inline(always)]
            fn lane_ssub(self, rhs: Self) -> Self {
                self.saturating_sub(rhs)
            }
            #[inline(always)]
            fn lane_abs(self) -> Self {
                $abs(self)
            }
            #[inline(always)]
            fn lane_mul_add(self, b: Self, c: Self) -> Self {
                self.wrapping_mul(b).wrapping_add(c)
            }
            #[inline(always)]
            fn lane_is_nan(self) -> bool {
                false
            }
        }

        impl IntElement for $t {
            #[inline(always)]
            fn lane_amount(self) -> u32 {
                self as u32
            }
        }
    };
}

impl_int_element!(i8, u8, true, i8::wrapping_abs);
impl_int_element!(i16, u16, true, i16::wrapping_abs);
impl_int_element!(i32, u32, true, i32::wrapping_abs);
impl_int_element!(i64, u64, true, i64::wrapping_abs);
impl_int_element!(u8, u8, false, core::convert::identity);
impl_int_element!(u16, u16, false, core::convert::identity);
impl_int_element!(u32, u32, false, core::convert::identity);
impl_int_element!(u64, u64, false, core::convert::identity);

macro_rules! impl_float_element {
    ($t:ty, $bits:ty) => {
        impl sealed::Sealed for $t {}

        impl Element for $t {
            type Bits = $bits;

            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const BITS: u32 = <$bits>::BITS;
            const IS_FLOAT: bool = true;
            const IS_SIGNED: bool = true;
            const NAME: &'static str = stringify!($t);

            #[inline(always)]
            fn lane_neg(self) -> Self {
                -self
            }
            #[inline(always)]
            fn lane_add(self, rhs: Self) -> Self {
                self + rhs
            }
            #[inline(always)]
            fn lane_sub(self, rhs: Self) -> Self {
                self - rhs
            }
            #[inline(always)]
            fn lane_mul(self, rhs: Self) -> Self {
                self * rhs
            }
            #[inline(always)]
            fn lane_div(self, rhs: Self) -> Self {
                self / rhs
            }
            #[inline(always)]
            fn lane_rem(self, rhs: Self) -> Self {
                self % rhs
            }
            // Clamp to the finite range; NaN passes through both comparisons.
            #[inline(always)]
            fn lane_sadd(self, rhs: Self) -> Self {
                (self + rhs).lane_max(<$t>::MIN).lane_min(<$t>::MAX)
            }
            #[inline(always)]
            fn lane_ssub(self, rhs: Self) -> Self {
                (self - rhs).lane_max(<$t>::MIN).lane_min(<$t>::MAX)
            }
            #[inline(always)]
            fn lane_abs(self) -> Self {
                self.lane_fabs()
            }
            #[inline(always)]
            fn lane_mul_add(self, b: Self, c: Self) -> Self {
                self.mul_add(b, c)
            }
            #[inline(always)]
            fn lane_is_nan(self) -> bool {
                self.is_nan()
            }
        }

        impl FloatElement for $t {
            const SIGN_MASK: $bits = 1 << (<$bits>::BITS - 1);

            #[inline(always)]
            fn lane_sqrt(self) -> Self {
                self.sqrt()
            }
        }
    };
}

impl_float_element!(f32, u32);
impl_float_element!(f64, u64);
