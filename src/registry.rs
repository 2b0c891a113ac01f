//! Compile-time `(T, N) -> Kernel` resolution.
//!
//! Every supported pair implements [`Registered<N>`] exactly once, so an
//! unsupported pair is a type error at the use site. Which kernel a pair
//! gets is decided by `cfg` on the compilation target:
//!
//! | target                  | 16-byte pairs | everything else |
//! |-------------------------|---------------|-----------------|
//! | `x86_64` + `sse2`       | `Sse2`        | `Fallback`      |
//! | anything else           | `Fallback`    | `Fallback`      |

use core::mem::size_of;

use serde::Serialize;

use crate::backends::fallback::Fallback;
use crate::element::Element;
use crate::kernel::{Kernel, MaskStorage, Storage};

/// Lane counts every element type is registered for.
pub const LANE_COUNTS: [usize; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Resolves the kernel for `(Self, N)`.
pub trait Registered<const N: usize>: Element {
    type Kernel: Kernel<Self, N>;
}

/// The resolved kernel for `(T, N)`.
pub type KernelOf<T, const N: usize> = <T as Registered<N>>::Kernel;

/// Static description of one registered `(T, N)` pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraitsEntry {
    pub value_type: &'static str,
    pub lanes: usize,
    /// Bytes occupied by the lanes.
    pub size: usize,
    /// Required alignment of aligned loads and stores, 0 for none.
    pub align: usize,
    pub storage: Storage,
    pub mask_storage: MaskStorage,
    /// Type the kernel keeps a `BatchBool` in.
    pub mask_type: &'static str,
    pub kernel: &'static str,
}

impl TraitsEntry {
    pub const fn of<T: Registered<N>, const N: usize>() -> Self {
        Self {
            value_type: T::NAME,
            lanes: N,
            size: size_of::<T>() * N,
            align: <KernelOf<T, N> as Kernel<T, N>>::ALIGN,
            storage: <KernelOf<T, N> as Kernel<T, N>>::STORAGE,
            mask_storage: <KernelOf<T, N> as Kernel<T, N>>::MASK_STORAGE,
            mask_type: <KernelOf<T, N> as Kernel<T, N>>::MASK_TYPE,
            kernel: <KernelOf<T, N> as Kernel<T, N>>::NAME,
        }
    }

    /// Whether this pair runs on something other than the fallback.
    pub fn is_accelerated(&self) -> bool {
        self.kernel != <Fallback as Kernel<u8, 1>>::NAME
    }
}

macro_rules! register {
    ($kernel:ty => $($t:ty: [$($n:literal),*]);* $(;)?) => {
        $($(
            impl Registered<$n> for $t {
                type Kernel = $kernel;
            }
        )*)*
    };
}

#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
mod resolved {
    use super::Registered;
    use crate::backends::fallback::Fallback;
    use crate::backends::x86::Sse2;

    register!(Sse2 =>
        i8: [16]; u8: [16];
        i16: [8]; u16: [8];
        i32: [4]; u32: [4]; f32: [4];
        i64: [2]; u64: [2]; f64: [2];
    );

    register!(Fallback =>
        i8: [1, 2, 4, 8, 32, 64]; u8: [1, 2, 4, 8, 32, 64];
        i16: [1, 2, 4, 16, 32, 64]; u16: [1, 2, 4, 16, 32, 64];
        i32: [1, 2, 8, 16, 32, 64]; u32: [1, 2, 8, 16, 32, 64]; f32: [1, 2, 8, 16, 32, 64];
        i64: [1, 4, 8, 16, 32, 64]; u64: [1, 4, 8, 16, 32, 64]; f64: [1, 4, 8, 16, 32, 64];
    );
}

#[cfg(not(all(target_arch = "x86_64", target_feature = "sse2")))]
mod resolved {
    use super::Registered;
    use crate::backends::fallback::Fallback;

    register!(Fallback =>
        i8: [1, 2, 4, 8, 16, 32, 64]; u8: [1, 2, 4, 8, 16, 32, 64];
        i16: [1, 2, 4, 8, 16, 32, 64]; u16: [1, 2, 4, 8, 16, 32, 64];
        i32: [1, 2, 4, 8, 16, 32, 64]; u32: [1, 2, 4, 8, 16, 32, 64];
        i64: [1, 2, 4, 8, 16, 32, 64]; u64: [1, 2, 4, 8, 16, 32, 64];
        f32: [1, 2, 4, 8, 16, 32, 64]; f64: [1, 2, 4, 8, 16, 32, 64];
    );
}

macro_rules! entries {
    ($($t:ty),*) => {
        &[$(
            TraitsEntry::of::<$t, 1>(),
            TraitsEntry::of::<$t, 2>(),
            TraitsEntry::of::<$t, 4>(),
            TraitsEntry::of::<$t, 8>(),
            TraitsEntry::of::<$t, 16>(),
            TraitsEntry::of::<$t, 32>(),
            TraitsEntry::of::<$t, 64>(),
        )*]
    };
}

/// Every registered pair, grouped by element type in [`LANE_COUNTS`] order.
pub static ENTRIES: &[TraitsEntry] = entries!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

/// Looks up the entry for a type name and lane count.
pub fn lookup(value_type: &str, lanes: usize) -> Option<&'static TraitsEntry> {
    ENTRIES
        .iter()
        .find(|e| e.value_type == value_type && e.lanes == lanes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_is_registered_once() {
        assert_eq!(ENTRIES.len(), 10 * LANE_COUNTS.len());
        for e in ENTRIES {
            let dupes = ENTRIES
                .iter()
                .filter(|o| o.value_type == e.value_type && o.lanes == e.lanes)
                .count();
            assert_eq!(dupes, 1, "{} x {}", e.value_type, e.lanes);
        }
    }

    #[test]
    fn entry_sizes_follow_lane_width() {
        let e = lookup("f64", 8).unwrap();
        assert_eq!(e.size, 64);
        let e = lookup("u8", 1).unwrap();
        assert_eq!(e.size, 1);
        assert!(lookup("f16", 4).is_none());
    }

    #[test]
    fn fallback_pairs_have_no_alignment_requirement() {
        let e = TraitsEntry::of::<i32, 32>();
        assert_eq!(e.kernel, "fallback");
        assert_eq!(e.align, 0);
        assert_eq!(e.storage, Storage::Array);
        assert_eq!(e.mask_storage, MaskStorage::Bits);
        assert_eq!(e.mask_type, "u64");
        assert!(!e.is_accelerated());
    }

    #[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
    #[test]
    fn sixteen_byte_pairs_resolve_to_sse2() {
        for e in ENTRIES.iter().filter(|e| e.size == 16) {
            assert_eq!(e.kernel, "sse2", "{} x {}", e.value_type, e.lanes);
            assert_eq!(e.align, 16);
            assert_eq!(e.mask_type, "__m128i");
            assert!(e.is_accelerated());
        }
    }
}
