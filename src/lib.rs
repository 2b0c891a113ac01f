//! # xbatch
//!
//! Fixed-width SIMD batch values that give the same bits on every target.
//!
//! `Batch<T, N>` holds `N` lanes of `T`. Which kernel executes its
//! operations is resolved at compile time from `(T, N)`:
//!
//! - `Fallback`: plain arrays and scalar loops. The reference semantics.
//! - `Sse2`: one 128-bit register, for the 16-byte pairs on `x86_64`.
//!
//! Every kernel must match the fallback bit for bit, saturation boundaries
//! and NaN handling included; `conformance` checks that.
//!
//! ```
//! use xbatch::{ops, Batch};
//!
//! let a = Batch::<i32, 4>::from_array([1, 2, 3, 4]);
//! let b = Batch::<i32, 4>::from_array([10, 20, 30, 40]);
//! assert_eq!((a + b).to_array(), [11, 22, 33, 44]);
//! assert_eq!(ops::hadd(a), 10);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod backends;
pub mod batch;
pub mod complex;
pub mod config;
pub mod conformance;
pub mod convert;
pub mod element;
pub mod kernel;
pub mod mask;
pub mod ops;
pub mod platform;
pub mod registry;
mod shift;

pub use batch::Batch;
pub use complex::ComplexBatch;
pub use convert::{FloatConvert, IntConvert};
pub use element::{Element, FloatElement, IntElement};
pub use kernel::Kernel;
pub use mask::BatchBool;
pub use num_complex::Complex;
pub use registry::{Registered, TraitsEntry};
