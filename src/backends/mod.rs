//! Kernel implementations.
//!
//! `fallback` is the scalar reference and supports every `(T, N)` pair.
//! Architecture kernels are compiled in only where their instruction set is.

pub mod fallback;

#[cfg(target_arch = "x86_64")]
pub mod x86;
