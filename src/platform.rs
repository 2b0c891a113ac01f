//! CPU feature reporting.
//!
//! Kernel selection itself is compile-time (see [`crate::registry`]). This
//! module reports what the build targeted, what the running CPU offers, and
//! which kernel each registered pair resolved to.

use bitflags::bitflags;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::kernel::Kernel;
use crate::registry::{KernelOf, Registered, TraitsEntry, ENTRIES};

bitflags! {
    /// SIMD instruction set extensions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CpuFeatures: u32 {
        const SSE2 = 1 << 0;
        const SSE3 = 1 << 1;
        const SSSE3 = 1 << 2;
        const SSE4_1 = 1 << 3;
        const SSE4_2 = 1 << 4;
        const AVX = 1 << 5;
        const AVX2 = 1 << 6;
        const FMA = 1 << 7;
        const AVX512F = 1 << 8;
        const NEON = 1 << 9;
    }
}

impl CpuFeatures {
    /// Space-separated lowercase names, `none` when empty.
    pub fn names(self) -> String {
        if self.is_empty() {
            return "none".to_string();
        }
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

static DETECTED: Lazy<CpuFeatures> = Lazy::new(|| {
    let detected = detect();
    info!("Detected CPU features: {}", detected.names());

    let missing = compiled() - detected;
    if !missing.is_empty() {
        warn!(
            "Build targets features the CPU does not report: {}",
            missing.names()
        );
    }

    let accelerated = ENTRIES.iter().filter(|e| e.is_accelerated()).count();
    debug!(
        "{} of {} registered (type, lanes) pairs use an accelerated kernel",
        accelerated,
        ENTRIES.len()
    );
    detected
});

/// Features of the running CPU, detected once.
pub fn detected() -> CpuFeatures {
    *DETECTED
}

#[cfg(target_arch = "x86_64")]
fn detect() -> CpuFeatures {
    let mut f = CpuFeatures::empty();
    f.set(CpuFeatures::SSE2, std::is_x86_feature_detected!("sse2"));
    f.set(CpuFeatures::SSE3, std::is_x86_feature_detected!("sse3"));
    f.set(CpuFeatures::SSSE3, std::is_x86_feature_detected!("ssse3"));
    f.set(CpuFeatures::SSE4_1, std::is_x86_feature_detected!("sse4.1"));
    f.set(CpuFeatures::SSE4_2, std::is_x86_feature_detected!("sse4.2"));
    f.set(CpuFeatures::AVX, std::is_x86_feature_detected!("avx"));
    f.set(CpuFeatures::AVX2, std::is_x86_feature_detected!("avx2"));
    f.set(CpuFeatures::FMA, std::is_x86_feature_detected!("fma"));
    f.set(CpuFeatures::AVX512F, std::is_x86_feature_detected!("avx512f"));
    f
}

#[cfg(target_arch = "aarch64")]
fn detect() -> CpuFeatures {
    let mut f = CpuFeatures::empty();
    f.set(CpuFeatures::NEON, std::arch::is_aarch64_feature_detected!("neon"));
    f
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect() -> CpuFeatures {
    CpuFeatures::empty()
}

/// Features the build was compiled to assume.
pub const fn compiled() -> CpuFeatures {
    let mut bits = 0;
    if cfg!(target_feature = "sse2") {
        bits |= CpuFeatures::SSE2.bits();
    }
    if cfg!(target_feature = "sse3") {
        bits |= CpuFeatures::SSE3.bits();
    }
    if cfg!(target_feature = "ssse3") {
        bits |= CpuFeatures::SSSE3.bits();
    }
    if cfg!(target_feature = "sse4.1") {
        bits |= CpuFeatures::SSE4_1.bits();
    }
    if cfg!(target_feature = "sse4.2") {
        bits |= CpuFeatures::SSE4_2.bits();
    }
    if cfg!(target_feature = "avx") {
        bits |= CpuFeatures::AVX.bits();
    }
    if cfg!(target_feature = "avx2") {
        bits |= CpuFeatures::AVX2.bits();
    }
    if cfg!(target_feature = "fma") {
        bits |= CpuFeatures::FMA.bits();
    }
    if cfg!(target_feature = "avx512f") {
        bits |= CpuFeatures::AVX512F.bits();
    }
    if cfg!(target_feature = "neon") {
        bits |= CpuFeatures::NEON.bits();
    }
    CpuFeatures::from_bits_truncate(bits)
}

/// Name of the kernel the registry resolved for `(T, N)`.
pub fn kernel_name<T: Registered<N>, const N: usize>() -> &'static str {
    <KernelOf<T, N> as Kernel<T, N>>::NAME
}

/// Build and runtime summary.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryReport {
    pub arch: &'static str,
    pub compiled: CpuFeatures,
    pub detected: CpuFeatures,
    pub entries: &'static [TraitsEntry],
}

impl RegistryReport {
    pub fn accelerated(&self) -> impl Iterator<Item = &TraitsEntry> + '_ {
        self.entries.iter().filter(|e| e.is_accelerated())
    }
}

pub fn registry_report() -> RegistryReport {
    RegistryReport {
        arch: std::env::consts::ARCH,
        compiled: compiled(),
        detected: detected(),
        entries: ENTRIES,
    }
}
