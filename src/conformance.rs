//! Bit-exact comparison of the resolved kernels against the fallback.
//!
//! For one `(T, N)` pair, every kernel operation runs on the same inputs
//! through the registry-selected kernel and through [`Fallback`], and the
//! outputs are compared on their bit patterns, signed zeros included.
//! Operations that only move bits (select, zip, neg, abs, bitwise, min/max,
//! loads and stores) must also keep NaN payloads; for arithmetic any NaN
//! matches any NaN, as Rust does not specify the payload an arithmetic NaN
//! carries. Inputs are seeded random lanes plus, optionally, lanes cycled
//! through each type's boundary values.
//!
//! Inputs outside an operation's domain are rewritten before the call:
//! integer divisors of zero become one and shift amounts are reduced below
//! the lane width.

use std::fmt;

use log::{debug, trace, warn};
use num_traits::{NumCast, ToPrimitive};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::backends::fallback::Fallback;
use crate::config::CheckConfig;
use crate::element::{Element, FloatElement, IntElement};
use crate::kernel::Kernel;
use crate::registry::{KernelOf, Registered};

/// Three operands; unary and binary operations ignore the tail.
type Args<T, const N: usize> = [[T; N]; 3];

/// Lane types the checker can generate inputs for.
pub trait Sample: Element {
    fn random(rng: &mut StdRng) -> Self;
    /// Boundary values worth hitting in every lane position.
    fn edge_cases() -> Vec<Self>;
    /// Runs the integer-only or float-only operations.
    fn check_specific<const N: usize>(checker: &mut Checker<Self, N>)
    where
        Self: Registered<N>;
}

macro_rules! impl_int_sample {
    ($($t:ty),*) => {$(
        impl Sample for $t {
            fn random(rng: &mut StdRng) -> Self {
                // Small values make equal lanes and in-range products likely.
                if rng.gen_bool(0.25) {
                    rng.gen_range(0..16) as $t
                } else {
                    rng.gen()
                }
            }

            fn edge_cases() -> Vec<Self> {
                vec![
                    <$t>::MIN,
                    <$t>::MIN.wrapping_add(1),
                    <$t>::MAX,
                    <$t>::MAX - 1,
                    0,
                    1,
                    (0 as $t).wrapping_sub(1),
                    1 << (<$t>::BITS - 2),
                ]
            }

            fn check_specific<const N: usize>(checker: &mut Checker<Self, N>)
            where
                Self: Registered<N>,
            {
                check_int_ops(checker);
            }
        }
    )*};
}

impl_int_sample!(i8, u8, i16, u16, i32, u32, i64, u64);

macro_rules! impl_float_sample {
    ($($t:ty),*) => {$(
        impl Sample for $t {
            fn random(rng: &mut StdRng) -> Self {
                match rng.gen_range(0..4) {
                    // Arbitrary bit patterns: NaN payloads, subnormals, infinities.
                    0 => <$t>::from_bits(rng.gen()),
                    1 => rng.gen_range(-1.0..1.0),
                    2 => rng.gen_range(-1.0e6..1.0e6),
                    _ => rng.gen_range(-64i32..64) as $t,
                }
            }

            fn edge_cases() -> Vec<Self> {
                vec![
                    0.0,
                    -0.0,
                    1.0,
                    -1.0,
                    <$t>::MIN,
                    <$t>::MAX,
                    <$t>::MIN_POSITIVE,
                    <$t>::from_bits(1),
                    <$t>::EPSILON,
                    <$t>::INFINITY,
                    <$t>::NEG_INFINITY,
                    <$t>::NAN,
                    -<$t>::NAN,
                ]
            }

            fn check_specific<const N: usize>(checker: &mut Checker<Self, N>)
            where
                Self: Registered<N>,
            {
                check_float_ops(checker);
            }
        }
    )*};
}

impl_float_sample!(f32, f64);

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Mismatch {
    pub inputs: Vec<String>,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpReport {
    pub op: &'static str,
    pub cases: usize,
    pub mismatches: usize,
    /// The first few mismatches, up to `report.max_mismatches`.
    pub examples: Vec<Mismatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub value_type: &'static str,
    pub lanes: usize,
    pub kernel: &'static str,
    pub ops: Vec<OpReport>,
}

impl PairReport {
    pub fn cases(&self) -> usize {
        self.ops.iter().map(|o| o.cases).sum()
    }

    pub fn mismatches(&self) -> usize {
        self.ops.iter().map(|o| o.mismatches).sum()
    }

    pub fn passed(&self) -> bool {
        self.mismatches() == 0
    }

    pub fn op(&self, name: &str) -> Option<&OpReport> {
        self.ops.iter().find(|o| o.op == name)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConformanceReport {
    pub pairs: Vec<PairReport>,
}

impl ConformanceReport {
    pub fn passed(&self) -> bool {
        self.pairs.iter().all(PairReport::passed)
    }

    pub fn mismatches(&self) -> usize {
        self.pairs.iter().map(PairReport::mismatches).sum()
    }

    pub fn failed_pairs(&self) -> impl Iterator<Item = &PairReport> {
        self.pairs.iter().filter(|p| !p.passed())
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pair in &self.pairs {
            let name = format!("{}x{}", pair.value_type, pair.lanes);
            if pair.passed() {
                writeln!(
                    f,
                    "{:<8} {:<9} ok    {} ops, {} cases",
                    name,
                    pair.kernel,
                    pair.ops.len(),
                    pair.cases()
                )?;
                continue;
            }
            writeln!(
                f,
                "{:<8} {:<9} FAIL  {} mismatches",
                name,
                pair.kernel,
                pair.mismatches()
            )?;
            for op in pair.ops.iter().filter(|o| o.mismatches > 0) {
                writeln!(f, "    {}: {} of {} cases", op.op, op.mismatches, op.cases)?;
                for m in &op.examples {
                    writeln!(f, "      inputs   {}", m.inputs.join(" "))?;
                    writeln!(f, "      expected {}", m.expected)?;
                    writeln!(f, "      actual   {}", m.actual)?;
                }
            }
        }
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        write!(f, "{}: {} pairs, {} mismatches", verdict, self.pairs.len(), self.mismatches())
    }
}

// ============================================================================
// Checker
// ============================================================================

/// One observed result: bit patterns to compare plus a readable rendering.
pub struct Observed {
    bits: Vec<u64>,
    text: String,
}

fn bit_pattern<T: Element>(v: T) -> u64 {
    v.to_bits().to_u64().unwrap_or(u64::MAX)
}

/// Every lane's exact bit pattern.
pub fn lanes<T: Element, const N: usize>(v: [T; N]) -> Observed {
    Observed {
        bits: v.iter().map(|&l| bit_pattern(l)).collect(),
        text: format!("{:?}", v),
    }
}

/// Like [`lanes`], but any NaN equals any other NaN.
pub fn values<T: Element, const N: usize>(v: [T; N]) -> Observed {
    Observed {
        bits: v.iter().map(|&l| canonical(l)).collect(),
        text: format!("{:?}", v),
    }
}

/// A scalar result, NaN canonicalized.
pub fn value<T: Element>(v: T) -> Observed {
    Observed {
        bits: vec![canonical(v)],
        text: format!("{:?}", v),
    }
}

fn canonical<T: Element>(v: T) -> u64 {
    if v.lane_is_nan() {
        u64::MAX
    } else {
        bit_pattern(v)
    }
}

/// A lane mask of `n` lanes.
pub fn mask(bits: u64, n: usize) -> Observed {
    Observed {
        bits: vec![bits],
        text: format!("{:0width$b}", bits, width = n.min(64)),
    }
}

/// Runs operations for one `(T, N)` pair and collects an [`OpReport`] each.
pub struct Checker<T: Registered<N>, const N: usize> {
    inputs: Vec<[T; N]>,
    max_examples: usize,
    report: PairReport,
}

impl<T: Registered<N> + Sample, const N: usize> Checker<T, N> {
    pub fn new(config: &CheckConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut inputs: Vec<[T; N]> = (0..config.samples)
            .map(|_| core::array::from_fn(|_| T::random(&mut rng)))
            .collect();

        if config.include_edge_cases {
            let edges = T::edge_cases();
            // Every edge value in every lane, next to every other edge value.
            for shift in 0..edges.len() {
                for start in 0..edges.len() {
                    inputs.push(core::array::from_fn(|i| {
                        edges[(start + i * (shift + 1)) % edges.len()]
                    }));
                }
            }
        }

        Checker {
            inputs,
            max_examples: config.report.max_mismatches,
            report: PairReport {
                value_type: T::NAME,
                lanes: N,
                kernel: <KernelOf<T, N> as Kernel<T, N>>::NAME,
                ops: Vec::new(),
            },
        }
    }

    pub fn run(
        &mut self,
        op: &'static str,
        fast: impl Fn(Args<T, N>) -> Observed,
        reference: impl Fn(Args<T, N>) -> Observed,
    ) {
        self.run_with(op, |args| args, fast, reference)
    }

    /// Like [`Checker::run`], with `prepare` mapping raw inputs into the
    /// operation's domain first.
    pub fn run_with(
        &mut self,
        op: &'static str,
        prepare: impl Fn(Args<T, N>) -> Args<T, N>,
        fast: impl Fn(Args<T, N>) -> Observed,
        reference: impl Fn(Args<T, N>) -> Observed,
    ) {
        let len = self.inputs.len();
        let mut result = OpReport {
            op,
            cases: 0,
            mismatches: 0,
            examples: Vec::new(),
        };

        for i in 0..len {
            let args = prepare([
                self.inputs[i],
                self.inputs[(i + 1) % len],
                self.inputs[(i + 2) % len],
            ]);
            let expected = reference(args);
            let actual = fast(args);
            result.cases += 1;
            if expected.bits == actual.bits {
                continue;
            }

            result.mismatches += 1;
            if result.mismatches == 1 {
                warn!(
                    "{}x{} {}: {} returned {} where fallback returned {}",
                    T::NAME,
                    N,
                    op,
                    self.report.kernel,
                    actual.text,
                    expected.text
                );
            }
            if result.examples.len() < self.max_examples {
                result.examples.push(Mismatch {
                    inputs: args.iter().map(|a| format!("{:?}", a)).collect(),
                    expected: expected.text,
                    actual: actual.text,
                });
            }
        }

        trace!("{}x{} {}: {} cases", T::NAME, N, op, result.cases);
        self.report.ops.push(result);
    }

    pub fn finish(self) -> PairReport {
        debug!(
            "{}x{} on {}: {} ops, {} cases, {} mismatches",
            T::NAME,
            N,
            self.report.kernel,
            self.report.ops.len(),
            self.report.cases(),
            self.report.mismatches()
        );
        self.report
    }
}

type Fast<T, const N: usize> = KernelOf<T, N>;
type Reg<T, const N: usize> = <Fast<T, N> as Kernel<T, N>>::Reg;
type MaskReg<T, const N: usize> = <Fast<T, N> as Kernel<T, N>>::MaskReg;

fn fast1<T: Registered<N>, const N: usize>(
    a: [T; N],
    op: impl Fn(Reg<T, N>) -> Reg<T, N>,
) -> [T; N] {
    let k = <Fast<T, N> as Kernel<T, N>>::from_array;
    <Fast<T, N> as Kernel<T, N>>::to_array(op(k(a)))
}

fn fast2<T: Registered<N>, const N: usize>(
    a: [T; N],
    b: [T; N],
    op: impl Fn(Reg<T, N>, Reg<T, N>) -> Reg<T, N>,
) -> [T; N] {
    let k = <Fast<T, N> as Kernel<T, N>>::from_array;
    <Fast<T, N> as Kernel<T, N>>::to_array(op(k(a), k(b)))
}

fn fast3<T: Registered<N>, const N: usize>(
    a: [T; N],
    b: [T; N],
    c: [T; N],
    op: impl Fn(Reg<T, N>, Reg<T, N>, Reg<T, N>) -> Reg<T, N>,
) -> [T; N] {
    let k = <Fast<T, N> as Kernel<T, N>>::from_array;
    <Fast<T, N> as Kernel<T, N>>::to_array(op(k(a), k(b), k(c)))
}

fn fast_mask<T: Registered<N>, const N: usize>(
    a: [T; N],
    b: [T; N],
    op: impl Fn(Reg<T, N>, Reg<T, N>) -> MaskReg<T, N>,
) -> u64 {
    let k = <Fast<T, N> as Kernel<T, N>>::from_array;
    <Fast<T, N> as Kernel<T, N>>::mask_bits(op(k(a), k(b)))
}

// `$observe` is `lanes` for operations that only move bits and `values` for
// arithmetic, whose NaN payloads Rust leaves unspecified.

macro_rules! unary_op {
    ($c:expr, $op:ident, $observe:ident) => {
        $c.run(
            stringify!($op),
            |[a, _, _]| $observe(fast1(a, <Fast<T, N> as Kernel<T, N>>::$op)),
            |[a, _, _]| $observe(<Fallback as Kernel<T, N>>::$op(a)),
        )
    };
}

macro_rules! binary_op {
    ($c:expr, $op:ident, $observe:ident) => {
        binary_op!($c, $op, $observe, |args| args)
    };
    ($c:expr, $op:ident, $observe:ident, $prepare:expr) => {
        $c.run_with(
            stringify!($op),
            $prepare,
            |[a, b, _]| $observe(fast2(a, b, <Fast<T, N> as Kernel<T, N>>::$op)),
            |[a, b, _]| $observe(<Fallback as Kernel<T, N>>::$op(a, b)),
        )
    };
}

macro_rules! ternary_op {
    ($c:expr, $op:ident, $observe:ident) => {
        $c.run(
            stringify!($op),
            |[a, b, c]| $observe(fast3(a, b, c, <Fast<T, N> as Kernel<T, N>>::$op)),
            |[a, b, c]| $observe(<Fallback as Kernel<T, N>>::$op(a, b, c)),
        )
    };
}

macro_rules! compare_op {
    ($c:expr, $op:ident) => {
        $c.run(
            stringify!($op),
            |[a, b, _]| mask(fast_mask(a, b, <Fast<T, N> as Kernel<T, N>>::$op), N),
            |[a, b, _]| mask(<Fallback as Kernel<T, N>>::$op(a, b), N),
        )
    };
}

fn nonzero<T: Element, const N: usize>(v: [T; N]) -> [T; N] {
    v.map(|x| if x == T::ZERO { T::ONE } else { x })
}

/// Reduces each lane below `T::BITS` and makes it non-negative.
fn shift_amounts<T: IntElement, const N: usize>(v: [T; N]) -> [T; N] {
    v.map(|x| {
        let amount = x.lane_amount() % T::BITS;
        <T as NumCast>::from(amount).unwrap_or(T::ZERO)
    })
}

/// Operations every lane type has.
fn check_common<T: Registered<N> + Sample, const N: usize>(c: &mut Checker<T, N>) {
    c.run(
        "load_store",
        |[a, _, _]| {
            let mut out = [T::ZERO; N];
            unsafe {
                let reg = <Fast<T, N> as Kernel<T, N>>::load_unaligned(a.as_ptr());
                <Fast<T, N> as Kernel<T, N>>::store_unaligned(reg, out.as_mut_ptr());
            }
            lanes(out)
        },
        |[a, _, _]| lanes(a),
    );
    c.run(
        "load_store_aligned",
        |[a, _, _]| {
            let src = Aligned(a);
            let mut dst = Aligned([T::ZERO; N]);
            unsafe {
                let reg = <Fast<T, N> as Kernel<T, N>>::load_aligned(src.0.as_ptr());
                <Fast<T, N> as Kernel<T, N>>::store_aligned(reg, dst.0.as_mut_ptr());
            }
            lanes(dst.0)
        },
        |[a, _, _]| lanes(a),
    );
    c.run("splat", splat_case::<Fast<T, N>, T, N>, splat_case::<Fallback, T, N>);

    unary_op!(c, neg, lanes);
    unary_op!(c, abs, lanes);
    unary_op!(c, not, lanes);
    binary_op!(c, add, values);
    binary_op!(c, sub, values);
    binary_op!(c, mul, values);
    binary_op!(c, sadd, values);
    binary_op!(c, ssub, values);
    binary_op!(c, min, lanes);
    binary_op!(c, max, lanes);
    binary_op!(c, bitand, lanes);
    binary_op!(c, bitor, lanes);
    binary_op!(c, bitxor, lanes);
    binary_op!(c, andnot, lanes);
    binary_op!(c, zip_lo, lanes);
    binary_op!(c, zip_hi, lanes);
    ternary_op!(c, fma, values);
    ternary_op!(c, fms, values);
    ternary_op!(c, fnma, values);
    ternary_op!(c, fnms, values);
    compare_op!(c, eq);
    compare_op!(c, ne);
    compare_op!(c, lt);
    compare_op!(c, le);

    c.run("isnan", isnan_case::<Fast<T, N>, T, N>, isnan_case::<Fallback, T, N>);
    c.run("select", select_case::<Fast<T, N>, T, N>, select_case::<Fallback, T, N>);
    c.run("hadd", hadd_case::<Fast<T, N>, T, N>, hadd_case::<Fallback, T, N>);
    c.run("haddp", haddp_case::<Fast<T, N>, T, N>, haddp_case::<Fallback, T, N>);
    c.run("mask_ops", mask_case::<Fast<T, N>, T, N>, mask_case::<Fallback, T, N>);
    c.run(
        "mask_round_trip",
        mask_round_trip::<Fast<T, N>, T, N>,
        mask_round_trip::<Fallback, T, N>,
    );
}

// Cases written once over the kernel, run on both sides.

fn splat_case<K: Kernel<T, N>, T: Element, const N: usize>([a, _, _]: Args<T, N>) -> Observed {
    lanes(K::to_array(K::splat(a[0])))
}

fn isnan_case<K: Kernel<T, N>, T: Element, const N: usize>([a, _, _]: Args<T, N>) -> Observed {
    mask(K::mask_bits(K::isnan(K::from_array(a))), N)
}

fn select_case<K: Kernel<T, N>, T: Element, const N: usize>([a, b, c]: Args<T, N>) -> Observed {
    let (ra, rb, rc) = (K::from_array(a), K::from_array(b), K::from_array(c));
    lanes(K::to_array(K::select(K::lt(ra, rb), rb, rc)))
}

fn hadd_case<K: Kernel<T, N>, T: Element, const N: usize>([a, _, _]: Args<T, N>) -> Observed {
    value(K::hadd(K::from_array(a)))
}

fn haddp_case<K: Kernel<T, N>, T: Element, const N: usize>(args: Args<T, N>) -> Observed {
    let rows = core::array::from_fn(|i| K::from_array(args[i % 3]));
    values(K::to_array(K::haddp(&rows)))
}

fn mask_case<K: Kernel<T, N>, T: Element, const N: usize>([a, b, c]: Args<T, N>) -> Observed {
    let (ra, rb, rc) = (K::from_array(a), K::from_array(b), K::from_array(c));
    let x = K::lt(ra, rb);
    let y = K::le(rc, ra);
    let bits = [
        K::mask_bits(K::mask_and(x, y)),
        K::mask_bits(K::mask_or(x, y)),
        K::mask_bits(K::mask_xor(x, y)),
        K::mask_bits(K::mask_not(x)),
        K::mask_bits(K::mask_eq(x, y)),
        K::mask_any(x) as u64,
        K::mask_all(y) as u64,
    ];
    Observed {
        bits: bits.to_vec(),
        text: format!("{:?}", bits),
    }
}

fn mask_round_trip<K: Kernel<T, N>, T: Element, const N: usize>([a, b, _]: Args<T, N>) -> Observed {
    let truth: [bool; N] = core::array::from_fn(|i| a[i] < b[i]);
    let back = K::mask_to_array(K::mask_from_array(truth));
    mask(K::mask_bits(K::mask_from_array(back)), N)
}

fn shift_case<K: Kernel<T, N>, T: IntElement, const N: usize>(
    a: [T; N],
    amount: u32,
    left: bool,
) -> Observed {
    let r = K::from_array(a);
    lanes(K::to_array(if left { K::shl(r, amount) } else { K::shr(r, amount) }))
}

#[repr(C, align(64))]
struct Aligned<A>(A);

fn check_int_ops<T, const N: usize>(c: &mut Checker<T, N>)
where
    T: Registered<N> + Sample + IntElement,
{
    binary_op!(c, div, lanes, |[a, b, c]: Args<T, N>| [a, nonzero(b), c]);
    binary_op!(c, rem, lanes, |[a, b, c]: Args<T, N>| [a, nonzero(b), c]);
    binary_op!(c, shl_lanes, lanes, |[a, b, c]: Args<T, N>| [a, shift_amounts(b), c]);
    binary_op!(c, shr_lanes, lanes, |[a, b, c]: Args<T, N>| [a, shift_amounts(b), c]);

    for amount in 0..T::BITS {
        c.run(
            "shl",
            |[a, _, _]| shift_case::<Fast<T, N>, T, N>(a, amount, true),
            |[a, _, _]| shift_case::<Fallback, T, N>(a, amount, true),
        );
        c.run(
            "shr",
            |[a, _, _]| shift_case::<Fast<T, N>, T, N>(a, amount, false),
            |[a, _, _]| shift_case::<Fallback, T, N>(a, amount, false),
        );
    }
}

fn check_float_ops<T, const N: usize>(c: &mut Checker<T, N>)
where
    T: Registered<N> + Sample + FloatElement,
{
    binary_op!(c, div, values);
    binary_op!(c, rem, values);
    unary_op!(c, sqrt, values);
    unary_op!(c, fabs, lanes);
    binary_op!(c, fmin, lanes);
    binary_op!(c, fmax, lanes);
}

/// Checks one `(T, N)` pair.
pub fn check_pair<T: Registered<N> + Sample, const N: usize>(config: &CheckConfig) -> PairReport {
    let mut checker = Checker::<T, N>::new(config);
    check_common(&mut checker);
    T::check_specific(&mut checker);
    checker.finish()
}

/// Checks one `(T, N)` pair, as a report of its own.
pub fn check<T: Registered<N> + Sample, const N: usize>(config: &CheckConfig) -> ConformanceReport {
    ConformanceReport {
        pairs: vec![check_pair::<T, N>(config)],
    }
}

/// Checks every 16-byte pair, the ones an accelerated kernel may serve.
pub fn check_all(config: &CheckConfig) -> ConformanceReport {
    let mut report = ConformanceReport::default();

    macro_rules! pairs {
        ($($t:ty => $n:literal),* $(,)?) => {$(
            let pair = check_pair::<$t, $n>(config);
            let failed = !pair.passed();
            report.pairs.push(pair);
            if failed && config.report.fail_fast {
                warn!("Stopping after first failing pair ({}x{})", stringify!($t), $n);
                return report;
            }
        )*};
    }

    pairs!(
        i8 => 16, u8 => 16,
        i16 => 8, u16 => 8,
        i32 => 4, u32 => 4,
        i64 => 2, u64 => 2,
        f32 => 4, f64 => 2,
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn small() -> CheckConfig {
        CheckConfig {
            samples: 64,
            ..CheckConfig::default()
        }
    }

    #[test]
    fn fallback_pairs_trivially_conform() {
        let report = check::<i32, 8>(&small());
        assert!(report.passed(), "{}", report);
        assert_eq!(report.pairs[0].kernel, "fallback");
    }

    #[test]
    fn shifts_cover_every_amount() {
        let report = check_pair::<u8, 16>(&small());
        let shl_runs = report.ops.iter().filter(|o| o.op == "shl").count();
        assert_eq!(shl_runs, 8);
    }

    #[test]
    fn edge_cases_are_appended() {
        let config = CheckConfig {
            samples: 0,
            ..CheckConfig::default()
        };
        let report = check_pair::<f32, 4>(&config);
        let edges = f32::edge_cases().len();
        assert_eq!(report.op("add").map(|o| o.cases), Some(edges * edges));
    }

    #[test]
    fn text_report_ends_with_verdict() {
        let report = check::<u16, 8>(&small());
        assert!(report.to_string().starts_with("u16x8"));
        assert!(report.to_string().ends_with("0 mismatches"));
    }
}
