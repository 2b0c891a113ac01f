use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xbatch::ops::{fma, hadd, sadd, select};
use xbatch::{Batch, Complex, ComplexBatch};

const LEN: usize = 4096;

/// `y = a * x + y` over a buffer, with the 16-byte batch and a wider one.
fn bench_axpy(c: &mut Criterion) {
    let x: Vec<f32> = (0..LEN).map(|i| i as f32 * 0.25).collect();
    let mut y = vec![1.0f32; LEN];
    let mut group = c.benchmark_group("axpy");

    group.bench_function("f32x4", |b| {
        let a = Batch::<f32, 4>::splat(1.5);
        b.iter(|| {
            for (xs, ys) in x.chunks_exact(4).zip(y.chunks_exact_mut(4)) {
                fma(a, Batch::from_slice(xs), Batch::from_slice(ys)).store_slice(ys);
            }
            black_box(&y);
        })
    });

    group.bench_function("f32x16", |b| {
        let a = Batch::<f32, 16>::splat(1.5);
        b.iter(|| {
            for (xs, ys) in x.chunks_exact(16).zip(y.chunks_exact_mut(16)) {
                fma(a, Batch::from_slice(xs), Batch::from_slice(ys)).store_slice(ys);
            }
            black_box(&y);
        })
    });

    group.finish();
}

fn bench_saturating_u8(c: &mut Criterion) {
    let pixels: Vec<u8> = (0..LEN).map(|i| (i * 7) as u8).collect();
    let mut out = vec![0u8; LEN];
    let boost = Batch::<u8, 16>::splat(40);

    c.bench_function("sadd_u8x16", |b| {
        b.iter(|| {
            for (src, dst) in pixels.chunks_exact(16).zip(out.chunks_exact_mut(16)) {
                sadd(Batch::from_slice(src), boost).store_slice(dst);
            }
            black_box(&out);
        })
    });
}

fn bench_select_and_sum(c: &mut Criterion) {
    let data: Vec<i32> = (0..LEN as i32).map(|i| i - 2000).collect();
    let zero = Batch::<i32, 4>::splat(0);

    c.bench_function("relu_hadd_i32x4", |b| {
        b.iter(|| {
            let mut total = 0i32;
            for chunk in data.chunks_exact(4) {
                let v = Batch::from_slice(chunk);
                total = total.wrapping_add(hadd(select(v.gt(zero), v, zero)));
            }
            black_box(total)
        })
    });
}

fn bench_complex_multiply(c: &mut Criterion) {
    let data: Vec<Complex<f64>> = (0..LEN)
        .map(|i| Complex::new(i as f64, -(i as f64) * 0.5))
        .collect();
    let mut out = vec![Complex::new(0.0, 0.0); LEN];
    let w = ComplexBatch::<f64, 2>::splat(Complex::new(0.6, 0.8));

    c.bench_function("complex_mul_f64x2", |b| {
        b.iter(|| {
            for (src, dst) in data.chunks_exact(2).zip(out.chunks_exact_mut(2)) {
                (ComplexBatch::load_interleaved(src) * w).store_interleaved(dst);
            }
            black_box(&out);
        })
    });
}

criterion_group!(
    benches,
    bench_axpy,
    bench_saturating_u8,
    bench_select_and_sum,
    bench_complex_multiply
);
criterion_main!(benches);
