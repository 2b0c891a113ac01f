use xbatch::{Batch, BatchBool};

#[test]
fn test_int32x4_add() {
    let a = Batch::<i32, 4>::from_array([1, 2, 3, 4]);
    let b = Batch::<i32, 4>::from_array([10, 20, 30, 40]);
    assert_eq!(a + b, Batch::from_array([11, 22, 33, 44]));
}

#[test]
fn test_batch_u32_arithmetic() {
    let a = Batch::<u32, 4>::splat(10);
    let b = Batch::<u32, 4>::splat(20);

    assert_eq!((a + b).to_array(), [30; 4]);
    assert_eq!((b - a).to_array(), [10; 4]);
    assert_eq!((a * b).to_array(), [200; 4]);
    assert_eq!((b / a).to_array(), [2; 4]);
    assert_eq!((Batch::<u32, 4>::splat(25) % a).to_array(), [5; 4]);
}

#[test]
fn test_integer_arithmetic_wraps() {
    let a = Batch::<i8, 16>::splat(i8::MAX);
    assert_eq!((a + 1).to_array(), [i8::MIN; 16]);

    let b = Batch::<u16, 8>::splat(0);
    assert_eq!((b - 1).to_array(), [u16::MAX; 8]);

    let c = Batch::<i32, 4>::splat(0x4000_0000);
    assert_eq!((c * 4).to_array(), [0; 4]);

    // Wrapping division: MIN / -1 == MIN.
    let d = Batch::<i64, 2>::splat(i64::MIN);
    assert_eq!((d / -1).to_array(), [i64::MIN; 2]);
}

#[test]
fn test_negation() {
    let a = Batch::<i32, 4>::from_array([1, -2, 0, i32::MIN]);
    assert_eq!((-a).to_array(), [-1, 2, 0, i32::MIN]);

    let f = Batch::<f32, 4>::from_array([1.0, -0.0, 0.0, f32::INFINITY]);
    let n = (-f).to_array();
    assert_eq!(n[0], -1.0);
    assert!(n[1].is_sign_positive() && n[1] == 0.0);
    assert!(n[2].is_sign_negative() && n[2] == 0.0);
    assert_eq!(n[3], f32::NEG_INFINITY);
}

#[test]
fn test_scalar_operands_broadcast() {
    let a = Batch::<f64, 2>::from_array([1.5, -2.0]);
    assert_eq!((a * 2.0).to_array(), [3.0, -4.0]);
    assert_eq!((a + 0.5).to_array(), [2.0, -1.5]);

    let mut b = Batch::<u8, 16>::splat(3);
    b += 4;
    b *= 2;
    assert_eq!(b.to_array(), [14; 16]);
}

#[test]
fn test_batch_u32_bitwise() {
    let a = Batch::<u32, 4>::splat(0x0F0F_0F0F);
    let b = Batch::<u32, 4>::splat(0xF0F0_F0F0);

    assert_eq!((a & b).to_array(), [0; 4]);
    assert_eq!((a | b).to_array(), [0xFFFF_FFFF; 4]);
    assert_eq!((a ^ a).to_array(), [0; 4]);
    assert_eq!((!a).to_array(), [0xF0F0_F0F0; 4]);
}

#[test]
fn test_float_bitwise_acts_on_bits() {
    let one = Batch::<f32, 4>::splat(1.0); // 0x3f800000
    let two = Batch::<f32, 4>::splat(2.0); // 0x40000000
    assert_eq!((one & two).to_array(), [0.0; 4]);
    assert_eq!((one | two).to_array(), [f32::from_bits(0x7f80_0000); 4]);

    let sign = Batch::<f32, 4>::splat(-0.0);
    assert_eq!((one ^ sign).to_array(), [-1.0; 4]);
}

#[test]
fn test_batch_load_store() {
    let data = [1u32, 2, 3, 4, 5, 6, 7, 8];

    let batch = Batch::<u32, 4>::from_slice(&data[4..]);
    assert_eq!(batch.to_array(), [5, 6, 7, 8]);

    let mut dest = [0u32; 6];
    batch.store_slice(&mut dest[1..]);
    assert_eq!(dest, [0, 5, 6, 7, 8, 0]);
}

#[test]
#[should_panic(expected = "shorter than 4 lanes")]
fn test_short_slice_panics() {
    let _ = Batch::<u32, 4>::from_slice(&[1, 2, 3]);
}

#[test]
fn test_raw_pointer_load_store() {
    #[repr(C, align(16))]
    struct Aligned([f32; 8]);

    let src = Aligned([0.5, 1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5]);
    let mut dst = Aligned([0.0; 8]);

    // SAFETY: both buffers hold 8 lanes and start on a 16-byte boundary.
    unsafe {
        let a = Batch::<f32, 4>::load_aligned(src.0.as_ptr());
        let b = Batch::<f32, 4>::load_unaligned(src.0.as_ptr().add(3));
        a.store_aligned(dst.0.as_mut_ptr().add(4));
        b.store_unaligned(dst.0.as_mut_ptr());
    }
    assert_eq!(dst.0, [3.5, 4.5, 5.5, 6.5, 0.5, 1.5, 2.5, 3.5]);
}

#[test]
fn test_converting_load_store() {
    let bytes = [0u8, 1, 127, 255];
    let a = Batch::<f32, 4>::from_slice_as(&bytes);
    assert_eq!(a.to_array(), [0.0, 1.0, 127.0, 255.0]);

    let mut out = [0i16; 4];
    (a * -1.5).store_slice_as(&mut out);
    assert_eq!(out, [0, -1, -190, -382]);

    let wide = [70_000i32, -1, 3, 4];
    // SAFETY: `wide` holds four lanes.
    let narrow = unsafe { Batch::<u16, 4>::load_unaligned_as(wide.as_ptr()) };
    assert_eq!(narrow.to_array(), [4464, 65535, 3, 4]);
}

#[test]
fn test_aligned_converting_load_store() {
    #[repr(C, align(16))]
    struct AlignedBytes([u8; 16]);
    #[repr(C, align(16))]
    struct AlignedF64([f64; 4]);

    let src = AlignedBytes([200, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
    let mut dst = AlignedF64([0.0; 4]);

    // SAFETY: both buffers start on a 16-byte boundary and hold enough lanes.
    let a = unsafe { Batch::<i32, 4>::load_aligned_as(src.0.as_ptr()) };
    assert_eq!(a.to_array(), [200, 1, 2, 3]);

    unsafe { (a - 100).store_aligned_as(dst.0.as_mut_ptr()) };
    assert_eq!(dst.0, [100.0, -99.0, -98.0, -97.0]);
}

#[test]
#[cfg(all(debug_assertions, target_arch = "x86_64", target_feature = "sse2"))]
#[should_panic(expected = "misaligned load_aligned")]
fn test_misaligned_load_is_rejected_in_debug() {
    #[repr(C, align(16))]
    struct Aligned([f32; 8]);

    let src = Aligned([0.0; 8]);
    assert_eq!(Batch::<f32, 4>::ALIGN, 16);
    // SAFETY: the offset pointer still has four readable lanes; only the
    // alignment is wrong.
    let _ = unsafe { Batch::<f32, 4>::load_aligned(src.0.as_ptr().add(1)) };
}

#[test]
#[cfg(all(debug_assertions, target_arch = "x86_64", target_feature = "sse2"))]
#[should_panic(expected = "misaligned store_aligned")]
fn test_misaligned_store_is_rejected_in_debug() {
    #[repr(C, align(16))]
    struct Aligned([i32; 8]);

    let mut dst = Aligned([0; 8]);
    // SAFETY: four writable lanes remain after the offset.
    unsafe { Batch::<i32, 4>::splat(1).store_aligned(dst.0.as_mut_ptr().add(1)) };
}

#[test]
fn test_lane_access() {
    let a = Batch::<i16, 8>::from_array([0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(a.get(5), 5);
    assert_eq!(a.get(13), 5);

    let b = a.replace(2, -9);
    assert_eq!(b.to_array(), [0, 1, -9, 3, 4, 5, 6, 7]);
    assert_eq!(a.get(2), 2);
}

#[test]
fn test_comparisons_produce_masks() {
    let a = Batch::<i32, 4>::from_array([1, 5, 3, -7]);
    let b = Batch::<i32, 4>::from_array([2, 5, 1, -7]);

    assert_eq!(a.eq(b).to_array(), [false, true, false, true]);
    assert_eq!(a.ne(b).to_array(), [true, false, true, false]);
    assert_eq!(a.lt(b).to_array(), [true, false, false, false]);
    assert_eq!(a.le(b).to_array(), [true, true, false, true]);
    assert_eq!(a.gt(b).to_array(), [false, false, true, false]);
    assert_eq!(a.ge(b).to_array(), [false, true, true, true]);
}

#[test]
fn test_unsigned_comparisons_use_full_range() {
    let a = Batch::<u8, 16>::splat(200);
    let b = Batch::<u8, 16>::splat(100);
    assert!(a.gt(b).all());

    let c = Batch::<u64, 2>::from_array([u64::MAX, 0]);
    let d = Batch::<u64, 2>::splat(1);
    assert_eq!(c.lt(d).to_array(), [false, true]);
}

#[test]
fn test_nan_compares_unordered() {
    let a = Batch::<f64, 2>::from_array([f64::NAN, 1.0]);
    let b = Batch::<f64, 2>::from_array([f64::NAN, f64::NAN]);

    assert!(a.eq(b).none());
    assert!(a.ne(b).all());
    assert!(a.lt(b).none());
    assert!(a.ge(b).none());
    assert_ne!(a, a);
}

#[test]
fn test_mask_to_batch() {
    let m = BatchBool::<i32, 4>::from_array([true, false, false, true]);
    assert_eq!(Batch::from(m).to_array(), [1, 0, 0, 1]);

    let f = BatchBool::<f32, 4>::from_array([false, true, false, true]);
    assert_eq!(Batch::from(f).to_array(), [0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_default_and_debug() {
    let z = Batch::<u64, 8>::default();
    assert_eq!(z.to_array(), [0; 8]);

    let a = Batch::<i8, 2>::from_array([-1, 2]);
    assert_eq!(format!("{:?}", a), "Batch([-1, 2])");
}
