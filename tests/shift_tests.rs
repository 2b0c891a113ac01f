use xbatch::Batch;

#[test]
fn test_shift_left_by_scalar() {
    let a = Batch::<u32, 4>::from_array([1, 3, 0x8000_0001, 0xFFFF_FFFF]);
    assert_eq!((a << 4).to_array(), [16, 48, 0x10, 0xFFFF_FFF0]);
    assert_eq!((a << 0), a);
    assert_eq!((a << 31).to_array(), [0x8000_0000, 0x8000_0000, 0x8000_0000, 0x8000_0000]);
}

#[test]
fn test_shift_right_is_arithmetic_for_signed() {
    let a = Batch::<i16, 8>::from_array([-16, 16, -1, i16::MIN, 7, -7, 0, i16::MAX]);
    assert_eq!(
        (a >> 2).to_array(),
        [-4, 4, -1, -8192, 1, -2, 0, 8191]
    );
}

#[test]
fn test_shift_right_is_logical_for_unsigned() {
    let a = Batch::<u8, 16>::splat(0x80);
    assert_eq!((a >> 7).to_array(), [1; 16]);

    let b = Batch::<u64, 2>::from_array([u64::MAX, 1 << 40]);
    assert_eq!((b >> 40).to_array(), [0xFF_FFFF, 1]);
}

#[test]
fn test_shift_by_batch_is_per_lane() {
    let a = Batch::<i32, 4>::splat(-64);
    let amounts = Batch::<i32, 4>::from_array([0, 1, 4, 31]);
    assert_eq!((a >> amounts).to_array(), [-64, -32, -4, -1]);
    assert_eq!((a << amounts).to_array(), [-64, -128, -1024, 0]);

    let b = Batch::<u8, 16>::splat(1);
    let steps = Batch::<u8, 16>::from_array([0, 1, 2, 3, 4, 5, 6, 7, 0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(
        (b << steps).to_array(),
        [1, 2, 4, 8, 16, 32, 64, 128, 1, 2, 4, 8, 16, 32, 64, 128]
    );
}

#[test]
fn test_shift_assign() {
    let mut a = Batch::<u16, 8>::splat(0x00F0);
    a <<= 4;
    assert_eq!(a.to_array(), [0x0F00; 8]);
    a >>= 8;
    assert_eq!(a.to_array(), [0x000F; 8]);

    let mut b = Batch::<i64, 2>::from_array([256, -256]);
    b >>= Batch::from_array([8, 4]);
    assert_eq!(b.to_array(), [1, -16]);
    b <<= Batch::from_array([1, 2]);
    assert_eq!(b.to_array(), [2, -64]);
}

#[test]
fn test_eight_bit_shifts_do_not_leak_between_lanes() {
    // 16-bit shift instructions would carry bits across byte lanes.
    let a = Batch::<u8, 16>::from_array([
        0xFF, 0x01, 0x80, 0x7F, 0xFF, 0x01, 0x80, 0x7F, 0xFF, 0x01, 0x80, 0x7F, 0xFF, 0x01, 0x80,
        0x7F,
    ]);
    assert_eq!((a << 1).get(0), 0xFE);
    assert_eq!((a << 1).get(1), 0x02);
    assert_eq!((a >> 1).get(1), 0x00);
    assert_eq!((a >> 1).get(2), 0x40);

    let s = Batch::<i8, 16>::splat(-128);
    assert_eq!((s >> 7).to_array(), [-1; 16]);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "out of range")]
fn test_shift_at_bit_width_is_rejected_in_debug() {
    let a = Batch::<i32, 4>::splat(1);
    let _ = a << 32;
}
