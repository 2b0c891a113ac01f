//! Numeric conversion against bitwise casting.
//!
//! `to_int`/`to_float`/`convert` change values; `bitwise_cast` keeps bits.

use xbatch::{ops, Batch, BatchBool};

/// IEEE 754 single-precision representation of 1.0.
const F32_ONE_BITS: i32 = 0x3F80_0000;

#[test]
fn test_bitwise_cast_round_trip() {
    let ints = Batch::<i32, 4>::splat(F32_ONE_BITS);
    let floats: Batch<f32, 4> = ops::bitwise_cast(ints);
    assert_eq!(floats.to_array(), [1.0; 4]);

    let back: Batch<i32, 4> = ops::bitwise_cast(floats);
    assert_eq!(back, Batch::splat(F32_ONE_BITS));
}

#[test]
fn test_bitwise_cast_is_not_a_value_conversion() {
    let one = Batch::<u32, 4>::splat(1);
    let tiny = one.bitwise_cast::<f32, 4>().to_array();
    assert_ne!(tiny[0], 1.0);
    assert!(tiny[0] > 0.0 && tiny[0] < 1.0e-30, "1u32 reinterprets as a subnormal");
}

#[test]
fn test_bitwise_cast_changes_lane_count() {
    let a = Batch::<u32, 4>::splat(0x1234_5678);
    let halves: Batch<u16, 8> = a.bitwise_cast();
    let first: [u8; 2] = 0x1234_5678u32.to_ne_bytes()[..2].try_into().unwrap();
    assert_eq!(halves.get(0), u16::from_ne_bytes(first));

    let bytes: Batch<u8, 16> = a.bitwise_cast();
    assert_eq!(bytes.to_array()[..4], 0x1234_5678u32.to_ne_bytes());

    let back: Batch<u32, 4> = halves.bitwise_cast();
    assert_eq!(back, a);

    let wide: Batch<u64, 2> = bytes.bitwise_cast();
    let narrow: Batch<u32, 4> = wide.bitwise_cast();
    assert_eq!(narrow, a);
}

#[test]
fn test_bitwise_cast_keeps_nan_payload() {
    let payload = 0x7FC0_1234u32;
    let n = Batch::<u32, 4>::splat(payload).bitwise_cast::<f32, 4>();
    assert!(ops::isnan(n).all());
    assert_eq!(n.bitwise_cast::<u32, 4>().to_array(), [payload; 4]);
}

#[test]
fn test_numeric_conversion_preserves_value() {
    let a = Batch::<i32, 4>::from_array([1, -2, 1 << 24, i32::MIN]);
    assert_eq!(a.to_float().to_array(), [1.0, -2.0, 16_777_216.0, -2_147_483_648.0]);

    let u = Batch::<u32, 4>::splat(u32::MAX);
    assert_eq!(ops::to_float(u).to_array(), [4_294_967_296.0; 4]);
}

#[test]
fn test_float_to_int_truncates_and_saturates() {
    let f = Batch::<f32, 4>::from_array([2.5, -2.5, 1.0e10, f32::NAN]);
    assert_eq!(f.to_int().to_array(), [2, -2, i32::MAX, 0]);

    let d = Batch::<f64, 2>::from_array([-0.999, f64::NEG_INFINITY]);
    assert_eq!(ops::to_int(d).to_array(), [0, i64::MIN]);
}

#[test]
fn test_round_trips_match_scalar_casts() {
    let ints = [0i64, -1, (1 << 53) + 1, i64::MAX];
    let b = Batch::<i64, 4>::from_array(ints);
    let expected = ints.map(|x| (x as f64) as i64);
    assert_eq!(b.to_float().to_int().to_array(), expected);

    let floats = [0.75f32, -3.5, 1.0e20, -0.0];
    let f = Batch::<f32, 4>::from_array(floats);
    let expected = floats.map(|x| (x as i32) as f32);
    assert_eq!(f.to_int().to_float().to_array(), expected);
}

#[test]
fn test_convert_between_widths() {
    let a = Batch::<i16, 8>::from_array([-1, 0, 1, 255, 256, -129, i16::MAX, i16::MIN]);
    let b: Batch<u8, 8> = a.convert();
    assert_eq!(b.to_array(), [255, 0, 1, 255, 0, 127, 255, 0]);

    let c: Batch<f64, 8> = a.convert();
    assert_eq!(c.get(7), -32768.0);
}

#[test]
fn test_bool_cast_keeps_lanes() {
    let x = Batch::<f32, 4>::from_array([1.0, -1.0, 2.0, -2.0]);
    let positive = x.gt(Batch::splat(0.0));

    let as_int: BatchBool<i32, 4> = ops::bool_cast(positive);
    assert_eq!(as_int.to_array(), [true, false, true, false]);

    let counts = Batch::<i32, 4>::splat(10);
    let picked = ops::select(as_int, counts, Batch::splat(-10));
    assert_eq!(picked.to_array(), [10, -10, 10, -10]);

    assert_eq!(as_int.bool_cast::<f32>(), positive);
}
