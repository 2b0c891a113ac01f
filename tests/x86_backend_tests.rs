#[cfg(target_arch = "x86_64")]
#[cfg(test)]
mod tests {
    use xbatch::backends::fallback::Fallback;
    use xbatch::backends::x86::Sse2;
    use xbatch::kernel::{Kernel, MaskStorage, Storage};
    use xbatch::platform::kernel_name;
    use xbatch::{ops, Batch};

    type F = Fallback;

    fn f32x4(lanes: [f32; 4]) -> <Sse2 as Kernel<f32, 4>>::Reg {
        <Sse2 as Kernel<f32, 4>>::from_array(lanes)
    }

    fn out_f32(reg: <Sse2 as Kernel<f32, 4>>::Reg) -> [f32; 4] {
        <Sse2 as Kernel<f32, 4>>::to_array(reg)
    }

    #[test]
    fn test_registry_selects_sse2_for_16_byte_pairs() {
        assert_eq!(kernel_name::<f32, 4>(), "sse2");
        assert_eq!(kernel_name::<u8, 16>(), "sse2");
        assert_eq!(kernel_name::<i64, 2>(), "sse2");
        assert_eq!(kernel_name::<f32, 8>(), "fallback");
        assert_eq!(<Sse2 as Kernel<i16, 8>>::STORAGE, Storage::Register128);
        assert_eq!(<Sse2 as Kernel<i16, 8>>::MASK_STORAGE, MaskStorage::Lanes);
        assert_eq!(Batch::<f64, 2>::ALIGN, 16);
    }

    #[test]
    fn test_sse2_arithmetic() {
        let a = <Sse2 as Kernel<f32, 4>>::splat(2.0);
        let b = <Sse2 as Kernel<f32, 4>>::splat(3.0);

        assert_eq!(out_f32(<Sse2 as Kernel<f32, 4>>::add(a, b)), [5.0; 4]);
        assert_eq!(out_f32(<Sse2 as Kernel<f32, 4>>::sub(b, a)), [1.0; 4]);
        assert_eq!(out_f32(<Sse2 as Kernel<f32, 4>>::mul(a, b)), [6.0; 4]);
        assert_eq!(out_f32(<Sse2 as Kernel<f32, 4>>::div(b, a)), [1.5; 4]);
    }

    #[test]
    fn test_sse2_logic() {
        let a = <Sse2 as Kernel<f32, 4>>::splat(1.0);
        let b = <Sse2 as Kernel<f32, 4>>::splat(2.0);

        let lt = <Sse2 as Kernel<f32, 4>>::lt(a, b);
        assert!(<Sse2 as Kernel<f32, 4>>::mask_all(lt));

        let t = <Sse2 as Kernel<f32, 4>>::splat(10.0);
        let f = <Sse2 as Kernel<f32, 4>>::splat(20.0);
        assert_eq!(out_f32(<Sse2 as Kernel<f32, 4>>::select(lt, t, f)), [10.0; 4]);

        let gt = <Sse2 as Kernel<f32, 4>>::lt(b, a);
        assert!(!<Sse2 as Kernel<f32, 4>>::mask_any(gt));
        assert_eq!(out_f32(<Sse2 as Kernel<f32, 4>>::select(gt, t, f)), [20.0; 4]);
    }

    #[test]
    fn test_sse2_bitwise() {
        let a = <Sse2 as Kernel<f32, 4>>::splat(1.0); // 0x3f800000
        let b = <Sse2 as Kernel<f32, 4>>::splat(2.0); // 0x40000000
        assert_eq!(out_f32(<Sse2 as Kernel<f32, 4>>::bitand(a, b)), [0.0; 4]);
        assert_eq!(
            out_f32(<Sse2 as Kernel<f32, 4>>::andnot(a, b)),
            [1.0; 4],
            "a & !b keeps every bit of 1.0"
        );
    }

    #[test]
    fn test_sse2_mask_bits_match_fallback() {
        let lanes = [true, false, true, true];
        let m = <Sse2 as Kernel<i32, 4>>::mask_from_array(lanes);
        assert_eq!(
            <Sse2 as Kernel<i32, 4>>::mask_bits(m),
            <F as Kernel<i32, 4>>::mask_bits(<F as Kernel<i32, 4>>::mask_from_array(lanes))
        );
        assert_eq!(<Sse2 as Kernel<i32, 4>>::mask_to_array(m), lanes);

        let n = <Sse2 as Kernel<i32, 4>>::mask_not(m);
        assert_eq!(<Sse2 as Kernel<i32, 4>>::mask_bits(n), 0b0010);
    }

    #[test]
    fn test_sse2_saturation_matches_fallback() {
        let a = [i16::MAX, i16::MIN, 100, -100, 0, 1, -1, 30_000];
        let b = [1, -1, i16::MAX, i16::MIN, 0, i16::MAX, i16::MIN, 30_000];

        let sse = <Sse2 as Kernel<i16, 8>>::to_array(<Sse2 as Kernel<i16, 8>>::sadd(
            <Sse2 as Kernel<i16, 8>>::from_array(a),
            <Sse2 as Kernel<i16, 8>>::from_array(b),
        ));
        assert_eq!(sse, <F as Kernel<i16, 8>>::sadd(a, b));

        let sse = <Sse2 as Kernel<i16, 8>>::to_array(<Sse2 as Kernel<i16, 8>>::ssub(
            <Sse2 as Kernel<i16, 8>>::from_array(a),
            <Sse2 as Kernel<i16, 8>>::from_array(b),
        ));
        assert_eq!(sse, <F as Kernel<i16, 8>>::ssub(a, b));
    }

    #[test]
    fn test_sse2_min_max_nan_order() {
        let a = [1.0, f32::NAN, -0.0, 0.0];
        let b = [f32::NAN, 1.0, 0.0, -0.0];
        let min = out_f32(<Sse2 as Kernel<f32, 4>>::min(f32x4(a), f32x4(b)));
        let expected = <F as Kernel<f32, 4>>::min(a, b);
        assert_eq!(min.map(f32::to_bits), expected.map(f32::to_bits));

        let max = out_f32(<Sse2 as Kernel<f32, 4>>::max(f32x4(a), f32x4(b)));
        let expected = <F as Kernel<f32, 4>>::max(a, b);
        assert_eq!(max.map(f32::to_bits), expected.map(f32::to_bits));
    }

    #[test]
    fn test_sse2_zip() {
        let a = <Sse2 as Kernel<u8, 16>>::from_array(core::array::from_fn(|i| i as u8));
        let b = <Sse2 as Kernel<u8, 16>>::from_array(core::array::from_fn(|i| 100 + i as u8));
        let lo = <Sse2 as Kernel<u8, 16>>::to_array(<Sse2 as Kernel<u8, 16>>::zip_lo(a, b));
        assert_eq!(&lo[..6], &[0, 100, 1, 101, 2, 102]);
        let hi = <Sse2 as Kernel<u8, 16>>::to_array(<Sse2 as Kernel<u8, 16>>::zip_hi(a, b));
        assert_eq!(&hi[..4], &[8, 108, 9, 109]);
    }

    #[test]
    fn test_sse2_variable_shift() {
        let a = <Sse2 as Kernel<i64, 2>>::from_array([-1024, 1024]);
        let n = <Sse2 as Kernel<i64, 2>>::from_array([3, 63]);
        let r = <Sse2 as Kernel<i64, 2>>::to_array(<Sse2 as Kernel<i64, 2>>::shr_lanes(a, n));
        assert_eq!(r, [-128, 0]);
    }

    #[test]
    fn test_batch_api_runs_on_sse2() {
        let a = Batch::<u32, 4>::from_array([1, 2, 3, 4]);
        let b = Batch::<u32, 4>::from_array([u32::MAX, 0, 3, 1]);
        assert_eq!(ops::sadd(a, b).to_array(), [u32::MAX, 2, 6, 5]);
        assert_eq!((a * b).to_array(), [u32::MAX, 0, 9, 4]);
        assert_eq!(a.lt(b).bits(), 0b0001);
        assert_eq!(ops::hadd(a), 10);
    }
}
